//! Widget session lifecycle: the view state machine, the controller that
//! drives it, and the async runtime that connects it to a chat transport.

pub mod commands;
pub mod controller;
pub mod host;
pub mod runtime;
pub mod state;
pub mod unread;

pub use commands::{Command, Ticket, WidgetEvent};
pub use controller::{ANONYMOUS_EMAIL, ANONYMOUS_NAME, Identity, WidgetController};
pub use host::WidgetHost;
pub use runtime::{HostSurface, WidgetRuntime};
pub use state::ViewState;
pub use unread::UnreadCounter;
