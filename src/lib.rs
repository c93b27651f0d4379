#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod error;
pub mod messages;
pub mod session;
pub mod timeline;
pub mod transport;

pub use config::{RawWidgetConfig, WidgetConfig};
pub use error::WidgetError;
pub use session::{WidgetController, WidgetEvent, WidgetHost, WidgetRuntime};
