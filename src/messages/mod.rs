pub mod avatar;
pub mod cards;
pub mod classifier;
pub mod types;

pub use avatar::{Avatar, AvatarStyle, is_bot_name};
pub use cards::{CardAction, CardButton, DecodedCard, decode};
pub use classifier::{MessageKind, classify};
pub use types::{FileAttachment, InboundMessage, OutboundMessage, Role};
