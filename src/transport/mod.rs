pub mod adapter;
pub mod demo;
pub mod traits;

pub use adapter::{ChatSession, SessionEvent, TransportAdapter, TransportEvent, check_upload_size};
pub use demo::{DemoTiming, DemoTransport, demo_factory};
pub use traits::{
    ChatTransport, MessageHandler, SessionEndHandler, StartChatOptions, TransportFactory,
    TypingHandler,
};
