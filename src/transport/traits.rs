use crate::config::ConnectionSettings;
use crate::messages::{FileAttachment, InboundMessage, OutboundMessage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type MessageHandler = Box<dyn Fn(InboundMessage) + Send + Sync>;
/// Receives `true` when the agent starts typing and `false` when it stops.
pub type TypingHandler = Box<dyn Fn(bool) + Send + Sync>;
pub type SessionEndHandler = Box<dyn Fn() + Send + Sync>;

/// Display context passed to the chat service when a session starts.
///
/// Serialized as the service's `customContext` map, e.g.
/// `{"emailaddress1": {"value": "ada@example.com", "isDisplayable": true}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartChatOptions {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextField {
    pub value: String,
    pub is_displayable: bool,
}

impl StartChatOptions {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn custom_context(&self) -> BTreeMap<&'static str, ContextField> {
        let field = |value: &str| ContextField {
            value: value.to_string(),
            is_displayable: true,
        };
        BTreeMap::from([("emailaddress1", field(&self.email)), ("Name", field(&self.name))])
    }
}

/// Capability set of a live-chat service session.
///
/// Implementations report failures as `anyhow::Error`; the adapter maps them
/// onto [`crate::error::TransportError`].
pub trait ChatTransport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    fn initialize<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    fn start_chat<'a>(
        &'a self,
        options: &'a StartChatOptions,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    fn send_message<'a>(
        &'a self,
        message: &'a OutboundMessage,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    /// Full message history of the current session, oldest first.
    fn get_messages<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<InboundMessage>>> + Send + 'a>>;

    fn on_new_message(&self, handler: MessageHandler);

    fn on_typing_event(&self, handler: TypingHandler);

    fn on_agent_end_session(&self, handler: SessionEndHandler);

    fn end_chat<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    fn upload_file_attachment<'a>(
        &'a self,
        _file: &'a FileAttachment,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move { anyhow::bail!("file upload not supported by this transport") })
    }
}

/// Builds one transport per chat session.
pub trait TransportFactory: Send + Sync {
    /// Fails when the underlying chat library cannot be loaded.
    fn create(&self, connection: &ConnectionSettings) -> anyhow::Result<Arc<dyn ChatTransport>>;
}

impl<F> TransportFactory for F
where
    F: Fn(&ConnectionSettings) -> anyhow::Result<Arc<dyn ChatTransport>> + Send + Sync,
{
    fn create(&self, connection: &ConnectionSettings) -> anyhow::Result<Arc<dyn ChatTransport>> {
        self(connection)
    }
}
