use super::traits::{ChatTransport, StartChatOptions, TransportFactory};
use crate::config::ConnectionSettings;
use crate::error::TransportError;
use crate::messages::{FileAttachment, InboundMessage, OutboundMessage};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Push notification from a running chat session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message(InboundMessage),
    Typing { active: bool },
    AgentEndedSession,
}

/// A [`TransportEvent`] tagged with the session that produced it, so events
/// from a session that has since been replaced can be discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: u64,
    pub event: TransportEvent,
}

/// Builds chat sessions and normalizes their callback surface into
/// [`SessionEvent`]s.
pub struct TransportAdapter {
    factory: Arc<dyn TransportFactory>,
    connection: ConnectionSettings,
    max_upload_bytes: usize,
}

impl TransportAdapter {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        connection: ConnectionSettings,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            factory,
            connection,
            max_upload_bytes,
        }
    }

    /// Create, initialize and start a session. Callbacks are registered before
    /// the chat starts so nothing pushed during start-up is lost.
    pub async fn start(
        &self,
        session: u64,
        options: &StartChatOptions,
        events: UnboundedSender<SessionEvent>,
    ) -> Result<ChatSession, TransportError> {
        let transport = self
            .factory
            .create(&self.connection)
            .map_err(|e| TransportError::SdkUnavailable(format!("{e:#}")))?;

        transport
            .initialize()
            .await
            .map_err(|e| TransportError::StartFailed(format!("{e:#}")))?;

        register_callbacks(transport.as_ref(), session, &events);

        transport
            .start_chat(options)
            .await
            .map_err(|e| TransportError::StartFailed(format!("{e:#}")))?;

        tracing::info!(
            transport = transport.name(),
            session,
            widget_id = %self.connection.widget_id,
            "chat session started"
        );
        Ok(ChatSession {
            transport,
            max_upload_bytes: self.max_upload_bytes,
        })
    }
}

fn register_callbacks(
    transport: &dyn ChatTransport,
    session: u64,
    events: &UnboundedSender<SessionEvent>,
) {
    let forward = move |events: UnboundedSender<SessionEvent>| {
        move |event: TransportEvent| {
            if events.send(SessionEvent { session, event }).is_err() {
                tracing::debug!(session, "session event receiver dropped");
            }
        }
    };

    let on_message = forward(events.clone());
    transport.on_new_message(Box::new(move |message| on_message(TransportEvent::Message(message))));

    let on_typing = forward(events.clone());
    transport.on_typing_event(Box::new(move |active| on_typing(TransportEvent::Typing { active })));

    let on_end = forward(events.clone());
    transport.on_agent_end_session(Box::new(move || on_end(TransportEvent::AgentEndedSession)));
}

/// A started session. Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    max_upload_bytes: usize,
}

impl ChatSession {
    pub async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.transport
            .send_message(message)
            .await
            .map_err(|e| TransportError::SendFailed(format!("{e:#}")))
    }

    pub async fn poll(&self) -> Result<Vec<InboundMessage>, TransportError> {
        self.transport
            .get_messages()
            .await
            .map_err(|e| TransportError::PollFailed(format!("{e:#}")))
    }

    /// Upload a file. Oversized files are rejected without contacting the
    /// transport.
    pub async fn upload(&self, file: &FileAttachment) -> Result<(), TransportError> {
        check_upload_size(file, self.max_upload_bytes)?;
        self.transport
            .upload_file_attachment(file)
            .await
            .map_err(|e| TransportError::UploadFailed(format!("{e:#}")))
    }

    /// Best-effort end; failures are only logged.
    pub async fn end(&self) {
        if let Err(e) = self.transport.end_chat().await {
            tracing::warn!(transport = self.transport.name(), error = %e, "failed to end chat");
        }
    }
}

pub fn check_upload_size(file: &FileAttachment, limit: usize) -> Result<(), TransportError> {
    let size = file.size();
    if size > limit {
        tracing::debug!(file = %file.name, size, limit, "upload rejected locally");
        return Err(TransportError::UploadTooLarge { size, limit });
    }
    Ok(())
}
