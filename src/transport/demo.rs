//! Offline transport that plays a scripted agent. Used by `omnichat-widget
//! demo` and whenever a deployment has no chat service to talk to.

use super::traits::{
    ChatTransport, MessageHandler, SessionEndHandler, StartChatOptions, TransportFactory,
    TypingHandler,
};
use crate::config::ConnectionSettings;
use crate::messages::{FileAttachment, InboundMessage, OutboundMessage, Role};
use rand::Rng;
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const DEMO_AGENT_NAME: &str = "Sarah";

const CANNED_REPLIES: [&str; 4] = [
    "I understand. Let me look into that for you.",
    "That's a great question! Here's what I can tell you...",
    "Thanks for the information. I'm checking our system now.",
    "I'd be happy to help with that!",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoTiming {
    pub greeting: Duration,
    pub typing: Duration,
    pub reply_min: Duration,
    pub reply_max: Duration,
}

impl Default for DemoTiming {
    fn default() -> Self {
        Self {
            greeting: Duration::from_millis(1000),
            typing: Duration::from_millis(500),
            reply_min: Duration::from_millis(2000),
            reply_max: Duration::from_millis(3500),
        }
    }
}

impl DemoTiming {
    /// No delays at all.
    pub fn immediate() -> Self {
        Self {
            greeting: Duration::ZERO,
            typing: Duration::ZERO,
            reply_min: Duration::ZERO,
            reply_max: Duration::ZERO,
        }
    }
}

#[derive(Default)]
struct Handlers {
    message: Option<MessageHandler>,
    typing: Option<TypingHandler>,
    end: Option<SessionEndHandler>,
}

struct DemoState {
    timing: DemoTiming,
    handlers: Mutex<Handlers>,
    history: Mutex<Vec<InboundMessage>>,
    ended: AtomicBool,
}

impl DemoState {
    fn deliver(&self, message: InboundMessage) {
        if self.ended.load(Ordering::SeqCst) {
            return;
        }
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handlers.message.as_ref() {
            handler(message);
        }
    }

    fn typing(&self, active: bool) {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handlers.typing.as_ref() {
            handler(active);
        }
    }

    async fn reply_after_typing(self: Arc<Self>, reply: String) {
        tokio::time::sleep(self.timing.typing).await;
        self.typing(true);
        let delay = self.reply_delay();
        tokio::time::sleep(delay).await;
        self.typing(false);
        self.deliver(agent_message(reply));
    }

    fn reply_delay(&self) -> Duration {
        let DemoTiming {
            reply_min,
            reply_max,
            ..
        } = self.timing;
        if reply_max <= reply_min {
            return reply_min;
        }
        rand::rng().random_range(reply_min..=reply_max)
    }
}

pub struct DemoTransport {
    state: Arc<DemoState>,
}

impl DemoTransport {
    pub fn new(timing: DemoTiming) -> Self {
        Self {
            state: Arc::new(DemoState {
                timing,
                handlers: Mutex::new(Handlers::default()),
                history: Mutex::new(Vec::new()),
                ended: AtomicBool::new(false),
            }),
        }
    }

    /// Simulate the agent closing the conversation.
    pub fn end_from_agent(&self) {
        let handlers = self
            .state
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handlers.end.as_ref() {
            handler();
        }
        self.state.ended.store(true, Ordering::SeqCst);
    }
}

/// Factory handing out a fresh [`DemoTransport`] per session.
pub fn demo_factory(timing: DemoTiming) -> impl TransportFactory {
    move |_: &ConnectionSettings| -> anyhow::Result<Arc<dyn ChatTransport>> {
        Ok(Arc::new(DemoTransport::new(timing)))
    }
}

fn agent_message(content: impl Into<String>) -> InboundMessage {
    InboundMessage::new(Role::Agent, content)
        .with_id(format!("demo-{}", uuid::Uuid::new_v4()))
        .with_sender(DEMO_AGENT_NAME)
}

fn quick_replies() -> String {
    json!({
        "text": "Here are a few things I can help with:",
        "suggestedActions": { "actions": [
            { "type": "imBack", "title": "Track Order", "value": "Track Order" },
            { "type": "imBack", "title": "Returns", "value": "Returns" },
            { "type": "imBack", "title": "Talk to a person", "value": "Talk to a person" }
        ]}
    })
    .to_string()
}

/// Pick the scripted answer to one outbound message.
fn scripted_reply(message: &OutboundMessage) -> String {
    if let Ok(Value::Object(doc)) = serde_json::from_str::<Value>(&message.content)
        && doc.contains_key("value")
    {
        return "Thanks, I've received your selection.".to_string();
    }

    let lower = message.content.to_lowercase();
    if lower.contains("menu") || lower.contains("options") {
        return quick_replies();
    }

    let index = rand::rng().random_range(0..CANNED_REPLIES.len());
    CANNED_REPLIES[index].to_string()
}

impl ChatTransport for DemoTransport {
    fn name(&self) -> &str {
        "demo"
    }

    fn initialize<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move { Ok(()) })
    }

    fn start_chat<'a>(
        &'a self,
        options: &'a StartChatOptions,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.state.ended.store(false, Ordering::SeqCst);
            self.state.deliver(
                InboundMessage::new(
                    Role::System,
                    format!("Demo Mode - Connected with {DEMO_AGENT_NAME}"),
                )
                .with_id(format!("demo-{}", uuid::Uuid::new_v4())),
            );

            let state = Arc::clone(&self.state);
            let greeting = format!(
                "Hi {}! 👋 I'm {DEMO_AGENT_NAME}. How can I help you today?",
                options.name
            );
            tokio::spawn(async move {
                tokio::time::sleep(state.timing.greeting).await;
                state.deliver(agent_message(greeting));
            });
            Ok(())
        })
    }

    fn send_message<'a>(
        &'a self,
        message: &'a OutboundMessage,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.state.ended.load(Ordering::SeqCst) {
                anyhow::bail!("conversation has ended");
            }
            let reply = scripted_reply(message);
            tokio::spawn(Arc::clone(&self.state).reply_after_typing(reply));
            Ok(())
        })
    }

    fn get_messages<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<InboundMessage>>> + Send + 'a>> {
        Box::pin(async move {
            Ok(self
                .state
                .history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone())
        })
    }

    fn on_new_message(&self, handler: MessageHandler) {
        self.state
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .message = Some(handler);
    }

    fn on_typing_event(&self, handler: TypingHandler) {
        self.state
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .typing = Some(handler);
    }

    fn on_agent_end_session(&self, handler: SessionEndHandler) {
        self.state
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .end = Some(handler);
    }

    fn end_chat<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.state.ended.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn upload_file_attachment<'a>(
        &'a self,
        file: &'a FileAttachment,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let reply = format!(
                "Thanks, I received {} ({}).",
                file.name,
                file.effective_mime_type()
            );
            tokio::spawn(Arc::clone(&self.state).reply_after_typing(reply));
            Ok(())
        })
    }
}
