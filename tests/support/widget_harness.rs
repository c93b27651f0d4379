#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use omnichat_widget::config::{ConnectionSettings, RawWidgetConfig};
use omnichat_widget::messages::{FileAttachment, InboundMessage, OutboundMessage, Role};
use omnichat_widget::session::{HostSurface, ViewState, WidgetController, WidgetEvent, WidgetHost};
use omnichat_widget::timeline::TimelineEntry;
use omnichat_widget::transport::{
    ChatTransport, MessageHandler, SessionEndHandler, StartChatOptions, TransportFactory,
    TypingHandler,
};

const WAIT_LIMIT: Duration = Duration::from_secs(5);

pub fn raw_config(prechat: bool) -> RawWidgetConfig {
    RawWidgetConfig {
        org_id: Some("org-123".into()),
        org_url: Some("https://org.omnichannelengagementhub.com".into()),
        widget_id: Some("widget-abc".into()),
        enable_prechat_form: Some(prechat),
        poll_interval_ms: Some(20),
        typing_timeout_ms: Some(150),
        max_upload_bytes: Some(1_000_000),
        ..RawWidgetConfig::default()
    }
}

#[derive(Default)]
struct Script {
    on_message: Option<MessageHandler>,
    on_typing: Option<TypingHandler>,
    on_end: Option<SessionEndHandler>,
    history: Vec<InboundMessage>,
    sent: Vec<OutboundMessage>,
    uploads: Vec<String>,
    started_with: Vec<StartChatOptions>,
    fail_sends: bool,
    fail_start: Option<String>,
    start_delay: Option<Duration>,
    ended: usize,
}

/// A chat transport the test drives by hand.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }

    /// Deliver through the push callback and keep it in the poll history.
    pub fn push(&self, message: InboundMessage) {
        self.with(|s| {
            s.history.push(message.clone());
            if let Some(handler) = &s.on_message {
                handler(message);
            }
        });
    }

    /// Only visible to the poll loop.
    pub fn add_to_history(&self, message: InboundMessage) {
        self.with(|s| s.history.push(message));
    }

    pub fn typing(&self, active: bool) {
        self.with(|s| {
            if let Some(handler) = &s.on_typing {
                handler(active);
            }
        });
    }

    pub fn agent_ends(&self) {
        self.with(|s| {
            if let Some(handler) = &s.on_end {
                handler();
            }
        });
    }

    pub fn fail_sends(&self, fail: bool) {
        self.with(|s| s.fail_sends = fail);
    }

    pub fn fail_start(&self, reason: &str) {
        self.with(|s| s.fail_start = Some(reason.to_string()));
    }

    pub fn delay_start(&self, delay: Duration) {
        self.with(|s| s.start_delay = Some(delay));
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.with(|s| s.sent.clone())
    }

    pub fn uploads(&self) -> Vec<String> {
        self.with(|s| s.uploads.clone())
    }

    pub fn started_with(&self) -> Vec<StartChatOptions> {
        self.with(|s| s.started_with.clone())
    }

    pub fn ended(&self) -> usize {
        self.with(|s| s.ended)
    }
}

impl ChatTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn initialize<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }

    fn start_chat<'a>(
        &'a self,
        options: &'a StartChatOptions,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let (delay, failure) = self.with(|s| {
                s.started_with.push(options.clone());
                (s.start_delay, s.fail_start.clone())
            });
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match failure {
                Some(reason) => anyhow::bail!(reason),
                None => Ok(()),
            }
        })
    }

    fn send_message<'a>(
        &'a self,
        message: &'a OutboundMessage,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.with(|s| {
                if s.fail_sends {
                    anyhow::bail!("network unreachable");
                }
                s.sent.push(message.clone());
                Ok(())
            })
        })
    }

    fn get_messages<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<InboundMessage>>> + Send + 'a>> {
        Box::pin(async move { Ok(self.with(|s| s.history.clone())) })
    }

    fn on_new_message(&self, handler: MessageHandler) {
        self.with(|s| s.on_message = Some(handler));
    }

    fn on_typing_event(&self, handler: TypingHandler) {
        self.with(|s| s.on_typing = Some(handler));
    }

    fn on_agent_end_session(&self, handler: SessionEndHandler) {
        self.with(|s| s.on_end = Some(handler));
    }

    fn end_chat<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.with(|s| s.ended += 1);
            Ok(())
        })
    }

    fn upload_file_attachment<'a>(
        &'a self,
        file: &'a FileAttachment,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.with(|s| s.uploads.push(file.name.clone()));
            Ok(())
        })
    }
}

/// Hands out the same scripted transport and counts how often it was asked.
pub struct ScriptedFactory {
    pub transport: Arc<ScriptedTransport>,
    pub created: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(transport: Arc<ScriptedTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            created: AtomicUsize::new(0),
        })
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl TransportFactory for ScriptedFactory {
    fn create(&self, _connection: &ConnectionSettings) -> anyhow::Result<Arc<dyn ChatTransport>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let transport: Arc<dyn ChatTransport> = self.transport.clone();
        Ok(transport)
    }
}

/// What the visitor would see after a refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: ViewState,
    pub window_open: bool,
    pub confirm_visible: bool,
    pub typing: bool,
    pub unread: u32,
    pub entries: Vec<TimelineEntry>,
    pub alerts: Vec<String>,
    pub opened: Vec<String>,
}

impl Snapshot {
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text().unwrap_or_default().to_string()).collect()
    }

    pub fn texts_by(&self, role: Role) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.role == role)
            .map(|e| e.text().unwrap_or_default().to_string())
            .collect()
    }
}

struct RecordingSurface {
    tx: UnboundedSender<Snapshot>,
    alerts: Vec<String>,
    opened: Vec<String>,
}

impl HostSurface for RecordingSurface {
    fn refresh(&mut self, controller: &WidgetController) {
        let _ = self.tx.send(Snapshot {
            state: controller.state(),
            window_open: controller.window_open(),
            confirm_visible: controller.confirm_visible(),
            typing: controller.agent_typing(),
            unread: controller.unread().count(),
            entries: controller.timeline().entries().to_vec(),
            alerts: self.alerts.clone(),
            opened: self.opened.clone(),
        });
    }

    fn notify(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn open_url(&mut self, url: &str) {
        self.opened.push(url.to_string());
    }
}

/// A mounted widget running on the test runtime.
pub struct Harness {
    ui: mpsc::Sender<WidgetEvent>,
    snapshots: UnboundedReceiver<Snapshot>,
    last: Option<Snapshot>,
    task: JoinHandle<WidgetController>,
}

impl Harness {
    pub fn mount(raw: RawWidgetConfig, factory: Arc<dyn TransportFactory>) -> Self {
        let runtime = WidgetHost::new()
            .mount(raw, factory)
            .expect("test config should mount");
        let (ui, rx) = mpsc::channel(16);
        let (tx, snapshots) = mpsc::unbounded_channel();
        let surface = RecordingSurface {
            tx,
            alerts: Vec::new(),
            opened: Vec::new(),
        };
        let task = tokio::spawn(runtime.run(rx, surface));
        Self {
            ui,
            snapshots,
            last: None,
            task,
        }
    }

    pub async fn send(&self, event: WidgetEvent) {
        self.ui.send(event).await.expect("runtime should be running");
    }

    /// Wait for the first refresh that satisfies `check`.
    pub async fn wait_for(&mut self, what: &str, check: impl Fn(&Snapshot) -> bool) -> Snapshot {
        if let Some(last) = &self.last
            && check(last)
        {
            return last.clone();
        }
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        loop {
            match tokio::time::timeout_at(deadline, self.snapshots.recv()).await {
                Ok(Some(snapshot)) => {
                    let done = check(&snapshot);
                    self.last = Some(snapshot.clone());
                    if done {
                        return snapshot;
                    }
                }
                Ok(None) => panic!("runtime stopped while waiting for {what}"),
                Err(_) => panic!("timed out waiting for {what}; last: {:?}", self.last),
            }
        }
    }

    /// Let queued work settle, then return the latest refresh.
    pub async fn settle(&mut self) -> Snapshot {
        tokio::time::sleep(Duration::from_millis(120)).await;
        while let Ok(snapshot) = self.snapshots.try_recv() {
            self.last = Some(snapshot);
        }
        self.last.clone().expect("at least one refresh")
    }

    pub async fn finish(self) -> WidgetController {
        drop(self.ui);
        self.task.await.expect("runtime task should not panic")
    }
}

/// Open the window and get through pre-chat into an active session.
pub async fn connect(harness: &mut Harness, name: &str, question: &str) -> Snapshot {
    harness.send(WidgetEvent::ToggleWindow).await;
    harness
        .send(WidgetEvent::SubmitPrechat {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            question: question.into(),
        })
        .await;
    harness
        .wait_for("active session", |s| s.state == ViewState::Active)
        .await
}

pub fn agent(id: &str, content: &str) -> InboundMessage {
    InboundMessage::new(Role::Agent, content)
        .with_id(id)
        .with_sender("Sarah")
}
