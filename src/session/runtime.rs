use super::commands::{Command, WidgetEvent};
use super::controller::WidgetController;
use super::state::ViewState;
use crate::error::TransportError;
use crate::transport::{ChatSession, SessionEvent, TransportAdapter, TransportEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Where the widget is drawn.
pub trait HostSurface: Send {
    /// Redraw from the controller's current state.
    fn refresh(&mut self, controller: &WidgetController);

    /// Blocking message to the visitor.
    fn notify(&mut self, message: &str);

    /// Open a link in a new browsing context.
    fn open_url(&mut self, url: &str);
}

/// Completions reported by spawned tasks.
enum Completion {
    Event(WidgetEvent),
    Started { session: u64, chat: ChatSession },
}

/// Drives a [`WidgetController`]: executes its commands against the chat
/// session, runs the poll loop and typing deadline, and feeds every result
/// back through `dispatch`.
pub struct WidgetRuntime {
    controller: WidgetController,
    adapter: Arc<TransportAdapter>,
    chat: Option<ChatSession>,
    poller: Option<CancellationToken>,
    typing_deadline: Option<(Instant, u64)>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

impl WidgetRuntime {
    pub fn new(controller: WidgetController, adapter: TransportAdapter) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            adapter: Arc::new(adapter),
            chat: None,
            poller: None,
            typing_deadline: None,
            completions_tx,
            completions_rx,
            events_tx,
            events_rx,
        }
    }

    pub fn controller(&self) -> &WidgetController {
        &self.controller
    }

    /// Run until the UI event channel closes. A chat still running at that
    /// point is ended.
    pub async fn run<S: HostSurface>(
        mut self,
        mut ui: mpsc::Receiver<WidgetEvent>,
        mut surface: S,
    ) -> WidgetController {
        surface.refresh(&self.controller);

        loop {
            let typing = self.typing_deadline;
            let deadline = typing.map_or_else(Instant::now, |(at, _)| at);

            tokio::select! {
                event = ui.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    self.handle(event, &mut surface);
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.complete(completion, &mut surface);
                }
                Some(SessionEvent { session, event }) = self.events_rx.recv() => {
                    if session == self.controller.session() {
                        self.handle(WidgetEvent::Transport(event), &mut surface);
                    } else {
                        tracing::debug!(session, "event from a previous session dropped");
                    }
                }
                () = tokio::time::sleep_until(deadline), if typing.is_some() => {
                    self.typing_deadline = None;
                    if let Some((_, token)) = typing {
                        self.handle(WidgetEvent::TypingExpired { token }, &mut surface);
                    }
                }
            }
        }

        self.shutdown().await;
        self.controller
    }

    /// Dispatch one event and carry out the resulting commands.
    pub fn handle(&mut self, event: WidgetEvent, surface: &mut dyn HostSurface) {
        for command in self.controller.dispatch(event) {
            self.execute(command, surface);
        }
        surface.refresh(&self.controller);
    }

    fn complete(&mut self, completion: Completion, surface: &mut dyn HostSurface) {
        match completion {
            Completion::Event(event) => self.handle(event, surface),
            Completion::Started { session, chat } => {
                if session != self.controller.session()
                    || self.controller.state() != ViewState::Connecting
                {
                    tracing::debug!(session, "session started after it was abandoned");
                    tokio::spawn(async move { chat.end().await });
                    return;
                }
                self.chat = Some(chat);
                self.handle(WidgetEvent::SessionStarted { session }, surface);
            }
        }
    }

    fn execute(&mut self, command: Command, surface: &mut dyn HostSurface) {
        match command {
            Command::StartSession { session, options } => {
                let adapter = Arc::clone(&self.adapter);
                let events = self.events_tx.clone();
                let completions = self.completions_tx.clone();
                tokio::spawn(async move {
                    let completion = match adapter.start(session, &options, events).await {
                        Ok(chat) => Completion::Started { session, chat },
                        Err(error) => {
                            Completion::Event(WidgetEvent::SessionStartFailed { session, error })
                        }
                    };
                    let _ = completions.send(completion);
                });
            }
            Command::Send { ticket, message } => {
                let completions = self.completions_tx.clone();
                let chat = self.chat.clone();
                tokio::spawn(async move {
                    let result = match chat {
                        Some(chat) => chat.send(&message).await,
                        None => Err(TransportError::NotConnected),
                    };
                    let _ = completions.send(Completion::Event(WidgetEvent::SendCompleted {
                        ticket,
                        result,
                    }));
                });
            }
            Command::Upload { ticket, file } => {
                let completions = self.completions_tx.clone();
                let chat = self.chat.clone();
                tokio::spawn(async move {
                    let result = match chat {
                        Some(chat) => chat.upload(&file).await,
                        None => Err(TransportError::NotConnected),
                    };
                    let _ = completions.send(Completion::Event(WidgetEvent::UploadCompleted {
                        ticket,
                        result,
                    }));
                });
            }
            Command::EndSession => {
                self.stop_polling();
                if let Some(chat) = self.chat.take() {
                    tokio::spawn(async move { chat.end().await });
                }
            }
            Command::OpenUrl(target) => match url::Url::parse(&target) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    surface.open_url(parsed.as_str());
                }
                _ => tracing::warn!(url = %target, "refusing to open non-http link"),
            },
            Command::StartPolling => self.start_polling(),
            Command::StopPolling => self.stop_polling(),
            Command::ArmTypingTimeout { token, after } => {
                self.typing_deadline = Some((Instant::now() + after, token));
            }
            Command::Alert(message) => surface.notify(&message),
        }
    }

    fn start_polling(&mut self) {
        self.stop_polling();
        let Some(chat) = self.chat.clone() else {
            tracing::debug!("polling requested without a chat session");
            return;
        };
        let cancel = CancellationToken::new();
        let session = self.controller.session();
        let interval = self.controller.config().limits.poll_interval;
        tokio::spawn(poll_loop(chat, session, interval, self.events_tx.clone(), cancel.clone()));
        self.poller = Some(cancel);
    }

    fn stop_polling(&mut self) {
        if let Some(cancel) = self.poller.take() {
            cancel.cancel();
        }
    }

    async fn shutdown(&mut self) {
        self.stop_polling();
        if let Some(chat) = self.chat.take()
            && self.controller.state() == ViewState::Active
        {
            chat.end().await;
        }
    }
}

async fn poll_loop(
    chat: ChatSession,
    session: u64,
    every: Duration,
    events: UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match chat.poll().await {
                    Ok(messages) => {
                        for message in messages {
                            let event = SessionEvent {
                                session,
                                event: TransportEvent::Message(message),
                            };
                            if events.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => tracing::debug!(session, error = %e, "poll failed"),
                }
            }
        }
    }
    tracing::debug!(session, "polling stopped");
}
