use super::commands::{Command, Ticket, WidgetEvent};
use super::state::ViewState;
use super::unread::UnreadCounter;
use crate::config::WidgetConfig;
use crate::error::TransportError;
use crate::messages::{CardAction, FileAttachment, InboundMessage, OutboundMessage};
use crate::timeline::{Activation, GroupRef, Timeline};
use crate::transport::{StartChatOptions, TransportEvent};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const ANONYMOUS_NAME: &str = "Anonymous";
pub const ANONYMOUS_EMAIL: &str = "anon@example.com";

const STATUS_CONNECTING: &str = "Connecting...";
const STATUS_CONNECTED: &str = "Connected";
const STATUS_ENDED: &str = "Chat ended";
const STARTING_LABEL: &str = "Starting...";

const PRECHAT_INCOMPLETE: &str = "Please fill all required fields";
const SEND_FAILED_NOTICE: &str = "Failed to send. Try again.";

/// Who the visitor said they are on the pre-chat form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    fn anonymous() -> Self {
        Self {
            name: ANONYMOUS_NAME.to_string(),
            email: ANONYMOUS_EMAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Pending {
    Text,
    Control { group: GroupRef, echo: String },
    Upload { name: String },
}

/// The widget session state machine.
///
/// `dispatch` is the only way state changes. It never performs I/O; the
/// returned [`Command`]s are carried out by the runtime, which reports back
/// with completion events.
pub struct WidgetController {
    config: Arc<WidgetConfig>,
    initial: ViewState,
    state: ViewState,
    window_open: bool,
    confirm_visible: bool,
    timeline: Timeline,
    unread: UnreadCounter,
    identity: Option<Identity>,
    question: Option<String>,
    session: u64,
    next_ticket: Ticket,
    pending: HashMap<Ticket, Pending>,
    agent_typing: bool,
    typing_token: u64,
}

impl WidgetController {
    pub fn new(config: Arc<WidgetConfig>) -> Self {
        let initial = if config.prechat_enabled() {
            ViewState::AwaitingPrechat
        } else {
            ViewState::Idle
        };
        Self {
            config,
            initial,
            state: initial,
            window_open: false,
            confirm_visible: false,
            timeline: Timeline::new(),
            unread: UnreadCounter::default(),
            identity: None,
            question: None,
            session: 0,
            next_ticket: 0,
            pending: HashMap::new(),
            agent_typing: false,
            typing_token: 0,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn window_open(&self) -> bool {
        self.window_open
    }

    pub fn confirm_visible(&self) -> bool {
        self.confirm_visible
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn unread(&self) -> UnreadCounter {
        self.unread
    }

    pub fn agent_typing(&self) -> bool {
        self.agent_typing
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Session generation; bumps whenever a session starts or is discarded.
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn status_line(&self) -> &str {
        match self.state {
            ViewState::Idle | ViewState::AwaitingPrechat => self.config.header_subtitle.as_str(),
            ViewState::Connecting => STATUS_CONNECTING,
            ViewState::Active => STATUS_CONNECTED,
            ViewState::Ended => STATUS_ENDED,
        }
    }

    /// Label of the pre-chat submit button; shows progress while connecting.
    pub fn start_button_label(&self) -> &str {
        if self.state == ViewState::Connecting {
            STARTING_LABEL
        } else {
            self.config.prechat.start_btn_text.as_str()
        }
    }

    fn user_name(&self) -> &str {
        self.identity
            .as_ref()
            .map_or(ANONYMOUS_NAME, |identity| identity.name.as_str())
    }

    pub fn dispatch(&mut self, event: WidgetEvent) -> Vec<Command> {
        match event {
            WidgetEvent::ToggleWindow => self.toggle_window(),
            WidgetEvent::Minimize => {
                self.window_open = false;
                Vec::new()
            }
            WidgetEvent::CloseRequested => {
                if self.state == ViewState::Active {
                    self.confirm_visible = true;
                } else {
                    self.window_open = false;
                }
                Vec::new()
            }
            WidgetEvent::ConfirmEnd => self.confirm_end(),
            WidgetEvent::CancelEnd => {
                self.confirm_visible = false;
                Vec::new()
            }
            WidgetEvent::SubmitPrechat {
                name,
                email,
                question,
            } => self.submit_prechat(&name, &email, &question),
            WidgetEvent::SubmitText(text) => self.submit_text(&text),
            WidgetEvent::ActivateControl {
                entry,
                control,
                inputs,
            } => self.activate_control(entry, control, &inputs),
            WidgetEvent::AttachFile(file) => self.attach_file(file),
            WidgetEvent::StartNewChat => self.start_new_chat(),
            WidgetEvent::SessionStarted { session } => self.session_started(session),
            WidgetEvent::SessionStartFailed { session, error } => {
                self.session_start_failed(session, &error)
            }
            WidgetEvent::Transport(event) => self.transport_event(event),
            WidgetEvent::SendCompleted { ticket, result } => self.send_completed(ticket, result),
            WidgetEvent::UploadCompleted { ticket, result } => {
                self.upload_completed(ticket, result)
            }
            WidgetEvent::TypingExpired { token } => {
                if token == self.typing_token {
                    self.agent_typing = false;
                }
                Vec::new()
            }
        }
    }

    fn enter(&mut self, target: ViewState) -> bool {
        match self.state.transition(target) {
            Ok(next) => {
                tracing::info!(from = %self.state, to = %next, "view state changed");
                self.state = next;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "transition rejected");
                false
            }
        }
    }

    fn toggle_window(&mut self) -> Vec<Command> {
        self.window_open = !self.window_open;
        if !self.window_open {
            return Vec::new();
        }
        self.unread.reset();
        if self.state == ViewState::Idle {
            return self.begin_connecting(Identity::anonymous(), None);
        }
        Vec::new()
    }

    fn begin_connecting(&mut self, identity: Identity, question: Option<String>) -> Vec<Command> {
        if !self.enter(ViewState::Connecting) {
            return Vec::new();
        }
        self.session += 1;
        let options = StartChatOptions::new(identity.name.clone(), identity.email.clone());
        self.identity = Some(identity);
        self.question = question;
        vec![Command::StartSession {
            session: self.session,
            options,
        }]
    }

    fn submit_prechat(&mut self, name: &str, email: &str, question: &str) -> Vec<Command> {
        if self.state != ViewState::AwaitingPrechat {
            tracing::debug!(state = %self.state, "pre-chat submit ignored");
            return Vec::new();
        }
        let (name, email, question) = (name.trim(), email.trim(), question.trim());
        if name.is_empty() || email.is_empty() {
            return vec![Command::Alert(PRECHAT_INCOMPLETE.to_string())];
        }
        let identity = Identity {
            name: name.to_string(),
            email: email.to_string(),
        };
        let question = (!question.is_empty()).then(|| question.to_string());
        self.begin_connecting(identity, question)
    }

    fn issue_ticket(&mut self, pending: Pending) -> Ticket {
        self.next_ticket += 1;
        self.pending.insert(self.next_ticket, pending);
        self.next_ticket
    }

    fn send_text(&mut self, text: &str) -> Vec<Command> {
        let user_name = self.user_name().to_string();
        self.timeline.push_user(text, &user_name, &self.config.avatars);
        let ticket = self.issue_ticket(Pending::Text);
        vec![Command::Send {
            ticket,
            message: OutboundMessage::text(text),
        }]
    }

    fn submit_text(&mut self, text: &str) -> Vec<Command> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if !self.state.accepts_outbound() {
            tracing::debug!(state = %self.state, "text submit ignored outside an active chat");
            return Vec::new();
        }
        self.send_text(text)
    }

    fn activate_control(
        &mut self,
        entry: u64,
        control: usize,
        inputs: &BTreeMap<String, String>,
    ) -> Vec<Command> {
        // Links open in any state; only sends need a live session.
        let opens_link = self
            .timeline
            .entry(entry)
            .and_then(|e| e.control(control))
            .is_some_and(|(_, c)| matches!(c.action, CardAction::OpenUrl(_)));
        if !opens_link && !self.state.accepts_outbound() {
            tracing::debug!(
                state = %self.state,
                entry,
                control,
                "control ignored outside an active chat"
            );
            return Vec::new();
        }
        match self.timeline.activate(entry, control, inputs) {
            Some(Activation::OpenUrl(url)) => vec![Command::OpenUrl(url)],
            Some(Activation::Send {
                group,
                message,
                echo,
            }) => {
                let ticket = self.issue_ticket(Pending::Control { group, echo });
                tracing::debug!(entry, control, ticket, "control activated");
                vec![Command::Send { ticket, message }]
            }
            None => {
                tracing::debug!(entry, control, "control not available");
                Vec::new()
            }
        }
    }

    fn attach_file(&mut self, file: FileAttachment) -> Vec<Command> {
        if !self.state.accepts_outbound() {
            tracing::debug!(
                state = %self.state,
                file = %file.name,
                "upload ignored outside an active chat"
            );
            return Vec::new();
        }
        let ticket = self.issue_ticket(Pending::Upload {
            name: file.name.clone(),
        });
        vec![Command::Upload { ticket, file }]
    }

    fn confirm_end(&mut self) -> Vec<Command> {
        if !self.confirm_visible {
            return Vec::new();
        }
        self.confirm_visible = false;
        if self.state != ViewState::Active || !self.enter(ViewState::Ended) {
            return Vec::new();
        }
        self.agent_typing = false;
        vec![Command::StopPolling, Command::EndSession]
    }

    fn start_new_chat(&mut self) -> Vec<Command> {
        if self.state != ViewState::Ended {
            tracing::debug!(state = %self.state, "new chat is only offered once a chat has ended");
            return Vec::new();
        }
        if !self.enter(self.initial) {
            return Vec::new();
        }
        self.timeline.clear();
        self.pending.clear();
        self.identity = None;
        self.question = None;
        self.agent_typing = false;
        self.typing_token += 1;
        self.confirm_visible = false;
        self.session += 1;
        tracing::info!(session = self.session, "widget reset for a new chat");

        if self.state == ViewState::Idle && self.window_open {
            return self.begin_connecting(Identity::anonymous(), None);
        }
        Vec::new()
    }

    fn is_current(&self, session: u64) -> bool {
        session == self.session && self.state == ViewState::Connecting
    }

    fn session_started(&mut self, session: u64) -> Vec<Command> {
        if !self.is_current(session) || !self.enter(ViewState::Active) {
            tracing::debug!(session, "stale session start ignored");
            return Vec::new();
        }
        let mut commands = vec![Command::StartPolling];
        if let Some(question) = self.question.take() {
            commands.extend(self.send_text(&question));
        }
        commands
    }

    fn session_start_failed(&mut self, session: u64, error: &TransportError) -> Vec<Command> {
        if !self.is_current(session) || !self.enter(self.initial) {
            tracing::debug!(session, "stale session failure ignored");
            return Vec::new();
        }
        tracing::warn!(session, error = %error, "chat session failed to start");
        self.identity = None;
        self.question = None;
        let reason = match error {
            TransportError::SdkUnavailable(reason) | TransportError::StartFailed(reason) => {
                reason.clone()
            }
            other => other.to_string(),
        };
        vec![Command::Alert(format!("Failed to connect: {reason}"))]
    }

    fn transport_event(&mut self, event: TransportEvent) -> Vec<Command> {
        match event {
            TransportEvent::Message(message) => {
                self.receive(message);
                Vec::new()
            }
            TransportEvent::Typing { active: true } => {
                if self.state != ViewState::Active {
                    return Vec::new();
                }
                self.agent_typing = true;
                self.typing_token += 1;
                vec![Command::ArmTypingTimeout {
                    token: self.typing_token,
                    after: self.config.limits.typing_timeout,
                }]
            }
            TransportEvent::Typing { active: false } => {
                self.agent_typing = false;
                Vec::new()
            }
            TransportEvent::AgentEndedSession => {
                if self.state != ViewState::Active || !self.enter(ViewState::Ended) {
                    return Vec::new();
                }
                self.agent_typing = false;
                self.confirm_visible = false;
                vec![Command::StopPolling]
            }
        }
    }

    fn receive(&mut self, message: InboundMessage) {
        if !matches!(self.state, ViewState::Connecting | ViewState::Active) {
            tracing::debug!(state = %self.state, "inbound message outside a session dropped");
            return;
        }
        let outcome = self.timeline.render_inbound(message, &self.config.avatars);
        if outcome.is_rendered() {
            self.agent_typing = false;
            self.unread.record(self.window_open);
        }
    }

    fn send_completed(
        &mut self,
        ticket: Ticket,
        result: Result<(), TransportError>,
    ) -> Vec<Command> {
        let Some(pending) = self.pending.remove(&ticket) else {
            tracing::debug!(ticket, "late send completion ignored");
            return Vec::new();
        };
        if let Err(e) = &result {
            tracing::warn!(ticket, error = %e, "send failed");
        }
        match pending {
            Pending::Text => {
                if result.is_err() {
                    self.timeline.push_notice(SEND_FAILED_NOTICE);
                }
            }
            Pending::Control { group, echo } => {
                let user_name = self.user_name().to_string();
                self.timeline.finish_activation(
                    group,
                    &echo,
                    result.is_ok(),
                    &user_name,
                    &self.config.avatars,
                );
            }
            Pending::Upload { name } => {
                tracing::debug!(ticket, file = %name, "send completion matched an upload ticket");
            }
        }
        Vec::new()
    }

    fn upload_completed(
        &mut self,
        ticket: Ticket,
        result: Result<(), TransportError>,
    ) -> Vec<Command> {
        let Some(Pending::Upload { name }) = self.pending.remove(&ticket) else {
            tracing::debug!(ticket, "late upload completion ignored");
            return Vec::new();
        };
        match result {
            Ok(()) => {
                let user_name = self.user_name().to_string();
                self.timeline
                    .push_user(format!("📎 {name}"), &user_name, &self.config.avatars);
                Vec::new()
            }
            Err(TransportError::UploadTooLarge { limit, .. }) => {
                vec![Command::Alert(format!(
                    "File too large (max {}MB)",
                    limit / 1_000_000
                ))]
            }
            Err(e) => {
                tracing::warn!(ticket, file = %name, error = %e, "upload failed");
                let reason = match e {
                    TransportError::UploadFailed(reason) => reason,
                    other => other.to_string(),
                };
                vec![Command::Alert(format!("Upload failed: {reason}"))]
            }
        }
    }
}
