use crate::error::TransportError;
use crate::messages::{FileAttachment, OutboundMessage};
use crate::timeline::EntryId;
use crate::transport::{StartChatOptions, TransportEvent};
use std::collections::BTreeMap;
use std::time::Duration;

/// Correlates an outbound operation with its completion.
pub type Ticket = u64;

/// Everything the controller reacts to: user input from the host surface,
/// transport pushes, and completions of operations it asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// Launcher clicked.
    ToggleWindow,
    Minimize,
    /// Close button; asks for confirmation while a chat is running.
    CloseRequested,
    ConfirmEnd,
    CancelEnd,
    SubmitPrechat {
        name: String,
        email: String,
        question: String,
    },
    SubmitText(String),
    ActivateControl {
        entry: EntryId,
        control: usize,
        /// Values typed into the card's input fields, keyed by input id.
        inputs: BTreeMap<String, String>,
    },
    AttachFile(FileAttachment),
    StartNewChat,

    SessionStarted {
        session: u64,
    },
    SessionStartFailed {
        session: u64,
        error: TransportError,
    },
    Transport(TransportEvent),
    SendCompleted {
        ticket: Ticket,
        result: Result<(), TransportError>,
    },
    UploadCompleted {
        ticket: Ticket,
        result: Result<(), TransportError>,
    },
    TypingExpired {
        token: u64,
    },
}

/// Side effects requested by the controller, executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartSession {
        session: u64,
        options: StartChatOptions,
    },
    Send {
        ticket: Ticket,
        message: OutboundMessage,
    },
    Upload {
        ticket: Ticket,
        file: FileAttachment,
    },
    EndSession,
    OpenUrl(String),
    StartPolling,
    StopPolling,
    /// Fire [`WidgetEvent::TypingExpired`] with `token` after `after`.
    ArmTypingTimeout {
        token: u64,
        after: Duration,
    },
    /// Blocking user-facing message, e.g. a failed connection.
    Alert(String),
}
