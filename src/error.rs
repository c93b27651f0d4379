use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the widget.
///
/// Each subsystem defines its own error variant. Host code can match on these
/// to decide what to surface; transport implementations keep using
/// `anyhow::Result` and are converted at the adapter boundary.
#[derive(Debug, Error)]
pub enum WidgetError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Transport ────────────────────────────────────────────────────────
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    // ── Session / view state ─────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Rendering ────────────────────────────────────────────────────────
    #[error("render: {0}")]
    Render(#[from] RenderError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required connection fields: {}", .missing.join(", "))]
    MissingConnectionFields { missing: Vec<&'static str> },

    #[error("orgUrl is not an absolute http(s) URL: {0}")]
    InvalidOrgUrl(String),

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Transport errors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("chat transport unavailable: {0}")]
    SdkUnavailable(String),

    #[error("failed to start chat: {0}")]
    StartFailed(String),

    #[error("failed to send message: {0}")]
    SendFailed(String),

    #[error("file too large ({size} bytes, max {limit})")]
    UploadTooLarge { size: usize, limit: usize },

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("failed to fetch messages: {0}")]
    PollFailed(String),

    #[error("no active chat session")]
    NotConnected,
}

// ─── Session errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a widget is already mounted on this host")]
    AlreadyMounted,

    #[error("invalid view transition {from} -> {to}")]
    InvalidTransition {
        from: crate::session::ViewState,
        to: crate::session::ViewState,
    },
}

// ─── Render errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("malformed {kind} payload: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

impl RenderError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}
