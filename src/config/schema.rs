use serde::{Deserialize, Serialize};
use std::time::Duration;

// ── Caller-supplied (partial) config ─────────────────────────────

/// Configuration as supplied by the embedding page or a config file.
///
/// Every field is optional; [`super::resolve`] fills in defaults and rejects
/// configs without connection details. Field names follow the camelCase keys
/// of the embed loader's `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawWidgetConfig {
    pub org_id: Option<String>,
    pub org_url: Option<String>,
    pub widget_id: Option<String>,

    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
    pub header_logo: Option<String>,
    pub font_family: Option<String>,
    pub use_gradient: Option<bool>,
    pub gradient_start: Option<String>,
    pub gradient_end: Option<String>,
    pub primary_color: Option<String>,
    pub user_bubble_color: Option<String>,
    pub user_text_color: Option<String>,
    pub agent_bubble_color: Option<String>,
    pub agent_text_color: Option<String>,
    pub chat_bg_color: Option<String>,
    pub badge_color: Option<String>,
    pub launcher_icon: Option<String>,

    pub customer_avatar: Option<String>,
    pub agent_avatar: Option<String>,
    pub bot_avatar: Option<String>,

    pub enable_prechat_form: Option<bool>,
    pub welcome_title: Option<String>,
    pub welcome_message: Option<String>,
    pub name_field_label: Option<String>,
    pub email_field_label: Option<String>,
    pub start_btn_text: Option<String>,

    pub poll_interval_ms: Option<u64>,
    pub typing_timeout_ms: Option<u64>,
    pub max_upload_bytes: Option<usize>,
}

impl RawWidgetConfig {
    /// Overlay `other` on top of `self`: fields set in `other` win.
    #[must_use]
    pub fn merged_with(self, other: RawWidgetConfig) -> Self {
        let (base, overlay) = (self, other);
        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                Self { $($field: overlay.$field.or(base.$field),)* }
            };
        }
        pick!(
            org_id,
            org_url,
            widget_id,
            header_title,
            header_subtitle,
            header_logo,
            font_family,
            use_gradient,
            gradient_start,
            gradient_end,
            primary_color,
            user_bubble_color,
            user_text_color,
            agent_bubble_color,
            agent_text_color,
            chat_bg_color,
            badge_color,
            launcher_icon,
            customer_avatar,
            agent_avatar,
            bot_avatar,
            enable_prechat_form,
            welcome_title,
            welcome_message,
            name_field_label,
            email_field_label,
            start_btn_text,
            poll_interval_ms,
            typing_timeout_ms,
            max_upload_bytes,
        )
    }
}

// ── Resolved config ──────────────────────────────────────────────

/// Omnichannel connection details. All three are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSettings {
    pub org_id: String,
    pub org_url: String,
    pub widget_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    /// Font key: "system", "inter", "roboto", "poppins" or "open-sans"
    pub font_family: String,
    pub use_gradient: bool,
    pub gradient_start: String,
    pub gradient_end: String,
    pub primary_color: String,
    pub user_bubble_color: String,
    pub user_text_color: String,
    pub agent_bubble_color: String,
    pub agent_text_color: String,
    pub chat_bg_color: String,
    pub badge_color: String,
    /// Launcher icon key: "chat_multiple" or "chat"
    pub launcher_icon: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            font_family: "system".into(),
            use_gradient: true,
            gradient_start: "#667eea".into(),
            gradient_end: "#764ba2".into(),
            primary_color: "#667eea".into(),
            user_bubble_color: "#667eea".into(),
            user_text_color: "#ffffff".into(),
            agent_bubble_color: "#ffffff".into(),
            agent_text_color: "#2d3748".into(),
            chat_bg_color: "#f8fafc".into(),
            badge_color: "#ff4757".into(),
            launcher_icon: "chat_multiple".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarConfig {
    pub customer_avatar: Option<String>,
    pub agent_avatar: Option<String>,
    pub bot_avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrechatConfig {
    pub enabled: bool,
    pub welcome_title: String,
    pub welcome_message: String,
    pub name_field_label: String,
    pub email_field_label: String,
    pub start_btn_text: String,
}

impl Default for PrechatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            welcome_title: "Welcome!".into(),
            welcome_message: "Please fill in your details to start chatting.".into(),
            name_field_label: "Name *".into(),
            email_field_label: "Email *".into(),
            start_btn_text: "Start Chat".into(),
        }
    }
}

/// Timers and size limits of the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetLimits {
    pub poll_interval: Duration,
    pub typing_timeout: Duration,
    pub max_upload_bytes: usize,
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25_000_000;

impl Default for WidgetLimits {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Fully resolved, immutable widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub connection: ConnectionSettings,
    pub header_title: String,
    pub header_subtitle: String,
    pub header_logo: Option<String>,
    pub theme: ThemeConfig,
    pub avatars: AvatarConfig,
    pub prechat: PrechatConfig,
    pub limits: WidgetLimits,
}

impl WidgetConfig {
    pub fn prechat_enabled(&self) -> bool {
        self.prechat.enabled
    }
}

pub(crate) const DEFAULT_HEADER_TITLE: &str = "Support Chat";
pub(crate) const DEFAULT_HEADER_SUBTITLE: &str = "We're here to help";
