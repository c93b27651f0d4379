use super::schema::{
    AvatarConfig, ConnectionSettings, DEFAULT_HEADER_SUBTITLE, DEFAULT_HEADER_TITLE,
    PrechatConfig, RawWidgetConfig, ThemeConfig, WidgetConfig, WidgetLimits,
};
use crate::error::ConfigError;
use std::time::Duration;

const FONT_FAMILIES: &[&str] = &["system", "inter", "roboto", "poppins", "open-sans"];
const LAUNCHER_ICONS: &[&str] = &["chat_multiple", "chat"];

/// Merge defaults into a caller-supplied config and validate the connection fields.
///
/// Pure and deterministic. Connection fields are never defaulted: every one
/// that is missing or blank after trimming is reported in
/// [`ConfigError::MissingConnectionFields`].
pub fn resolve(raw: RawWidgetConfig) -> Result<WidgetConfig, ConfigError> {
    let org_id = required(raw.org_id);
    let org_url = required(raw.org_url);
    let widget_id = required(raw.widget_id);

    let missing: Vec<&'static str> = [
        ("orgId", org_id.is_none()),
        ("orgUrl", org_url.is_none()),
        ("widgetId", widget_id.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(org_id), Some(org_url), Some(widget_id)) = (org_id, org_url, widget_id) else {
        return Err(ConfigError::MissingConnectionFields { missing });
    };

    validate_org_url(&org_url)?;

    let theme_defaults = ThemeConfig::default();
    let theme = ThemeConfig {
        font_family: known_or_default(raw.font_family, FONT_FAMILIES, theme_defaults.font_family),
        use_gradient: raw.use_gradient.unwrap_or(theme_defaults.use_gradient),
        gradient_start: raw.gradient_start.unwrap_or(theme_defaults.gradient_start),
        gradient_end: raw.gradient_end.unwrap_or(theme_defaults.gradient_end),
        primary_color: raw.primary_color.unwrap_or(theme_defaults.primary_color),
        user_bubble_color: raw
            .user_bubble_color
            .unwrap_or(theme_defaults.user_bubble_color),
        user_text_color: raw.user_text_color.unwrap_or(theme_defaults.user_text_color),
        agent_bubble_color: raw
            .agent_bubble_color
            .unwrap_or(theme_defaults.agent_bubble_color),
        agent_text_color: raw
            .agent_text_color
            .unwrap_or(theme_defaults.agent_text_color),
        chat_bg_color: raw.chat_bg_color.unwrap_or(theme_defaults.chat_bg_color),
        badge_color: raw.badge_color.unwrap_or(theme_defaults.badge_color),
        launcher_icon: known_or_default(
            raw.launcher_icon,
            LAUNCHER_ICONS,
            theme_defaults.launcher_icon,
        ),
    };

    let prechat_defaults = PrechatConfig::default();
    let prechat = PrechatConfig {
        enabled: raw.enable_prechat_form.unwrap_or(prechat_defaults.enabled),
        welcome_title: raw.welcome_title.unwrap_or(prechat_defaults.welcome_title),
        welcome_message: raw
            .welcome_message
            .unwrap_or(prechat_defaults.welcome_message),
        name_field_label: raw
            .name_field_label
            .unwrap_or(prechat_defaults.name_field_label),
        email_field_label: raw
            .email_field_label
            .unwrap_or(prechat_defaults.email_field_label),
        start_btn_text: raw.start_btn_text.unwrap_or(prechat_defaults.start_btn_text),
    };

    let limit_defaults = WidgetLimits::default();
    let limits = WidgetLimits {
        poll_interval: positive_millis(raw.poll_interval_ms)
            .unwrap_or(limit_defaults.poll_interval),
        typing_timeout: positive_millis(raw.typing_timeout_ms)
            .unwrap_or(limit_defaults.typing_timeout),
        max_upload_bytes: raw
            .max_upload_bytes
            .filter(|bytes| *bytes > 0)
            .unwrap_or(limit_defaults.max_upload_bytes),
    };

    Ok(WidgetConfig {
        connection: ConnectionSettings {
            org_id,
            org_url,
            widget_id,
        },
        header_title: raw
            .header_title
            .unwrap_or_else(|| DEFAULT_HEADER_TITLE.to_string()),
        header_subtitle: raw
            .header_subtitle
            .unwrap_or_else(|| DEFAULT_HEADER_SUBTITLE.to_string()),
        header_logo: non_blank(raw.header_logo),
        theme,
        avatars: AvatarConfig {
            customer_avatar: non_blank(raw.customer_avatar),
            agent_avatar: non_blank(raw.agent_avatar),
            bot_avatar: non_blank(raw.bot_avatar),
        },
        prechat,
        limits,
    })
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn known_or_default(value: Option<String>, known: &[&str], default: String) -> String {
    match value {
        Some(v) if known.contains(&v.as_str()) => v,
        Some(v) => {
            tracing::debug!(value = %v, fallback = %default, "unknown config key, using default");
            default
        }
        None => default,
    }
}

fn positive_millis(value: Option<u64>) -> Option<Duration> {
    value.filter(|ms| *ms > 0).map(Duration::from_millis)
}

fn validate_org_url(org_url: &str) -> Result<(), ConfigError> {
    match url::Url::parse(org_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidOrgUrl(org_url.to_string())),
    }
}
