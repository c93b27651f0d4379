use super::types::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
pub const HERO_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.hero";
pub const THUMBNAIL_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.thumbnail";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    PlainText,
    AdaptiveCard,
    HeroCard { carousel: bool },
    SuggestedActions,
    System,
}

/// Classify a raw payload. Total: every input maps to exactly one kind, with
/// `PlainText` as the fallback.
///
/// Checked in order, first match wins: system role, non-JSON, adaptive card,
/// hero/thumbnail card, suggested actions, plain text.
pub fn classify(role: Role, raw: &str) -> MessageKind {
    if role == Role::System {
        return MessageKind::System;
    }

    let Ok(Value::Object(doc)) = serde_json::from_str::<Value>(raw) else {
        return MessageKind::PlainText;
    };

    let attachments = doc
        .get("attachments")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let is_adaptive = doc.get("type").and_then(Value::as_str) == Some("AdaptiveCard")
        || attachments
            .iter()
            .any(|a| content_type(a) == Some(ADAPTIVE_CARD_CONTENT_TYPE));
    if is_adaptive {
        return MessageKind::AdaptiveCard;
    }

    if doc.get("contentType").and_then(Value::as_str) == Some(HERO_CARD_CONTENT_TYPE) {
        return MessageKind::HeroCard { carousel: false };
    }

    let hero_count = attachments.iter().filter(|a| is_hero_attachment(a)).count();
    if hero_count > 0 {
        let carousel_layout =
            doc.get("attachmentLayout").and_then(Value::as_str) == Some("carousel");
        return MessageKind::HeroCard {
            carousel: hero_count > 1 || carousel_layout,
        };
    }

    let has_suggestions = doc
        .get("suggestedActions")
        .and_then(|s| s.get("actions"))
        .and_then(Value::as_array)
        .is_some_and(|actions| !actions.is_empty());
    if has_suggestions {
        return MessageKind::SuggestedActions;
    }

    MessageKind::PlainText
}

fn content_type(value: &Value) -> Option<&str> {
    value.get("contentType").and_then(Value::as_str)
}

pub(crate) fn is_hero_attachment(value: &Value) -> bool {
    matches!(
        content_type(value),
        Some(HERO_CARD_CONTENT_TYPE | THUMBNAIL_CARD_CONTENT_TYPE)
    )
}
