//! Typed decoding of card payloads.
//!
//! [`super::classify`] only decides the kind; this module turns the raw JSON of
//! a classified message into renderable structures. Any shape problem comes
//! back as a [`RenderError`] so the renderer can fall back to plain text.

use super::classifier::{ADAPTIVE_CARD_CONTENT_TYPE, MessageKind, is_hero_attachment};
use super::types::OutboundMessage;
use crate::error::RenderError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// What an interactive control does when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    /// Send `value` as a plain message; echo `echo` as the user's bubble.
    PostText { value: String, echo: String },
    /// Adaptive card submit: `data` merged with the card's input values is
    /// wrapped as `{"value": …}`.
    AdaptiveSubmit { data: Value, echo: String },
    /// Open a link in a new browsing context, bypassing the transport.
    OpenUrl(String),
}

impl CardAction {
    /// Build the outbound payload for a submit-style action. `inputs` are the
    /// values the user typed into the card's input fields.
    pub fn outbound(&self, inputs: &BTreeMap<String, String>) -> Option<(OutboundMessage, String)> {
        match self {
            Self::PostText { value, echo } => Some((OutboundMessage::text(value), echo.clone())),
            Self::AdaptiveSubmit { data, echo } => {
                let merged = merge_inputs(data, inputs);
                Some((OutboundMessage::adaptive_card_submit(&merged), echo.clone()))
            }
            Self::OpenUrl(_) => None,
        }
    }
}

fn merge_inputs(data: &Value, inputs: &BTreeMap<String, String>) -> Value {
    if inputs.is_empty() {
        return data.clone();
    }
    let mut merged = match data {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => return other.clone(),
    };
    for (key, value) in inputs {
        merged.insert(key.clone(), Value::String(value.clone()));
    }
    Value::Object(merged)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardButton {
    pub label: String,
    pub action: CardAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardElement {
    Text(String),
    Image { url: String, alt: Option<String> },
    Fact { title: String, value: String },
    Input { id: String, label: Option<String>, placeholder: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveCardView {
    pub body: Vec<CardElement>,
    pub actions: Vec<CardButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroCardView {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub buttons: Vec<CardButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedActionsView {
    pub text: Option<String>,
    pub actions: Vec<CardButton>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedCard {
    Adaptive(AdaptiveCardView),
    Hero {
        cards: Vec<HeroCardView>,
        carousel: bool,
        /// Text sent alongside the attachments.
        text: Option<String>,
    },
    Suggested(SuggestedActionsView),
}

/// Decode the payload of a message already classified as a card kind.
pub fn decode(kind: MessageKind, raw: &str) -> Result<DecodedCard, RenderError> {
    let doc: Value =
        serde_json::from_str(raw).map_err(|e| RenderError::InvalidJson(e.to_string()))?;
    match kind {
        MessageKind::AdaptiveCard => decode_adaptive(&doc).map(DecodedCard::Adaptive),
        MessageKind::HeroCard { carousel } => decode_hero(&doc, carousel),
        MessageKind::SuggestedActions => decode_suggested(&doc).map(DecodedCard::Suggested),
        MessageKind::PlainText | MessageKind::System => Err(RenderError::malformed(
            "card",
            format!("{kind} messages carry no card"),
        )),
    }
}

// ── Adaptive cards ───────────────────────────────────────────────

fn decode_adaptive(doc: &Value) -> Result<AdaptiveCardView, RenderError> {
    let card = if doc.get("type").and_then(Value::as_str) == Some("AdaptiveCard") {
        doc
    } else {
        doc.get("attachments")
            .and_then(Value::as_array)
            .and_then(|atts| {
                atts.iter().find(|a| {
                    a.get("contentType").and_then(Value::as_str) == Some(ADAPTIVE_CARD_CONTENT_TYPE)
                        && a.get("content").is_some_and(|c| !c.is_null())
                })
            })
            .and_then(|a| a.get("content"))
            .ok_or_else(|| RenderError::malformed("adaptive card", "no card content"))?
    };

    let mut view = AdaptiveCardView {
        body: Vec::new(),
        actions: Vec::new(),
    };
    if let Some(body) = card.get("body").and_then(Value::as_array) {
        walk_elements(body, &mut view);
    }
    if let Some(actions) = card.get("actions").and_then(Value::as_array) {
        collect_adaptive_actions(actions, &mut view.actions);
    }

    if view.body.is_empty() && view.actions.is_empty() {
        return Err(RenderError::malformed("adaptive card", "card has nothing to show"));
    }
    Ok(view)
}

fn walk_elements(elements: &[Value], view: &mut AdaptiveCardView) {
    for element in elements {
        let kind = element.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "TextBlock" => {
                if let Some(text) = str_field(element, "text") {
                    view.body.push(CardElement::Text(text));
                }
            }
            "RichTextBlock" => {
                let text: String = element
                    .get("inlines")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|inline| match inline {
                        Value::String(s) => Some(s.clone()),
                        other => str_field(other, "text"),
                    })
                    .collect();
                if !text.is_empty() {
                    view.body.push(CardElement::Text(text));
                }
            }
            "Image" => {
                if let Some(url) = str_field(element, "url") {
                    view.body.push(CardElement::Image {
                        url,
                        alt: str_field(element, "altText"),
                    });
                }
            }
            "FactSet" => {
                for fact in element
                    .get("facts")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    view.body.push(CardElement::Fact {
                        title: str_field(fact, "title").unwrap_or_default(),
                        value: str_field(fact, "value").unwrap_or_default(),
                    });
                }
            }
            "Container" | "Column" => {
                if let Some(items) = element.get("items").and_then(Value::as_array) {
                    walk_elements(items, view);
                }
            }
            "ColumnSet" => {
                for column in element
                    .get("columns")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    if let Some(items) = column.get("items").and_then(Value::as_array) {
                        walk_elements(items, view);
                    }
                }
            }
            "ActionSet" => {
                if let Some(actions) = element.get("actions").and_then(Value::as_array) {
                    collect_adaptive_actions(actions, &mut view.actions);
                }
            }
            input if input.starts_with("Input.") => {
                if let Some(id) = str_field(element, "id") {
                    view.body.push(CardElement::Input {
                        id,
                        label: str_field(element, "label"),
                        placeholder: str_field(element, "placeholder"),
                    });
                }
            }
            other => tracing::trace!(element = other, "skipping unsupported card element"),
        }
    }
}

fn collect_adaptive_actions(actions: &[Value], out: &mut Vec<CardButton>) {
    for action in actions {
        let kind = action.get("type").and_then(Value::as_str).unwrap_or_default();
        let title = str_field(action, "title");
        match kind {
            "Action.OpenUrl" => {
                if let Some(url) = str_field(action, "url") {
                    out.push(CardButton {
                        label: title.unwrap_or_else(|| url.clone()),
                        action: CardAction::OpenUrl(url),
                    });
                }
            }
            "Action.Submit" | "Action.Execute" => {
                let data = action.get("data").cloned().unwrap_or(Value::Null);
                let echo = data
                    .get("actionSubmitId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| title.clone())
                    .unwrap_or_else(|| "Submit".to_string());
                out.push(CardButton {
                    label: title.unwrap_or_else(|| "Submit".to_string()),
                    action: CardAction::AdaptiveSubmit { data, echo },
                });
            }
            other => tracing::debug!(action = other, "skipping unsupported card action"),
        }
    }
}

// ── Hero / thumbnail cards ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct HeroContent {
    title: Option<String>,
    subtitle: Option<String>,
    text: Option<String>,
    #[serde(default)]
    images: Vec<ImageRef>,
    #[serde(default)]
    buttons: Vec<ActionRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: Option<String>,
}

/// Bot Framework `CardAction`, shared by hero buttons and suggested actions.
#[derive(Debug, Deserialize)]
struct ActionRef {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    text: Option<String>,
    value: Option<Value>,
}

impl ActionRef {
    fn value_text(&self) -> Option<String> {
        match &self.value {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(Value::String(_)) => None,
            Some(other) => Some(other.to_string()),
        }
    }

    fn open_url(&self) -> Option<String> {
        (self.kind.as_deref() == Some("openUrl"))
            .then(|| self.value_text())
            .flatten()
    }
}

fn decode_hero(doc: &Value, carousel: bool) -> Result<DecodedCard, RenderError> {
    let contents: Vec<&Value> = if doc.get("contentType").and_then(Value::as_str)
        == Some(super::classifier::HERO_CARD_CONTENT_TYPE)
    {
        doc.get("content").into_iter().collect()
    } else {
        doc.get("attachments")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|a| is_hero_attachment(a))
            .filter_map(|a| a.get("content"))
            .filter(|c| !c.is_null())
            .collect()
    };

    if contents.is_empty() {
        return Err(RenderError::malformed("hero card", "no hero cards found"));
    }

    let cards = contents
        .into_iter()
        .map(|content| {
            serde_json::from_value::<HeroContent>(content.clone())
                .map(hero_view)
                .map_err(|e| RenderError::malformed("hero card", e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedCard::Hero {
        cards,
        carousel,
        text: str_field(doc, "text").filter(|t| !t.trim().is_empty()),
    })
}

fn hero_view(content: HeroContent) -> HeroCardView {
    let buttons = content
        .buttons
        .iter()
        .map(|btn| {
            let label = btn
                .title
                .clone()
                .or_else(|| btn.text.clone())
                .unwrap_or_else(|| "Click".to_string());
            let action = match btn.open_url() {
                Some(url) => CardAction::OpenUrl(url),
                None => {
                    let value = btn
                        .value_text()
                        .or_else(|| btn.title.clone())
                        .unwrap_or_else(|| label.clone());
                    let echo = btn.title.clone().unwrap_or_else(|| value.clone());
                    CardAction::PostText { value, echo }
                }
            };
            CardButton { label, action }
        })
        .collect();

    HeroCardView {
        title: content.title,
        subtitle: content.subtitle,
        text: content.text,
        image_url: content.images.into_iter().find_map(|img| img.url),
        buttons,
    }
}

// ── Suggested actions ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestedActionsDoc {
    text: Option<String>,
    suggested_actions: SuggestedActionsBlock,
}

#[derive(Debug, Deserialize)]
struct SuggestedActionsBlock {
    actions: Vec<ActionRef>,
}

fn decode_suggested(doc: &Value) -> Result<SuggestedActionsView, RenderError> {
    let parsed: SuggestedActionsDoc = serde_json::from_value(doc.clone())
        .map_err(|e| RenderError::malformed("suggested actions", e.to_string()))?;

    let actions: Vec<CardButton> = parsed
        .suggested_actions
        .actions
        .iter()
        .filter_map(|a| {
            let label = a
                .title
                .clone()
                .or_else(|| a.text.clone())
                .or_else(|| a.value_text())?;
            let action = match a.open_url() {
                Some(url) => CardAction::OpenUrl(url),
                None => {
                    let value = a.value_text().or_else(|| a.title.clone())?;
                    CardAction::PostText {
                        value,
                        echo: label.clone(),
                    }
                }
            };
            Some(CardButton { label, action })
        })
        .collect();

    if actions.is_empty() {
        return Err(RenderError::malformed(
            "suggested actions",
            "no usable actions",
        ));
    }

    Ok(SuggestedActionsView {
        text: parsed.text.filter(|t| !t.is_empty()),
        actions,
    })
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
