use crate::messages::cards::{AdaptiveCardView, CardAction, CardElement, DecodedCard};
use crate::messages::{Avatar, MessageKind, Role};
use chrono::{DateTime, Utc};

pub type EntryId = u64;

/// Addresses one group of controls inside a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupRef {
    pub entry: EntryId,
    pub group: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub action: CardAction,
}

/// Controls that are disabled and re-enabled together: the buttons of one
/// hero card, the suggested actions of one message, or the actions of one
/// adaptive card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlGroup {
    pub controls: Vec<Control>,
    pub enabled: bool,
}

impl ControlGroup {
    fn new(controls: Vec<Control>) -> Self {
        Self {
            controls,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    Text(String),
    Card(DecodedCard),
    /// Status line such as "Agent joined" or a local error notice.
    Notice(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub id: EntryId,
    pub role: Role,
    pub sender: String,
    pub avatar: Option<Avatar>,
    pub kind: MessageKind,
    pub body: EntryBody,
    pub groups: Vec<ControlGroup>,
    pub message_id: Option<String>,
    pub rendered_at: DateTime<Utc>,
}

impl TimelineEntry {
    pub(crate) fn new(id: EntryId, role: Role, sender: String, body: EntryBody) -> Self {
        let kind = match (&body, role) {
            (EntryBody::Notice(_), _) | (_, Role::System) => MessageKind::System,
            (EntryBody::Card(card), _) => card_kind(card),
            (EntryBody::Text(_), _) => MessageKind::PlainText,
        };
        let groups = match &body {
            EntryBody::Card(card) => control_groups(card),
            _ => Vec::new(),
        };
        Self {
            id,
            role,
            sender,
            avatar: None,
            kind,
            body,
            groups,
            message_id: None,
            rendered_at: Utc::now(),
        }
    }

    /// Plain text of the entry, as a terminal would print it.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            EntryBody::Text(text) | EntryBody::Notice(text) => Some(text),
            EntryBody::Card(_) => None,
        }
    }

    /// Look up a control by its position across all groups of the entry.
    pub fn control(&self, index: usize) -> Option<(usize, &Control)> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(group, g)| g.controls.iter().map(move |c| (group, c)))
            .nth(index)
    }

    /// Input fields the user can fill in before submitting an adaptive card.
    pub fn input_ids(&self) -> Vec<&str> {
        match &self.body {
            EntryBody::Card(DecodedCard::Adaptive(AdaptiveCardView { body, .. })) => body
                .iter()
                .filter_map(|element| match element {
                    CardElement::Input { id, .. } => Some(id.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn card_kind(card: &DecodedCard) -> MessageKind {
    match card {
        DecodedCard::Adaptive(_) => MessageKind::AdaptiveCard,
        DecodedCard::Hero { carousel, .. } => MessageKind::HeroCard {
            carousel: *carousel,
        },
        DecodedCard::Suggested(_) => MessageKind::SuggestedActions,
    }
}

fn control_groups(card: &DecodedCard) -> Vec<ControlGroup> {
    let to_controls = |buttons: &[crate::messages::CardButton]| -> Vec<Control> {
        buttons
            .iter()
            .map(|b| Control {
                label: b.label.clone(),
                action: b.action.clone(),
            })
            .collect()
    };

    match card {
        DecodedCard::Adaptive(view) => vec![ControlGroup::new(to_controls(&view.actions))],
        DecodedCard::Hero { cards, .. } => cards
            .iter()
            .map(|c| ControlGroup::new(to_controls(&c.buttons)))
            .collect(),
        DecodedCard::Suggested(view) => vec![ControlGroup::new(to_controls(&view.actions))],
    }
    .into_iter()
    .filter(|g| !g.controls.is_empty())
    .collect()
}
