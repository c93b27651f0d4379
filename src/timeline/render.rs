use super::entry::{EntryBody, EntryId, GroupRef, TimelineEntry};
use crate::config::AvatarConfig;
use crate::messages::avatar::{self, DEFAULT_AGENT_NAME};
use crate::messages::cards::{self, CardAction, DecodedCard};
use crate::messages::{InboundMessage, MessageKind, OutboundMessage, Role, classify};
use std::collections::{BTreeMap, HashSet};

const SYSTEM_SENDER: &str = "System";

/// Why an inbound message produced no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    Duplicate,
    UserEcho,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { entry: EntryId, kind: MessageKind },
    Skipped(SkipReason),
}

impl RenderOutcome {
    pub fn is_rendered(self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

/// Result of activating an interactive control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The group is now disabled; send `message` and report back through
    /// [`Timeline::finish_activation`].
    Send {
        group: GroupRef,
        message: OutboundMessage,
        echo: String,
    },
    OpenUrl(String),
}

/// The rendered conversation plus the ids already seen in this session.
#[derive(Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    processed: HashSet<String>,
    next_id: EntryId,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&TimelineEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_processed(&self, message_id: &str) -> bool {
        self.processed.contains(message_id)
    }

    /// Drop every entry and forget all processed ids.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.processed.clear();
    }

    /// Render one inbound message. Idempotent per message id.
    pub fn render_inbound(
        &mut self,
        message: InboundMessage,
        avatars: &AvatarConfig,
    ) -> RenderOutcome {
        if let Some(id) = message.id.as_deref()
            && !id.is_empty()
        {
            if self.processed.contains(id) {
                tracing::debug!(message_id = id, "duplicate message skipped");
                return RenderOutcome::Skipped(SkipReason::Duplicate);
            }
            self.processed.insert(id.to_string());
        }

        if message.role == Role::User {
            return RenderOutcome::Skipped(SkipReason::UserEcho);
        }
        if message.content.trim().is_empty() {
            return RenderOutcome::Skipped(SkipReason::Empty);
        }

        let kind = classify(message.role, &message.content);
        let sender = message
            .sender_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                if message.role == Role::System {
                    SYSTEM_SENDER.to_string()
                } else {
                    DEFAULT_AGENT_NAME.to_string()
                }
            });

        let body = match kind {
            MessageKind::System => EntryBody::Notice(message.content.clone()),
            MessageKind::PlainText => EntryBody::Text(message.content.clone()),
            card_kind => match cards::decode(card_kind, &message.content) {
                Ok(card) => EntryBody::Card(card),
                Err(e) => {
                    tracing::warn!(
                        kind = %card_kind,
                        error = %e,
                        "card payload could not be decoded, rendering as text"
                    );
                    EntryBody::Text(message.content.clone())
                }
            },
        };

        let trailing_text = match &body {
            EntryBody::Card(DecodedCard::Hero { text, .. }) => {
                text.clone().filter(|t| !t.trim().is_empty())
            }
            _ => None,
        };

        let agent_avatar =
            (message.role == Role::Agent).then(|| avatar::agent_avatar(&sender, avatars));
        let entry_id = self.push(message.role, sender.clone(), body, |entry| {
            entry.avatar = agent_avatar.clone();
            entry.message_id = message.id.clone();
        });
        let rendered_kind = self.entries.last().map_or(kind, |e| e.kind);

        if let Some(text) = trailing_text {
            self.push(Role::Agent, sender, EntryBody::Text(text), |entry| {
                entry.avatar = agent_avatar;
            });
        }

        tracing::debug!(entry = entry_id, kind = %rendered_kind, "message rendered");
        RenderOutcome::Rendered {
            entry: entry_id,
            kind: rendered_kind,
        }
    }

    /// Append the user's own bubble.
    pub fn push_user(
        &mut self,
        text: impl Into<String>,
        user_name: &str,
        avatars: &AvatarConfig,
    ) -> EntryId {
        let user_avatar = avatar::user_avatar(user_name, avatars);
        self.push(Role::User, user_name.to_string(), EntryBody::Text(text.into()), |entry| {
            entry.avatar = Some(user_avatar);
        })
    }

    /// Append a locally generated status notice.
    pub fn push_notice(&mut self, text: impl Into<String>) -> EntryId {
        self.push(
            Role::System,
            SYSTEM_SENDER.to_string(),
            EntryBody::Notice(text.into()),
            |_| {},
        )
    }

    /// Activate control `index` of `entry`. Submit-style actions disable their
    /// whole group first; returns `None` when the control does not exist or its
    /// group is already disabled.
    pub fn activate(
        &mut self,
        entry: EntryId,
        index: usize,
        inputs: &BTreeMap<String, String>,
    ) -> Option<Activation> {
        let target = self.entries.iter_mut().find(|e| e.id == entry)?;
        let (group, control) = target.control(index)?;
        let action = control.action.clone();

        if let CardAction::OpenUrl(url) = &action {
            return Some(Activation::OpenUrl(url.clone()));
        }

        let group_ref = GroupRef { entry, group };
        let controls = target.groups.get_mut(group)?;
        if !controls.enabled {
            tracing::debug!(entry, group, "control group already disabled");
            return None;
        }
        let (message, echo) = action.outbound(inputs)?;
        controls.enabled = false;
        Some(Activation::Send {
            group: group_ref,
            message,
            echo,
        })
    }

    /// Apply the transport result of an earlier [`Activation::Send`]. Success
    /// echoes the label as a user entry; failure re-enables the group. Groups
    /// that no longer exist (timeline cleared) are ignored.
    pub fn finish_activation(
        &mut self,
        group: GroupRef,
        echo: &str,
        succeeded: bool,
        user_name: &str,
        avatars: &AvatarConfig,
    ) -> Option<EntryId> {
        let controls = self
            .entries
            .iter_mut()
            .find(|e| e.id == group.entry)
            .and_then(|e| e.groups.get_mut(group.group))?;

        if succeeded {
            Some(self.push_user(echo, user_name, avatars))
        } else {
            controls.enabled = true;
            None
        }
    }

    fn push(
        &mut self,
        role: Role,
        sender: String,
        body: EntryBody,
        decorate: impl FnOnce(&mut TimelineEntry),
    ) -> EntryId {
        self.next_id += 1;
        let mut entry = TimelineEntry::new(self.next_id, role, sender, body);
        decorate(&mut entry);
        self.entries.push(entry);
        self.next_id
    }
}
