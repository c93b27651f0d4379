use crate::config::AvatarConfig;
use serde::{Deserialize, Serialize};

const BOT_MARKERS: &[&str] = &["bot", "copilot", "virtual", "assistant"];

pub const DEFAULT_AGENT_NAME: &str = "Agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AvatarStyle {
    User,
    Agent,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub style: AvatarStyle,
    pub image_url: Option<String>,
    pub initials: String,
}

/// Whether a sender name looks like an automated agent.
pub fn is_bot_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    BOT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// First letters of the first and last word, or the first two characters of a
/// single word, uppercased. `?` for blank names.
pub fn initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => "?".to_string(),
        [single] => single.chars().take(2).collect::<String>().to_uppercase(),
        [first, .., last] => first
            .chars()
            .take(1)
            .chain(last.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
    }
}

pub fn agent_avatar(sender_name: &str, avatars: &AvatarConfig) -> Avatar {
    let bot = is_bot_name(sender_name);
    let image_url = if bot {
        avatars.bot_avatar.clone().or_else(|| avatars.agent_avatar.clone())
    } else {
        avatars.agent_avatar.clone()
    };
    Avatar {
        style: if bot { AvatarStyle::Bot } else { AvatarStyle::Agent },
        image_url,
        initials: initials(sender_name),
    }
}

pub fn user_avatar(user_name: &str, avatars: &AvatarConfig) -> Avatar {
    Avatar {
        style: AvatarStyle::User,
        image_url: avatars.customer_avatar.clone(),
        initials: initials(user_name),
    }
}
