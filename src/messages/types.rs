use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    System,
}

impl Role {
    /// Map a transport role marker. Omnichannel reports roles either as names
    /// ("user", "System") or as numeric codes (0 = system, 1 = user); anything
    /// else is treated as an agent.
    pub fn from_wire(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(name)) if name.eq_ignore_ascii_case("user") => Self::User,
            Some(Value::String(name)) if name.eq_ignore_ascii_case("system") => Self::System,
            Some(Value::Number(code)) if code.as_i64() == Some(1) => Self::User,
            Some(Value::Number(code)) if code.as_i64() == Some(0) => Self::System,
            _ => Self::Agent,
        }
    }
}

/// A message delivered by the transport, either pushed or polled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: Option<String>,
    pub role: Role,
    pub sender_name: Option<String>,
    /// Raw payload: plain text or a JSON card document.
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            sender_name: None,
            content: content.into(),
            received_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender_name = Some(sender.into());
        self
    }

    /// Normalize a chat SDK message object.
    ///
    /// Ids come from `messageId`, `id` or `clientmessageid`; content from
    /// `content`, `text` or `body`; the role from `role` or `senderRole`; the
    /// sender from `senderDisplayName` or `sender.displayName`. Returns `None`
    /// when the value is not an object.
    pub fn from_sdk_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let first_str = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| obj.get(*key))
                .find_map(|v| match v {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
        };

        let id = first_str(&["messageId", "id", "clientmessageid"]);
        let content = first_str(&["content", "text", "body"]).unwrap_or_default();
        let role = Role::from_wire(obj.get("role").or_else(|| obj.get("senderRole")));
        let sender_name = first_str(&["senderDisplayName"]).or_else(|| {
            obj.get("sender")
                .and_then(|s| s.get("displayName"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        Some(Self {
            id,
            role,
            sender_name,
            content,
            received_at: Utc::now(),
        })
    }
}

/// Metadata key the bot service uses to recognise adaptive card submissions.
pub const ADAPTIVE_CARD_METADATA_KEY: &str = "microsoft.azure.communication.chat.bot.contenttype";
pub const ADAPTIVE_CARD_METADATA_VALUE: &str = "azurebotservice.adaptivecard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn adaptive_card_submit(data: &Value) -> Self {
        let content = serde_json::json!({ "value": data }).to_string();
        let metadata = BTreeMap::from([(
            ADAPTIVE_CARD_METADATA_KEY.to_string(),
            ADAPTIVE_CARD_METADATA_VALUE.to_string(),
        )]);
        Self { content, metadata }
    }
}

/// A file picked by the user for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Caller-supplied type, else sniffed from the bytes, else octet-stream.
    pub fn effective_mime_type(&self) -> String {
        self.mime_type
            .clone()
            .or_else(|| infer::get(&self.data).map(|kind| kind.mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    /// `data:<mime>;base64,<payload>`, the shape the chat SDK expects.
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{encoded}", self.effective_mime_type())
    }
}
