//! Bot API wire types.
//!
//! Only the fields the forwarding workflow reads are modelled. Media payloads
//! are kept as raw JSON because only their presence matters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat identifier: a signed numeric id (`-100123…`) or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Create a chat id from user input, trimming whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` for `-?\d+` or `@username` forms.
    pub fn is_valid(&self) -> bool {
        let s = self.0.as_str();
        if let Some(name) = s.strip_prefix('@') {
            return !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        }
        let digits = s.strip_prefix('-').unwrap_or(s);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Response envelope shared by every Bot API method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra error information attached to failed calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TgUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// A chat (private, group, supergroup or channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TgChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Modern provenance metadata (`forward_origin`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOrigin {
    User {
        date: i64,
        sender_user: TgUser,
    },
    HiddenUser {
        date: i64,
        sender_user_name: String,
    },
    Chat {
        date: i64,
        sender_chat: TgChat,
        #[serde(default)]
        author_signature: Option<String>,
    },
    Channel {
        date: i64,
        chat: TgChat,
        #[serde(default)]
        message_id: Option<i64>,
        #[serde(default)]
        author_signature: Option<String>,
    },
    /// Origin kinds added to the Bot API after this client was written.
    #[serde(other)]
    Unknown,
}

impl MessageOrigin {
    pub fn date(&self) -> Option<i64> {
        match self {
            MessageOrigin::User { date, .. }
            | MessageOrigin::HiddenUser { date, .. }
            | MessageOrigin::Chat { date, .. }
            | MessageOrigin::Channel { date, .. } => Some(*date),
            MessageOrigin::Unknown => None,
        }
    }
}

/// A message as returned by `forwardMessage` / `sendMessage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TgMessage {
    pub message_id: i64,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub chat: Option<TgChat>,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub forward_origin: Option<MessageOrigin>,
    #[serde(default)]
    pub forward_from: Option<TgUser>,
    #[serde(default)]
    pub forward_from_chat: Option<TgChat>,
    #[serde(default)]
    pub forward_date: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Option<Value>,
    #[serde(default)]
    pub video: Option<Value>,
    #[serde(default)]
    pub document: Option<Value>,
    #[serde(default)]
    pub audio: Option<Value>,
    #[serde(default)]
    pub voice: Option<Value>,
    #[serde(default)]
    pub sticker: Option<Value>,
    #[serde(default)]
    pub animation: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_id_validation() {
        assert!(ChatId::new("-100111").is_valid());
        assert!(ChatId::new("  42 ").is_valid());
        assert!(ChatId::new("@my_channel").is_valid());
        assert!(!ChatId::new("").is_valid());
        assert!(!ChatId::new("-").is_valid());
        assert!(!ChatId::new("@").is_valid());
        assert!(!ChatId::new("12a").is_valid());
    }

    #[test]
    fn test_chat_id_serializes_as_plain_string() {
        let id = ChatId::from(-100222i64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"-100222\"");
    }

    #[test]
    fn test_forward_origin_channel_parses() {
        let json = r#"{
            "message_id": 9,
            "date": 1700000100,
            "chat": {"id": -100222, "type": "channel", "title": "Archive"},
            "forward_origin": {
                "type": "channel",
                "date": 1700000000,
                "chat": {"id": -100111, "type": "channel", "title": "News", "username": "news"},
                "message_id": 5
            },
            "text": "hello"
        }"#;
        let msg: TgMessage = serde_json::from_str(json).unwrap();
        match msg.forward_origin {
            Some(MessageOrigin::Channel { ref chat, date, .. }) => {
                assert_eq!(chat.id, -100111);
                assert_eq!(date, 1700000000);
            }
            other => panic!("unexpected origin: {:?}", other),
        }
        assert_eq!(msg.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_unknown_origin_type_does_not_fail_message() {
        let json = r#"{"message_id": 1, "date": 0, "forward_origin": {"type": "paid_bot", "date": 1}}"#;
        let msg: TgMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.forward_origin, Some(MessageOrigin::Unknown));
    }

    #[test]
    fn test_error_envelope_parses_retry_after() {
        let json = r#"{"ok": false, "error_code": 429, "description": "Too Many Requests: retry after 35", "parameters": {"retry_after": 35}}"#;
        let env: ApiEnvelope<TgMessage> = serde_json::from_str(json).unwrap();
        assert!(!env.ok);
        assert_eq!(env.error_code, Some(429));
        assert_eq!(env.parameters.unwrap().retry_after, Some(35));
    }
}
