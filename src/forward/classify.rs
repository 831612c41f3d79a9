//! Provenance and payload classification of forwarded messages.
//!
//! Sender precedence, first match wins:
//! `forward_origin` (user, hidden_user, chat, channel), legacy `forward_from`,
//! legacy `forward_from_chat`, the message's own chat (the target chat),
//! then the raw `from` sender.

use chrono::{DateTime, TimeZone, Utc};

use super::types::{ForwardResult, MessageKind, OriginType, ResultStatus, SenderInfo};
use crate::transport::{MessageOrigin, TgChat, TgMessage, TgUser};

/// Text shown for messages without text or caption.
pub const MEDIA_PLACEHOLDER: &str = "Media message";

fn from_user(user: &TgUser, origin_type: OriginType) -> SenderInfo {
    SenderInfo {
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()).filter(|s| !s.is_empty()),
        last_name: user.last_name.clone(),
        user_id: Some(user.id),
        is_bot: user.is_bot,
        origin_type,
        chat_type: None,
        forward_date: None,
    }
}

fn from_chat(chat: &TgChat, origin_type: OriginType) -> SenderInfo {
    SenderInfo {
        username: chat.username.clone(),
        first_name: chat.title.clone(),
        last_name: None,
        user_id: Some(chat.id),
        is_bot: false,
        origin_type,
        chat_type: Some(chat.kind.clone()).filter(|s| !s.is_empty()),
        forward_date: None,
    }
}

fn from_origin(origin: &MessageOrigin) -> Option<SenderInfo> {
    let mut info = match origin {
        MessageOrigin::User { sender_user, .. } => from_user(sender_user, OriginType::User),
        MessageOrigin::HiddenUser {
            sender_user_name, ..
        } => SenderInfo {
            first_name: Some(sender_user_name.clone()).filter(|s| !s.is_empty()),
            origin_type: OriginType::HiddenUser,
            ..SenderInfo::unknown()
        },
        MessageOrigin::Chat { sender_chat, .. } => from_chat(sender_chat, OriginType::Chat),
        MessageOrigin::Channel { chat, .. } => from_chat(chat, OriginType::Channel),
        MessageOrigin::Unknown => return None,
    };
    info.forward_date = origin.date();
    Some(info)
}

/// Derive exactly one sender attribution for a forwarded message.
pub fn sender_info(msg: &TgMessage) -> SenderInfo {
    if let Some(info) = msg.forward_origin.as_ref().and_then(from_origin) {
        return info;
    }
    if let Some(user) = &msg.forward_from {
        return from_user(user, OriginType::LegacyUser);
    }
    if let Some(chat) = &msg.forward_from_chat {
        return from_chat(chat, OriginType::LegacyChat);
    }
    if let Some(chat) = &msg.chat {
        // Private target chats carry first/last name instead of a title.
        return SenderInfo {
            username: chat.username.clone(),
            first_name: chat.first_name.clone(),
            last_name: chat.last_name.clone(),
            user_id: Some(chat.id),
            is_bot: false,
            origin_type: OriginType::TargetChat,
            chat_type: Some(chat.kind.clone()).filter(|s| !s.is_empty()),
            forward_date: None,
        };
    }
    match &msg.from {
        Some(user) => from_user(user, OriginType::MessageSender),
        None => SenderInfo::unknown(),
    }
}

/// Payload kind, checked photo first and falling back to text.
pub fn message_kind(msg: &TgMessage) -> MessageKind {
    let checks = [
        (msg.photo.is_some(), MessageKind::Photo),
        (msg.video.is_some(), MessageKind::Video),
        (msg.document.is_some(), MessageKind::Document),
        (msg.audio.is_some(), MessageKind::Audio),
        (msg.voice.is_some(), MessageKind::Voice),
        (msg.sticker.is_some(), MessageKind::Sticker),
        (msg.animation.is_some(), MessageKind::Animation),
    ];
    checks
        .into_iter()
        .find(|(present, _)| *present)
        .map(|(_, kind)| kind)
        .unwrap_or(MessageKind::Text)
}

/// When the original message was sent.
pub fn origin_date(msg: &TgMessage) -> Option<DateTime<Utc>> {
    let secs = msg
        .forward_date
        .or_else(|| msg.forward_origin.as_ref().and_then(MessageOrigin::date))
        .or(Some(msg.date).filter(|d| *d > 0))?;
    Utc.timestamp_opt(secs, 0).single()
}

fn display_text(msg: &TgMessage) -> String {
    [&msg.text, &msg.caption]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| MEDIA_PLACEHOLDER.to_string())
}

/// Build the log entry for a successfully forwarded message.
pub fn success_result(original_id: u64, msg: &TgMessage, at: DateTime<Utc>) -> ForwardResult {
    let kind = message_kind(msg);
    ForwardResult {
        original_id,
        forwarded_id: u64::try_from(msg.message_id).unwrap_or(0),
        status: ResultStatus::Success,
        timestamp_forwarded: at,
        origin_message_date: origin_date(msg),
        text: display_text(msg),
        message_kind: kind,
        has_media: kind.has_media(),
        sender_info: sender_info(msg),
        chat_title: msg.chat.as_ref().and_then(|c| c.title.clone()),
        chat_type: msg
            .chat
            .as_ref()
            .map(|c| c.kind.clone())
            .filter(|s| !s.is_empty()),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> TgMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_channel_origin_beats_legacy_forward_from() {
        let msg = parse(json!({
            "message_id": 10,
            "date": 1700000100,
            "forward_origin": {
                "type": "channel",
                "date": 1700000000,
                "chat": {"id": -100111, "type": "channel", "title": "News", "username": "news"}
            },
            "forward_from": {"id": 5, "is_bot": false, "first_name": "Legacy"}
        }));
        let info = sender_info(&msg);
        assert_eq!(info.origin_type, OriginType::Channel);
        assert_eq!(info.first_name.as_deref(), Some("News"));
        assert_eq!(info.user_id, Some(-100111));
        assert_eq!(info.chat_type.as_deref(), Some("channel"));
        assert_eq!(info.forward_date, Some(1700000000));
    }

    #[test]
    fn test_user_origin() {
        let msg = parse(json!({
            "message_id": 1,
            "forward_origin": {
                "type": "user",
                "date": 1,
                "sender_user": {"id": 42, "is_bot": true, "first_name": "Helper", "username": "helper_bot"}
            }
        }));
        let info = sender_info(&msg);
        assert_eq!(info.origin_type, OriginType::User);
        assert!(info.is_bot);
        assert_eq!(info.username.as_deref(), Some("helper_bot"));
        assert!(info.chat_type.is_none());
    }

    #[test]
    fn test_hidden_user_origin_only_has_name() {
        let msg = parse(json!({
            "message_id": 1,
            "forward_origin": {"type": "hidden_user", "date": 1, "sender_user_name": "Anon"}
        }));
        let info = sender_info(&msg);
        assert_eq!(info.origin_type, OriginType::HiddenUser);
        assert_eq!(info.first_name.as_deref(), Some("Anon"));
        assert!(info.user_id.is_none());
        assert!(info.username.is_none());
    }

    #[test]
    fn test_unknown_origin_falls_through_to_legacy() {
        let msg = parse(json!({
            "message_id": 1,
            "forward_origin": {"type": "something_new", "date": 1},
            "forward_from_chat": {"id": -100333, "type": "supergroup", "title": "Group"}
        }));
        assert_eq!(sender_info(&msg).origin_type, OriginType::LegacyChat);
    }

    #[test]
    fn test_target_chat_then_message_sender() {
        let msg = parse(json!({
            "message_id": 1,
            "chat": {"id": 77, "type": "private", "first_name": "Ann", "last_name": "Lee"},
            "from": {"id": 99, "first_name": "Bot", "is_bot": true}
        }));
        let info = sender_info(&msg);
        assert_eq!(info.origin_type, OriginType::TargetChat);
        assert_eq!(info.display_name(), "Ann Lee");

        let bare = parse(json!({
            "message_id": 1,
            "from": {"id": 99, "first_name": "Bot", "is_bot": true}
        }));
        let info = sender_info(&bare);
        assert_eq!(info.origin_type, OriginType::MessageSender);
        assert_eq!(info.user_id, Some(99));
    }

    #[test]
    fn test_message_kind_precedence() {
        let msg = parse(json!({
            "message_id": 1,
            "video": {"file_id": "v"},
            "photo": [{"file_id": "p"}],
            "caption": "both"
        }));
        assert_eq!(message_kind(&msg), MessageKind::Photo);

        let msg = parse(json!({"message_id": 1, "animation": {}, "document": {}}));
        assert_eq!(message_kind(&msg), MessageKind::Document);

        let msg = parse(json!({"message_id": 1, "text": "hi"}));
        assert_eq!(message_kind(&msg), MessageKind::Text);
    }

    #[test]
    fn test_success_result_text_fallbacks() {
        let now = Utc::now();
        let msg = parse(json!({"message_id": 8, "sticker": {"file_id": "s"}}));
        let r = success_result(3, &msg, now);
        assert_eq!(r.text, MEDIA_PLACEHOLDER);
        assert!(r.has_media);
        assert_eq!(r.forwarded_id, 8);

        let msg = parse(json!({"message_id": 9, "photo": [], "caption": "sunset"}));
        assert_eq!(success_result(4, &msg, now).text, "sunset");
    }

    #[test]
    fn test_origin_date_precedence() {
        let msg = parse(json!({
            "message_id": 1,
            "date": 300,
            "forward_date": 100,
            "forward_origin": {"type": "hidden_user", "date": 200, "sender_user_name": "x"}
        }));
        assert_eq!(origin_date(&msg).unwrap().timestamp(), 100);

        let msg = parse(json!({
            "message_id": 1,
            "date": 300,
            "forward_origin": {"type": "hidden_user", "date": 200, "sender_user_name": "x"}
        }));
        assert_eq!(origin_date(&msg).unwrap().timestamp(), 200);

        let msg = parse(json!({"message_id": 1, "date": 300}));
        assert_eq!(origin_date(&msg).unwrap().timestamp(), 300);
    }

    #[test]
    fn test_success_result_chat_fields() {
        let msg = parse(json!({
            "message_id": 12,
            "chat": {"id": -100222, "type": "channel", "title": "Archive"},
            "text": "hello"
        }));
        let r = success_result(1, &msg, Utc::now());
        assert_eq!(r.chat_title.as_deref(), Some("Archive"));
        assert_eq!(r.chat_type.as_deref(), Some("channel"));
        assert!(r.error.is_none());
    }
}
