//! Data model of a forwarding job.
//!
//! Persisted shapes use camelCase keys so the stored JSON matches the
//! job-configuration and forwarded-results blobs the store keeps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::governor::TerminalKind;
use crate::error::JobError;
use crate::transport::ChatId;

// ============================================================================
// Job configuration
// ============================================================================

/// What to forward and where. Owned by the session lifecycle, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobConfig {
    #[serde(rename = "sourceChatId")]
    pub source_chat: ChatId,
    #[serde(rename = "targetChatId")]
    pub target_chat: ChatId,
    pub start_message_id: u64,
    #[serde(rename = "deleteOriginalMessages")]
    pub delete_original_after_forward: bool,
    pub setup_completed: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            source_chat: ChatId::default(),
            target_chat: ChatId::default(),
            start_message_id: 0,
            delete_original_after_forward: true,
            setup_completed: false,
        }
    }
}

impl JobConfig {
    pub fn new(source: impl Into<ChatId>, target: impl Into<ChatId>) -> Self {
        Self {
            source_chat: source.into(),
            target_chat: target.into(),
            ..Default::default()
        }
    }

    /// Check that both chat ids are present and well-formed.
    pub fn validate_chats(&self) -> Result<(), JobError> {
        if self.source_chat.is_empty() || self.target_chat.is_empty() {
            return Err(JobError::ConfigInvalid(
                "source and target chat ids are required".to_string(),
            ));
        }
        for (label, chat) in [("source", &self.source_chat), ("target", &self.target_chat)] {
            if !chat.is_valid() {
                return Err(JobError::ConfigInvalid(format!(
                    "{} chat id '{}' is not a numeric id or @username",
                    label, chat
                )));
            }
        }
        Ok(())
    }

    /// First message id of the range (ids start at 1).
    pub fn range_start(&self) -> u64 {
        self.start_message_id.max(1)
    }
}

// ============================================================================
// Run state
// ============================================================================

/// Lifecycle of a forwarding job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Position and counters of the active job. Mutated only by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRunState {
    pub status: JobStatus,
    /// Next id to attempt when paused; id in flight while running.
    pub current_message_id: Option<u64>,
    /// Id of the sentinel message sent to the target chat at start.
    pub target_anchor_message_id: Option<u64>,
    pub range_start: u64,
    pub range_end: u64,
    pub processed_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

impl JobRunState {
    /// Number of ids in `[range_start, range_end]`, zero for an empty range.
    pub fn range_len(&self) -> u64 {
        if self.range_end < self.range_start {
            0
        } else {
            self.range_end - self.range_start + 1
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            success_count: self.success_count,
            error_count: self.error_count,
        }
    }
}

// ============================================================================
// Forward results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failed,
}

/// Payload kind of a forwarded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Photo,
    Video,
    Document,
    Audio,
    Voice,
    Sticker,
    Animation,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Photo => "photo",
            MessageKind::Video => "video",
            MessageKind::Document => "document",
            MessageKind::Audio => "audio",
            MessageKind::Voice => "voice",
            MessageKind::Sticker => "sticker",
            MessageKind::Animation => "animation",
        }
    }

    pub fn has_media(&self) -> bool {
        *self != MessageKind::Text
    }
}

/// Which provenance field the sender details were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    User,
    HiddenUser,
    Chat,
    Channel,
    LegacyUser,
    LegacyChat,
    TargetChat,
    MessageSender,
}

impl OriginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginType::User => "user",
            OriginType::HiddenUser => "hidden_user",
            OriginType::Chat => "chat",
            OriginType::Channel => "channel",
            OriginType::LegacyUser => "legacy_user",
            OriginType::LegacyChat => "legacy_chat",
            OriginType::TargetChat => "target_chat",
            OriginType::MessageSender => "message_sender",
        }
    }
}

/// Who originally authored a forwarded message.
///
/// For chat-like origins `first_name` holds the chat title and `user_id` the chat id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderInfo {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_id: Option<i64>,
    pub is_bot: bool,
    pub origin_type: OriginType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_date: Option<i64>,
}

impl SenderInfo {
    /// Sender of a failed forward: nothing is known.
    pub fn unknown() -> Self {
        Self {
            username: None,
            first_name: None,
            last_name: None,
            user_id: None,
            is_bot: false,
            origin_type: OriginType::MessageSender,
            chat_type: None,
            forward_date: None,
        }
    }

    /// "First Last", else the username, else "Unknown".
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Outcome of one forward attempt. Appended to the result log, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardResult {
    pub original_id: u64,
    /// Id of the copy in the target chat, `0` for failures.
    pub forwarded_id: u64,
    pub status: ResultStatus,
    pub timestamp_forwarded: DateTime<Utc>,
    pub origin_message_date: Option<DateTime<Utc>>,
    pub text: String,
    pub message_kind: MessageKind,
    pub has_media: bool,
    pub sender_info: SenderInfo,
    pub chat_title: Option<String>,
    pub chat_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForwardResult {
    pub fn failed(original_id: u64, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            original_id,
            forwarded_id: 0,
            status: ResultStatus::Failed,
            timestamp_forwarded: at,
            origin_message_date: None,
            text: String::new(),
            message_kind: MessageKind::Text,
            has_media: false,
            sender_info: SenderInfo::unknown(),
            chat_title: None,
            chat_type: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

// ============================================================================
// Throttling and progress reporting
// ============================================================================

/// Live view of an active throttling cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateLimitState {
    pub active: bool,
    pub retry_after_seconds: u64,
    pub remaining_seconds: u64,
}

/// Final counters of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub success_count: u64,
    pub error_count: u64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} successful, {} failed",
            self.success_count, self.error_count
        )
    }
}

/// How a call to `start`/`resume` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stopped at a pause boundary; `at` is the next id to attempt.
    Paused { at: u64 },
    /// The whole range was walked.
    Completed(RunSummary),
}

/// Progress notifications for the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardEvent {
    Started {
        anchor_message_id: u64,
        range_start: u64,
        range_end: u64,
    },
    Resumed {
        from: u64,
    },
    Forwarded {
        original_id: u64,
        forwarded_id: u64,
        kind: MessageKind,
    },
    Failed {
        original_id: u64,
        kind: TerminalKind,
        error: String,
    },
    Throttled {
        message_id: u64,
        retry_after_seconds: u64,
    },
    Countdown {
        remaining_seconds: u64,
    },
    Paused {
        at: u64,
    },
    Completed(RunSummary),
}
