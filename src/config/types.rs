//! Configuration type definitions for tgrelay
//!
//! This module defines all configuration structs used throughout the crate.
//! All types implement serde traits for JSON serialization and have sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration struct for tgrelay
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Bot API credentials and endpoint
    pub telegram: TelegramConfig,
    /// Forwarding loop tuning (delays, cooldown defaults, checkpoints)
    pub forward: ForwardConfig,
    /// Where session-scoped progress is persisted
    pub storage: StorageConfig,
    /// Logging output format and level
    pub logging: LoggingConfig,
}

// ============================================================================
// Telegram Configuration
// ============================================================================

/// Bot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    pub bot_token: String,
    /// Bot API base URL (override for local Bot API servers or tests)
    pub api_base: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_api_base(),
            timeout_secs: 30,
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl TelegramConfig {
    /// Numeric bot id (the part of the token before the colon).
    pub fn bot_id(&self) -> Option<&str> {
        self.bot_token
            .split_once(':')
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
    }
}

// ============================================================================
// Forward Configuration
// ============================================================================

/// Forwarding loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Pause between two forwarded messages, in milliseconds
    pub inter_message_delay_ms: u64,
    /// Cooldown used when a throttling response carries no wait value
    pub default_retry_after_secs: u64,
    /// How long the completion summary stays in the status line
    pub status_clear_secs: u64,
    /// Persist results every N appended entries (0 disables periodic checkpoints)
    pub checkpoint_every: usize,
    /// Text of the sentinel message sent to the target chat at job start
    pub anchor_text: String,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            inter_message_delay_ms: 200,
            default_retry_after_secs: 30,
            status_clear_secs: 10,
            checkpoint_every: 25,
            anchor_text: "Starting message forwarding session...".to_string(),
        }
    }
}

// ============================================================================
// Storage Configuration
// ============================================================================

/// Progress store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for session-scoped state. Defaults to `~/.tgrelay/session`.
    pub dir: Option<String>,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, coloured
    Pretty,
    /// `[timestamp] [LEVEL] target message {fields}`, grep-friendly
    #[default]
    Component,
    /// JSON lines for log aggregators
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
    /// Optional log file (JSON format only)
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            level: "info".to_string(),
            file: None,
        }
    }
}
