//! Error types for tgrelay
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

use crate::forward::JobStatus;

// ============================================================================
// Forward Job Errors
// ============================================================================

/// Errors raised by the forwarding job and its collaborators.
///
/// Only setup-time failures (`ConfigInvalid`, `AnchorSendFailed`) and
/// state-machine misuse stop a job. Per-message failures (`ForwardFailed`,
/// `DeleteFailed`, `Throttled`) are recovered inside the loop and only show
/// up in the result log, the logs, or the status line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Missing credential or chat id, or chats failed validation.
    #[error("Invalid job configuration: {0}")]
    ConfigInvalid(String),

    /// The sentinel message could not be sent to the target chat.
    #[error("Failed to send anchor message to target chat: {0}")]
    AnchorSendFailed(String),

    /// The Bot API asked us to back off.
    #[error("Throttled: retry after {0}s")]
    Throttled(u64),

    /// A single message could not be forwarded.
    #[error("Forward failed: {0}")]
    ForwardFailed(String),

    /// Best-effort delete of the source message failed.
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// Resume was requested but no anchor message is known.
    #[error("Cannot resume: target anchor message id not found")]
    CannotResume,

    /// Persistence backend is unavailable; state is kept in memory only.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A job is already running in this process.
    #[error("A forwarding job is already running")]
    AlreadyRunning,

    /// The requested operation is not valid from the current state.
    #[error("Cannot {op} while job is {from}")]
    InvalidTransition { from: JobStatus, op: &'static str },
}

impl JobError {
    /// Returns `true` if this error should be shown to the user and stops the job.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            JobError::ConfigInvalid(_)
                | JobError::AnchorSendFailed(_)
                | JobError::CannotResume
                | JobError::AlreadyRunning
                | JobError::InvalidTransition { .. }
        )
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for tgrelay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Forwarding job errors
    #[error(transparent)]
    Job(#[from] JobError),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized `Result` type for tgrelay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
