//! Transport module - the Bot API calls the forwarding workflow depends on.
//!
//! The [`Transport`] trait is the seam between the job engine and the network.
//! Every call returns an [`ApiResult`]: HTTP-level, network-level and
//! API-level (`{"ok": false}`) failures are all normalized into one
//! [`ApiFailure`] shape so the engine and the rate-limit governor only have a
//! single error path to inspect.
//!
//! # Implementing a Transport
//!
//! ```ignore
//! use async_trait::async_trait;
//! use tgrelay::transport::{ApiResult, ChatId, TgChat, TgMessage, Transport};
//!
//! struct Recorder;
//!
//! #[async_trait]
//! impl Transport for Recorder {
//!     fn name(&self) -> &str { "recorder" }
//!     async fn forward_one(&self, _: &ChatId, _: &ChatId, id: u64) -> ApiResult<TgMessage> {
//!         Ok(TgMessage { message_id: id as i64, ..Default::default() })
//!     }
//!     // ...
//! }
//! ```

pub mod telegram;
mod types;

pub use telegram::BotApiTransport;
pub use types::{
    ApiEnvelope, ChatId, MessageOrigin, ResponseParameters, TgChat, TgMessage, TgUser,
};

use async_trait::async_trait;

/// Error code used for failures that never reached the Bot API.
pub const NETWORK_ERROR_CODE: i64 = 0;

/// Normalized failure of a single Bot API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// Bot API `error_code`, the HTTP status, or [`NETWORK_ERROR_CODE`].
    pub error_code: i64,
    /// Human-readable description from the API or the HTTP client.
    pub description: String,
    /// `parameters.retry_after`, when the API supplied one.
    pub retry_after: Option<u64>,
}

impl ApiFailure {
    pub fn new(error_code: i64, description: impl Into<String>) -> Self {
        Self {
            error_code,
            description: description.into(),
            retry_after: None,
        }
    }

    /// Failure that never reached the API (DNS, TLS, timeout, ...).
    pub fn network(description: impl Into<String>) -> Self {
        Self::new(NETWORK_ERROR_CODE, description)
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.retry_after {
            Some(secs) => write!(
                f,
                "{} (code {}, retry_after:{})",
                self.description, self.error_code, secs
            ),
            None => write!(f, "{} (code {})", self.description, self.error_code),
        }
    }
}

/// Outcome of a Bot API call.
pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// The remote calls the forwarding workflow needs.
///
/// Implementations hold the bot credential; callers only pass chat ids.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Forward `message_id` from `source` into `target`.
    async fn forward_one(
        &self,
        source: &ChatId,
        target: &ChatId,
        message_id: u64,
    ) -> ApiResult<TgMessage>;

    /// Send a plain text message.
    async fn send_text(&self, chat: &ChatId, text: &str) -> ApiResult<TgMessage>;

    /// Delete a single message.
    async fn delete_one(&self, chat: &ChatId, message_id: u64) -> ApiResult<bool>;

    /// Fetch chat metadata (used to validate chat ids during setup).
    async fn get_chat(&self, chat: &ChatId) -> ApiResult<TgChat>;
}
