//! Progress store - session-scoped persistence of job state.
//!
//! Backends implement three raw key operations; the typed operations the
//! engine and lifecycle use are provided on top of them and never fail at the
//! call site. A backend error is logged at `warn` and the caller carries on
//! with its in-memory state.
//!
//! # Example
//!
//! ```
//! use tgrelay::forward::JobConfig;
//! use tgrelay::store::{MemoryProgressStore, ProgressStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryProgressStore::new();
//!     let mut config = JobConfig::new("-100111", "-100222");
//!     config.setup_completed = true;
//!
//!     store.save_config(&config).await;
//!     assert_eq!(store.load_config().await, Some(config));
//! }
//! ```

pub mod file;
pub mod memory;

pub use file::FileProgressStore;
pub use memory::MemoryProgressStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::forward::{ForwardResult, JobConfig, JobRunState};
use crate::log_component;

/// Job configuration blob.
pub const KEY_JOB_CONFIG: &str = "job_config.json";
/// Forwarded results, newest first.
pub const KEY_RESULTS: &str = "forward_results.json";
/// Last processed position and counters.
pub const KEY_RUN_STATE: &str = "run_state.json";
/// Last observed bot credential.
pub const KEY_LAST_CREDENTIAL: &str = "last_bot_token";
/// Present while a session is active.
pub const KEY_SESSION_MARKER: &str = "session_active";

/// Session-scoped key/value persistence for forwarding progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    async fn read_raw(&self, key: &str) -> Result<Option<String>>;

    async fn write_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove_raw(&self, key: &str) -> Result<()>;

    // ------------------------------------------------------------------
    // Infallible helpers
    // ------------------------------------------------------------------

    async fn read_or_warn(&self, key: &str) -> Option<String> {
        match self.read_raw(key).await {
            Ok(value) => value,
            Err(e) => {
                log_component!(
                    warn,
                    "store",
                    "Storage unavailable, read skipped",
                    key = key,
                    error = e.to_string()
                );
                None
            }
        }
    }

    async fn write_or_warn(&self, key: &str, value: &str) {
        if let Err(e) = self.write_raw(key, value).await {
            log_component!(
                warn,
                "store",
                "Storage unavailable, write skipped",
                key = key,
                error = e.to_string()
            );
        }
    }

    async fn remove_or_warn(&self, key: &str) {
        if let Err(e) = self.remove_raw(key).await {
            log_component!(
                warn,
                "store",
                "Storage unavailable, remove skipped",
                key = key,
                error = e.to_string()
            );
        }
    }

    // ------------------------------------------------------------------
    // Job configuration
    // ------------------------------------------------------------------

    async fn save_config(&self, config: &JobConfig) {
        match serde_json::to_string(config) {
            Ok(json) => self.write_or_warn(KEY_JOB_CONFIG, &json).await,
            Err(e) => log_component!(warn, "store", "Cannot encode job config", error = e.to_string()),
        }
    }

    async fn load_config(&self) -> Option<JobConfig> {
        let raw = self.read_or_warn(KEY_JOB_CONFIG).await?;
        decode_or_warn(KEY_JOB_CONFIG, &raw)
    }

    async fn clear_config(&self) {
        self.remove_or_warn(KEY_JOB_CONFIG).await;
    }

    // ------------------------------------------------------------------
    // Forward results
    // ------------------------------------------------------------------

    /// Persist results; `results` must already be newest first.
    async fn save_results(&self, results: &[ForwardResult]) {
        match serde_json::to_string(results) {
            Ok(json) => self.write_or_warn(KEY_RESULTS, &json).await,
            Err(e) => log_component!(warn, "store", "Cannot encode results", error = e.to_string()),
        }
    }

    /// Stored results, newest first. Empty when absent or unreadable.
    async fn load_results(&self) -> Vec<ForwardResult> {
        match self.read_or_warn(KEY_RESULTS).await {
            Some(raw) => decode_or_warn(KEY_RESULTS, &raw).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    async fn clear_results(&self) {
        self.remove_or_warn(KEY_RESULTS).await;
    }

    // ------------------------------------------------------------------
    // Run state
    // ------------------------------------------------------------------

    async fn save_run_state(&self, state: &JobRunState) {
        match serde_json::to_string(state) {
            Ok(json) => self.write_or_warn(KEY_RUN_STATE, &json).await,
            Err(e) => log_component!(warn, "store", "Cannot encode run state", error = e.to_string()),
        }
    }

    async fn load_run_state(&self) -> Option<JobRunState> {
        let raw = self.read_or_warn(KEY_RUN_STATE).await?;
        decode_or_warn(KEY_RUN_STATE, &raw)
    }

    async fn clear_run_state(&self) {
        self.remove_or_warn(KEY_RUN_STATE).await;
    }

    // ------------------------------------------------------------------
    // Credential and session markers
    // ------------------------------------------------------------------

    async fn last_credential(&self) -> Option<String> {
        self.read_or_warn(KEY_LAST_CREDENTIAL)
            .await
            .map(|s| s.trim().to_string())
    }

    async fn set_last_credential(&self, token: &str) {
        self.write_or_warn(KEY_LAST_CREDENTIAL, token).await;
    }

    async fn clear_last_credential(&self) {
        self.remove_or_warn(KEY_LAST_CREDENTIAL).await;
    }

    async fn session_active(&self) -> bool {
        self.read_or_warn(KEY_SESSION_MARKER).await.is_some()
    }

    /// Set the marker to a fresh session id and return it.
    async fn mark_session_active(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.write_or_warn(KEY_SESSION_MARKER, &id).await;
        id
    }

    async fn clear_session_marker(&self) {
        self.remove_or_warn(KEY_SESSION_MARKER).await;
    }

    /// Remove config, results and run state. Markers are kept.
    async fn clear_all(&self) {
        self.clear_config().await;
        self.clear_results().await;
        self.clear_run_state().await;
    }
}

fn decode_or_warn<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log_component!(
                warn,
                "store",
                "Ignoring unreadable stored value",
                key = key,
                error = e.to_string()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::JobStatus;
    use chrono::Utc;

    #[tokio::test]
    async fn test_config_round_trip_and_clear() {
        let store = MemoryProgressStore::new();
        assert!(store.load_config().await.is_none());

        let mut cfg = JobConfig::new("@src", "-100222");
        cfg.start_message_id = 10;
        cfg.setup_completed = true;
        store.save_config(&cfg).await;
        assert_eq!(store.load_config().await, Some(cfg));

        store.clear_config().await;
        assert!(store.load_config().await.is_none());
    }

    #[tokio::test]
    async fn test_results_keep_order() {
        let store = MemoryProgressStore::new();
        let now = Utc::now();
        let results = vec![
            ForwardResult::failed(3, "x", now),
            ForwardResult::failed(2, "x", now),
        ];
        store.save_results(&results).await;
        let loaded = store.load_results().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].original_id, 3);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_ignored() {
        let store = MemoryProgressStore::new();
        store.write_raw(KEY_RUN_STATE, "{not json").await.unwrap();
        assert!(store.load_run_state().await.is_none());
        store.write_raw(KEY_RESULTS, "[1,2").await.unwrap();
        assert!(store.load_results().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_state_round_trip() {
        let store = MemoryProgressStore::new();
        let state = JobRunState {
            status: JobStatus::Paused,
            current_message_id: Some(120),
            target_anchor_message_id: Some(500),
            range_start: 1,
            range_end: 499,
            processed_count: 119,
            success_count: 118,
            error_count: 1,
        };
        store.save_run_state(&state).await;
        assert_eq!(store.load_run_state().await, Some(state));
    }

    #[tokio::test]
    async fn test_markers() {
        let store = MemoryProgressStore::new();
        assert!(!store.session_active().await);
        let id = store.mark_session_active().await;
        assert_eq!(id.len(), 36);
        assert!(store.session_active().await);
        store.clear_session_marker().await;
        assert!(!store.session_active().await);

        store.set_last_credential("1:abc").await;
        assert_eq!(store.last_credential().await.as_deref(), Some("1:abc"));
        store.clear_last_credential().await;
        assert!(store.last_credential().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_all_keeps_markers() {
        let store = MemoryProgressStore::new();
        store.mark_session_active().await;
        store.set_last_credential("1:abc").await;
        let mut cfg = JobConfig::new("-1", "-2");
        cfg.setup_completed = true;
        store.save_config(&cfg).await;

        store.clear_all().await;
        assert!(store.load_config().await.is_none());
        assert!(store.session_active().await);
        assert!(store.last_credential().await.is_some());
    }
}
