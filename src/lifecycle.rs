//! Session and configuration lifecycle.
//!
//! Decides whether persisted progress belongs to the current session, reacts
//! to bot identity changes, validates chat setup and forces a pause when the
//! forwarding view is left.

use std::sync::Arc;

use crate::error::JobError;
use crate::forward::{ForwardEngine, JobConfig, JobControl, JobRunState, JobStatus, ResultLog};
use crate::log_component;
use crate::store::ProgressStore;
use crate::transport::{ChatId, Transport};

/// What [`SessionLifecycle::mount`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mounted {
    /// No session marker: everything persisted was wiped.
    Fresh,
    /// Same session: config, results and run state were loaded into the engine.
    Restored {
        config: JobConfig,
        result_count: usize,
        run_state: Option<JobRunState>,
    },
}

/// Chat ids and options entered during setup, before validation.
#[derive(Debug, Clone, Default)]
pub struct SetupDraft {
    pub source_chat: String,
    pub target_chat: String,
    pub start_message_id: u64,
    pub delete_original_after_forward: bool,
}

pub struct SessionLifecycle {
    store: Arc<dyn ProgressStore>,
}

impl SessionLifecycle {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Load or wipe persisted state depending on the session marker.
    pub async fn mount(&self, engine: &mut ForwardEngine) -> Mounted {
        if !self.store.session_active().await {
            self.store.clear_all().await;
            self.store.clear_last_credential().await;
            engine.restore(JobConfig::default(), ResultLog::new(), None);
            let session = self.store.mark_session_active().await;
            log_component!(info, "lifecycle", "Fresh session", session = session);
            return Mounted::Fresh;
        }

        let config = self.store.load_config().await.unwrap_or_default();
        let results = ResultLog::from_newest_first(self.store.load_results().await);
        let run_state = self.store.load_run_state().await;
        let result_count = results.len();

        engine.restore(config.clone(), results, run_state);
        log_component!(
            info,
            "lifecycle",
            "Session restored",
            results = result_count,
            status = engine.status().to_string()
        );
        Mounted::Restored {
            config,
            result_count,
            run_state: Some(engine.run_state().clone()).filter(|s| *s != JobRunState::default()),
        }
    }

    /// Compare `token` with the last observed credential.
    ///
    /// A different bot wipes the job regardless of its state and requires setup
    /// again. The first observation only records the token. Returns `true`
    /// when a reset happened.
    pub async fn observe_credential(&self, token: &str, engine: &mut ForwardEngine) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        let changed = matches!(
            self.store.last_credential().await,
            Some(previous) if !previous.is_empty() && previous != token
        );
        if changed {
            log_component!(
                warn,
                "lifecycle",
                "Bot identity changed, discarding job state",
                previous_status = engine.status().to_string()
            );
            engine.reset().await;
        }
        self.store.set_last_credential(token).await;
        changed
    }

    /// Leaving the forwarding view never lets a job continue unattended.
    /// Returns `true` if a pause was requested.
    pub fn leave_view(control: &JobControl) -> bool {
        if control.status() != JobStatus::Running {
            return false;
        }
        match control.pause() {
            Ok(()) => {
                log_component!(info, "lifecycle", "Left forwarding view, pausing");
                true
            }
            Err(_) => false,
        }
    }

    /// Validate the draft against the Bot API and persist it as completed setup.
    pub async fn complete_setup(
        &self,
        transport: &dyn Transport,
        token: &str,
        draft: SetupDraft,
        engine: &mut ForwardEngine,
    ) -> Result<JobConfig, JobError> {
        if draft.source_chat.trim().is_empty() || draft.target_chat.trim().is_empty() {
            return Err(JobError::ConfigInvalid(
                "please enter both source and target chat ids".to_string(),
            ));
        }
        if token.trim().is_empty() {
            return Err(JobError::ConfigInvalid(
                "bot token is missing from configuration".to_string(),
            ));
        }

        let mut config = JobConfig {
            source_chat: ChatId::new(&draft.source_chat),
            target_chat: ChatId::new(&draft.target_chat),
            start_message_id: draft.start_message_id,
            delete_original_after_forward: draft.delete_original_after_forward,
            setup_completed: false,
        };
        config.validate_chats()?;

        for chat in [&config.source_chat, &config.target_chat] {
            if let Err(failure) = transport.get_chat(chat).await {
                log_component!(
                    warn,
                    "lifecycle",
                    "Chat validation failed",
                    chat = chat.to_string(),
                    error = failure.to_string()
                );
                let desc = failure.description.to_lowercase();
                let message = if desc.contains("chat not found") || desc.contains("bad request") {
                    "one or both chat ids are invalid"
                } else if failure.error_code == 401 || desc.contains("unauthorized") {
                    "bot token is invalid or the bot doesn't have access to the specified chats"
                } else {
                    "failed to validate chats, check the bot token and chat ids"
                };
                return Err(JobError::ConfigInvalid(message.to_string()));
            }
        }

        config.setup_completed = true;
        self.store.save_config(&config).await;
        engine.set_job_config(config.clone());
        log_component!(
            info,
            "lifecycle",
            "Setup completed",
            source = config.source_chat.to_string(),
            target = config.target_chat.to_string()
        );
        Ok(config)
    }

    /// Explicit reset from the user: job state, setup and credential tracking.
    pub async fn reset_setup(&self, engine: &mut ForwardEngine) {
        engine.reset().await;
        engine.set_job_config(JobConfig::default());
        self.store.clear_last_credential().await;
    }

    /// End the current session; the next mount starts fresh.
    pub async fn end_session(&self) {
        self.store.clear_session_marker().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForwardConfig;
    use crate::forward::{ForwardResult, RunOutcome};
    use crate::store::MemoryProgressStore;
    use crate::transport::{ApiFailure, ApiResult, TgChat, TgMessage};
    use async_trait::async_trait;
    use chrono::Utc;

    struct ChatLookup {
        known: Vec<&'static str>,
        unauthorized: bool,
    }

    #[async_trait]
    impl Transport for ChatLookup {
        fn name(&self) -> &str {
            "lookup"
        }

        async fn forward_one(&self, _: &ChatId, _: &ChatId, id: u64) -> ApiResult<TgMessage> {
            Ok(TgMessage {
                message_id: id as i64 + 100,
                ..Default::default()
            })
        }

        async fn send_text(&self, _: &ChatId, _: &str) -> ApiResult<TgMessage> {
            Ok(TgMessage {
                message_id: 4,
                ..Default::default()
            })
        }

        async fn delete_one(&self, _: &ChatId, _: u64) -> ApiResult<bool> {
            Ok(true)
        }

        async fn get_chat(&self, chat: &ChatId) -> ApiResult<TgChat> {
            if self.unauthorized {
                return Err(ApiFailure::new(401, "Unauthorized"));
            }
            if self.known.contains(&chat.as_str()) {
                Ok(TgChat {
                    id: -1,
                    kind: "channel".into(),
                    title: Some("chat".into()),
                    username: None,
                    first_name: None,
                    last_name: None,
                })
            } else {
                Err(ApiFailure::new(400, "Bad Request: chat not found"))
            }
        }
    }

    fn lookup() -> Arc<ChatLookup> {
        Arc::new(ChatLookup {
            known: vec!["-100111", "-100222"],
            unauthorized: false,
        })
    }

    fn setup(store: Arc<MemoryProgressStore>, transport: Arc<ChatLookup>) -> (SessionLifecycle, ForwardEngine) {
        let engine = ForwardEngine::new(transport, store.clone(), ForwardConfig::default());
        (SessionLifecycle::new(store), engine)
    }

    fn draft() -> SetupDraft {
        SetupDraft {
            source_chat: " -100111 ".into(),
            target_chat: "-100222".into(),
            start_message_id: 0,
            delete_original_after_forward: false,
        }
    }

    #[tokio::test]
    async fn test_fresh_mount_wipes_persisted_state() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut cfg = JobConfig::new("-100111", "-100222");
        cfg.setup_completed = true;
        store.save_config(&cfg).await;
        store
            .save_results(&[ForwardResult::failed(1, "x", Utc::now())])
            .await;
        store.set_last_credential("1:old").await;

        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        assert_eq!(lifecycle.mount(&mut engine).await, Mounted::Fresh);
        assert!(store.load_config().await.is_none());
        assert!(store.load_results().await.is_empty());
        assert!(store.last_credential().await.is_none());
        assert!(store.session_active().await);
        assert!(!engine.job_config().setup_completed);
    }

    #[tokio::test]
    async fn test_second_mount_restores() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        lifecycle.mount(&mut engine).await;
        lifecycle
            .complete_setup(&*lookup(), "1:abc", draft(), &mut engine)
            .await
            .unwrap();
        store
            .save_results(&[ForwardResult::failed(2, "x", Utc::now())])
            .await;

        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        match lifecycle.mount(&mut engine).await {
            Mounted::Restored {
                config,
                result_count,
                run_state,
            } => {
                assert!(config.setup_completed);
                assert_eq!(config.source_chat.as_str(), "-100111");
                assert_eq!(result_count, 1);
                assert!(run_state.is_none());
            }
            other => panic!("expected restore, got {:?}", other),
        }
        assert_eq!(engine.results().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_setup_rejects_unknown_chat() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        let mut d = draft();
        d.target_chat = "-100999".into();
        let err = lifecycle
            .complete_setup(&*lookup(), "1:abc", d, &mut engine)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            JobError::ConfigInvalid("one or both chat ids are invalid".into())
        );
        assert!(store.load_config().await.is_none());
    }

    #[tokio::test]
    async fn test_complete_setup_unauthorized() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store, lookup());
        let bad = ChatLookup {
            known: vec![],
            unauthorized: true,
        };
        let err = lifecycle
            .complete_setup(&bad, "1:abc", draft(), &mut engine)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bot token is invalid"));
    }

    #[tokio::test]
    async fn test_complete_setup_requires_both_ids_and_token() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store, lookup());
        let mut d = draft();
        d.source_chat = "  ".into();
        assert!(lifecycle
            .complete_setup(&*lookup(), "1:abc", d, &mut engine)
            .await
            .is_err());
        assert!(lifecycle
            .complete_setup(&*lookup(), "", draft(), &mut engine)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_first_credential_is_recorded_without_reset() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        lifecycle.mount(&mut engine).await;
        lifecycle
            .complete_setup(&*lookup(), "1:abc", draft(), &mut engine)
            .await
            .unwrap();

        assert!(!lifecycle.observe_credential("1:abc", &mut engine).await);
        assert!(!lifecycle.observe_credential("1:abc", &mut engine).await);
        assert!(engine.job_config().setup_completed);
        assert_eq!(store.last_credential().await.as_deref(), Some("1:abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_credential_change_resets_everything() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        lifecycle.mount(&mut engine).await;
        lifecycle.observe_credential("1:abc", &mut engine).await;
        let cfg = lifecycle
            .complete_setup(&*lookup(), "1:abc", draft(), &mut engine)
            .await
            .unwrap();
        let outcome = engine.start(cfg).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(engine.results().len(), 3);

        assert!(lifecycle.observe_credential("2:xyz", &mut engine).await);
        assert_eq!(engine.status(), JobStatus::Idle);
        assert!(engine.results().is_empty());
        assert!(!engine.job_config().setup_completed);
        assert!(store.load_config().await.is_none());
        assert_eq!(store.last_credential().await.as_deref(), Some("2:xyz"));
    }

    #[tokio::test]
    async fn test_leave_view_only_pauses_running_job() {
        let store = Arc::new(MemoryProgressStore::new());
        let (_, engine) = setup(store, lookup());
        assert!(!SessionLifecycle::leave_view(&engine.control()));
    }

    #[tokio::test]
    async fn test_reset_setup_and_end_session() {
        let store = Arc::new(MemoryProgressStore::new());
        let (lifecycle, mut engine) = setup(store.clone(), lookup());
        lifecycle.mount(&mut engine).await;
        lifecycle.observe_credential("1:abc", &mut engine).await;
        lifecycle
            .complete_setup(&*lookup(), "1:abc", draft(), &mut engine)
            .await
            .unwrap();

        lifecycle.reset_setup(&mut engine).await;
        assert!(store.load_config().await.is_none());
        assert!(store.last_credential().await.is_none());
        assert!(engine.job_config().source_chat.is_empty());

        lifecycle.end_session().await;
        assert!(!store.session_active().await);
    }
}
