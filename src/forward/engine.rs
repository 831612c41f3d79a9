//! Forward job engine.
//!
//! Walks `[range_start, range_end]` one message id at a time:
//!
//! 1. stop if a pause was requested
//! 2. forward the message
//! 3. on success classify and append, then best-effort delete the source
//! 4. on throttling wait out the cooldown and retry the same id
//! 5. on any other failure append a failed entry and move on
//! 6. sleep the inter-message delay and check for a pause again
//!
//! The run future borrows the engine mutably, so pauses are requested
//! through a [`JobControl`] handle taken before the run starts.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use super::classify;
use super::governor::{CooldownOutcome, RateLimitGovernor, TerminalKind, Verdict};
use super::results::ResultLog;
use super::types::{
    ForwardEvent, ForwardResult, JobConfig, JobRunState, JobStatus, RateLimitState, RunOutcome,
    RunSummary,
};
use crate::config::ForwardConfig;
use crate::error::JobError;
use crate::log_component;
use crate::store::ProgressStore;
use crate::transport::{ApiFailure, Transport};

// ============================================================================
// JobControl
// ============================================================================

/// Shared handle for requesting a pause and observing job status.
#[derive(Debug)]
pub struct JobControl {
    pause_tx: watch::Sender<bool>,
    status_tx: watch::Sender<JobStatus>,
}

impl JobControl {
    fn new() -> Self {
        let (pause_tx, _) = watch::channel(false);
        let (status_tx, _) = watch::channel(JobStatus::Idle);
        Self {
            pause_tx,
            status_tx,
        }
    }

    /// Request a pause. Valid only while the job is running; the engine stops
    /// at the next iteration boundary or cancels an active cooldown.
    pub fn pause(&self) -> Result<(), JobError> {
        let status = self.status();
        if status != JobStatus::Running {
            return Err(JobError::InvalidTransition {
                from: status,
                op: "pause",
            });
        }
        self.pause_tx.send_replace(true);
        log_component!(info, "engine", "Pause requested");
        Ok(())
    }

    pub fn status(&self) -> JobStatus {
        *self.status_tx.borrow()
    }

    pub fn pause_requested(&self) -> bool {
        *self.pause_tx.borrow()
    }

    fn pause_signal(&self) -> watch::Receiver<bool> {
        self.pause_tx.subscribe()
    }

    fn clear_pause(&self) {
        self.pause_tx.send_replace(false);
    }

    fn set_status(&self, status: JobStatus) {
        self.status_tx.send_replace(status);
    }
}

// ============================================================================
// ForwardEngine
// ============================================================================

/// Resumable, pausable, rate-limit aware forwarding job runner.
pub struct ForwardEngine {
    transport: Arc<dyn Transport>,
    store: Arc<dyn ProgressStore>,
    governor: RateLimitGovernor,
    settings: ForwardConfig,
    job: JobConfig,
    run: JobRunState,
    log: ResultLog,
    control: Arc<JobControl>,
    status_line: Arc<watch::Sender<Option<String>>>,
    events: Option<mpsc::UnboundedSender<ForwardEvent>>,
}

impl ForwardEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn ProgressStore>,
        settings: ForwardConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(None);
        Self {
            transport,
            store,
            governor: RateLimitGovernor::new(settings.default_retry_after_secs),
            settings,
            job: JobConfig::default(),
            run: JobRunState::default(),
            log: ResultLog::new(),
            control: Arc::new(JobControl::new()),
            status_line: Arc::new(status_tx),
            events: None,
        }
    }

    /// Route progress events to a new channel and return its receiver.
    /// Replaces any previous subscriber.
    pub fn subscribe_events(&mut self) -> mpsc::UnboundedReceiver<ForwardEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn control(&self) -> Arc<JobControl> {
        Arc::clone(&self.control)
    }

    /// The single user-visible status slot.
    pub fn status_line(&self) -> watch::Receiver<Option<String>> {
        self.status_line.subscribe()
    }

    pub fn rate_limit(&self) -> watch::Receiver<RateLimitState> {
        self.governor.subscribe()
    }

    pub fn status(&self) -> JobStatus {
        self.run.status
    }

    pub fn run_state(&self) -> &JobRunState {
        &self.run
    }

    pub fn job_config(&self) -> &JobConfig {
        &self.job
    }

    pub fn results(&self) -> &ResultLog {
        &self.log
    }

    /// Install a configuration produced by setup without starting a job.
    pub fn set_job_config(&mut self, config: JobConfig) {
        self.job = config;
    }

    /// Rehydrate from persisted state.
    ///
    /// A stored `Running` status means the previous process exited mid-run;
    /// it is restored as `Paused` at the id that was in flight.
    pub fn restore(&mut self, job: JobConfig, results: ResultLog, run: Option<JobRunState>) {
        self.job = job;
        self.log = results;
        self.run = run.unwrap_or_default();
        if self.run.status == JobStatus::Running {
            self.run.status = JobStatus::Paused;
            if self.run.current_message_id.is_none() {
                self.run.current_message_id = Some(self.run.range_start);
            }
        }
        self.control.clear_pause();
        self.control.set_status(self.run.status);
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Start a new job for `config` and run it until it pauses or completes.
    ///
    /// Starting while paused resumes the paused job instead.
    pub async fn start(&mut self, config: JobConfig) -> Result<RunOutcome, JobError> {
        match self.run.status {
            JobStatus::Running => return Err(JobError::AlreadyRunning),
            JobStatus::Paused => return self.resume().await,
            JobStatus::Idle | JobStatus::Completed => {}
        }

        if !config.setup_completed {
            return Err(JobError::ConfigInvalid(
                "setup has not been completed".to_string(),
            ));
        }
        config.validate_chats()?;

        self.job = config;
        self.control.clear_pause();
        // Pausable from here on; a pause during the anchor request stops at range_start.
        self.control.set_status(JobStatus::Running);
        self.set_status_line("Sending initial message to target chat...");

        let anchor = match self
            .transport
            .send_text(&self.job.target_chat, &self.settings.anchor_text)
            .await
        {
            Ok(msg) => match u64::try_from(msg.message_id) {
                Ok(id) if id > 0 => id,
                _ => {
                    self.abandon_start();
                    return Err(JobError::AnchorSendFailed(
                        "anchor message has no id".to_string(),
                    ));
                }
            },
            Err(failure) => {
                self.abandon_start();
                log_component!(
                    error,
                    "engine",
                    "Anchor message failed",
                    error = failure.to_string()
                );
                return Err(JobError::AnchorSendFailed(failure.description));
            }
        };

        let range_start = self.job.range_start();
        let range_end = anchor - 1;
        self.log.clear();
        self.run = JobRunState {
            status: JobStatus::Running,
            current_message_id: None,
            target_anchor_message_id: Some(anchor),
            range_start,
            range_end,
            ..Default::default()
        };
        self.checkpoint().await;

        log_component!(
            info,
            "engine",
            "Forwarding started",
            anchor = anchor,
            range_start = range_start,
            range_end = range_end
        );
        self.emit(ForwardEvent::Started {
            anchor_message_id: anchor,
            range_start,
            range_end,
        });

        Ok(self.run_from(range_start).await)
    }

    /// Request a pause of the running job.
    pub fn pause(&self) -> Result<(), JobError> {
        self.control.pause()
    }

    /// Continue a paused job from its recorded position.
    pub async fn resume(&mut self) -> Result<RunOutcome, JobError> {
        if self.run.target_anchor_message_id.is_none() {
            return Err(JobError::CannotResume);
        }
        if self.run.status != JobStatus::Paused {
            return Err(JobError::InvalidTransition {
                from: self.run.status,
                op: "resume",
            });
        }

        let from = self
            .run
            .current_message_id
            .unwrap_or(self.run.range_start)
            .max(self.run.range_start);
        self.control.clear_pause();
        self.run.status = JobStatus::Running;
        self.control.set_status(JobStatus::Running);

        log_component!(info, "engine", "Forwarding resumed", from = from);
        self.set_status_line(&format!("Resuming from message {}...", from));
        self.emit(ForwardEvent::Resumed { from });

        Ok(self.run_from(from).await)
    }

    /// Drop all job state and return to `Idle`. Safe to call in any state.
    pub async fn reset(&mut self) {
        self.control.clear_pause();
        self.run = JobRunState::default();
        self.log.clear();
        self.job.setup_completed = false;
        self.control.set_status(JobStatus::Idle);
        self.governor.clear();
        self.status_line.send_replace(None);

        self.store.clear_all().await;
        log_component!(info, "engine", "Job reset");
    }

    // ------------------------------------------------------------------
    // Iteration
    // ------------------------------------------------------------------

    async fn run_from(&mut self, from: u64) -> RunOutcome {
        let mut pause_rx = self.control.pause_signal();
        let total = self.run.range_len();
        let delay = Duration::from_millis(self.settings.inter_message_delay_ms);
        let mut msg_id = from;

        while msg_id <= self.run.range_end {
            if self.control.pause_requested() {
                return self.stop_paused(msg_id).await;
            }

            self.run.current_message_id = Some(msg_id);
            self.set_status_line(&format!(
                "Forwarding message {} ({}/{})...",
                msg_id,
                msg_id - self.run.range_start + 1,
                total
            ));

            let outcome = self
                .transport
                .forward_one(&self.job.source_chat, &self.job.target_chat, msg_id)
                .await;

            match outcome {
                Ok(message) => {
                    let result = classify::success_result(msg_id, &message, Utc::now());
                    self.run.success_count += 1;
                    self.emit(ForwardEvent::Forwarded {
                        original_id: msg_id,
                        forwarded_id: result.forwarded_id,
                        kind: result.message_kind,
                    });
                    self.log.push(result);
                    if self.job.delete_original_after_forward {
                        self.delete_original(msg_id).await;
                    }
                }
                Err(failure) => match self.governor.classify_failure(&failure) {
                    Verdict::Retryable(seconds) => {
                        match self.wait_out_throttle(msg_id, seconds, &mut pause_rx).await {
                            CooldownOutcome::Elapsed => continue,
                            CooldownOutcome::Cancelled => return self.stop_paused(msg_id).await,
                        }
                    }
                    Verdict::Terminal(kind) => self.record_failure(msg_id, kind, &failure),
                    Verdict::Ok => self.record_failure(msg_id, TerminalKind::Other, &failure),
                },
            }

            self.run.processed_count += 1;
            if self.settings.checkpoint_every > 0
                && self.run.processed_count % self.settings.checkpoint_every as u64 == 0
            {
                self.checkpoint().await;
            }

            tokio::time::sleep(delay).await;

            if self.control.pause_requested() && msg_id < self.run.range_end {
                return self.stop_paused(msg_id + 1).await;
            }
            msg_id += 1;
        }

        self.complete().await
    }

    async fn wait_out_throttle(
        &mut self,
        msg_id: u64,
        seconds: u64,
        pause_rx: &mut watch::Receiver<bool>,
    ) -> CooldownOutcome {
        log_component!(
            warn,
            "engine",
            "Rate limited",
            message_id = msg_id,
            error = JobError::Throttled(seconds).to_string()
        );
        self.checkpoint().await;
        self.set_status_line(&format!(
            "Rate limited! Waiting {}s before retrying message {}...",
            seconds, msg_id
        ));
        self.emit(ForwardEvent::Throttled {
            message_id: msg_id,
            retry_after_seconds: seconds,
        });

        let events = self.events.clone();
        self.governor
            .await_cooldown(
                seconds,
                |remaining| {
                    if let Some(tx) = &events {
                        let _ = tx.send(ForwardEvent::Countdown {
                            remaining_seconds: remaining,
                        });
                    }
                },
                pause_rx,
            )
            .await
    }

    fn record_failure(&mut self, msg_id: u64, kind: TerminalKind, failure: &ApiFailure) {
        let error = JobError::ForwardFailed(failure.description.clone());
        log_component!(
            debug,
            "engine",
            "Forward failed",
            message_id = msg_id,
            kind = kind.to_string(),
            error = error.to_string()
        );
        self.run.error_count += 1;
        self.emit(ForwardEvent::Failed {
            original_id: msg_id,
            kind,
            error: failure.description.clone(),
        });
        self.log
            .push(ForwardResult::failed(msg_id, failure.description.clone(), Utc::now()));
    }

    async fn delete_original(&self, msg_id: u64) {
        let outcome = self.transport.delete_one(&self.job.source_chat, msg_id).await;
        let error = match outcome {
            Ok(true) => return,
            Ok(false) => JobError::DeleteFailed("API returned false".to_string()),
            Err(failure) => JobError::DeleteFailed(failure.description),
        };
        log_component!(
            warn,
            "engine",
            "Could not delete original message",
            message_id = msg_id,
            error = error.to_string()
        );
    }

    /// Undo the pre-anchor `Running` publication after a failed start.
    fn abandon_start(&mut self) {
        self.control.clear_pause();
        self.control.set_status(self.run.status);
        self.status_line.send_replace(None);
    }

    async fn stop_paused(&mut self, at: u64) -> RunOutcome {
        self.run.status = JobStatus::Paused;
        self.run.current_message_id = Some(at);
        self.control.set_status(JobStatus::Paused);
        self.governor.clear();
        self.checkpoint().await;

        log_component!(info, "engine", "Forwarding paused", at = at);
        self.set_status_line(&format!(
            "Forwarding paused at message {}. Resume to continue...",
            at
        ));
        self.emit(ForwardEvent::Paused { at });
        RunOutcome::Paused { at }
    }

    async fn complete(&mut self) -> RunOutcome {
        let summary = RunSummary {
            success_count: self.run.success_count,
            error_count: self.run.error_count,
        };
        self.run.status = JobStatus::Completed;
        self.run.current_message_id = None;
        self.control.clear_pause();
        self.control.set_status(JobStatus::Completed);
        self.checkpoint().await;

        log_component!(
            info,
            "engine",
            "Forwarding completed",
            success = summary.success_count,
            failed = summary.error_count
        );
        let text = format!("Forwarding completed: {}", summary);
        self.set_status_line(&text);
        self.schedule_status_clear(text);
        self.emit(ForwardEvent::Completed(summary));
        RunOutcome::Completed(summary)
    }

    // ------------------------------------------------------------------
    // Side channels
    // ------------------------------------------------------------------

    /// Persist run state and results. Skipped until setup is completed.
    async fn checkpoint(&self) {
        if !self.job.setup_completed {
            return;
        }
        self.store.save_run_state(&self.run).await;
        self.store.save_results(&self.log.newest_first()).await;
    }

    fn set_status_line(&self, text: &str) {
        self.status_line.send_replace(Some(text.to_string()));
    }

    /// Clear the status line after the display period unless something newer replaced it.
    fn schedule_status_clear(&self, expected: String) {
        let slot = Arc::clone(&self.status_line);
        let after = Duration::from_secs(self.settings.status_clear_secs);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            slot.send_if_modified(|current| {
                if current.as_deref() == Some(expected.as_str()) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
    }

    fn emit(&self, event: ForwardEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
