//! Rate-limit governor.
//!
//! Classifies transport outcomes into ok / retryable / terminal and waits out
//! throttling penalties with a cancellable, per-second countdown.

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::sync::watch;

use super::types::RateLimitState;
use crate::log_component;
use crate::transport::{ApiFailure, ApiResult, NETWORK_ERROR_CODE};

static THROTTLE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b429\b|too many requests").unwrap());

static RETRY_AFTER_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)retry[_ ]after[:\s]*(\d+)").unwrap());

/// Why a failed call will not be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest,
    Network,
    Server,
    Other,
}

impl std::fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TerminalKind::Unauthorized => "unauthorized",
            TerminalKind::Forbidden => "forbidden",
            TerminalKind::NotFound => "not found",
            TerminalKind::BadRequest => "bad request",
            TerminalKind::Network => "network",
            TerminalKind::Server => "server error",
            TerminalKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Governor decision for one transport outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    /// Throttled; retry the same call after this many seconds.
    Retryable(u64),
    Terminal(TerminalKind),
}

/// How a cooldown wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    Elapsed,
    /// A pause was requested while waiting.
    Cancelled,
}

/// Extract a wait value from an error description (`retry_after:35`, `retry after 35`).
pub fn parse_retry_after(description: &str) -> Option<u64> {
    RETRY_AFTER_TEXT
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Returns `true` if the failure is a throttling signal.
///
/// Bot API errors are judged by `error_code` alone. The description is only
/// sniffed when no API code is available (network-level failures).
pub fn is_throttled(failure: &ApiFailure) -> bool {
    match failure.error_code {
        429 => true,
        NETWORK_ERROR_CODE => THROTTLE_TEXT.is_match(&failure.description),
        _ => false,
    }
}

fn terminal_kind(failure: &ApiFailure) -> TerminalKind {
    match failure.error_code {
        NETWORK_ERROR_CODE => TerminalKind::Network,
        401 => TerminalKind::Unauthorized,
        403 => TerminalKind::Forbidden,
        400 if failure.description.to_lowercase().contains("not found") => {
            TerminalKind::NotFound
        }
        400 => TerminalKind::BadRequest,
        500..=599 => TerminalKind::Server,
        _ => TerminalKind::Other,
    }
}

/// Waits out throttling penalties and publishes the countdown.
pub struct RateLimitGovernor {
    default_retry_after_secs: u64,
    state_tx: watch::Sender<RateLimitState>,
}

impl RateLimitGovernor {
    pub fn new(default_retry_after_secs: u64) -> Self {
        let (state_tx, _) = watch::channel(RateLimitState::default());
        Self {
            default_retry_after_secs: default_retry_after_secs.max(1),
            state_tx,
        }
    }

    /// Classify any transport outcome.
    pub fn classify<T>(&self, outcome: &ApiResult<T>) -> Verdict {
        match outcome {
            Ok(_) => Verdict::Ok,
            Err(failure) => self.classify_failure(failure),
        }
    }

    /// Classify a failed call. Never returns [`Verdict::Ok`].
    ///
    /// Wait time comes from `parameters.retry_after`, then from a marker in the
    /// description, then from the configured default. A zero wait counts as absent.
    pub fn classify_failure(&self, failure: &ApiFailure) -> Verdict {
        if !is_throttled(failure) {
            return Verdict::Terminal(terminal_kind(failure));
        }
        let seconds = failure
            .retry_after
            .filter(|s| *s > 0)
            .or_else(|| parse_retry_after(&failure.description).filter(|s| *s > 0))
            .unwrap_or(self.default_retry_after_secs);
        Verdict::Retryable(seconds)
    }

    /// Live cooldown state for the view layer.
    pub fn subscribe(&self) -> watch::Receiver<RateLimitState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> RateLimitState {
        *self.state_tx.borrow()
    }

    /// Drop any displayed cooldown.
    pub fn clear(&self) {
        self.state_tx.send_replace(RateLimitState::default());
    }

    /// Wait `seconds`, calling `on_tick(remaining)` for `seconds..=1`.
    ///
    /// Returns [`CooldownOutcome::Cancelled`] as soon as `pause` reads `true`,
    /// including when it already does on entry.
    pub async fn await_cooldown<F>(
        &self,
        seconds: u64,
        mut on_tick: F,
        pause: &mut watch::Receiver<bool>,
    ) -> CooldownOutcome
    where
        F: FnMut(u64),
    {
        log_component!(info, "governor", "Cooldown started", seconds = seconds);

        let mut remaining = seconds;
        let outcome = loop {
            if *pause.borrow() {
                break CooldownOutcome::Cancelled;
            }
            if remaining == 0 {
                break CooldownOutcome::Elapsed;
            }
            self.state_tx.send_replace(RateLimitState {
                active: true,
                retry_after_seconds: seconds,
                remaining_seconds: remaining,
            });
            on_tick(remaining);

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    remaining -= 1;
                }
                _ = pause_raised(pause) => {
                    break CooldownOutcome::Cancelled;
                }
            }
        };

        self.clear();
        if outcome == CooldownOutcome::Cancelled {
            log_component!(
                info,
                "governor",
                "Cooldown cancelled by pause",
                remaining = remaining
            );
        }
        outcome
    }
}

/// Resolves once the pause flag is `true`. Never resolves if the sender is gone.
async fn pause_raised(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|paused| *paused).await.is_err() {
        std::future::pending::<()>().await;
    }
}
