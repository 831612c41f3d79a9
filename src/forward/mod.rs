//! Forward module - the bulk forwarding job.
//!
//! - [`engine`]: the resumable, pausable job runner and its [`JobControl`] handle
//! - [`governor`]: throttling classification and cancellable cooldowns
//! - [`classify`]: sender provenance and message kind of forwarded payloads
//! - [`results`]: the append-only result log and its statistics
//! - [`types`]: job configuration, run state and progress events

pub mod classify;
pub mod engine;
pub mod governor;
pub mod results;
pub mod types;

pub use engine::{ForwardEngine, JobControl};
pub use governor::{CooldownOutcome, RateLimitGovernor, TerminalKind, Verdict};
pub use results::{LogStats, ResultLog, SenderSummary};
pub use types::{
    ForwardEvent, ForwardResult, JobConfig, JobRunState, JobStatus, MessageKind, OriginType,
    RateLimitState, ResultStatus, RunOutcome, RunSummary, SenderInfo,
};
