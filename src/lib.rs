//! tgrelay - Resumable, rate-limit aware bulk forwarding for the Telegram Bot API

pub mod config;
pub mod error;
pub mod export;
pub mod forward;
pub mod lifecycle;
pub mod store;
pub mod transport;
pub mod utils;

pub use config::Config;
pub use error::{JobError, RelayError, Result};
pub use forward::{
    ForwardEngine, ForwardEvent, ForwardResult, JobConfig, JobControl, JobRunState, JobStatus,
    RateLimitGovernor, ResultLog, RunOutcome, RunSummary,
};
pub use lifecycle::{Mounted, SessionLifecycle, SetupDraft};
pub use store::{FileProgressStore, MemoryProgressStore, ProgressStore};
pub use transport::{ApiFailure, ApiResult, BotApiTransport, ChatId, Transport};
