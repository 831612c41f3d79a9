//! Logging initialization for tgrelay.
//!
//! Supports three formats:
//! - `pretty`: default tracing pretty-print (human-readable, coloured)
//! - `component`: `[timestamp] [LEVEL] target message {fields}`, compact and grep-friendly;
//!   use the [`log_component!`] macro to add a `component` field for per-subsystem filtering
//! - `json`: structured JSON lines for log aggregators

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// Falls back to `RUST_LOG` env var; if unset, uses `cfg.level`.
/// Logs go to stderr so they never interleave with command output on stdout.
pub fn init_logging(cfg: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    match cfg.format {
        LogFormat::Json => {
            let file = cfg.file.as_ref().and_then(|path| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| eprintln!("tgrelay: cannot open log file {}: {}", path, e))
                    .ok()
            });
            match file {
                Some(file) => {
                    tracing_subscriber::fmt()
                        .json()
                        .with_env_filter(filter)
                        .with_writer(std::sync::Mutex::new(file))
                        .init();
                }
                None => {
                    tracing_subscriber::fmt()
                        .json()
                        .with_env_filter(filter)
                        .with_writer(std::io::stderr)
                        .init();
                }
            }
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        // Component-tagged events are emitted via the `log_component!` macro
        // which adds a structured `component` field, no custom layer needed.
        LogFormat::Component => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .init();
        }
    }
}

/// Emit a component-tagged tracing event.
///
/// Works with any tracing level (`trace`, `debug`, `info`, `warn`, `error`).
/// The `component` field makes it easy to grep logs by subsystem:
///
/// ```
/// # use tgrelay::log_component;
/// log_component!(info, "engine", "job started");
/// log_component!(warn, "governor", "throttled", retry_after = 30u64, message_id = 250u64);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($key:ident = $val:expr),+ $(,)?) => {
        tracing::$level!(component = $component, $($key = $val,)+ $msg)
    };
}
