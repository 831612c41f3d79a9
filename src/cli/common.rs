//! Shared CLI helpers used across multiple command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tgrelay::config::Config;
use tgrelay::forward::ForwardEngine;
use tgrelay::lifecycle::{Mounted, SessionLifecycle};
use tgrelay::store::{FileProgressStore, ProgressStore};
use tgrelay::transport::BotApiTransport;

/// Everything a command needs to act on the persisted job.
pub(crate) struct RelayContext {
    pub config: Config,
    pub transport: Arc<BotApiTransport>,
    pub lifecycle: SessionLifecycle,
    pub engine: ForwardEngine,
    pub mounted: Mounted,
}

impl RelayContext {
    /// Load config, mount the session and check the bot credential.
    pub async fn open() -> Result<Self> {
        let config = Config::load().with_context(|| "Failed to load configuration")?;

        let store: Arc<dyn ProgressStore> = Arc::new(FileProgressStore::from_config(&config));
        let transport = Arc::new(BotApiTransport::from_config(&config.telegram));
        let mut engine =
            ForwardEngine::new(transport.clone(), Arc::clone(&store), config.forward.clone());
        let lifecycle = SessionLifecycle::new(store);

        let mounted = lifecycle.mount(&mut engine).await;
        if lifecycle
            .observe_credential(&config.telegram.bot_token, &mut engine)
            .await
        {
            println!("Bot token changed since the last run; the previous job was discarded.");
            println!("Run `tgrelay setup` again before forwarding.");
            println!();
        }

        Ok(Self {
            config,
            transport,
            lifecycle,
            engine,
            mounted,
        })
    }
}

/// Lifecycle over the configured store without mounting the session.
pub(crate) fn unmounted_lifecycle() -> Result<SessionLifecycle> {
    let config = Config::load().with_context(|| "Failed to load configuration")?;
    Ok(SessionLifecycle::new(Arc::new(
        FileProgressStore::from_config(&config),
    )))
}

/// Expand `~/` prefix to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Mask a bot token for display: keep the bot id, hide the secret.
pub(crate) fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, secret)) if !secret.is_empty() => format!("{}:***", id),
        _ if token.is_empty() => "not set".to_string(),
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("123456:ABC-secret"), "123456:***");
        assert_eq!(mask_token(""), "not set");
        assert_eq!(mask_token("garbage"), "***");
    }

    #[test]
    fn test_expand_tilde_passthrough() {
        assert_eq!(expand_tilde("out/file.csv"), PathBuf::from("out/file.csv"));
    }
}
