//! Configuration management for tgrelay
//!
//! This module provides configuration loading, saving, and global state management.
//! Configuration is loaded from `~/.tgrelay/config.json` with environment variable overrides.

mod types;
pub mod validate;

pub use types::*;

use crate::error::{RelayError, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Global configuration instance
static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

impl Config {
    /// Returns the tgrelay configuration directory path (~/.tgrelay)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tgrelay")
    }

    /// Returns the path to the config file (~/.tgrelay/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables can override config values using the pattern:
    /// `TGRELAY_SECTION_KEY`
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables follow the pattern: TGRELAY_SECTION_KEY
    fn apply_env_overrides(&mut self) {
        // Telegram
        if let Ok(val) = std::env::var("TGRELAY_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = val;
        }
        if let Ok(val) = std::env::var("TGRELAY_TELEGRAM_API_BASE") {
            self.telegram.api_base = val;
        }
        if let Ok(val) = std::env::var("TGRELAY_TELEGRAM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                self.telegram.timeout_secs = v;
            }
        }

        // Forward loop
        if let Ok(val) = std::env::var("TGRELAY_FORWARD_DELAY_MS") {
            if let Ok(v) = val.parse() {
                self.forward.inter_message_delay_ms = v;
            }
        }
        if let Ok(val) = std::env::var("TGRELAY_FORWARD_DEFAULT_RETRY_AFTER_SECS") {
            if let Ok(v) = val.parse() {
                self.forward.default_retry_after_secs = v;
            }
        }
        if let Ok(val) = std::env::var("TGRELAY_FORWARD_ANCHOR_TEXT") {
            self.forward.anchor_text = val;
        }

        // Storage
        if let Ok(val) = std::env::var("TGRELAY_STORAGE_DIR") {
            self.storage.dir = Some(val);
        }

        // Logging
        if let Ok(val) = std::env::var("TGRELAY_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("TGRELAY_LOG_FORMAT") {
            if let Ok(format) = serde_json::from_value(serde_json::Value::String(val)) {
                self.logging.format = format;
            }
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Initialize the global configuration.
    ///
    /// This should be called once at startup. Subsequent calls will return
    /// an error if the config is already initialized.
    pub fn init() -> Result<()> {
        let config = Self::load()?;
        CONFIG
            .set(RwLock::new(config))
            .map_err(|_| RelayError::Config("Configuration already initialized".to_string()))
    }

    /// Get a clone of the current global configuration.
    ///
    /// Returns default configuration if not yet initialized.
    pub fn get() -> Config {
        CONFIG
            .get()
            .and_then(|lock| lock.read().ok())
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Returns the directory holding session-scoped progress state.
    pub fn storage_dir(&self) -> PathBuf {
        match &self.storage.dir {
            Some(dir) => expand_home(dir),
            None => Self::dir().join("session"),
        }
    }

    /// Build the Bot API method URL prefix for the configured token.
    pub fn bot_url(&self) -> String {
        format!(
            "{}/bot{}",
            self.telegram.api_base.trim_end_matches('/'),
            self.telegram.bot_token
        )
    }
}

/// Expand ~ to home directory in a path string
fn expand_home(path: &str) -> PathBuf {
    if path.is_empty() {
        return PathBuf::from(path);
    }

    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            if path.len() > 1 && path.chars().nth(1) == Some('/') {
                return home.join(&path[2..]);
            }
            return home;
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.telegram.bot_token.is_empty());
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.forward.inter_message_delay_ms, 200);
        assert_eq!(config.forward.default_retry_after_secs, 30);
        assert_eq!(config.forward.status_clear_secs, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"forward": {"inter_message_delay_ms": 500}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.forward.inter_message_delay_ms, 500);
        // Defaults should apply to unspecified fields
        assert_eq!(config.forward.default_retry_after_secs, 30);
        assert_eq!(config.telegram.timeout_secs, 30);
    }

    #[test]
    fn test_bot_id() {
        let mut config = Config::default();
        assert_eq!(config.telegram.bot_id(), None);
        config.telegram.bot_token = "123456:ABC-DEF".to_string();
        assert_eq!(config.telegram.bot_id(), Some("123456"));
    }

    #[test]
    fn test_bot_url_trims_trailing_slash() {
        let mut config = Config::default();
        config.telegram.api_base = "http://localhost:8081/".to_string();
        config.telegram.bot_token = "1:x".to_string();
        assert_eq!(config.bot_url(), "http://localhost:8081/bot1:x");
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/.tgrelay"), home.join(".tgrelay"));
        assert_eq!(
            expand_home("/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(expand_home(""), PathBuf::from(""));
    }

    #[test]
    fn test_storage_dir_default_and_override() {
        let mut config = Config::default();
        assert_eq!(config.storage_dir(), Config::dir().join("session"));
        config.storage.dir = Some("/tmp/tgrelay-state".to_string());
        assert_eq!(config.storage_dir(), PathBuf::from("/tmp/tgrelay-state"));
    }

    #[test]
    fn test_env_override() {
        env::set_var("TGRELAY_TELEGRAM_BOT_TOKEN", "42:env-token");
        env::set_var("TGRELAY_FORWARD_DELAY_MS", "750");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.telegram.bot_token, "42:env-token");
        assert_eq!(config.forward.inter_message_delay_ms, 750);

        env::remove_var("TGRELAY_TELEGRAM_BOT_TOKEN");
        env::remove_var("TGRELAY_FORWARD_DELAY_MS");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.forward.checkpoint_every = 7;
        config.telegram.timeout_secs = 5;
        config.save_to_path(&config_path).unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap();
        assert_eq!(loaded.forward.checkpoint_every, 7);
        assert_eq!(loaded.telegram.timeout_secs, 5);
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.json");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.forward.status_clear_secs, 10);
    }
}
