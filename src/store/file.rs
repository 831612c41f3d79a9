//! File-backed progress store: one file per key inside a session directory.
//!
//! Writes go to a temporary file first and are renamed into place, so a crash
//! mid-write leaves the previous value intact.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::ProgressStore;
use crate::config::Config;
use crate::error::{JobError, RelayError, Result};

/// Progress store rooted at a directory (`~/.tgrelay/session` by default).
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the configured storage directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(RelayError::Job(JobError::StorageUnavailable(format!(
                "invalid store key '{}'",
                key
            ))));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl ProgressStore for FileProgressStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!(".{}.tmp", key));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove_raw(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
