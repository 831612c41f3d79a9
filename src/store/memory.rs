//! In-memory progress store, used by tests and when no storage directory is usable.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ProgressStore;
use crate::error::Result;

/// Progress store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_raw(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = MemoryProgressStore::new();
        assert!(store.remove_raw("nope").await.is_ok());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryProgressStore::new();
        store.write_raw("k", "1").await.unwrap();
        store.write_raw("k", "2").await.unwrap();
        assert_eq!(store.read_raw("k").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len().await, 1);
    }
}
