//! Key-value storage trait and the in-memory implementation

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::Result;

/// Flat asynchronous key-value store. No transactions: last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write several keys in one operation
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<()>;

    /// Remove keys; absent keys are ignored
    async fn remove(&self, keys: &[&str]) -> Result<()>;

    /// All keys currently stored
    async fn keys(&self) -> Result<Vec<String>>;

    /// Write a single key
    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Volatile store, used by tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<()> {
        let mut guard = self.entries.write().await;
        for (key, value) in entries {
            guard.insert(key, value);
        }
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut guard = self.entries.write().await;
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
