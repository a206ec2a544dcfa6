//! In-memory result store for development and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ResultStore, StoreError};
use crate::models::StoredRecord;

/// Result store keeping JSON-encoded records in a [`BTreeMap`].
///
/// Values go through the same JSON encoding as the Redis store so both
/// backends round-trip records identically. Data is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryResultStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_str(value)?)),
            None => Ok(None),
        }
    }

    async fn scan_by_suffix(&self, suffix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|key| key.ends_with(suffix))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
