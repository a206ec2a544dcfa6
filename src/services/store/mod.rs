//! Result store facade over the shared key-value backend.
//!
//! Three operations are needed: overwrite by key, read by key, and list
//! keys ending in a `-userId-taskId` suffix (the querying caller does not
//! know the username). Records are stored as JSON.

mod memory;
mod redis_store;

use async_trait::async_trait;

use crate::models::StoredRecord;

pub use self::memory::MemoryResultStore;
pub use self::redis_store::RedisResultStore;

/// Result store operation failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("operation timed out")]
    Timeout,

    #[error("stored value is not a valid record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence for test result records.
///
/// `put` is an unconditional overwrite (last write wins). `scan_by_suffix`
/// returns keys in no particular order.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError>;

    async fn scan_by_suffix(&self, suffix: &str) -> Result<Vec<String>, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
