//! Redis-backed result store.
//!
//! One [`ConnectionManager`] is shared by every request. It is created once,
//! behind a [`OnceCell`], so concurrent first requests wait on the same
//! initialization instead of racing to open their own connections.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::RedisResult;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{ResultStore, StoreError};
use crate::config::StoreSettings;
use crate::models::StoredRecord;

/// Keys requested per SCAN round trip.
const SCAN_BATCH: usize = 500;

/// Result store on a shared Redis instance.
#[derive(Clone)]
pub struct RedisResultStore {
    client: redis::Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    operation_timeout: Duration,
}

impl RedisResultStore {
    /// Create a store for the configured URL. No connection is opened yet.
    pub fn new(settings: &StoreSettings) -> Result<Self, StoreError> {
        let client = redis::Client::open(settings.redis_url.as_str())
            .map_err(|e| StoreError::Connection(format!("invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            operation_timeout: settings.operation_timeout,
        })
    }

    /// Open the shared connection now rather than on the first request.
    pub async fn connect(&self) -> Result<(), StoreError> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                info!("Opening Redis connection");
                bounded(self.operation_timeout, ConnectionManager::new(self.client.clone()))
                    .await?
                    .map_err(|e| StoreError::Connection(e.to_string()))
            })
            .await?;
        Ok(manager.clone())
    }
}

/// Apply the per-operation timeout.
async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout)
}

fn command_error(err: redis::RedisError) -> StoreError {
    StoreError::Command(err.to_string())
}

#[async_trait]
impl ResultStore for RedisResultStore {
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        let mut conn = self.connection().await?;

        let result: RedisResult<()> = bounded(
            self.operation_timeout,
            redis::cmd("SET").arg(key).arg(value).query_async(&mut conn),
        )
        .await?;
        result.map_err(command_error)?;

        debug!("SET {}", key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let mut conn = self.connection().await?;

        let result: RedisResult<Option<String>> = bounded(
            self.operation_timeout,
            redis::cmd("GET").arg(key).query_async(&mut conn),
        )
        .await?;

        match result.map_err(command_error)? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn scan_by_suffix(&self, suffix: &str) -> Result<Vec<String>, StoreError> {
        // Suffix components are restricted to [A-Za-z0-9_-], so no glob escaping is needed
        let pattern = format!("*{}", suffix);
        let mut conn = self.connection().await?;

        let scan = async {
            let mut keys = Vec::new();
            let mut cursor: u64 = 0;
            loop {
                let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await?;
                keys.extend(batch);
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            RedisResult::Ok(keys)
        };

        let mut keys = bounded(self.operation_timeout, scan)
            .await?
            .map_err(command_error)?;

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();

        debug!("SCAN MATCH {} -> {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        let result: RedisResult<String> = bounded(
            self.operation_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await?;
        result.map(|_| ()).map_err(command_error)
    }
}
