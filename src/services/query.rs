//! Result lookup by (userId, taskId).

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};
use utoipa::IntoParams;

use crate::error::{AppError, AppResult, ValidationError};
use crate::models::submission::{is_identifier, is_username};
use crate::models::{StorageKey, StoredRecord};
use crate::services::store::ResultStore;

/// Query string for `GET /results`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ResultQuery {
    /// Student identifier.
    pub user_id: Option<String>,
    /// Task identifier.
    pub task_id: Option<String>,
    /// GitHub username; when given, the record is fetched by its exact key.
    pub username: Option<String>,
}

/// A record and the key it was found under.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub key: String,
    pub record: StoredRecord,
}

/// Resolves stored results for a student and task.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn ResultStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Find the record for a (userId, taskId) pair.
    ///
    /// Without a username the store is scanned for keys ending in
    /// `-userId-taskId`. When several usernames share the pair, the first
    /// key returned by the scan wins; that choice is arbitrary and logged.
    pub async fn query(&self, query: &ResultQuery) -> AppResult<QueryOutcome> {
        let user_id = non_empty(&query.user_id).ok_or(ValidationError::MissingQueryParams)?;
        let task_id = non_empty(&query.task_id).ok_or(ValidationError::MissingQueryParams)?;

        if !is_identifier(user_id) || !is_identifier(task_id) {
            return Err(ValidationError::InvalidQueryParams.into());
        }

        let key = match non_empty(&query.username) {
            Some(username) => {
                if !is_username(username) {
                    return Err(ValidationError::InvalidQueryParams.into());
                }
                StorageKey::new(username, user_id, task_id)
                    .ok_or(ValidationError::InvalidQueryParams)?
                    .to_string()
            }
            None => self.first_match(user_id, task_id).await?,
        };

        let record = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| not_found(user_id, task_id))?;

        debug!("Resolved userId={} taskId={} to key {}", user_id, task_id, key);
        Ok(QueryOutcome { key, record })
    }

    async fn first_match(&self, user_id: &str, task_id: &str) -> AppResult<String> {
        let keys = self
            .store
            .scan_by_suffix(&StorageKey::suffix(user_id, task_id))
            .await?;

        if keys.len() > 1 {
            warn!(
                "{} keys match userId={} taskId={}, returning '{}' (candidates: {:?})",
                keys.len(),
                user_id,
                task_id,
                keys[0],
                keys
            );
        }

        keys.into_iter()
            .next()
            .ok_or_else(|| not_found(user_id, task_id))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn not_found(user_id: &str, task_id: &str) -> AppError {
    AppError::NotFound(format!(
        "No data found for userId '{}' and taskId '{}'",
        user_id, task_id
    ))
}
