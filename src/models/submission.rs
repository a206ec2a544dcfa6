//! Submission, stored record, and storage key models.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Minimum number of `/`-separated segments in a student repository string.
const MIN_REPOSITORY_SEGMENTS: usize = 5;

/// Test result submission sent by the CI runner.
///
/// Every field is optional at the serde level so that a missing field is
/// reported as a validation error instead of a JSON decoding error.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    /// Repository path, e.g. "https://github.com/alice/42-7".
    pub student_repository: Option<String>,
    /// Commit the tests ran against.
    pub commit_sha: Option<String>,
    /// Test runner output, stored as-is.
    #[schema(value_type = Object)]
    pub test_result: Option<Value>,
}

/// A submission with all mandatory fields present.
#[derive(Debug, Clone)]
pub struct Submission {
    pub student_repository: String,
    pub commit_sha: String,
    pub test_result: Value,
}

impl SubmissionPayload {
    /// Check that every mandatory field is present and non-empty.
    pub fn validate(self) -> Result<Submission, ValidationError> {
        let student_repository = self
            .student_repository
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingFields)?;
        let commit_sha = self
            .commit_sha
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingFields)?;
        let test_result = self
            .test_result
            .filter(|v| !v.is_null())
            .ok_or(ValidationError::MissingFields)?;

        Ok(Submission {
            student_repository,
            commit_sha,
            test_result,
        })
    }
}

/// Persisted test result, serialized as JSON under its [`StorageKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredRecord {
    /// Subject of the OIDC token that authorized the write.
    pub github_sub: String,
    /// Repository from the verified token.
    pub repository: String,
    /// Commit SHA from the submission.
    pub commit: String,
    /// Test runner output.
    #[serde(rename = "testResult")]
    #[schema(value_type = Object)]
    pub test_result: Value,
}

/// Storage key derived from a student repository: `username-userId-taskId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    username: String,
    user_id: String,
    task_id: String,
}

impl StorageKey {
    /// Build a key from already separated components, validating each one.
    pub fn new(username: &str, user_id: &str, task_id: &str) -> Option<Self> {
        if !is_username(username) || !is_identifier(user_id) || !is_identifier(task_id) {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            user_id: user_id.to_string(),
            task_id: task_id.to_string(),
        })
    }

    /// Parse a repository string of the shape `.../<username>/<userId>-<taskId>`.
    ///
    /// The string comes from the request body, so it is treated as untrusted:
    /// at least five segments are required, the last one must split into
    /// exactly two identifiers, and every component is restricted to a safe
    /// character set so it cannot smuggle pattern syntax into the store.
    pub fn from_repository(repository: &str) -> Result<Self, ValidationError> {
        let segments: Vec<&str> = repository.split('/').collect();
        if segments.len() < MIN_REPOSITORY_SEGMENTS {
            return Err(ValidationError::MalformedRepository);
        }

        let last = segments[segments.len() - 1];
        let username = segments[segments.len() - 2];

        let (user_id, task_id) = last
            .split_once('-')
            .ok_or(ValidationError::MalformedRepository)?;

        Self::new(username, user_id, task_id).ok_or(ValidationError::MalformedRepository)
    }

    /// Suffix shared by every key for a (userId, taskId) pair.
    pub fn suffix(user_id: &str, task_id: &str) -> String {
        format!("-{}-{}", user_id, task_id)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.username, self.user_id, self.task_id)
    }
}

/// `[A-Za-z0-9_]+`: user and task identifiers. Hyphens are the key separator.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `[A-Za-z0-9._-]+`: GitHub usernames plus the characters allowed in repo names.
pub fn is_username(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
