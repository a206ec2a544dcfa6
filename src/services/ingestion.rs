//! Submission ingestion: verify, authorize, derive key, store.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info};

use crate::error::{AppResult, ValidationError};
use crate::models::{StorageKey, StoredRecord, SubmissionPayload};
use crate::services::github_oidc::TokenVerifier;
use crate::services::store::ResultStore;

/// A stored submission and the key it was stored under.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub key: StorageKey,
    pub record: StoredRecord,
}

/// Accepts signed test result submissions from CI.
#[derive(Clone)]
pub struct IngestionService {
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn ResultStore>,
}

impl IngestionService {
    pub fn new(verifier: Arc<dyn TokenVerifier>, store: Arc<dyn ResultStore>) -> Self {
        Self { verifier, store }
    }

    /// Verify the token, check the payload against it, and store the record.
    ///
    /// The token only proves that *some* workflow produced the request; the
    /// equality check between its `repository` claim and the submitted
    /// repository is what binds it to this submission. Nothing is written
    /// unless every check passes.
    pub async fn ingest(
        &self,
        token: &SecretString,
        payload: SubmissionPayload,
    ) -> AppResult<IngestOutcome> {
        let claims = self.verifier.verify(token).await?;

        let submission = payload.validate()?;

        if claims.repository != submission.student_repository {
            debug!(
                "Repository mismatch: token={}, payload={}",
                claims.repository, submission.student_repository
            );
            return Err(ValidationError::RepositoryMismatch.into());
        }

        let key = StorageKey::from_repository(&claims.repository)?;

        let record = StoredRecord {
            github_sub: claims.sub,
            repository: claims.repository,
            commit: submission.commit_sha,
            test_result: submission.test_result,
        };

        self.store.put(&key.to_string(), &record).await?;

        info!(
            key = %key,
            commit = %record.commit,
            "Result verified and stored"
        );

        Ok(IngestOutcome { key, record })
    }
}
