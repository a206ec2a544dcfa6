//! Domain models for the homework results server.

pub mod github_oidc;
pub mod submission;

// Re-export commonly used types
pub use github_oidc::{Audience, GitHubOidcClaims};
pub use submission::{StorageKey, StoredRecord, Submission, SubmissionPayload};
