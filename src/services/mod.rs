//! Business logic services.

pub mod github_oidc;
pub mod ingestion;
pub mod jwks;
pub mod query;
pub mod store;

pub use github_oidc::{AuthenticationError, GitHubOidcVerifier, TokenVerifier};
pub use ingestion::{IngestOutcome, IngestionService};
pub use jwks::{JwksKeyResolver, KeyResolutionError, SigningKeyResolver};
pub use query::{QueryOutcome, QueryService, ResultQuery};
pub use store::{MemoryResultStore, RedisResultStore, ResultStore, StoreError};
