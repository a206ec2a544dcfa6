//! GitHub Actions OIDC token verification service.
//!
//! Verifies JWT tokens from GitHub Actions using the OIDC provider's JWKS.
//!
//! Security features:
//! - RS256 signature verification (algorithm pinned, no fallback)
//! - Signing keys resolved by `kid` through a rotating, cached JWKS
//! - Audience validated by the JWT library against a single configured value
//! - Issuer compared separately by exact string equality
//! - Generic error messages to clients; the specific reason is logged server-side

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::config::GitHubOidcSettings;
use crate::models::GitHubOidcClaims;
use crate::services::jwks::{JwksKeyResolver, KeyResolutionError, SigningKeyResolver};

/// Why a token was rejected. Only ever logged; clients see a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("signing key unresolvable: {0}")]
    KeyUnresolvable(#[from] KeyResolutionError),

    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("token expired")]
    Expired,

    #[error("audience mismatch")]
    AudienceMismatch,

    #[error("issuer mismatch")]
    IssuerMismatch,
}

impl AuthenticationError {
    /// Stable reason code for diagnostics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthenticationError::MalformedToken(_) => "malformed_token",
            AuthenticationError::KeyUnresolvable(_) => "key_unresolvable",
            AuthenticationError::SignatureInvalid(_) => "signature_invalid",
            AuthenticationError::Expired => "expired",
            AuthenticationError::AudienceMismatch => "audience_mismatch",
            AuthenticationError::IssuerMismatch => "issuer_mismatch",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthenticationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthenticationError::SignatureInvalid(err.to_string())
            }
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                AuthenticationError::Expired
            }
            ErrorKind::InvalidAudience => AuthenticationError::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => {
                AuthenticationError::AudienceMismatch
            }
            ErrorKind::InvalidIssuer => AuthenticationError::IssuerMismatch,
            _ => AuthenticationError::MalformedToken(err.to_string()),
        }
    }
}

/// Turns a bearer token into a trusted claim set.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &SecretString) -> Result<GitHubOidcClaims, AuthenticationError>;
}

/// GitHub Actions OIDC token verifier.
#[derive(Clone)]
pub struct GitHubOidcVerifier {
    issuer: String,
    audience: String,
    resolver: Arc<dyn SigningKeyResolver>,
}

impl GitHubOidcVerifier {
    /// Create a verifier that resolves keys from the issuer's JWKS endpoint.
    pub fn new(settings: &GitHubOidcSettings) -> Result<Self, KeyResolutionError> {
        let resolver = JwksKeyResolver::new(settings)?;

        info!(
            "GitHub OIDC verifier initialized (issuer={}, jwks_url={}, audience={})",
            settings.issuer,
            resolver.jwks_url(),
            settings.audience
        );

        Ok(Self::with_resolver(settings, Arc::new(resolver)))
    }

    /// Create a verifier with a caller-supplied key resolver.
    pub fn with_resolver(
        settings: &GitHubOidcSettings,
        resolver: Arc<dyn SigningKeyResolver>,
    ) -> Self {
        Self {
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            resolver,
        }
    }
}

#[async_trait]
impl TokenVerifier for GitHubOidcVerifier {
    async fn verify(&self, token: &SecretString) -> Result<GitHubOidcClaims, AuthenticationError> {
        // Header is not secret; decoding it does not check the signature
        let header = decode_header(token.expose_secret())
            .map_err(|e| AuthenticationError::MalformedToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthenticationError::MalformedToken("missing 'kid' header".into()))?;

        let decoding_key = self.resolver.resolve(&kid).await?;

        // Issuer is checked below by exact comparison, not by the library
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);

        let claims =
            decode::<GitHubOidcClaims>(token.expose_secret(), &decoding_key, &validation)?.claims;

        if claims.iss != self.issuer {
            return Err(AuthenticationError::IssuerMismatch);
        }

        debug!(
            "GitHub OIDC token verified: repo={}, actor={:?}, workflow={:?}, run_id={:?}",
            claims.repository, claims.actor, claims.workflow, claims.run_id
        );

        Ok(claims)
    }
}
