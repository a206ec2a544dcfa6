//! Signing key resolution for GitHub Actions OIDC tokens.
//!
//! Keys are fetched from the provider's JWKS endpoint (derived from the issuer)
//! and cached by key ID. A `kid` that is not in the cache forces one refresh so
//! that key rotation is picked up without a restart; forced refreshes are
//! rate limited so unknown `kid`s cannot be used to hammer the provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::GitHubOidcSettings;

/// JWKS cache TTL (24 hours).
const JWKS_CACHE_TTL: Duration = Duration::from_secs(86400);

/// Minimum spacing between forced refreshes triggered by unknown key IDs.
const JWKS_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// How long stale keys are served without retrying after a failed refresh.
const JWKS_FAILURE_BACKOFF: Duration = Duration::from_secs(30);

/// HTTP connect timeout for JWKS fetch.
const JWKS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure to map a key ID to a public key.
#[derive(Debug, thiserror::Error)]
pub enum KeyResolutionError {
    #[error("unknown key ID '{0}'")]
    UnknownKey(String),

    #[error("JWKS fetch failed: {0}")]
    Fetch(String),
}

/// Maps a JWT `kid` header to the public key that verifies it.
#[async_trait]
pub trait SigningKeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, KeyResolutionError>;
}

/// Cached JWKS keys.
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    /// Set after a failed scheduled refresh; stale keys are served until then.
    retry_after: Option<Instant>,
    /// Last forced refresh attempt, successful or not.
    last_forced_refresh: Option<Instant>,
}

impl CachedKeys {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl || self.retry_after.is_some_and(|at| Instant::now() < at)
    }
}

/// JWKS response from the OIDC provider.
#[derive(serde::Deserialize)]
struct JwksResponse {
    keys: Vec<serde_json::Value>,
}

/// Resolver backed by the provider's published JWKS document.
///
/// Fetches are serialized through `refresh_lock`; a caller that waited on it
/// re-checks the cache before fetching, so a burst of lookups costs one request.
#[derive(Clone)]
pub struct JwksKeyResolver {
    jwks_url: String,
    cache: Arc<RwLock<Option<CachedKeys>>>,
    refresh_lock: Arc<Mutex<()>>,
    http_client: reqwest::Client,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    failure_backoff: Duration,
}

impl JwksKeyResolver {
    /// Create a resolver for the issuer in `settings`.
    pub fn new(settings: &GitHubOidcSettings) -> Result<Self, KeyResolutionError> {
        let jwks_url = jwks_url_for_issuer(&settings.issuer);

        let http_client = reqwest::Client::builder()
            .connect_timeout(JWKS_CONNECT_TIMEOUT.min(settings.jwks_timeout))
            .timeout(settings.jwks_timeout)
            .build()
            .map_err(|e| KeyResolutionError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            jwks_url,
            cache: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
            http_client,
            cache_ttl: JWKS_CACHE_TTL,
            min_refresh_interval: JWKS_MIN_REFRESH_INTERVAL,
            failure_backoff: JWKS_FAILURE_BACKOFF,
        })
    }

    /// URL the key set is fetched from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Answer from the cache if no fetch is needed.
    ///
    /// `None` means the caller must refresh. `Some(None)` means the cache is
    /// authoritative and does not hold `kid`.
    async fn cached_key(&self, kid: &str, force_refresh: bool) -> Option<Option<DecodingKey>> {
        let cache = self.cache.read().await;
        let cached = cache.as_ref()?;
        let key = cached.keys.get(kid).cloned();

        if !force_refresh {
            return cached.is_fresh(self.cache_ttl).then_some(key);
        }

        if key.is_some() {
            return Some(key);
        }
        if cached
            .last_forced_refresh
            .is_some_and(|at| at.elapsed() < self.min_refresh_interval)
        {
            warn!("OIDC: forced JWKS refresh suppressed, last one was too recent");
            return Some(None);
        }
        None
    }

    /// Look `kid` up, refreshing the key set first when the cache cannot answer.
    async fn lookup(
        &self,
        kid: &str,
        force_refresh: bool,
    ) -> Result<Option<DecodingKey>, KeyResolutionError> {
        if let Some(found) = self.cached_key(kid, force_refresh).await {
            return Ok(found);
        }

        let _refresh = self.refresh_lock.lock().await;
        // Another caller may have refreshed while this one waited
        if let Some(found) = self.cached_key(kid, force_refresh).await {
            return Ok(found);
        }

        self.refresh(force_refresh).await?;

        let cache = self.cache.read().await;
        Ok(cache.as_ref().and_then(|cached| cached.keys.get(kid).cloned()))
    }

    /// Fetch the key set and record the outcome. Must hold `refresh_lock`.
    async fn refresh(&self, forced: bool) -> Result<(), KeyResolutionError> {
        let attempted_at = Instant::now();
        let result = self.fetch_jwks().await;

        let mut cache = self.cache.write().await;
        let keys = match result {
            Ok(keys) => keys,
            Err(e) => {
                let Some(cached) = cache.as_mut() else {
                    return Err(e);
                };
                if forced {
                    cached.last_forced_refresh = Some(attempted_at);
                    return Err(e);
                }
                // Stale keys are better than none for a scheduled refresh
                warn!("Failed to refresh JWKS, using stale cache: {}", e);
                cached.retry_after = Some(Instant::now() + self.failure_backoff);
                return Ok(());
            }
        };

        let last_forced_refresh = if forced {
            Some(attempted_at)
        } else {
            cache.as_ref().and_then(|cached| cached.last_forced_refresh)
        };
        *cache = Some(CachedKeys {
            keys,
            fetched_at: attempted_at,
            retry_after: None,
            last_forced_refresh,
        });
        Ok(())
    }

    /// Fetch the JWKS document and build decoding keys for every entry with a `kid`.
    async fn fetch_jwks(&self) -> Result<HashMap<String, DecodingKey>, KeyResolutionError> {
        info!("Fetching GitHub OIDC JWKS from {}", self.jwks_url);

        let response: JwksResponse = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| KeyResolutionError::Fetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| KeyResolutionError::Fetch(format!("invalid JWKS response: {}", e)))?;

        let keys = decode_jwks(&response.keys);
        info!("Loaded {} JWKS keys from OIDC provider", keys.len());
        Ok(keys)
    }
}

#[async_trait]
impl SigningKeyResolver for JwksKeyResolver {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, KeyResolutionError> {
        if let Some(key) = self.lookup(kid, false).await? {
            return Ok(key);
        }

        info!(
            "OIDC: kid '{}' not in cache, forcing JWKS refresh for key rotation",
            kid
        );
        self.lookup(kid, true)
            .await?
            .ok_or_else(|| KeyResolutionError::UnknownKey(kid.to_string()))
    }
}

/// Derive the JWKS URL from an issuer URL.
pub fn jwks_url_for_issuer(issuer: &str) -> String {
    format!("{}/.well-known/jwks", issuer.trim_end_matches('/'))
}

/// Turn raw JWK values into decoding keys, skipping entries that cannot be used.
fn decode_jwks(values: &[serde_json::Value]) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::new();
    for jwk_value in values {
        let jwk: jsonwebtoken::jwk::Jwk = match serde_json::from_value(jwk_value.clone()) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to parse JWK: {}", e);
                continue;
            }
        };

        if let Some(ref kid) = jwk.common.key_id {
            match DecodingKey::from_jwk(&jwk) {
                Ok(key) => {
                    keys.insert(kid.clone(), key);
                }
                Err(e) => warn!("Failed to create decoding key from JWK {}: {}", kid, e),
            }
        }
    }
    keys
}
