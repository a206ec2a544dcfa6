//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// HTTP header carrying the GitHub Actions OIDC bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Development default values - NEVER use in production.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_REDIS_URL: &str = "redis://127.0.0.1:6379";
    pub const DEV_STORE_TIMEOUT_SECS: u64 = 5;
    pub const DEV_MAX_BODY_SIZE: usize = 1_048_576; // 1MB per submission

    // GitHub Actions OIDC
    pub const GITHUB_OIDC_ISSUER: &str = "https://token.actions.githubusercontent.com";
    pub const DEV_OIDC_AUDIENCE: &str = "homework-test-server";
    pub const JWKS_TIMEOUT_SECS: u64 = 10;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Which result store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl StoreKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "redis" => Some(Self::Redis),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Result store configuration.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Backend selection
    pub kind: StoreKind,
    /// Redis connection URL
    pub redis_url: String,
    /// Upper bound for a single store operation
    pub operation_timeout: Duration,
}

/// GitHub Actions OIDC settings.
#[derive(Debug, Clone)]
pub struct GitHubOidcSettings {
    /// Trusted issuer URL; the JWKS URL is derived from it.
    pub issuer: String,
    /// Audience every token must carry.
    pub audience: String,
    /// Total timeout for a JWKS fetch.
    pub jwks_timeout: Duration,
}

impl GitHubOidcSettings {
    /// Settings for the public GitHub Actions provider with the given audience.
    pub fn github(audience: impl Into<String>) -> Self {
        Self {
            issuer: defaults::GITHUB_OIDC_ISSUER.to_string(),
            audience: audience.into(),
            jwks_timeout: Duration::from_secs(defaults::JWKS_TIMEOUT_SECS),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum JSON body size in bytes (default: 1MB)
    pub max_body_size: usize,
    /// Result store configuration
    pub store: StoreSettings,
    /// OIDC verification configuration
    pub oidc: GitHubOidcSettings,
    /// Whether the audience came from the environment rather than the dev default
    audience_explicit: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In development mode (RUST_ENV=development) every variable has a default.
    /// In production mode (RUST_ENV=production) the Redis URL and the OIDC
    /// audience must be set explicitly and the in-memory store is refused.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `HRS_HOST`: Server host (default: 127.0.0.1)
    /// - `HRS_PORT`: Server port (default: 8080)
    /// - `HRS_STORE`: `redis` or `memory` (default: redis)
    /// - `REDIS_URL`: Redis connection URL
    /// - `HRS_STORE_TIMEOUT_SECS`: Per-operation store timeout (default: 5)
    /// - `HRS_OIDC_ISSUER`: Trusted token issuer (default: GitHub Actions)
    /// - `HRS_OIDC_AUDIENCE`: Expected token audience
    /// - `HRS_JWKS_TIMEOUT_SECS`: JWKS fetch timeout (default: 10)
    /// - `HRS_MAX_BODY_SIZE`: Max JSON body in bytes (default: 1MB)
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("HRS_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("HRS_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("HRS_PORT must be a valid port number"))?;

        let max_body_size = env::var("HRS_MAX_BODY_SIZE")
            .unwrap_or_else(|_| defaults::DEV_MAX_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidValue("HRS_MAX_BODY_SIZE must be a valid number"))?;

        let kind = match env::var("HRS_STORE") {
            Ok(value) => StoreKind::parse(&value).ok_or(ConfigError::InvalidValue(
                "HRS_STORE must be 'redis' or 'memory'",
            ))?,
            Err(_) => StoreKind::Redis,
        };

        let store_timeout_secs = env::var("HRS_STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::DEV_STORE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("HRS_STORE_TIMEOUT_SECS must be a valid number")
            })?;

        let store = StoreSettings {
            kind,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| defaults::DEV_REDIS_URL.to_string()),
            operation_timeout: Duration::from_secs(store_timeout_secs),
        };

        let jwks_timeout_secs = env::var("HRS_JWKS_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::JWKS_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("HRS_JWKS_TIMEOUT_SECS must be a valid number")
            })?;

        let explicit_audience = env::var("HRS_OIDC_AUDIENCE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let audience_explicit = explicit_audience.is_some();

        let oidc = GitHubOidcSettings {
            issuer: env::var("HRS_OIDC_ISSUER")
                .unwrap_or_else(|_| defaults::GITHUB_OIDC_ISSUER.to_string()),
            audience: explicit_audience.unwrap_or_else(|| defaults::DEV_OIDC_AUDIENCE.to_string()),
            jwks_timeout: Duration::from_secs(jwks_timeout_secs),
        };

        let config = Config {
            environment,
            host,
            port,
            max_body_size,
            store,
            oidc,
            audience_explicit,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// Build a configuration directly, bypassing the environment.
    pub fn new(
        environment: Environment,
        host: impl Into<String>,
        port: u16,
        store: StoreSettings,
        oidc: GitHubOidcSettings,
    ) -> Self {
        Self {
            environment,
            host: host.into(),
            port,
            max_body_size: defaults::DEV_MAX_BODY_SIZE,
            store,
            oidc,
            audience_explicit: true,
        }
    }

    /// Validate that production configuration does not use development defaults.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.store.kind == StoreKind::Memory {
            errors.push(
                "HRS_STORE=memory loses every result on restart. Use redis in production."
                    .to_string(),
            );
        }

        if self.store.kind == StoreKind::Redis && self.store.redis_url == defaults::DEV_REDIS_URL {
            errors.push(format!(
                "REDIS_URL is using development default '{}'. Set a production Redis URL.",
                defaults::DEV_REDIS_URL
            ));
        }

        if !self.audience_explicit {
            errors.push(
                "HRS_OIDC_AUDIENCE is not set. Tokens must be bound to this deployment's audience."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
