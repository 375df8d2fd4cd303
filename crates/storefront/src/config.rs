//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: `http://localhost:3000`)
//! - `STOREFRONT_ENV` - `development` or `production` (default: development).
//!   Session cookies are marked `Secure` only in production.
//! - `STOREFRONT_PROTECTED_PATHS` - Comma-separated path prefixes that require
//!   sign-in (default: /checkout,/account,/orders,/profile)
//! - `STOREFRONT_GUARD_BYPASS_PATHS` - Comma-separated path prefixes the route
//!   guard ignores (default: /static,/api,/health,/favicon.ico)
//! - `STOREFRONT_PASSWORD_REQUIRE_UPPERCASE` - `off`, `advisory` or `enforce` (default: advisory)
//! - `STOREFRONT_PASSWORD_REQUIRE_LOWERCASE` - `off`, `advisory` or `enforce` (default: advisory)
//! - `STOREFRONT_PASSWORD_REQUIRE_DIGIT` - `off`, `advisory` or `enforce` (default: advisory)
//! - `STOREFRONT_CATALOG_CACHE_SECONDS` - Product cache TTL (default: 300)
//! - `STOREFRONT_RATE_LIMIT` - Rate limit the auth API per client IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: `STOREFRONT_ENV`)
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate, 0.0-1.0 (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::access::PathPrefixes;
use crate::services::validation::PasswordPolicy;

const DEFAULT_PROTECTED_PATHS: &str = "/checkout,/account,/orders,/profile";
const DEFAULT_GUARD_BYPASS_PATHS: &str = "/static,/api,/health,/favicon.ico";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other:?}")),
        }
    }
}

/// Sentry settings.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: String,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Paths that require an authenticated session
    pub protected_paths: PathPrefixes,
    /// Paths the route guard never touches
    pub guard_bypass_paths: PathPrefixes,
    /// Sign-up password composition rules
    pub password_policy: PasswordPolicy,
    /// How long catalog reads are cached
    pub catalog_cache_ttl: Duration,
    /// Whether the auth API is rate limited
    pub rate_limit: bool,
    /// Error tracking
    pub sentry: SentryConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&get);

        let database_url = env.database_url("STOREFRONT_DATABASE_URL")?;
        let host = env.parsed("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed("STOREFRONT_PORT", "3000")?;
        let base_url = env.or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let environment: Environment = env.parsed("STOREFRONT_ENV", "development")?;

        let protected_paths =
            PathPrefixes::new(env.list("STOREFRONT_PROTECTED_PATHS", DEFAULT_PROTECTED_PATHS));
        let guard_bypass_paths = PathPrefixes::new(
            env.list("STOREFRONT_GUARD_BYPASS_PATHS", DEFAULT_GUARD_BYPASS_PATHS),
        );

        let password_policy = PasswordPolicy {
            require_uppercase: env.parsed("STOREFRONT_PASSWORD_REQUIRE_UPPERCASE", "advisory")?,
            require_lowercase: env.parsed("STOREFRONT_PASSWORD_REQUIRE_LOWERCASE", "advisory")?,
            require_digit: env.parsed("STOREFRONT_PASSWORD_REQUIRE_DIGIT", "advisory")?,
        };

        let catalog_cache_ttl =
            Duration::from_secs(env.parsed("STOREFRONT_CATALOG_CACHE_SECONDS", "300")?);
        let rate_limit = env.parsed("STOREFRONT_RATE_LIMIT", "true")?;

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.or_default("SENTRY_ENVIRONMENT", environment.as_str()),
            sample_rate: env.rate("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: env.rate("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            environment,
            protected_paths,
            guard_bypass_paths,
            password_policy,
            catalog_cache_ttl,
            rate_limit,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse a sample rate in `0.0..=1.0`.
    fn rate(&self, key: &str, default: &str) -> Result<f32, ConfigError> {
        let rate: f32 = self.parsed(key, default)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("{rate} is outside 0.0-1.0"),
            ));
        }
        Ok(rate)
    }

    /// Split a comma-separated list.
    fn list(&self, key: &str, default: &str) -> Vec<String> {
        self.or_default(key, default)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}
