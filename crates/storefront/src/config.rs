//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `STOREFRONT_API_URL` - Backend REST base URL (default: `https://localhost:7216/api`)
//! - `STOREFRONT_SESSION_DIR` - Directory holding the persisted session (default: `.styleaura/session`)
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `STOREFRONT_READ_RETRIES` - Retries for idempotent reads (default: 2)
//! - `STOREFRONT_RETRY_BACKOFF_MS` - Initial retry backoff, doubled per attempt (default: 200)
//! - `STOREFRONT_RATING_CONCURRENCY` - Max concurrent rating requests (default: 8)
//! - `STOREFRONT_ON_UNAUTHORIZED` - `logout` or `clear-cart` (default: `logout`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://localhost:7216/api";
const DEFAULT_SESSION_DIR: &str = ".styleaura/session";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What the cart synchronizer does when the backend rejects the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnauthorizedPolicy {
    /// Clear the cart mirror and log the session out.
    #[default]
    Logout,
    /// Clear the cart mirror only; the session stays.
    ClearCart,
}

impl FromStr for UnauthorizedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logout" => Ok(Self::Logout),
            "clear-cart" | "clear_cart" => Ok(Self::ClearCart),
            other => Err(format!("expected `logout` or `clear-cart`, got `{other}`")),
        }
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST base URL, e.g. `https://localhost:7216/api`
    pub api_url: Url,
    /// Directory where the session token and profile are persisted
    pub session_dir: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// Retry budget for idempotent reads (mutations never retry)
    pub read_retries: u32,
    /// Backoff before the first retry; doubled for each following attempt
    pub retry_backoff: Duration,
    /// Upper bound on concurrent rating-average requests
    pub rating_concurrency: usize,
    /// Reaction to a 401 on a cart call
    pub on_unauthorized: UnauthorizedPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_api_url(
            "STOREFRONT_API_URL",
            &lookup("STOREFRONT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;
        let session_dir = lookup("STOREFRONT_SESSION_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR), PathBuf::from);
        let request_timeout =
            Duration::from_secs(parse_or("STOREFRONT_REQUEST_TIMEOUT_SECS", &lookup, 10)?);
        let read_retries = parse_or("STOREFRONT_READ_RETRIES", &lookup, 2)?;
        let retry_backoff =
            Duration::from_millis(parse_or("STOREFRONT_RETRY_BACKOFF_MS", &lookup, 200)?);
        let rating_concurrency = parse_or("STOREFRONT_RATING_CONCURRENCY", &lookup, 8_usize)?;
        if rating_concurrency == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_RATING_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let on_unauthorized = parse_or(
            "STOREFRONT_ON_UNAUTHORIZED",
            &lookup,
            UnauthorizedPolicy::default(),
        )?;
        let sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty());

        Ok(Self {
            api_url,
            session_dir,
            request_timeout,
            read_retries,
            retry_backoff,
            rating_concurrency,
            on_unauthorized,
            sentry_dsn,
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn for_base_url(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = api_url.to_string();
        Self::from_lookup(move |key| (key == "STOREFRONT_API_URL").then(|| api_url.clone()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and validate the backend base URL.
fn parse_api_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
