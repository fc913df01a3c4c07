//! REST client for the commerce backend.
//!
//! One `reqwest::Client` is shared by every service through cheap clones of
//! [`ApiClient`]. The client owns the base URL, the per-request timeout, the
//! bearer header, mapping of HTTP statuses onto [`StorefrontError`] and the
//! bounded retry of idempotent reads. Mutating calls are sent exactly once.

mod endpoints;

pub use endpoints::RegisterRequest;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError};

/// Longest slice of a plain-text error body that is surfaced as a message.
const MAX_TEXT_MESSAGE: usize = 200;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    read_retries: u32,
    retry_backoff: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("read_retries", &self.inner.read_retries)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Network` if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                read_retries: config.read_retries,
                retry_backoff: config.retry_backoff,
            }),
        })
    }

    /// Base URL every path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send one request and return the body of a successful response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&SecretString>,
        body: Option<&serde_json::Value>,
    ) -> Result<String> {
        let mut request = self.inner.client.request(method.clone(), self.url(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        debug!(
            %method,
            path,
            status = status.as_u16(),
            body = %text.chars().take(MAX_TEXT_MESSAGE).collect::<String>(),
            "Backend returned non-success status"
        );
        Err(error_for_status(status, path, &text))
    }

    /// Send a request and decode the JSON response body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&SecretString>,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let text = self.send(method, path, bearer, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request whose response body is irrelevant.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&SecretString>,
        body: Option<&serde_json::Value>,
    ) -> Result<()> {
        self.send(method, path, bearer, body).await.map(drop)
    }

    /// `GET` with retry on network and server failures.
    ///
    /// Waits `retry_backoff`, then twice that, and so on between attempts.
    #[instrument(skip(self, bearer), fields(base = %self.inner.base_url))]
    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SecretString>,
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            match self.fetch(Method::GET, path, bearer, None).await {
                Err(err) if err.is_retryable() && attempt < self.inner.read_retries => {
                    let delay = self
                        .inner
                        .retry_backoff
                        .saturating_mul(2_u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        error = %err,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Read failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

// =============================================================================
// Status mapping
// =============================================================================

/// Map a non-success response onto the error taxonomy.
fn error_for_status(status: StatusCode, path: &str, body: &str) -> StorefrontError {
    let message = extract_message(body);
    match status {
        StatusCode::UNAUTHORIZED => StorefrontError::Auth(message),
        StatusCode::FORBIDDEN => StorefrontError::Forbidden(message),
        StatusCode::NOT_FOUND => StorefrontError::NotFound(message.unwrap_or_else(|| path.to_string())),
        s if s.is_client_error() => StorefrontError::Validation(
            message.unwrap_or_else(|| format!("request rejected with status {}", s.as_u16())),
        ),
        s => StorefrontError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// JSON bodies are searched for `message`, `error` and `title` in that order;
/// a bare JSON string or short plain text is used as-is.
fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => ["message", "error", "title"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(ToString::to_string),
        Ok(serde_json::Value::String(s)) => Some(s).filter(|s| !s.trim().is_empty()),
        Ok(_) => None,
        Err(_) => Some(body.chars().take(MAX_TEXT_MESSAGE).collect()),
    }
}
