//! Unified error handling for the storefront engine.
//!
//! Every network-facing operation returns `Result<T, StorefrontError>`. The
//! variants follow the failure taxonomy consumers act on: retry on
//! `Network`/`Server`, re-authenticate on `Auth`, show the message on
//! `Validation`, and render "not found" on `NotFound`.

use thiserror::Error;

/// Message shown when a transport failure has no better description.
pub const NETWORK_MESSAGE: &str = "A network error occurred.";

/// Application-level error type for the storefront client.
#[derive(Debug, Clone, Error)]
pub enum StorefrontError {
    /// The backend could not be reached or the request timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// The credential was rejected (401) or is missing.
    #[error("Auth error: {}", .0.as_deref().unwrap_or("unauthorized"))]
    Auth(Option<String>),

    /// The credential is valid but may not perform this action (403).
    #[error("Forbidden: {}", .0.as_deref().unwrap_or("access denied"))]
    Forbidden(Option<String>),

    /// The request or the response had an unexpected shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend failed (5xx or an unexpected status).
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, if any.
        message: Option<String>,
    },
}

impl StorefrontError {
    /// Whether an idempotent read that failed this way is worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Whether the backend rejected the credential itself. A 403 does not
    /// count: the credential is still good.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Message suitable for a form error.
    ///
    /// Server-provided text is surfaced verbatim; otherwise `fallback` is used.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Auth(Some(message))
            | Self::Forbidden(Some(message))
            | Self::Server {
                message: Some(message),
                ..
            }
            | Self::Validation(message) => message.clone(),
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::Auth(None)
            | Self::Forbidden(None)
            | Self::NotFound(_)
            | Self::Server { message: None, .. } => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for StorefrontError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Validation(format!("malformed response: {err}"))
        } else if let Some(status) = err.status() {
            Self::Server {
                status: status.as_u16(),
                message: Some(err.to_string()),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("malformed response: {err}"))
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StorefrontError::NotFound("product 9".to_string()).to_string(),
            "Not found: product 9"
        );
        assert_eq!(
            StorefrontError::Auth(None).to_string(),
            "Auth error: unauthorized"
        );
        assert_eq!(
            StorefrontError::Server {
                status: 502,
                message: None
            }
            .to_string(),
            "Server error (502): no details"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(StorefrontError::Network("reset".to_string()).is_retryable());
        assert!(
            StorefrontError::Server {
                status: 503,
                message: None
            }
            .is_retryable()
        );
        assert!(!StorefrontError::Auth(None).is_retryable());
        assert!(!StorefrontError::Validation("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_only_rejected_credentials_are_unauthorized() {
        assert!(StorefrontError::Auth(None).is_unauthorized());
        assert!(!StorefrontError::Forbidden(Some("nope".to_string())).is_unauthorized());
        assert_eq!(
            StorefrontError::Forbidden(None).user_message("Cart update failed"),
            "Cart update failed"
        );
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = StorefrontError::Auth(Some("Invalid email or password".to_string()));
        assert_eq!(err.user_message("Login failed"), "Invalid email or password");

        let err = StorefrontError::Auth(None);
        assert_eq!(err.user_message("Login failed"), "Login failed");

        let err = StorefrontError::Network("connection refused".to_string());
        assert_eq!(err.user_message("Login failed"), NETWORK_MESSAGE);
    }
}
