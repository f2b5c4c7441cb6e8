//! Error types for REST API operations

use bitfinex_auth::AuthError;
use serde_json::Value;

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Signing failed (usually missing credentials)
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Server answered with a non-success status
    #[error("{method} {url} failed with status {status}: {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        /// Server message decoded from the body, or the raw body
        message: String,
    },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RestError {
    /// Build a status error from a failed response body
    pub fn from_response(
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        body: &str,
    ) -> Self {
        Self::Status {
            method: method.into(),
            url: url.into(),
            status,
            message: error_message(body),
        }
    }

    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable (rate limits, server errors, timeouts)
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Auth(_) | Self::Parse(_) => false,
        }
    }
}

/// Extract the server message from an error body
///
/// v2 errors look like `["error", 10020, "limit: invalid"]`, v1 errors like
/// `{"message": "Nonce is too small."}`. Anything else is returned trimmed.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) if items.first().and_then(Value::as_str) == Some("error") => items
            .get(2)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        Ok(Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        _ => body.trim().to_string(),
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;
