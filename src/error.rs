//! Custom error types for tweetfeed.
//!
//! Every stage of a feed request returns `Result<T, FeedError>`; the request
//! handler decides whether an error aborts the request or degrades it.

use serde_json::Value;
use thiserror::Error;

/// Main error type for tweetfeed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Required inbound query parameter missing or empty
    #[error("{0}")]
    Validation(String),

    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream API answered with a non-2xx status
    #[error("API error: {status} - {body}")]
    Api {
        /// HTTP status returned by the upstream
        status: u16,
        /// Upstream response body, parsed as JSON when possible
        body: Value,
    },

    /// Upstream answered 2xx with a body we cannot use
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl FeedError {
    /// Value reported under `error` in a failed response envelope.
    ///
    /// Upstream failures carry the upstream body as-is; everything else is
    /// reported by its message.
    pub fn payload(&self) -> Value {
        match self {
            FeedError::Api { body, .. } => body.clone(),
            FeedError::Network(e) => Value::String(e.to_string()),
            other => Value::String(other.to_string()),
        }
    }

    /// Build an `Api` error from a status and raw body text.
    ///
    /// An empty body is replaced by a message naming the status.
    pub(crate) fn api(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::String(format!("Request failed with status code {}", status))
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        FeedError::Api { status, body }
    }
}

/// Result type alias using `FeedError`
pub type Result<T> = std::result::Result<T, FeedError>;
