//! Error taxonomy for the Gemini client.

use thiserror::Error;

/// Errors surfaced by the Gemini client.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// HTTP transport failure (connect, TLS, mid-stream disconnect).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    /// The API rejected the request with 429.
    #[error("rate limited: {message}")]
    RateLimited {
        /// Suggested wait from the `retry-after` header, 0 if absent.
        retry_after_ms: u64,
        /// Error message from the response body.
        message: String,
    },

    /// Non-2xx response or an error object inside the stream.
    #[error("Gemini API error ({status}): {message}")]
    Api {
        /// HTTP status code (or the in-stream error code).
        status: u16,
        /// Error message from the response body.
        message: String,
        /// Google's symbolic status (e.g. `NOT_FOUND`), when present.
        code: Option<String>,
        /// Whether retrying the request could succeed.
        retryable: bool,
    },

    /// Generation was cut off by the safety filter.
    #[error("generation blocked by safety filter ({reason})")]
    SafetyBlocked {
        /// The finish reason or triggering category reported by the API.
        reason: String,
    },
}

impl GeminiError {
    /// Whether the failure is transient and a retry could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Json(_) | Self::SafetyBlocked { .. } => false,
        }
    }

    /// Short stable label for logs and metrics.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::RateLimited { .. } => "rate_limited",
            Self::Api { .. } => "api",
            Self::SafetyBlocked { .. } => "safety",
        }
    }
}
