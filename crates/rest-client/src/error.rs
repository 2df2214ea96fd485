//! Transport-level errors shared by every venue client.

use thiserror::Error;

/// A failed HTTP exchange.
///
/// Venue crates turn [`RestError::Http`] into their own API errors by
/// parsing the body; everything else is transport.
#[derive(Debug, Error)]
pub enum RestError {
    /// Non-success status other than 429.
    #[error("HTTP {status}: {body}")]
    Http {
        status: u16,
        /// Response body as received.
        body: String,
    },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    /// Success status with a body that does not match the expected type.
    #[error("unexpected response body: {0}")]
    Parse(String),

    /// HTTP 429.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("could not build HTTP client: {0}")]
    RequestBuild(String),
}

impl RestError {
    /// Whether sending the same request again may succeed.
    ///
    /// The client never retries by itself; callers decide.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection(_) | Self::RateLimited { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Parse(_) | Self::RequestBuild(_) => false,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Status and body of an HTTP error, for venue-specific classification.
    pub fn http_body(&self) -> Option<(u16, &str)> {
        match self {
            Self::Http { status, body } => Some((*status, body.as_str())),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            Self::Connection(err.to_string())
        }
    }
}
