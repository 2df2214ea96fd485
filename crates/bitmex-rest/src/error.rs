//! BitMEX REST API error types.

use crate::responses::ErrorResponse;
use auth::AuthError;
use execution_core::{ExecutionError, Venue};
use rest_client::RestError;
use thiserror::Error;

/// Errors that can occur when interacting with the BitMEX REST API.
#[derive(Debug, Error)]
pub enum BitmexRestError {
    /// REST client error (network, timeout, etc.).
    #[error("REST client error: {0}")]
    Rest(RestError),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Error body returned by BitMEX.
    #[error("BitMEX API error {status} ({name}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error class reported by BitMEX (e.g. `HTTPError`, `ValidationError`).
        name: String,
        /// Error message.
        message: String,
    },

    /// A query returned no row for the symbol.
    #[error("No {what} for {symbol}")]
    NotFound {
        what: &'static str,
        symbol: String,
    },

    /// Failed to encode a request body.
    #[error("Encode error: {0}")]
    Encode(String),
}

impl From<RestError> for BitmexRestError {
    fn from(err: RestError) -> Self {
        if let Some((status, body)) = err.http_body() {
            if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
                return Self::ApiError {
                    status,
                    name: parsed.error.name,
                    message: parsed.error.message,
                };
            }
        }
        Self::Rest(err)
    }
}

impl BitmexRestError {
    /// Check if this error indicates the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rest(rest_err) => rest_err.is_retryable(),
            // 503 is returned when the matching engine is overloaded
            Self::ApiError { status, .. } => *status == 503,
            _ => false,
        }
    }
}

impl From<BitmexRestError> for ExecutionError {
    fn from(err: BitmexRestError) -> Self {
        ExecutionError::venue(Venue::Bitmex, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_is_parsed() {
        let rest = RestError::Http {
            status: 400,
            body: r#"{"error":{"message":"Account has insufficient Available Balance","name":"ValidationError"}}"#.into(),
        };

        match BitmexRestError::from(rest) {
            BitmexRestError::ApiError { status, name, message } => {
                assert_eq!(status, 400);
                assert_eq!(name, "ValidationError");
                assert!(message.contains("insufficient"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_overload_is_retryable() {
        let rest = RestError::Http {
            status: 503,
            body: r#"{"error":{"message":"The system is currently overloaded.","name":"HTTPError"}}"#.into(),
        };
        assert!(BitmexRestError::from(rest).is_retryable());
        assert!(!BitmexRestError::from(RestError::Http {
            status: 400,
            body: "<html>".into()
        })
        .is_retryable());
    }

    #[test]
    fn test_into_execution_error() {
        let err: ExecutionError = BitmexRestError::NotFound {
            what: "instrument",
            symbol: "XBTUSD".into(),
        }
        .into();
        assert_eq!(err.to_string(), "bitmex error: No instrument for XBTUSD");
    }
}
