//! Error types for the backend HTTP client.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message used when an error body is JSON but carries no usable text.
const GENERIC_MESSAGE: &str = "API error";

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    ///
    /// Displays as the backend's own message so it can be shown verbatim.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The request could not be completed (connection, DNS, TLS, body read).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success body could not be decoded into the expected type.
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        /// Endpoint path that was called.
        endpoint: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The endpoint path does not form a valid URL with the base URL.
    #[error("invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Underlying URL error.
        #[source]
        source: url::ParseError,
    },
}

impl ApiError {
    /// HTTP status of a [`ApiError::Status`] error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract a human-readable message from a failed response.
///
/// A JSON object body yields its non-empty `message` field, else its
/// non-empty `error` field, else a generic message. A body that is not JSON
/// (or is JSON `null`) yields the status reason phrase, or `HTTP <code>` when
/// the status has none.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string),
        Ok(value) => text_field(&value, "message")
            .or_else(|| text_field(&value, "error"))
            .unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_wins() {
        let msg = error_message(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid credentials","error":"ignored"}"#,
        );
        assert_eq!(msg, "Invalid credentials");
    }

    #[test]
    fn test_error_field_fallback() {
        let msg = error_message(StatusCode::BAD_REQUEST, r#"{"error":"SKU already exists"}"#);
        assert_eq!(msg, "SKU already exists");

        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"message":"","error":"SKU already exists"}"#,
        );
        assert_eq!(msg, "SKU already exists");
    }

    #[test]
    fn test_json_without_fields_is_generic() {
        assert_eq!(error_message(StatusCode::BAD_REQUEST, r#"{"ok":false}"#), "API error");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, r#"{"message":42}"#), "API error");
    }

    #[test]
    fn test_non_json_uses_reason_phrase() {
        let msg = error_message(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(msg, "Bad Gateway");

        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(msg, "Internal Server Error");
    }

    #[test]
    fn test_non_json_without_reason_uses_code() {
        let status = StatusCode::from_u16(599).expect("valid status code");
        assert_eq!(error_message(status, "oops"), "HTTP 599");
    }

    #[test]
    fn test_status_error_displays_message_only() {
        let err = ApiError::Status {
            status: 401,
            message: "Invalid credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(err.status(), Some(401));
    }
}
