//! Error types for the Supabase PostgREST client.
//!
//! Provides typed errors for credential resolution, API communication,
//! and pagination failures.

use thiserror::Error;

/// Errors that can occur when talking to the Supabase REST API.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Credential or project-ref resolution failed.
    #[error("setup error: {0}")]
    Setup(String),

    /// API request returned a non-2xx status.
    #[error("HTTP {status_code}: {body}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Raw response body.
        body: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Response body was not the expected JSON shape.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Pagination advanced past the configured row cap.
    #[error("pagination exceeded {max_rows} rows; narrow the query with a tighter date range or filter")]
    PaginationOverflow {
        /// Configured row cap.
        max_rows: u64,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SupabaseError {
    /// Creates a setup error.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Creates an API error from status code and body.
    pub fn api(status_code: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            body: body.into(),
        }
    }

    /// Creates an unexpected-shape error.
    pub fn unexpected_shape(msg: impl Into<String>) -> Self {
        Self::UnexpectedShape(msg.into())
    }

    /// Returns the response body for API errors, if any.
    ///
    /// Used by the calibration command to decide whether a rejected filter
    /// on an optional column warrants the single schema-fallback retry.
    #[must_use]
    pub fn api_body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SupabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SupabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Supabase operations.
pub type Result<T> = std::result::Result<T, SupabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_carries_status_and_body() {
        let err = SupabaseError::api(400, "column ai_signals.is_virtual does not exist");
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("is_virtual"));
        assert_eq!(
            err.api_body(),
            Some("column ai_signals.is_virtual does not exist")
        );
    }

    #[test]
    fn test_non_api_error_has_no_body() {
        let err = SupabaseError::setup("no service_role key found");
        assert_eq!(err.api_body(), None);
    }

    #[test]
    fn test_pagination_overflow_message_is_actionable() {
        let err = SupabaseError::PaginationOverflow { max_rows: 1_000_000 };
        let display = err.to_string();
        assert!(display.contains("1000000"));
        assert!(display.contains("narrow the query"));
    }
}
