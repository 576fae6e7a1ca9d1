//! Error types for the offline cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the offline cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A named cache store could not be opened or accessed
    #[error("Cache storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Network fetch rejected or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Install-time precaching failed
    #[error("Precache failed: {0}")]
    Precache(String),

    /// Message payload failed boundary validation
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Lifecycle event not allowed in the current state
    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        CacheError::Network(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Network(_) => StatusCode::BAD_GATEWAY,
            CacheError::Precache(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidTransition(_) => StatusCode::CONFLICT,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message_maps_to_bad_request() {
        let response = CacheError::InvalidMessage("missing type".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_unavailable_maps_to_503() {
        let response = CacheError::StorageUnavailable("static-v1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_display() {
        let err = CacheError::InvalidTransition("Parsed -> Activate".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid lifecycle transition: Parsed -> Activate"
        );
    }
}
