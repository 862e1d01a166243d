//! API error types and response handling.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 404 Not Found - Resource does not exist.
    NotFound {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 409 Conflict - Operation cannot be completed due to current state.
    Conflict {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "nothing_to_acknowledge",
    "message": "No proximity report has been composed since the last acknowledgement"
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "not_found").
    #[schema(example = "nothing_to_acknowledge")]
    pub error: String,

    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::NotFound {
                error_code,
                message,
            } => (StatusCode::NOT_FOUND, error_code, message),
            Self::Conflict {
                error_code,
                message,
            } => (StatusCode::CONFLICT, error_code, message),
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { message, .. } => write!(f, "Not Found: {message}"),
            Self::Conflict { message, .. } => write!(f, "Conflict: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Fallback for unknown routes, so clients always get a JSON body.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        error_code: "not_found".to_string(),
        message: format!("No route for {uri}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_error_display() {
        let err = ApiError::Conflict {
            error_code: "test_error".to_string(),
            message: "Test message".to_string(),
        };
        assert!(err.to_string().contains("Conflict"));
    }

    #[test]
    fn test_status_codes() {
        let not_found = ApiError::NotFound {
            error_code: "not_found".to_string(),
            message: "gone".to_string(),
        };
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let conflict = ApiError::Conflict {
            error_code: "conflict".to_string(),
            message: "busy".to_string(),
        };
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse {
            error: "test_error".to_string(),
            message: "Test message".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test_error"));
    }
}
