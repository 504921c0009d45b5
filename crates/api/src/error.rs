//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders::OrdersError;

/// API-level error type that maps to HTTP responses.
///
/// Every failure renders the `{success: false, message}` envelope with
/// the matching status code; internal causes are logged, never leaked.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or invalid request input.
    BadRequest(String),
    /// Ownership/authorization violation.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "success": false, "message": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<OrdersError> for ApiError {
    fn from(err: OrdersError) -> Self {
        match &err {
            // Validation failures, unknown statuses, and illegal
            // transitions are all client errors.
            OrdersError::Order(_) | OrdersError::Cart(_) | OrdersError::InvalidMonth(_) => {
                ApiError::BadRequest(err.to_string())
            }
            OrdersError::OrderNotFound(_) | OrdersError::CartItemNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrdersError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            OrdersError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}
