//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::CheckoutError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Identity headers missing or malformed.
    Unauthorized(String),
    /// The caller may not touch the referenced resource.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Checkout saga outcome.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::TenantMismatch { .. } => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::PaymentUnavailable(_) | CheckoutError::PaymentDeclined => {
            (StatusCode::PAYMENT_REQUIRED, err.to_string())
        }
        CheckoutError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        CheckoutError::Store(StoreError::Conflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::Store(_) => {
            tracing::error!(error = %err, "order store fault during checkout");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
