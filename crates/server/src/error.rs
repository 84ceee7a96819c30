//! Unified error handling for the API.
//!
//! Every handler error funnels into [`AppError`], which renders the
//! `{ "message": ... }` JSON body with the status carrying the kind:
//! 400 validation/stock, 401/403 auth, 404 missing, 409 conflict,
//! 500 internal. Internal details are logged, never sent to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::store::StoreError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Request lacks valid authentication.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate or conflicting state.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{ "message": "..." }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_)) {
            tracing::error!(error = %self, "request failed");
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Server error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Resource not found".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientStock { .. } => Self::Validation(err.to_string()),
            StoreError::ProductNotFound(_) | StoreError::OrderNotFound => {
                Self::NotFound(err.to_string())
            }
            StoreError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            StoreError::Database(_) | StoreError::DataCorruption(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_owned());
        assert_eq!(err.to_string(), "Order not found");

        let err = AppError::Validation("Missing required fields".to_owned());
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AppError = StoreError::InsufficientStock {
            product_id: ecoshop_core::ProductId::new(1),
            name: "Bamboo Toothbrush".to_owned(),
            available: 2,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Bamboo Toothbrush"));
        assert!(err.to_string().contains('2'));

        let err: AppError = StoreError::OrderNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = StoreError::InvalidTransition {
            from: ecoshop_core::OrderStatus::Shipped,
            to: ecoshop_core::OrderStatus::Pending,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("connection refused".to_owned());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
