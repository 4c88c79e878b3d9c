//! # API Error
//!
//! Every failed request is answered with the same envelope:
//!
//! ```json
//! { "success": false, "message": "...", "code": "INSUFFICIENT_STOCK" }
//! ```
//!
//! ## Status Mapping
//! ```text
//! ValidationError                         → 400 VALIDATION_ERROR
//! CoreError::InsufficientStock            → 400 INSUFFICIENT_STOCK
//! CoreError::ProductNotFound              → 400 PRODUCT_NOT_FOUND
//! CoreError::StockOverflow                → 400 STOCK_OVERFLOW
//! DbError::UniqueViolation                → 400 DUPLICATE
//! DbError::NotFound                       → 404 NOT_FOUND
//! LedgerError::TimedOut                   → 503 TIMEOUT
//! anything else from the store            → 500 INTERNAL_ERROR (logged)
//! malformed JSON / path / query           → 400 BAD_REQUEST
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use almacen_core::{CoreError, ValidationError};
use almacen_db::{DbError, LedgerError};

/// Message shown for failures whose detail stays in the logs.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn internal() -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            INTERNAL_MESSAGE,
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "success": false,
                "message": self.message,
                "code": self.code,
            })),
        )
            .into_response()
    }
}

// =============================================================================
// Domain Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(inner) => return inner.clone().into(),
            CoreError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::StockOverflow { .. } => "STOCK_OVERFLOW",
        };
        ApiError::new(StatusCode::BAD_REQUEST, code, err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "DUPLICATE", err.to_string())
            }
            other => {
                error!(error = %other, "Database failure");
                ApiError::internal()
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(core) => core.into(),
            LedgerError::Persistence(db) => db.into(),
            LedgerError::TimedOut(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "TIMEOUT",
                err.to_string(),
            ),
        }
    }
}

// =============================================================================
// Extractor Rejections
// =============================================================================

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
