//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::response::ErrorResponse;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, AppError>;

/// Application error type that maps onto HTTP responses.
///
/// Feature slices carry their own error enums and convert into this at the
/// route boundary, so status codes and error codes are decided in one place.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource missing or not owned by the caller; the two cases are
    /// deliberately indistinguishable in the response
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Concurrent writer won the race; the caller should re-read and retry
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The dataset's privacy budget cannot cover another query
    #[error("Privacy budget exhausted: {0}")]
    BudgetExhausted(String),

    /// The noisy-statistics engine failed; no ledger state was changed
    #[error("Statistic computation failed: {0}")]
    StatisticComputationFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg)
            },
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::BudgetExhausted(msg) => (StatusCode::CONFLICT, "BUDGET_EXHAUSTED", msg),
            AppError::StatisticComputationFailed(msg) => {
                tracing::error!("Engine failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "ENGINE_ERROR", msg)
            },
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "A database error occurred".to_string(),
                )
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            },
        };

        let error_response = ErrorResponse::new(code, message);
        (status, Json(error_response)).into_response()
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        match err {
            crate::db::DbError::NotFound(msg) => AppError::NotFound(msg),
            crate::db::DbError::Duplicate(msg) => AppError::Conflict(msg),
            crate::db::DbError::Config(msg) => AppError::Internal(msg),
            crate::db::DbError::Sqlx(err) => AppError::Database(err),
        }
    }
}

impl From<crate::engine::EngineError> for AppError {
    fn from(err: crate::engine::EngineError) -> Self {
        AppError::StatisticComputationFailed(err.to_string())
    }
}

impl From<crate::crypto::CipherError> for AppError {
    fn from(err: crate::crypto::CipherError) -> Self {
        match err {
            crate::crypto::CipherError::MalformedToken(msg) => AppError::BadRequest(msg),
            crate::crypto::CipherError::Decryption(msg) => {
                tracing::error!("Token decryption failure: {}", msg);
                AppError::Internal("Stored token could not be decrypted".to_string())
            },
        }
    }
}
