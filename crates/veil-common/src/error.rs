//! Error types for Veil

use thiserror::Error;

/// Result type alias for Veil operations
pub type Result<T> = std::result::Result<T, VeilError>;

/// Errors from the shared domain types
#[derive(Error, Debug)]
pub enum VeilError {
    #[error("Invalid statistic operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}
