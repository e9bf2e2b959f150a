//! Utilities shared across feature slices

pub mod validation;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated caller's id.
///
/// Authentication itself happens upstream (the OAuth exchange is not this
/// service's concern); handlers trust the gateway-populated header.
pub const CALLER_ID_HEADER: &str = "x-user-id";

/// Extract the caller id from request headers
pub fn caller_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(CALLER_ID_HEADER)
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", CALLER_ID_HEADER)))?;

    let text = value
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} header", CALLER_ID_HEADER)))?;

    text.parse()
        .map_err(|_| AppError::BadRequest(format!("{} header must be a UUID", CALLER_ID_HEADER)))
}
