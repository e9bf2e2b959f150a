//! Credential API routes
//!
//! - `PUT /api/v1/users/:id/tokens` - Store the encrypted OAuth pair
//! - `GET /api/v1/users/:id/tokens` - Decrypt the stored pair
//! - `PUT /api/v1/users/:id/hf-token` - Store the Hugging Face token

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;

use super::commands::{
    StoreHfTokenCommand, StoreHfTokenError, StoreTokensCommand, StoreTokensError,
};
use super::queries::{GetTokensError, GetTokensQuery};

/// Creates the credentials router with all routes configured
pub fn credential_routes() -> Router<FeatureState> {
    Router::new()
        .route("/:id/tokens", put(store_tokens))
        .route("/:id/tokens", get(get_tokens))
        .route("/:id/hf-token", put(store_hf_token))
}

#[tracing::instrument(skip(state, command), fields(user_id = %user_id))]
async fn store_tokens(
    State(state): State<FeatureState>,
    Path(user_id): Path<Uuid>,
    Json(mut command): Json<StoreTokensCommand>,
) -> Result<Response, AppError> {
    command.user_id = user_id;

    let response = super::commands::store_tokens::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, command), fields(user_id = %user_id))]
async fn store_hf_token(
    State(state): State<FeatureState>,
    Path(user_id): Path<Uuid>,
    Json(mut command): Json<StoreHfTokenCommand>,
) -> Result<Response, AppError> {
    command.user_id = user_id;

    let response = super::commands::store_hf_token::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state), fields(user_id = %user_id))]
async fn get_tokens(
    State(state): State<FeatureState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let query = GetTokensQuery { user_id };

    let response = super::queries::get_tokens::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

impl From<StoreTokensError> for AppError {
    fn from(err: StoreTokensError) -> Self {
        match err {
            StoreTokensError::AccessTokenRequired | StoreTokensError::RefreshTokenRequired => {
                AppError::Validation(err.to_string())
            },
            StoreTokensError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            StoreTokensError::Cipher(e) => e.into(),
            StoreTokensError::Database(e) => e.into(),
        }
    }
}

impl From<StoreHfTokenError> for AppError {
    fn from(err: StoreHfTokenError) -> Self {
        match err {
            StoreHfTokenError::TokenRequired => AppError::Validation(err.to_string()),
            StoreHfTokenError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            StoreHfTokenError::Cipher(e) => e.into(),
            StoreHfTokenError::Database(e) => e.into(),
        }
    }
}

impl From<GetTokensError> for AppError {
    fn from(err: GetTokensError) -> Self {
        match err {
            GetTokensError::UserNotFound(_) | GetTokensError::NoTokensStored(_) => {
                AppError::NotFound(err.to_string())
            },
            GetTokensError::Cipher(e) => {
                tracing::error!("Stored token failed to decrypt: {}", e);
                AppError::Internal("Stored token could not be decrypted".to_string())
            },
            GetTokensError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_structure() {
        let router = credential_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
