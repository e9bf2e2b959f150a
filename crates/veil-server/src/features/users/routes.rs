//! User API routes
//!
//! - `POST /api/v1/users` - Create a user account
//! - `DELETE /api/v1/users/:id` - Delete a user account

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;

use super::commands::{CreateUserCommand, CreateUserError, DeleteUserCommand, DeleteUserError};

/// Creates the users router with all routes configured
pub fn user_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_user))
        .route("/:id", delete(delete_user))
}

#[tracing::instrument(skip(state, command), fields(email = %command.email))]
async fn create_user(
    State(state): State<FeatureState>,
    Json(command): Json<CreateUserCommand>,
) -> Result<Response, AppError> {
    let response = super::commands::create::handle(&state, command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state), fields(user_id = %user_id))]
async fn delete_user(
    State(state): State<FeatureState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let command = DeleteUserCommand { user_id };

    let response = super::commands::delete::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

impl From<CreateUserError> for AppError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::EmailValidation(_)
            | CreateUserError::PasswordTooShort
            | CreateUserError::InvalidRole(_) => AppError::Validation(err.to_string()),
            CreateUserError::DuplicateEmail(_) => AppError::Conflict(err.to_string()),
            CreateUserError::Hashing(e) => AppError::Internal(e.to_string()),
            CreateUserError::Database(e) => e.into(),
        }
    }
}

impl From<DeleteUserError> for AppError {
    fn from(err: DeleteUserError) -> Self {
        match err {
            DeleteUserError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteUserError::Database(e) => e.into(),
        }
    }
}
