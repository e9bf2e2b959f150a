//! Delete user command

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::FeatureState;

/// Command to delete a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserCommand {
    pub user_id: Uuid,
}

/// Response from deleting a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub user_id: Uuid,
}

/// Errors that can occur when deleting a user
#[derive(Debug, thiserror::Error)]
pub enum DeleteUserError {
    #[error("User '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(crate::db::DbError),
}

/// Handler function for deleting users.
///
/// Ownership associations cascade; datasets themselves are left for an
/// administrator to reassign or remove.
#[tracing::instrument(skip(state), fields(user_id = %command.user_id))]
pub async fn handle(
    state: &FeatureState,
    command: DeleteUserCommand,
) -> Result<DeleteUserResponse, DeleteUserError> {
    state
        .credentials
        .delete_user(command.user_id)
        .await
        .map_err(|e| match e {
            crate::db::DbError::NotFound(_) => DeleteUserError::NotFound(command.user_id),
            other => DeleteUserError::Database(other),
        })?;

    tracing::info!(user_id = %command.user_id, "User deleted");

    Ok(DeleteUserResponse {
        user_id: command.user_id,
    })
}
