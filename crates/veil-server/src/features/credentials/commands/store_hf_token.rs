//! Store Hugging Face token command

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::CipherError;
use crate::db::TokenSlot;
use crate::features::FeatureState;

/// Command to store a user's Hugging Face API token
#[derive(Debug, Clone, Deserialize)]
pub struct StoreHfTokenCommand {
    /// Target user (set from the URL path)
    #[serde(default)]
    pub user_id: Uuid,

    pub hf_token: String,
}

/// Response from storing the token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHfTokenResponse {
    pub user_id: Uuid,
}

/// Errors that can occur when storing the token
#[derive(Debug, thiserror::Error)]
pub enum StoreHfTokenError {
    #[error("Token is required")]
    TokenRequired,

    #[error("User '{0}' not found")]
    UserNotFound(Uuid),

    #[error("Encryption failed: {0}")]
    Cipher(#[from] CipherError),

    #[error("Database error: {0}")]
    Database(crate::db::DbError),
}

/// Handler function for storing a Hugging Face token
#[tracing::instrument(skip(state, command), fields(user_id = %command.user_id))]
pub async fn handle(
    state: &FeatureState,
    command: StoreHfTokenCommand,
) -> Result<StoreHfTokenResponse, StoreHfTokenError> {
    if command.hf_token.is_empty() {
        return Err(StoreHfTokenError::TokenRequired);
    }

    let ciphertext = state.cipher.encrypt(command.hf_token.as_bytes())?;

    state
        .credentials
        .store_token(command.user_id, TokenSlot::HuggingFace, &ciphertext)
        .await
        .map_err(|e| match e {
            crate::db::DbError::NotFound(_) => StoreHfTokenError::UserNotFound(command.user_id),
            other => StoreHfTokenError::Database(other),
        })?;

    tracing::info!(user_id = %command.user_id, "Hugging Face token stored");

    Ok(StoreHfTokenResponse {
        user_id: command.user_id,
    })
}
