//! Store OAuth token pair command
//!
//! The access and refresh tokens are combined with the pair delimiter and
//! encrypted into a single column, matching the format of tokens stored by
//! earlier releases.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::CipherError;
use crate::db::TokenSlot;
use crate::features::FeatureState;

/// Command to store a user's OAuth access/refresh pair
#[derive(Debug, Clone, Deserialize)]
pub struct StoreTokensCommand {
    /// Target user (set from the URL path)
    #[serde(default)]
    pub user_id: Uuid,

    pub access_token: String,
    pub refresh_token: String,
}

/// Response from storing tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreTokensResponse {
    pub user_id: Uuid,
}

/// Errors that can occur when storing tokens
#[derive(Debug, thiserror::Error)]
pub enum StoreTokensError {
    #[error("Access token is required")]
    AccessTokenRequired,

    #[error("Refresh token is required")]
    RefreshTokenRequired,

    #[error("User '{0}' not found")]
    UserNotFound(Uuid),

    #[error("Encryption failed: {0}")]
    Cipher(#[from] CipherError),

    #[error("Database error: {0}")]
    Database(crate::db::DbError),
}

impl StoreTokensCommand {
    /// Validates the command parameters
    pub fn validate(&self) -> Result<(), StoreTokensError> {
        if self.access_token.is_empty() {
            return Err(StoreTokensError::AccessTokenRequired);
        }

        if self.refresh_token.is_empty() {
            return Err(StoreTokensError::RefreshTokenRequired);
        }

        Ok(())
    }
}

/// Handler function for storing an OAuth token pair
#[tracing::instrument(skip(state, command), fields(user_id = %command.user_id))]
pub async fn handle(
    state: &FeatureState,
    command: StoreTokensCommand,
) -> Result<StoreTokensResponse, StoreTokensError> {
    command.validate()?;

    let ciphertext = state
        .cipher
        .encrypt_token_pair(&command.access_token, &command.refresh_token)?;

    state
        .credentials
        .store_token(command.user_id, TokenSlot::OAuthPair, &ciphertext)
        .await
        .map_err(|e| match e {
            crate::db::DbError::NotFound(_) => StoreTokensError::UserNotFound(command.user_id),
            other => StoreTokensError::Database(other),
        })?;

    tracing::info!(user_id = %command.user_id, "OAuth token pair stored");

    Ok(StoreTokensResponse {
        user_id: command.user_id,
    })
}
