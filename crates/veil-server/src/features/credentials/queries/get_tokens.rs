//! Get decrypted tokens query
//!
//! Decrypts the stored OAuth pair for the dashboard. A stored token that no
//! longer decrypts (key rotation without migration, corrupted column) is an
//! internal error, not a missing token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{CipherError, TokenCipher};
use crate::db::TokenSlot;
use crate::features::FeatureState;

/// Query for a user's decrypted OAuth tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTokensQuery {
    pub user_id: Uuid,
}

/// Response containing the decrypted token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Errors that can occur when fetching tokens
#[derive(Debug, thiserror::Error)]
pub enum GetTokensError {
    #[error("User '{0}' not found")]
    UserNotFound(Uuid),

    #[error("No tokens stored for user '{0}'")]
    NoTokensStored(Uuid),

    #[error("Stored token could not be decrypted: {0}")]
    Cipher(#[from] CipherError),

    #[error("Database error: {0}")]
    Database(crate::db::DbError),
}

/// Handler function for fetching a user's decrypted OAuth tokens
#[tracing::instrument(skip(state), fields(user_id = %query.user_id))]
pub async fn handle(
    state: &FeatureState,
    query: GetTokensQuery,
) -> Result<GetTokensResponse, GetTokensError> {
    let ciphertext = state
        .credentials
        .load_token(query.user_id, TokenSlot::OAuthPair)
        .await
        .map_err(|e| match e {
            crate::db::DbError::NotFound(_) => GetTokensError::UserNotFound(query.user_id),
            other => GetTokensError::Database(other),
        })?
        .ok_or(GetTokensError::NoTokensStored(query.user_id))?;

    let combined = state.cipher.decrypt_string(&ciphertext)?;
    let (access_token, refresh_token) = TokenCipher::split_token_pair(&combined)?;

    Ok(GetTokensResponse {
        access_token,
        refresh_token,
    })
}
