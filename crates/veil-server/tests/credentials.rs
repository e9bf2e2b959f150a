//! End-to-end credential storage: signup, encrypt-at-rest, decrypt-on-read

use std::sync::Arc;

use uuid::Uuid;

use veil_server::config::EngineConfig;
use veil_server::crypto::TokenCipher;
use veil_server::db::{CredentialStore, MemoryStore, TokenSlot};
use veil_server::engine::EngineClient;
use veil_server::features::credentials::commands::store_hf_token::{self, StoreHfTokenCommand};
use veil_server::features::credentials::commands::store_tokens::{self, StoreTokensCommand};
use veil_server::features::credentials::queries::get_tokens::{
    self, GetTokensError, GetTokensQuery,
};
use veil_server::features::users::commands::create::{self, CreateUserCommand};
use veil_server::features::FeatureState;

fn test_state() -> (FeatureState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = EngineClient::new(&EngineConfig {
        base_url: "http://localhost:1".to_string(),
        timeout_secs: 1,
    })
    .unwrap();

    let state = FeatureState {
        datasets: store.clone(),
        credentials: store.clone(),
        engine,
        cipher: TokenCipher::new([7u8; 32]),
    };

    (state, store)
}

async fn signup(state: &FeatureState, email: &str) -> Uuid {
    create::handle(
        state,
        CreateUserCommand {
            email: email.to_string(),
            password: "correct-horse-battery".to_string(),
            role: "data_owner".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_token_pair_round_trip_through_store() {
    let (state, store) = test_state();
    let user_id = signup(&state, "owner@example.com").await;

    store_tokens::handle(
        &state,
        StoreTokensCommand {
            user_id,
            access_token: "access123".to_string(),
            refresh_token: "refresh456".to_string(),
        },
    )
    .await
    .unwrap();

    // The stored column is ciphertext in the legacy format, not plaintext
    let stored = store
        .load_token(user_id, TokenSlot::OAuthPair)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.contains("access123"));
    assert!(!stored.contains("refresh456"));
    let (iv_hex, _) = stored.split_once(':').unwrap();
    assert_eq!(iv_hex.len(), 32);

    let tokens = get_tokens::handle(&state, GetTokensQuery { user_id })
        .await
        .unwrap();
    assert_eq!(tokens.access_token, "access123");
    assert_eq!(tokens.refresh_token, "refresh456");
}

#[tokio::test]
async fn test_get_tokens_before_any_stored() {
    let (state, _store) = test_state();
    let user_id = signup(&state, "owner@example.com").await;

    let err = get_tokens::handle(&state, GetTokensQuery { user_id })
        .await
        .unwrap_err();
    assert!(matches!(err, GetTokensError::NoTokensStored(_)));
}

#[tokio::test]
async fn test_get_tokens_for_unknown_user() {
    let (state, _store) = test_state();

    let err = get_tokens::handle(
        &state,
        GetTokensQuery {
            user_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, GetTokensError::UserNotFound(_)));
}

#[tokio::test]
async fn test_hf_token_is_encrypted_in_its_own_slot() {
    let (state, store) = test_state();
    let user_id = signup(&state, "owner@example.com").await;

    store_hf_token::handle(
        &state,
        StoreHfTokenCommand {
            user_id,
            hf_token: "hf_abc123".to_string(),
        },
    )
    .await
    .unwrap();

    let stored = store
        .load_token(user_id, TokenSlot::HuggingFace)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.contains("hf_abc123"));

    // The OAuth slot is untouched
    assert!(store
        .load_token(user_id, TokenSlot::OAuthPair)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_signup_stores_password_hash_not_plaintext() {
    let (state, _store) = test_state();
    let response = create::handle(
        &state,
        CreateUserCommand {
            email: "owner@example.com".to_string(),
            password: "correct-horse-battery".to_string(),
            role: "data_scientist".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(response.email, "owner@example.com");

    let json = serde_json::to_string(&response).unwrap();
    assert!(!json.contains("correct-horse-battery"));
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let (state, _store) = test_state();
    signup(&state, "owner@example.com").await;

    let err = create::handle(
        &state,
        CreateUserCommand {
            email: "owner@example.com".to_string(),
            password: "another-password".to_string(),
            role: "data_owner".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        veil_server::features::users::commands::create::CreateUserError::DuplicateEmail(_)
    ));
}
