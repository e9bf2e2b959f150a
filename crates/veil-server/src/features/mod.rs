//! Feature modules implementing the Veil API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes:
//!
//! - **datasets**: dataset CRUD plus the engine-backed column listing
//! - **budget**: the privacy-budget ledger (spend, administrative update)
//! - **users**: signup and account removal
//! - **credentials**: encrypted bearer-token storage and retrieval
//!
//! Commands are plain data structures validated before any I/O; handlers are
//! standalone async functions taking [`FeatureState`]. Handlers reach the
//! database only through the store traits so tests can run against the
//! in-memory implementation.

pub mod budget;
pub mod credentials;
pub mod datasets;
pub mod shared;
pub mod users;

use axum::Router;
use std::sync::Arc;

use crate::crypto::TokenCipher;
use crate::db::{CredentialStore, DatasetStore};
use crate::engine::EngineClient;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Dataset store (Postgres in production, in-memory in tests)
    pub datasets: Arc<dyn DatasetStore>,
    /// User and token store
    pub credentials: Arc<dyn CredentialStore>,
    /// Client for the noisy-statistics engine
    pub engine: EngineClient,
    /// Cipher for bearer-token material
    pub cipher: TokenCipher,
}

/// Creates the main API router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    // Ledger routes live under /datasets alongside the CRUD routes, so the
    // two routers are merged before the prefix is applied
    let dataset_routes = datasets::dataset_routes().merge(budget::budget_routes());
    let user_routes = users::user_routes().merge(credentials::credential_routes());

    Router::new()
        .nest("/datasets", dataset_routes.with_state(state.clone()))
        .nest("/users", user_routes.with_state(state))
}
