//! Persistence layer
//!
//! Handlers never talk to Postgres directly; they go through the
//! [`DatasetStore`] and [`CredentialStore`] traits so tests can substitute
//! the in-memory implementation. The connection pool is built once at
//! startup and injected, never held in module-level state.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{Dataset, DatasetPatch, LedgerEntry, NewDataset, NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Record already exists (unique constraint violation)
    #[error("{0}")]
    Duplicate(String),
}

impl DbError {
    /// Create a not found error with resource context
    pub fn not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFound(format!("{} '{}' not found", resource_type, identifier))
    }

    /// Create a duplicate error with resource context
    pub fn duplicate(resource_type: &str, identifier: &str) -> Self {
        Self::Duplicate(format!("{} '{}' already exists", resource_type, identifier))
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Which encrypted credential column a token lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSlot {
    /// Combined OAuth access/refresh pair
    OAuthPair,
    /// Hugging Face API token
    HuggingFace,
}

/// Store for datasets and their ownership associations.
///
/// `update_guarded` is the only mutation the spend path may use: it applies
/// the budget and counter together, conditioned on the version last read.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Insert a dataset and its single owning association in one transaction
    async fn insert(&self, dataset: NewDataset, owner_id: Uuid) -> DbResult<Dataset>;

    /// Fetch a dataset only if `user_id` owns it; `Ok(None)` covers both
    /// "missing" and "not yours" so callers cannot probe for existence
    async fn find_for_user(&self, dataset_id: Uuid, user_id: Uuid) -> DbResult<Option<Dataset>>;

    /// All datasets owned by `user_id`, most recently updated first
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Dataset>>;

    /// Conditionally apply a ledger entry: both fields are written together
    /// and only if the stored version still equals `expected_version`.
    /// Returns `Ok(None)` when the precondition fails (concurrent writer).
    async fn update_guarded(
        &self,
        dataset_id: Uuid,
        expected_version: i64,
        entry: LedgerEntry,
    ) -> DbResult<Option<Dataset>>;

    /// Administrative multi-field patch, unconditional but still atomic
    async fn update_fields(&self, dataset_id: Uuid, patch: DatasetPatch) -> DbResult<Dataset>;

    /// Delete a dataset and its ownership rows
    async fn delete(&self, dataset_id: Uuid) -> DbResult<()>;
}

/// Store for users and their encrypted credential columns
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a user with a hashed password
    async fn create_user(&self, user: NewUser) -> DbResult<User>;

    /// Look up a user by id
    async fn find_user(&self, user_id: Uuid) -> DbResult<Option<User>>;

    /// Look up a user by email
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>>;

    /// Delete a user; ownership associations cascade
    async fn delete_user(&self, user_id: Uuid) -> DbResult<()>;

    /// Overwrite one encrypted credential column
    async fn store_token(&self, user_id: Uuid, slot: TokenSlot, ciphertext: &str) -> DbResult<()>;

    /// Read one encrypted credential column; `Ok(None)` when the user has
    /// no token stored in that slot
    async fn load_token(&self, user_id: Uuid, slot: TokenSlot) -> DbResult<Option<String>>;
}

/// Build the connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> DbResult<PgPool> {
    if config.url.is_empty() {
        return Err(DbError::Config("DATABASE_URL not set".to_string()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    Ok(pool)
}
