//! Postgres-backed store implementations
//!
//! Queries are runtime-checked (`query_as`) rather than macro-checked so the
//! crate builds without a live database. The column lists are kept explicit
//! and in sync with `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use veil_common::types::Role;

use super::{CredentialStore, DatasetStore, DbError, DbResult, TokenSlot};
use crate::models::{Dataset, DatasetPatch, LedgerEntry, NewDataset, NewUser, User};

const DATASET_COLUMNS: &str = "id, file_name, file_type, file_path, privacy_budget, \
     total_queries, version, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, email, role, encrypted_token, encrypted_hf_token, created_at, updated_at";

/// Store backed by a shared Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DatasetRow {
    id: Uuid,
    file_name: String,
    file_type: String,
    file_path: String,
    privacy_budget: f64,
    total_queries: i64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            id: row.id,
            file_name: row.file_name,
            file_type: row.file_type,
            file_path: row.file_path,
            privacy_budget: row.privacy_budget,
            total_queries: row.total_queries,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    encrypted_token: Option<String>,
    encrypted_hf_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> DbResult<User> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| DbError::Config(format!("unknown role '{}' in users table", row.role)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            role,
            encrypted_token: row.encrypted_token,
            encrypted_hf_token: row.encrypted_hf_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn token_column(slot: TokenSlot) -> &'static str {
    match slot {
        TokenSlot::OAuthPair => "encrypted_token",
        TokenSlot::HuggingFace => "encrypted_hf_token",
    }
}

#[async_trait]
impl DatasetStore for PgStore {
    #[tracing::instrument(skip(self, dataset), fields(file_name = %dataset.file_name))]
    async fn insert(&self, dataset: NewDataset, owner_id: Uuid) -> DbResult<Dataset> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DatasetRow>(&format!(
            "INSERT INTO datasets (id, file_name, file_type, file_path, privacy_budget, total_queries, version) \
             VALUES ($1, $2, $3, $4, $5, 0, 0) \
             RETURNING {DATASET_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&dataset.file_name)
        .bind(&dataset.file_type)
        .bind(&dataset.file_path)
        .bind(dataset.privacy_budget)
        .fetch_one(&mut *tx)
        .await?;

        // Exactly one owning association is created with the dataset
        sqlx::query("INSERT INTO dataset_owners (dataset_id, user_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn find_for_user(&self, dataset_id: Uuid, user_id: Uuid) -> DbResult<Option<Dataset>> {
        let row = sqlx::query_as::<_, DatasetRow>(&format!(
            "SELECT d.{} \
             FROM datasets d \
             JOIN dataset_owners o ON o.dataset_id = d.id \
             WHERE d.id = $1 AND o.user_id = $2",
            DATASET_COLUMNS.replace(", ", ", d.")
        ))
        .bind(dataset_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Dataset>> {
        let rows = sqlx::query_as::<_, DatasetRow>(&format!(
            "SELECT d.{} \
             FROM datasets d \
             JOIN dataset_owners o ON o.dataset_id = d.id \
             WHERE o.user_id = $1 \
             ORDER BY d.updated_at DESC",
            DATASET_COLUMNS.replace(", ", ", d.")
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn update_guarded(
        &self,
        dataset_id: Uuid,
        expected_version: i64,
        entry: LedgerEntry,
    ) -> DbResult<Option<Dataset>> {
        // Budget and counter are written in one statement; the version
        // predicate rejects writers that read stale state
        let row = sqlx::query_as::<_, DatasetRow>(&format!(
            "UPDATE datasets \
             SET privacy_budget = $2, total_queries = $3, version = version + 1, updated_at = NOW() \
             WHERE id = $1 AND version = $4 \
             RETURNING {DATASET_COLUMNS}"
        ))
        .bind(dataset_id)
        .bind(entry.privacy_budget)
        .bind(entry.total_queries)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_fields(&self, dataset_id: Uuid, patch: DatasetPatch) -> DbResult<Dataset> {
        let row = sqlx::query_as::<_, DatasetRow>(&format!(
            "UPDATE datasets \
             SET file_name = COALESCE($2, file_name), \
                 file_path = COALESCE($3, file_path), \
                 privacy_budget = COALESCE($4, privacy_budget), \
                 total_queries = COALESCE($5, total_queries), \
                 version = version + 1, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {DATASET_COLUMNS}"
        ))
        .bind(dataset_id)
        .bind(patch.file_name)
        .bind(patch.file_path)
        .bind(patch.privacy_budget)
        .bind(patch.total_queries)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Dataset", &dataset_id.to_string()))?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, dataset_id: Uuid) -> DbResult<()> {
        // Ownership rows go with the dataset via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(dataset_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Dataset", &dataset_id.to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                DbError::duplicate("User", &user.email)
            },
            _ => DbError::Sqlx(e),
        })?;

        sqlx::query("INSERT INTO passwords (user_id, hash) VALUES ($1, $2)")
            .bind(row.id)
            .bind(&user.password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn find_user(&self, user_id: Uuid) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, user_id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user_id.to_string()));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, ciphertext))]
    async fn store_token(&self, user_id: Uuid, slot: TokenSlot, ciphertext: &str) -> DbResult<()> {
        let result = sqlx::query(&format!(
            "UPDATE users SET {} = $2, updated_at = NOW() WHERE id = $1",
            token_column(slot)
        ))
        .bind(user_id)
        .bind(ciphertext)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user_id.to_string()));
        }

        Ok(())
    }

    async fn load_token(&self, user_id: Uuid, slot: TokenSlot) -> DbResult<Option<String>> {
        let row = sqlx::query_scalar::<_, Option<String>>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            token_column(slot)
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Err(DbError::not_found("User", &user_id.to_string())),
            Some(token) => Ok(token),
        }
    }
}
