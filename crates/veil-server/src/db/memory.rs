//! In-memory store
//!
//! Implements the store traits over a `Mutex`-guarded map. Used by tests
//! and local development without Postgres; the guarded-update semantics
//! mirror the Postgres implementation exactly.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, DatasetStore, DbError, DbResult, TokenSlot};
use crate::models::{Dataset, DatasetPatch, LedgerEntry, NewDataset, NewUser, User};

#[derive(Default)]
struct Inner {
    datasets: HashMap<Uuid, Dataset>,
    // dataset id -> owning user id (exactly one owner per dataset)
    owners: HashMap<Uuid, Uuid>,
    users: HashMap<Uuid, User>,
    passwords: HashMap<Uuid, String>,
}

/// Thread-safe in-memory implementation of both store traits
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise the
    /// engine-succeeded-but-persistence-failed window in tests
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn insert(&self, dataset: NewDataset, owner_id: Uuid) -> DbResult<Dataset> {
        self.check_writable()?;

        let now = Utc::now();
        let record = Dataset {
            id: Uuid::new_v4(),
            file_name: dataset.file_name,
            file_type: dataset.file_type,
            file_path: dataset.file_path,
            privacy_budget: dataset.privacy_budget,
            total_queries: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.lock();
        inner.owners.insert(record.id, owner_id);
        inner.datasets.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_for_user(&self, dataset_id: Uuid, user_id: Uuid) -> DbResult<Option<Dataset>> {
        let inner = self.lock();

        match inner.owners.get(&dataset_id) {
            Some(owner) if *owner == user_id => Ok(inner.datasets.get(&dataset_id).cloned()),
            _ => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Dataset>> {
        let inner = self.lock();

        let mut datasets: Vec<Dataset> = inner
            .owners
            .iter()
            .filter(|(_, owner)| **owner == user_id)
            .filter_map(|(id, _)| inner.datasets.get(id).cloned())
            .collect();
        datasets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(datasets)
    }

    async fn update_guarded(
        &self,
        dataset_id: Uuid,
        expected_version: i64,
        entry: LedgerEntry,
    ) -> DbResult<Option<Dataset>> {
        self.check_writable()?;

        let mut inner = self.lock();

        let Some(dataset) = inner.datasets.get_mut(&dataset_id) else {
            return Ok(None);
        };

        if dataset.version != expected_version {
            return Ok(None);
        }

        dataset.privacy_budget = entry.privacy_budget;
        dataset.total_queries = entry.total_queries;
        dataset.version += 1;
        dataset.updated_at = Utc::now();

        Ok(Some(dataset.clone()))
    }

    async fn update_fields(&self, dataset_id: Uuid, patch: DatasetPatch) -> DbResult<Dataset> {
        self.check_writable()?;

        let mut inner = self.lock();

        let dataset = inner
            .datasets
            .get_mut(&dataset_id)
            .ok_or_else(|| DbError::not_found("Dataset", &dataset_id.to_string()))?;

        if let Some(file_name) = patch.file_name {
            dataset.file_name = file_name;
        }
        if let Some(file_path) = patch.file_path {
            dataset.file_path = file_path;
        }
        if let Some(privacy_budget) = patch.privacy_budget {
            dataset.privacy_budget = privacy_budget;
        }
        if let Some(total_queries) = patch.total_queries {
            dataset.total_queries = total_queries;
        }
        dataset.version += 1;
        dataset.updated_at = Utc::now();

        Ok(dataset.clone())
    }

    async fn delete(&self, dataset_id: Uuid) -> DbResult<()> {
        self.check_writable()?;

        let mut inner = self.lock();

        inner
            .datasets
            .remove(&dataset_id)
            .ok_or_else(|| DbError::not_found("Dataset", &dataset_id.to_string()))?;
        inner.owners.remove(&dataset_id);

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> DbResult<User> {
        self.check_writable()?;

        let mut inner = self.lock();

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(DbError::duplicate("User", &user.email));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            role: user.role,
            encrypted_token: None,
            encrypted_hf_token: None,
            created_at: now,
            updated_at: now,
        };

        inner.passwords.insert(record.id, user.password_hash);
        inner.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_user(&self, user_id: Uuid) -> DbResult<Option<User>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn delete_user(&self, user_id: Uuid) -> DbResult<()> {
        self.check_writable()?;

        let mut inner = self.lock();

        inner
            .users
            .remove(&user_id)
            .ok_or_else(|| DbError::not_found("User", &user_id.to_string()))?;
        inner.passwords.remove(&user_id);
        inner.owners.retain(|_, owner| *owner != user_id);

        Ok(())
    }

    async fn store_token(&self, user_id: Uuid, slot: TokenSlot, ciphertext: &str) -> DbResult<()> {
        self.check_writable()?;

        let mut inner = self.lock();

        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DbError::not_found("User", &user_id.to_string()))?;

        match slot {
            TokenSlot::OAuthPair => user.encrypted_token = Some(ciphertext.to_string()),
            TokenSlot::HuggingFace => user.encrypted_hf_token = Some(ciphertext.to_string()),
        }
        user.updated_at = Utc::now();

        Ok(())
    }

    async fn load_token(&self, user_id: Uuid, slot: TokenSlot) -> DbResult<Option<String>> {
        let inner = self.lock();

        let user = inner
            .users
            .get(&user_id)
            .ok_or_else(|| DbError::not_found("User", &user_id.to_string()))?;

        Ok(match slot {
            TokenSlot::OAuthPair => user.encrypted_token.clone(),
            TokenSlot::HuggingFace => user.encrypted_hf_token.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_common::types::Role;

    fn new_dataset() -> NewDataset {
        NewDataset {
            file_name: "ratings.csv".to_string(),
            file_type: "csv".to_string(),
            file_path: "data/ratings.csv".to_string(),
            privacy_budget: 1.0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_for_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let created = store.insert(new_dataset(), owner).await.unwrap();
        assert_eq!(created.total_queries, 0);
        assert_eq!(created.version, 0);

        let found = store.find_for_user(created.id, owner).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_find_for_other_user_is_none() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = store.insert(new_dataset(), owner).await.unwrap();

        let found = store
            .find_for_user(created.id, Uuid::new_v4())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_guarded_applies_both_fields() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = store.insert(new_dataset(), owner).await.unwrap();

        let updated = store
            .update_guarded(
                created.id,
                created.version,
                LedgerEntry {
                    privacy_budget: 0.9,
                    total_queries: 1,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.privacy_budget, 0.9);
        assert_eq!(updated.total_queries, 1);
        assert_eq!(updated.version, created.version + 1);
    }

    #[tokio::test]
    async fn test_update_guarded_rejects_stale_version() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = store.insert(new_dataset(), owner).await.unwrap();

        let entry = LedgerEntry {
            privacy_budget: 0.9,
            total_queries: 1,
        };
        assert!(store
            .update_guarded(created.id, created.version, entry)
            .await
            .unwrap()
            .is_some());

        // Second writer with the same starting version loses
        let stale = store
            .update_guarded(created.id, created.version, entry)
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_update_fields_leaves_unset_alone() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = store.insert(new_dataset(), owner).await.unwrap();

        let updated = store
            .update_fields(
                created.id,
                DatasetPatch {
                    privacy_budget: Some(0.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.privacy_budget, 0.5);
        assert_eq!(updated.file_name, created.file_name);
        assert_eq!(updated.total_queries, created.total_queries);
    }

    #[tokio::test]
    async fn test_token_slots_are_independent() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "owner@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::DataOwner,
            })
            .await
            .unwrap();

        store
            .store_token(user.id, TokenSlot::OAuthPair, "aa:bb")
            .await
            .unwrap();

        assert_eq!(
            store
                .load_token(user.id, TokenSlot::OAuthPair)
                .await
                .unwrap()
                .as_deref(),
            Some("aa:bb")
        );
        assert!(store
            .load_token(user.id, TokenSlot::HuggingFace)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "owner@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::DataOwner,
        };

        store.create_user(user.clone()).await.unwrap();
        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_fail_writes_injection() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        let err = store.insert(new_dataset(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)));
    }
}
