//! Domain models shared across feature slices

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veil_common::types::Role;

/// One uploaded or generated data file with its privacy-budget ledger state.
///
/// `privacy_budget` only ever decreases through the ledger and
/// `total_queries` only ever increases; `version` is bumped on every write
/// and guards spend updates against lost-update races.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub file_name: String,
    pub file_type: String,
    pub file_path: String,
    pub privacy_budget: f64,
    pub total_queries: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDataset {
    pub file_name: String,
    pub file_type: String,
    pub file_path: String,
    pub privacy_budget: f64,
}

/// Ledger-driven update: budget and counter always move together
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerEntry {
    pub privacy_budget: f64,
    pub total_queries: i64,
}

/// Administrative patch applied outside the spend path.
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_queries: Option<i64>,
}

impl DatasetPatch {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        self.file_name.is_none()
            && self.file_path.is_none()
            && self.privacy_budget.is_none()
            && self.total_queries.is_none()
    }
}

/// An authenticated principal.
///
/// Token columns hold `TokenCipher` output only; plaintext credentials are
/// never written to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub encrypted_token: Option<String>,
    #[serde(skip_serializing)]
    pub encrypted_hf_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch() {
        assert!(DatasetPatch::default().is_empty());

        let patch = DatasetPatch {
            privacy_budget: Some(0.5),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_user_serialization_hides_tokens() {
        let user = User {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            role: Role::DataOwner,
            encrypted_token: Some("aa:bb".to_string()),
            encrypted_hf_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("encrypted_token"));
        assert!(!json.contains("aa:bb"));
    }
}
