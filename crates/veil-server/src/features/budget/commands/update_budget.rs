//! Administrative budget update command
//!
//! Distinct from the spend path: it never touches the engine and can set the
//! budget to any non-negative value, for topping up or correcting a ledger.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{validate_budget, BudgetValidationError};
use crate::features::FeatureState;
use crate::models::{Dataset, DatasetPatch};

/// Command to administratively update a dataset's ledger fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBudgetCommand {
    /// Dataset to update (set from the URL path)
    #[serde(default)]
    pub dataset_id: Uuid,

    /// Caller (set from the authenticated request)
    #[serde(default)]
    pub user_id: Uuid,

    /// New budget value, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_budget: Option<f64>,

    /// New counter value, if changing; ignored when `reset_queries` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_queries: Option<i64>,

    /// Force the query counter back to zero regardless of `total_queries`
    #[serde(default)]
    pub reset_queries: bool,
}

/// Response from updating a budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBudgetResponse {
    pub dataset: Dataset,
}

/// Errors that can occur when updating a budget
#[derive(Debug, thiserror::Error)]
pub enum UpdateBudgetError {
    #[error("Budget validation failed: {0}")]
    BudgetValidation(#[from] BudgetValidationError),

    #[error("Total queries cannot be negative")]
    NegativeQueryCount,

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Dataset '{0}' not found")]
    NotFoundOrUnauthorized(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

impl UpdateBudgetCommand {
    /// Validates the command parameters
    pub fn validate(&self) -> Result<(), UpdateBudgetError> {
        if self.privacy_budget.is_none() && self.total_queries.is_none() && !self.reset_queries {
            return Err(UpdateBudgetError::NoFieldsToUpdate);
        }

        if let Some(budget) = self.privacy_budget {
            validate_budget(budget)?;
        }

        if let Some(queries) = self.total_queries {
            if queries < 0 {
                return Err(UpdateBudgetError::NegativeQueryCount);
            }
        }

        Ok(())
    }
}

/// Handler function for administrative budget updates
#[tracing::instrument(
    skip(state, command),
    fields(dataset_id = %command.dataset_id, reset_queries = command.reset_queries)
)]
pub async fn handle(
    state: &FeatureState,
    command: UpdateBudgetCommand,
) -> Result<UpdateBudgetResponse, UpdateBudgetError> {
    command.validate()?;

    let dataset = state
        .datasets
        .find_for_user(command.dataset_id, command.user_id)
        .await?
        .ok_or(UpdateBudgetError::NotFoundOrUnauthorized(command.dataset_id))?;

    // reset_queries overrides any supplied counter value
    let total_queries = if command.reset_queries {
        Some(0)
    } else {
        command.total_queries
    };

    let patch = DatasetPatch {
        privacy_budget: command.privacy_budget,
        total_queries,
        ..Default::default()
    };

    let updated = state.datasets.update_fields(dataset.id, patch).await?;

    tracing::info!(
        dataset_id = %updated.id,
        privacy_budget = updated.privacy_budget,
        total_queries = updated.total_queries,
        "Budget updated administratively"
    );

    Ok(UpdateBudgetResponse { dataset: updated })
}
