//! Spend command: consume privacy budget for one noisy query
//!
//! The ledger's core operation. Ordering is fixed: ownership check, budget
//! pre-check, engine call, guarded persistence. The engine is never reached
//! when the caller fails ownership or the budget is already exhausted, and
//! nothing is persisted when the engine fails.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veil_common::types::StatisticOperation;

use crate::engine::{EngineError, NoisyRequest};
use crate::features::FeatureState;
use crate::models::LedgerEntry;

/// Command to spend privacy budget on a noisy statistic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendBudgetCommand {
    /// Dataset to query (set from the URL path)
    #[serde(default)]
    pub dataset_id: Uuid,

    /// Caller (set from the authenticated request, never the body)
    #[serde(default)]
    pub user_id: Uuid,

    /// Statistic to compute
    pub operation: String,

    /// Column of the dataset file to compute over
    pub column_name: String,
}

/// Response from a successful spend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendBudgetResponse {
    /// The noisy statistic value returned by the engine
    pub statistic: f64,

    /// Budget remaining after this query
    pub remaining_budget: f64,

    /// Total queries recorded against the dataset, including this one
    pub total_queries: i64,
}

/// Errors that can occur when spending budget
#[derive(Debug, thiserror::Error)]
pub enum SpendBudgetError {
    /// Unknown statistic operation; rejected before any I/O
    #[error("Unsupported operation '{0}': expected one of mean, median, mode, min, max")]
    InvalidOperation(String),

    #[error("Column name is required")]
    ColumnRequired,

    /// Dataset missing or not owned by the caller. One variant for both so
    /// responses cannot be used to probe which datasets exist.
    #[error("Dataset '{0}' not found")]
    NotFoundOrUnauthorized(Uuid),

    /// Remaining budget cannot cover another query
    #[error("Privacy budget for dataset '{0}' is exhausted")]
    BudgetExhausted(Uuid),

    /// The engine failed or answered outside its contract; ledger state is
    /// untouched
    #[error("Statistic computation failed: {0}")]
    StatisticComputationFailed(#[from] EngineError),

    /// A concurrent spend won the version race; the caller should retry
    #[error("Dataset '{0}' was modified concurrently")]
    ConcurrentModification(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

impl SpendBudgetCommand {
    /// Validates the command parameters and resolves the operation
    pub fn validate(&self) -> Result<StatisticOperation, SpendBudgetError> {
        if self.column_name.trim().is_empty() {
            return Err(SpendBudgetError::ColumnRequired);
        }

        self.operation
            .parse()
            .map_err(|_| SpendBudgetError::InvalidOperation(self.operation.clone()))
    }
}

/// Handler function for spending privacy budget
#[tracing::instrument(
    skip(state, command),
    fields(
        dataset_id = %command.dataset_id,
        operation = %command.operation,
        column = %command.column_name
    )
)]
pub async fn handle(
    state: &FeatureState,
    command: SpendBudgetCommand,
) -> Result<SpendBudgetResponse, SpendBudgetError> {
    let operation = command.validate()?;

    // Ownership check; missing and not-owned are indistinguishable
    let dataset = state
        .datasets
        .find_for_user(command.dataset_id, command.user_id)
        .await?
        .ok_or(SpendBudgetError::NotFoundOrUnauthorized(command.dataset_id))?;

    // Refuse before contacting the engine when nothing is left to spend
    if dataset.privacy_budget <= 0.0 {
        return Err(SpendBudgetError::BudgetExhausted(dataset.id));
    }

    let request = NoisyRequest {
        privacy_budget: dataset.privacy_budget,
        file_name: dataset.file_name.clone(),
        column_name: command.column_name.clone(),
        total_queries: dataset.total_queries,
    };

    let noisy = state.engine.get_noisy(operation, &request).await?;

    // Budget and counter are committed together, conditioned on the version
    // read above; a concurrent spend in the window loses nothing but retries
    let entry = LedgerEntry {
        privacy_budget: noisy.updated_privacy_budget,
        total_queries: dataset.total_queries + 1,
    };

    let updated = state
        .datasets
        .update_guarded(dataset.id, dataset.version, entry)
        .await
        .map_err(|e| {
            // The engine already deducted; flag loudly for reconciliation
            tracing::error!(
                dataset_id = %dataset.id,
                "Ledger write failed after engine deduction: {}",
                e
            );
            e
        })?
        .ok_or(SpendBudgetError::ConcurrentModification(dataset.id))?;

    tracing::info!(
        dataset_id = %updated.id,
        remaining_budget = updated.privacy_budget,
        total_queries = updated.total_queries,
        "Privacy budget spent"
    );

    Ok(SpendBudgetResponse {
        statistic: noisy.statistic_value,
        remaining_budget: updated.privacy_budget,
        total_queries: updated.total_queries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(operation: &str, column: &str) -> SpendBudgetCommand {
        SpendBudgetCommand {
            dataset_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            operation: operation.to_string(),
            column_name: column.to_string(),
        }
    }

    #[test]
    fn test_validation_accepts_known_operations() {
        for op in ["mean", "median", "mode", "min", "max"] {
            assert!(command(op, "age").validate().is_ok(), "'{}' should be valid", op);
        }
    }

    #[test]
    fn test_validation_is_case_insensitive() {
        assert_eq!(
            command("MEAN", "age").validate().unwrap(),
            StatisticOperation::Mean
        );
    }

    #[test]
    fn test_validation_rejects_unknown_operation() {
        assert!(matches!(
            command("variance", "age").validate(),
            Err(SpendBudgetError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_empty_column() {
        assert!(matches!(
            command("mean", "  ").validate(),
            Err(SpendBudgetError::ColumnRequired)
        ));
    }
}
