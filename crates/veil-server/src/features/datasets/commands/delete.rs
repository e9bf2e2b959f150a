//! Delete dataset command
//!
//! The engine is asked to remove the backing file first; that call is
//! best-effort. The ledger row is the source of truth and its removal is
//! what counts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::FeatureState;

/// Command to delete a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetCommand {
    pub dataset_id: Uuid,
    pub user_id: Uuid,
}

/// Response from deleting a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetResponse {
    pub dataset_id: Uuid,
    /// False when the engine could not remove the backing file; the dataset
    /// row is gone either way
    pub file_removed: bool,
}

/// Errors that can occur when deleting a dataset
#[derive(Debug, thiserror::Error)]
pub enum DeleteDatasetError {
    #[error("Dataset '{0}' not found")]
    NotFoundOrUnauthorized(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

/// Handler function for deleting datasets
#[tracing::instrument(skip(state), fields(dataset_id = %command.dataset_id))]
pub async fn handle(
    state: &FeatureState,
    command: DeleteDatasetCommand,
) -> Result<DeleteDatasetResponse, DeleteDatasetError> {
    let dataset = state
        .datasets
        .find_for_user(command.dataset_id, command.user_id)
        .await?
        .ok_or(DeleteDatasetError::NotFoundOrUnauthorized(command.dataset_id))?;

    let file_removed = match state
        .engine
        .delete_file(&dataset.file_path, &dataset.file_name)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                dataset_id = %dataset.id,
                "Engine could not remove backing file, continuing: {}",
                e
            );
            false
        },
    };

    state.datasets.delete(dataset.id).await?;

    tracing::info!(dataset_id = %dataset.id, file_removed, "Dataset deleted");

    Ok(DeleteDatasetResponse {
        dataset_id: dataset.id,
        file_removed,
    })
}
