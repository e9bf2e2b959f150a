//! Get dataset query

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::FeatureState;
use crate::models::Dataset;

/// Query for a single dataset by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetQuery {
    pub dataset_id: Uuid,
    pub user_id: Uuid,
}

/// Response containing the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetResponse {
    pub dataset: Dataset,
}

/// Errors that can occur when fetching a dataset
#[derive(Debug, thiserror::Error)]
pub enum GetDatasetError {
    #[error("Dataset '{0}' not found")]
    NotFoundOrUnauthorized(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

/// Handler function for fetching a dataset
#[tracing::instrument(skip(state), fields(dataset_id = %query.dataset_id))]
pub async fn handle(
    state: &FeatureState,
    query: GetDatasetQuery,
) -> Result<GetDatasetResponse, GetDatasetError> {
    let dataset = state
        .datasets
        .find_for_user(query.dataset_id, query.user_id)
        .await?
        .ok_or(GetDatasetError::NotFoundOrUnauthorized(query.dataset_id))?;

    Ok(GetDatasetResponse { dataset })
}
