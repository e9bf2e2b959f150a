//! List datasets query

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::FeatureState;
use crate::models::Dataset;

/// Query for all datasets owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDatasetsQuery {
    pub user_id: Uuid,
}

/// Response containing the owned datasets, most recently updated first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDatasetsResponse {
    pub datasets: Vec<Dataset>,
}

/// Errors that can occur when listing datasets
#[derive(Debug, thiserror::Error)]
pub enum ListDatasetsError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

/// Handler function for listing a user's datasets
#[tracing::instrument(skip(state), fields(user_id = %query.user_id))]
pub async fn handle(
    state: &FeatureState,
    query: ListDatasetsQuery,
) -> Result<ListDatasetsResponse, ListDatasetsError> {
    let datasets = state.datasets.list_for_user(query.user_id).await?;

    tracing::debug!(count = datasets.len(), "Datasets listed");

    Ok(ListDatasetsResponse { datasets })
}
