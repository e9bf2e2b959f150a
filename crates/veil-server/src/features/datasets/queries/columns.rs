//! Dataset column-names query
//!
//! Column discovery is delegated to the engine, which is the only component
//! allowed to open the data files.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::EngineError;
use crate::features::FeatureState;

/// Query for the column names of a dataset's file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetColumnsQuery {
    pub dataset_id: Uuid,
    pub user_id: Uuid,
}

/// Response containing the column names as the engine reports them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetColumnsResponse {
    pub columns: Vec<String>,
}

/// Errors that can occur when listing columns
#[derive(Debug, thiserror::Error)]
pub enum GetColumnsError {
    #[error("Dataset '{0}' not found")]
    NotFoundOrUnauthorized(Uuid),

    #[error("Column listing failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

/// Handler function for listing a dataset's columns
#[tracing::instrument(skip(state), fields(dataset_id = %query.dataset_id))]
pub async fn handle(
    state: &FeatureState,
    query: GetColumnsQuery,
) -> Result<GetColumnsResponse, GetColumnsError> {
    let dataset = state
        .datasets
        .find_for_user(query.dataset_id, query.user_id)
        .await?
        .ok_or(GetColumnsError::NotFoundOrUnauthorized(query.dataset_id))?;

    let columns = state.engine.get_column_names(&dataset.file_name).await?;

    Ok(GetColumnsResponse { columns })
}
