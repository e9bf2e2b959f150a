//! Create dataset command

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::validation::{
    validate_budget, validate_file_name, BudgetValidationError, FileNameValidationError,
};
use crate::features::FeatureState;
use crate::models::{Dataset, NewDataset};

/// Maximum length for dataset file names
const MAX_FILE_NAME_LEN: usize = 255;

/// Command to register a new dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetCommand {
    /// Caller who becomes the single owner (set from the request, not the body)
    #[serde(default)]
    pub user_id: Uuid,

    /// File name as the engine knows it
    pub file_name: String,

    /// File type, e.g. "csv"
    pub file_type: String,

    /// Engine-understood location of the file
    pub file_path: String,

    /// Initial privacy budget
    pub privacy_budget: f64,
}

/// Response from creating a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetResponse {
    pub dataset: Dataset,
}

/// Errors that can occur when creating a dataset
#[derive(Debug, thiserror::Error)]
pub enum CreateDatasetError {
    #[error("File name validation failed: {0}")]
    FileNameValidation(#[from] FileNameValidationError),

    #[error("File type is required")]
    FileTypeRequired,

    #[error("File path is required")]
    FilePathRequired,

    #[error("Budget validation failed: {0}")]
    BudgetValidation(#[from] BudgetValidationError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

impl CreateDatasetCommand {
    /// Validates the command parameters
    pub fn validate(&self) -> Result<(), CreateDatasetError> {
        validate_file_name(&self.file_name, MAX_FILE_NAME_LEN)?;

        if self.file_type.trim().is_empty() {
            return Err(CreateDatasetError::FileTypeRequired);
        }

        if self.file_path.trim().is_empty() {
            return Err(CreateDatasetError::FilePathRequired);
        }

        validate_budget(self.privacy_budget)?;

        Ok(())
    }
}

/// Handler function for creating datasets
#[tracing::instrument(
    skip(state, command),
    fields(file_name = %command.file_name, owner = %command.user_id)
)]
pub async fn handle(
    state: &FeatureState,
    command: CreateDatasetCommand,
) -> Result<CreateDatasetResponse, CreateDatasetError> {
    command.validate()?;

    let new_dataset = NewDataset {
        file_name: command.file_name,
        file_type: command.file_type,
        file_path: command.file_path,
        privacy_budget: command.privacy_budget,
    };

    let dataset = state.datasets.insert(new_dataset, command.user_id).await?;

    tracing::info!(
        dataset_id = %dataset.id,
        file_name = %dataset.file_name,
        "Dataset created"
    );

    Ok(CreateDatasetResponse { dataset })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> CreateDatasetCommand {
        CreateDatasetCommand {
            user_id: Uuid::new_v4(),
            file_name: "ratings.csv".to_string(),
            file_type: "csv".to_string(),
            file_path: "data/ratings.csv".to_string(),
            privacy_budget: 1.0,
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_traversal_file_name() {
        let mut cmd = command();
        cmd.file_name = "../secrets.csv".to_string();
        assert!(matches!(
            cmd.validate(),
            Err(CreateDatasetError::FileNameValidation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_blank_type_and_path() {
        let mut cmd = command();
        cmd.file_type = " ".to_string();
        assert!(matches!(cmd.validate(), Err(CreateDatasetError::FileTypeRequired)));

        let mut cmd = command();
        cmd.file_path = String::new();
        assert!(matches!(cmd.validate(), Err(CreateDatasetError::FilePathRequired)));
    }

    #[test]
    fn test_validation_rejects_negative_budget() {
        let mut cmd = command();
        cmd.privacy_budget = -0.5;
        assert!(matches!(
            cmd.validate(),
            Err(CreateDatasetError::BudgetValidation(_))
        ));
    }

    #[test]
    fn test_zero_budget_is_allowed() {
        // A dataset can exist with nothing left to spend
        let mut cmd = command();
        cmd.privacy_budget = 0.0;
        assert!(cmd.validate().is_ok());
    }
}
