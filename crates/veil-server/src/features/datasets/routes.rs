//! Dataset API routes
//!
//! - `POST /api/v1/datasets` - Register a new dataset
//! - `GET /api/v1/datasets` - List the caller's datasets
//! - `GET /api/v1/datasets/:id` - Fetch a single dataset
//! - `GET /api/v1/datasets/:id/columns` - Column names via the engine
//! - `DELETE /api/v1/datasets/:id` - Delete a dataset

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::caller_id;
use crate::features::FeatureState;

use super::commands::{
    CreateDatasetCommand, CreateDatasetError, DeleteDatasetCommand, DeleteDatasetError,
};
use super::queries::{
    GetColumnsError, GetColumnsQuery, GetDatasetError, GetDatasetQuery, ListDatasetsQuery,
};

/// Creates the datasets router with all routes configured
pub fn dataset_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", post(create_dataset))
        .route("/", get(list_datasets))
        .route("/:id", get(get_dataset))
        .route("/:id", delete(delete_dataset))
        .route("/:id/columns", get(get_columns))
}

#[tracing::instrument(skip(state, command, headers), fields(file_name = %command.file_name))]
async fn create_dataset(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Json(mut command): Json<CreateDatasetCommand>,
) -> Result<Response, DatasetApiError> {
    command.user_id = caller_id(&headers).map_err(DatasetApiError::Caller)?;

    let response = super::commands::create::handle(&state, command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, headers))]
async fn list_datasets(
    State(state): State<FeatureState>,
    headers: HeaderMap,
) -> Result<Response, DatasetApiError> {
    let query = ListDatasetsQuery {
        user_id: caller_id(&headers).map_err(DatasetApiError::Caller)?,
    };

    let response = super::queries::list::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, headers), fields(dataset_id = %dataset_id))]
async fn get_dataset(
    State(state): State<FeatureState>,
    Path(dataset_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, DatasetApiError> {
    let query = GetDatasetQuery {
        dataset_id,
        user_id: caller_id(&headers).map_err(DatasetApiError::Caller)?,
    };

    let response = super::queries::get::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, headers), fields(dataset_id = %dataset_id))]
async fn get_columns(
    State(state): State<FeatureState>,
    Path(dataset_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, DatasetApiError> {
    let query = GetColumnsQuery {
        dataset_id,
        user_id: caller_id(&headers).map_err(DatasetApiError::Caller)?,
    };

    let response = super::queries::columns::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, headers), fields(dataset_id = %dataset_id))]
async fn delete_dataset(
    State(state): State<FeatureState>,
    Path(dataset_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, DatasetApiError> {
    let command = DeleteDatasetCommand {
        dataset_id,
        user_id: caller_id(&headers).map_err(DatasetApiError::Caller)?,
    };

    let response = super::commands::delete::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Unified error type for dataset API endpoints
#[derive(Debug)]
enum DatasetApiError {
    Create(CreateDatasetError),
    Delete(DeleteDatasetError),
    Get(GetDatasetError),
    List(super::queries::ListDatasetsError),
    Columns(GetColumnsError),
    Caller(crate::error::AppError),
}

impl From<CreateDatasetError> for DatasetApiError {
    fn from(err: CreateDatasetError) -> Self {
        Self::Create(err)
    }
}

impl From<DeleteDatasetError> for DatasetApiError {
    fn from(err: DeleteDatasetError) -> Self {
        Self::Delete(err)
    }
}

impl From<GetDatasetError> for DatasetApiError {
    fn from(err: GetDatasetError) -> Self {
        Self::Get(err)
    }
}

impl From<super::queries::ListDatasetsError> for DatasetApiError {
    fn from(err: super::queries::ListDatasetsError) -> Self {
        Self::List(err)
    }
}

impl From<GetColumnsError> for DatasetApiError {
    fn from(err: GetColumnsError) -> Self {
        Self::Columns(err)
    }
}

impl IntoResponse for DatasetApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, code) = match self {
            DatasetApiError::Create(CreateDatasetError::FileNameValidation(_))
            | DatasetApiError::Create(CreateDatasetError::FileTypeRequired)
            | DatasetApiError::Create(CreateDatasetError::FilePathRequired)
            | DatasetApiError::Create(CreateDatasetError::BudgetValidation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            },

            DatasetApiError::Delete(DeleteDatasetError::NotFoundOrUnauthorized(_))
            | DatasetApiError::Get(GetDatasetError::NotFoundOrUnauthorized(_))
            | DatasetApiError::Columns(GetColumnsError::NotFoundOrUnauthorized(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },

            DatasetApiError::Columns(GetColumnsError::Engine(ref e)) => {
                tracing::error!("Engine failure during column listing: {}", e);
                (StatusCode::BAD_GATEWAY, "ENGINE_ERROR")
            },

            DatasetApiError::Create(CreateDatasetError::Database(ref e))
            | DatasetApiError::Delete(DeleteDatasetError::Database(ref e))
            | DatasetApiError::Get(GetDatasetError::Database(ref e))
            | DatasetApiError::List(super::queries::ListDatasetsError::Database(ref e))
            | DatasetApiError::Columns(GetColumnsError::Database(ref e)) => {
                tracing::error!("Database error in dataset routes: {}", e);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response();
            },

            DatasetApiError::Caller(e) => return e.into_response(),
        };

        let error = ErrorResponse::new(code, message);
        (status, Json(error)).into_response()
    }
}

impl std::fmt::Display for DatasetApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create(e) => write!(f, "{}", e),
            Self::Delete(e) => write!(f, "{}", e),
            Self::Get(e) => write!(f, "{}", e),
            Self::List(e) => write!(f, "{}", e),
            Self::Columns(e) => write!(f, "{}", e),
            Self::Caller(e) => write!(f, "{}", e),
        }
    }
}
