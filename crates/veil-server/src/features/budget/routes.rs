//! Budget ledger API routes
//!
//! - `POST /api/v1/datasets/:id/spend` - Spend budget on a noisy statistic
//! - `PUT /api/v1/datasets/:id/budget` - Administrative budget update

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::caller_id;
use crate::features::FeatureState;

use super::commands::{
    SpendBudgetCommand, SpendBudgetError, UpdateBudgetCommand, UpdateBudgetError,
};

/// Creates the budget router with all routes configured
pub fn budget_routes() -> Router<FeatureState> {
    Router::new()
        .route("/:id/spend", post(spend_budget))
        .route("/:id/budget", put(update_budget))
}

/// Spend privacy budget on one noisy query
///
/// # Response
///
/// - `200 OK` - Statistic computed, ledger updated
/// - `404 Not Found` - Dataset missing or not owned by the caller
/// - `409 Conflict` - Budget exhausted or concurrent modification
/// - `502 Bad Gateway` - Engine failure, ledger untouched
#[tracing::instrument(skip(state, command, headers), fields(dataset_id = %dataset_id))]
async fn spend_budget(
    State(state): State<FeatureState>,
    Path(dataset_id): Path<Uuid>,
    headers: HeaderMap,
    Json(mut command): Json<SpendBudgetCommand>,
) -> Result<Response, BudgetApiError> {
    command.dataset_id = dataset_id;
    command.user_id = caller_id(&headers).map_err(BudgetApiError::Caller)?;

    let response = super::commands::spend::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Administratively update a dataset's budget or query counter
///
/// # Response
///
/// - `200 OK` - Ledger fields updated
/// - `404 Not Found` - Dataset missing or not owned by the caller
/// - `422 Unprocessable Entity` - Validation error
#[tracing::instrument(skip(state, command, headers), fields(dataset_id = %dataset_id))]
async fn update_budget(
    State(state): State<FeatureState>,
    Path(dataset_id): Path<Uuid>,
    headers: HeaderMap,
    Json(mut command): Json<UpdateBudgetCommand>,
) -> Result<Response, BudgetApiError> {
    command.dataset_id = dataset_id;
    command.user_id = caller_id(&headers).map_err(BudgetApiError::Caller)?;

    let response = super::commands::update_budget::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Unified error type for budget API endpoints
#[derive(Debug)]
enum BudgetApiError {
    Spend(SpendBudgetError),
    Update(UpdateBudgetError),
    Caller(crate::error::AppError),
}

impl From<SpendBudgetError> for BudgetApiError {
    fn from(err: SpendBudgetError) -> Self {
        Self::Spend(err)
    }
}

impl From<UpdateBudgetError> for BudgetApiError {
    fn from(err: UpdateBudgetError) -> Self {
        Self::Update(err)
    }
}

impl IntoResponse for BudgetApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, code) = match self {
            BudgetApiError::Spend(SpendBudgetError::InvalidOperation(_))
            | BudgetApiError::Spend(SpendBudgetError::ColumnRequired) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            },
            BudgetApiError::Spend(SpendBudgetError::NotFoundOrUnauthorized(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            BudgetApiError::Spend(SpendBudgetError::BudgetExhausted(_)) => {
                (StatusCode::CONFLICT, "BUDGET_EXHAUSTED")
            },
            BudgetApiError::Spend(SpendBudgetError::ConcurrentModification(_)) => {
                (StatusCode::CONFLICT, "CONFLICT")
            },
            BudgetApiError::Spend(SpendBudgetError::StatisticComputationFailed(ref e)) => {
                tracing::error!("Engine failure during spend: {}", e);
                (StatusCode::BAD_GATEWAY, "ENGINE_ERROR")
            },
            BudgetApiError::Spend(SpendBudgetError::Database(ref e)) => {
                tracing::error!("Database error during spend: {}", e);
                return database_error_response();
            },

            BudgetApiError::Update(UpdateBudgetError::BudgetValidation(_))
            | BudgetApiError::Update(UpdateBudgetError::NegativeQueryCount)
            | BudgetApiError::Update(UpdateBudgetError::NoFieldsToUpdate) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            },
            BudgetApiError::Update(UpdateBudgetError::NotFoundOrUnauthorized(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            BudgetApiError::Update(UpdateBudgetError::Database(ref e)) => {
                tracing::error!("Database error during budget update: {}", e);
                return database_error_response();
            },

            BudgetApiError::Caller(e) => return e.into_response(),
        };

        let error = ErrorResponse::new(code, message);
        (status, Json(error)).into_response()
    }
}

fn database_error_response() -> Response {
    let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}

impl std::fmt::Display for BudgetApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spend(e) => write!(f, "{}", e),
            Self::Update(e) => write!(f, "{}", e),
            Self::Caller(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_structure() {
        let router = budget_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
