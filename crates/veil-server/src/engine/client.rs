//! HTTP client for the noisy-statistics engine
//!
//! Wire format is fixed by the engine: camelCase JSON bodies, operation name
//! in the path. Responses are validated here so handlers only ever see typed
//! values or an [`EngineError`].

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use veil_common::types::StatisticOperation;

use crate::config::EngineConfig;

/// Errors from the engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    /// Request never completed (connection refused, timeout, DNS)
    #[error("Engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Engine answered with a non-success status
    #[error("Engine returned status {status}: {body}")]
    BadStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Engine answered 2xx but the body did not match the contract
    #[error("Engine response did not match contract: {0}")]
    MalformedResponse(String),

    /// The configured engine URL cannot be used as a request base
    #[error("Invalid engine URL: {0}")]
    InvalidUrl(String),
}

/// Request body for `POST /get_noisy/{operation}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoisyRequest {
    pub privacy_budget: f64,
    pub file_name: String,
    pub column_name: String,
    pub total_queries: i64,
}

/// Response body from `POST /get_noisy/{operation}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoisyResponse {
    pub statistic_value: f64,
    pub updated_privacy_budget: f64,
}

/// Request body for `POST /delete_file`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteFileRequest {
    pub original_file_path: String,
    pub original_file_name: String,
}

/// Client for the noisy-statistics engine
#[derive(Clone)]
pub struct EngineClient {
    client: Client,
    base_url: Url,
}

impl EngineClient {
    /// Build a client from configuration; the timeout covers the full
    /// request including body read
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url =
            Url::parse(&config.base_url).map_err(|e| EngineError::InvalidUrl(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Join path segments onto the base URL. Segments are percent-encoded,
    /// so file names with spaces or `%` survive the trip intact.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base_url.clone();

        {
            let mut path = url.path_segments_mut().map_err(|_| {
                EngineError::InvalidUrl("engine URL cannot carry path segments".to_string())
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }

        Ok(url)
    }

    /// Request a noisy statistic over one column of a dataset file.
    ///
    /// The engine deducts from the supplied budget and reports the remainder;
    /// this method performs no persistence.
    #[tracing::instrument(skip(self, request), fields(operation = %operation, file_name = %request.file_name))]
    pub async fn get_noisy(
        &self,
        operation: StatisticOperation,
        request: &NoisyRequest,
    ) -> Result<NoisyResponse, EngineError> {
        let url = self.endpoint(&["get_noisy", operation.as_str()])?;
        debug!(url = %url, "Requesting noisy statistic from engine");

        let response = self.client.post(url).json(request).send().await?;
        let body: NoisyResponse = Self::read_json(response).await?;

        if !body.statistic_value.is_finite() || !body.updated_privacy_budget.is_finite() {
            return Err(EngineError::MalformedResponse(
                "statisticValue and updatedPrivacyBudget must be finite numbers".to_string(),
            ));
        }

        // The ledger invariant says budgets never go below zero; an engine
        // reporting a negative remainder is off-contract and must not be
        // persisted.
        if body.updated_privacy_budget < 0.0 {
            return Err(EngineError::MalformedResponse(
                "updatedPrivacyBudget must not be negative".to_string(),
            ));
        }

        Ok(body)
    }

    /// Fetch the column names the engine sees in a dataset file.
    ///
    /// The engine answers with a bare JSON array of strings.
    #[tracing::instrument(skip(self))]
    pub async fn get_column_names(&self, file_name: &str) -> Result<Vec<String>, EngineError> {
        let url = self.endpoint(&["get_column_names", file_name])?;

        let response = self.client.get(url).send().await?;
        let columns: Vec<String> = Self::read_json(response).await?;

        Ok(columns)
    }

    /// Ask the engine to remove a dataset's backing file.
    ///
    /// Callers treat failure as non-fatal; the ledger row is the source of
    /// truth and orphaned files are cleaned up out of band.
    #[tracing::instrument(skip(self))]
    pub async fn delete_file(&self, file_path: &str, file_name: &str) -> Result<(), EngineError> {
        let url = self.endpoint(&["delete_file"])?;
        let request = DeleteFileRequest {
            original_file_path: file_path.to_string(),
            original_file_name: file_name.to_string(),
        };

        let response = self.client.post(url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Engine refused file deletion");
            return Err(EngineError::BadStatus { status, body });
        }

        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::BadStatus { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))
    }
}
