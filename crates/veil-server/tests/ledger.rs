//! End-to-end ledger behavior over the in-memory store and a mock engine

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use veil_server::config::EngineConfig;
use veil_server::crypto::TokenCipher;
use veil_server::db::{DatasetStore, MemoryStore};
use veil_server::engine::EngineClient;
use veil_server::features::budget::commands::spend::{self, SpendBudgetCommand, SpendBudgetError};
use veil_server::features::budget::commands::update_budget::{self, UpdateBudgetCommand};
use veil_server::features::FeatureState;
use veil_server::models::{Dataset, NewDataset};

async fn state_with_engine(engine_url: &str) -> (FeatureState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = EngineClient::new(&EngineConfig {
        base_url: engine_url.to_string(),
        timeout_secs: 1,
    })
    .unwrap();

    let state = FeatureState {
        datasets: store.clone(),
        credentials: store.clone(),
        engine,
        cipher: TokenCipher::new([1u8; 32]),
    };

    (state, store)
}

async fn seed_dataset(store: &MemoryStore, owner: Uuid, budget: f64) -> Dataset {
    store
        .insert(
            NewDataset {
                file_name: "ratings.csv".to_string(),
                file_type: "csv".to_string(),
                file_path: "data/ratings.csv".to_string(),
                privacy_budget: budget,
            },
            owner,
        )
        .await
        .unwrap()
}

fn spend_command(dataset: &Dataset, user: Uuid) -> SpendBudgetCommand {
    SpendBudgetCommand {
        dataset_id: dataset.id,
        user_id: user,
        operation: "mean".to_string(),
        column_name: "age".to_string(),
    }
}

#[tokio::test]
async fn test_spend_updates_budget_and_counter_together() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    Mock::given(method("POST"))
        .and(path("/get_noisy/mean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statisticValue": 42.3,
            "updatedPrivacyBudget": 0.9,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = spend::handle(&state, spend_command(&dataset, owner))
        .await
        .unwrap();

    assert_eq!(response.statistic, 42.3);
    assert_eq!(response.remaining_budget, 0.9);
    assert_eq!(response.total_queries, 1);

    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 0.9);
    assert_eq!(stored.total_queries, 1);
    assert_eq!(stored.version, dataset.version + 1);
}

#[tokio::test]
async fn test_spend_by_non_owner_never_reaches_engine() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    // No mock mounted: any engine request would fail the test via the
    // resulting error variant
    let err = spend::handle(&state, spend_command(&dataset, Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(err, SpendBudgetError::NotFoundOrUnauthorized(_)));

    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 1.0);
    assert_eq!(stored.total_queries, 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_spend_with_exhausted_budget_never_reaches_engine() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 0.0).await;

    let err = spend::handle(&state, spend_command(&dataset, owner))
        .await
        .unwrap_err();

    assert!(matches!(err, SpendBudgetError::BudgetExhausted(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_engine_timeout_leaves_ledger_untouched() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    // Response delayed beyond the client timeout
    Mock::given(method("POST"))
        .and(path("/get_noisy/mean"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "statisticValue": 42.3,
                    "updatedPrivacyBudget": 0.9,
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = spend::handle(&state, spend_command(&dataset, owner))
        .await
        .unwrap_err();

    assert!(matches!(err, SpendBudgetError::StatisticComputationFailed(_)));

    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 1.0);
    assert_eq!(stored.total_queries, 0);
    assert_eq!(stored.version, dataset.version);
}

#[tokio::test]
async fn test_engine_error_status_leaves_ledger_untouched() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    Mock::given(method("POST"))
        .and(path("/get_noisy/mean"))
        .respond_with(ResponseTemplate::new(500).set_body_string("engine exploded"))
        .mount(&server)
        .await;

    let err = spend::handle(&state, spend_command(&dataset, owner))
        .await
        .unwrap_err();

    assert!(matches!(err, SpendBudgetError::StatisticComputationFailed(_)));

    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.total_queries, 0);
}

#[tokio::test]
async fn test_negative_engine_budget_is_never_persisted() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 0.1).await;

    // An engine that overdraws the remaining budget is off-contract
    Mock::given(method("POST"))
        .and(path("/get_noisy/mean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statisticValue": 42.3,
            "updatedPrivacyBudget": -0.5,
        })))
        .mount(&server)
        .await;

    let err = spend::handle(&state, spend_command(&dataset, owner))
        .await
        .unwrap_err();

    assert!(matches!(err, SpendBudgetError::StatisticComputationFailed(_)));

    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 0.1);
    assert_eq!(stored.total_queries, 0);
    assert_eq!(stored.version, dataset.version);
}

#[tokio::test]
async fn test_persistence_failure_after_engine_success_is_reported() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    Mock::given(method("POST"))
        .and(path("/get_noisy/mean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statisticValue": 42.3,
            "updatedPrivacyBudget": 0.9,
        })))
        .mount(&server)
        .await;

    store.set_fail_writes(true);
    let err = spend::handle(&state, spend_command(&dataset, owner))
        .await
        .unwrap_err();
    store.set_fail_writes(false);

    assert!(matches!(err, SpendBudgetError::Database(_)));

    // The write never happened; the stored ledger still shows no spend
    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 1.0);
    assert_eq!(stored.total_queries, 0);
}

#[tokio::test]
async fn test_concurrent_spends_have_exactly_one_winner() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    // Both spenders read the same version before either commits; the delay
    // keeps them overlapped inside the engine call
    Mock::given(method("POST"))
        .and(path("/get_noisy/mean"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "statisticValue": 42.3,
                    "updatedPrivacyBudget": 0.9,
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let first = spend::handle(&state, spend_command(&dataset, owner));
    let second = spend::handle(&state, spend_command(&dataset, owner));
    let (first, second) = tokio::join!(first, second);

    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent spend may commit");

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser.unwrap_err(),
        SpendBudgetError::ConcurrentModification(_)
    ));

    // Only the winning spend is reflected in the ledger
    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 0.9);
    assert_eq!(stored.total_queries, 1);
}

#[tokio::test]
async fn test_update_budget_reset_queries_forces_zero() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    // Record some spends directly
    store
        .update_guarded(
            dataset.id,
            dataset.version,
            veil_server::models::LedgerEntry {
                privacy_budget: 0.5,
                total_queries: 7,
            },
        )
        .await
        .unwrap()
        .unwrap();

    let command = UpdateBudgetCommand {
        dataset_id: dataset.id,
        user_id: owner,
        privacy_budget: Some(2.0),
        total_queries: Some(99),
        reset_queries: true,
    };

    let response = update_budget::handle(&state, command).await.unwrap();

    assert_eq!(response.dataset.privacy_budget, 2.0);
    // reset_queries wins over the supplied counter
    assert_eq!(response.dataset.total_queries, 0);
}

#[tokio::test]
async fn test_update_budget_by_non_owner_is_not_found() {
    let server = MockServer::start().await;
    let (state, store) = state_with_engine(&server.uri()).await;
    let owner = Uuid::new_v4();
    let dataset = seed_dataset(&store, owner, 1.0).await;

    let command = UpdateBudgetCommand {
        dataset_id: dataset.id,
        user_id: Uuid::new_v4(),
        privacy_budget: Some(5.0),
        total_queries: None,
        reset_queries: false,
    };

    let err = update_budget::handle(&state, command).await.unwrap_err();
    assert!(matches!(
        err,
        veil_server::features::budget::commands::update_budget::UpdateBudgetError::NotFoundOrUnauthorized(_)
    ));

    let stored = store.find_for_user(dataset.id, owner).await.unwrap().unwrap();
    assert_eq!(stored.privacy_budget, 1.0);
}
