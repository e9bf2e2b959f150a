//! Veil Server Library
//!
//! HTTP backend for the Veil privacy toolbox dashboard.
//!
//! # Overview
//!
//! The Veil server mediates access to privacy-sensitive datasets:
//!
//! - **Privacy Budget Ledger**: every noisy-statistic query spends part of a
//!   dataset's differential-privacy budget; the ledger keeps the persisted
//!   budget and query counter consistent under concurrency
//! - **Token Cipher**: OAuth and API bearer tokens are encrypted at rest
//!   with AES-256-CTR in a legacy-compatible `hex(iv):hex(ct)` format
//! - **Noisy Statistics Engine**: noise calibration itself lives in an
//!   external service reached over HTTP; this server never computes noise
//!
//! # Architecture
//!
//! Feature slices follow a CQRS-style layout:
//!
//! - **Commands** (write operations): spend budget, update budget, create
//!   and delete datasets, store credentials
//! - **Queries** (read operations): get and list datasets, fetch column
//!   names, decrypt stored tokens
//!
//! Each slice owns its request/response types, error enum, and routes.
//! Persistence sits behind the [`db::DatasetStore`] and
//! [`db::CredentialStore`] traits so handlers can be exercised against an
//! in-memory store in tests.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extraction
//! - **SQLx**: PostgreSQL access
//! - **Reqwest**: client for the external noisy-statistics engine
//!
//! # Example
//!
//! ```no_run
//! use veil_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod engine;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;

// Re-export commonly used types
pub use error::{AppError, ServerResult};
