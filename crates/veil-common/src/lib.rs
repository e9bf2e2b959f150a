//! Veil Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Veil project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all Veil workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: Centralized tracing setup for all binaries
//! - **Types**: Shared domain types (statistic operations, user roles)
//!
//! # Example
//!
//! ```no_run
//! use veil_common::types::StatisticOperation;
//!
//! let op: StatisticOperation = "mean".parse().unwrap();
//! assert_eq!(op.as_str(), "mean");
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, VeilError};
