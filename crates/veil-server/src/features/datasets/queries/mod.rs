//! Dataset queries

pub mod columns;
pub mod get;
pub mod list;

pub use columns::{GetColumnsError, GetColumnsQuery, GetColumnsResponse};
pub use get::{GetDatasetError, GetDatasetQuery, GetDatasetResponse};
pub use list::{ListDatasetsError, ListDatasetsQuery, ListDatasetsResponse};
