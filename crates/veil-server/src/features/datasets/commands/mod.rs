//! Dataset commands

pub mod create;
pub mod delete;

pub use create::{CreateDatasetCommand, CreateDatasetError, CreateDatasetResponse};
pub use delete::{DeleteDatasetCommand, DeleteDatasetError, DeleteDatasetResponse};
