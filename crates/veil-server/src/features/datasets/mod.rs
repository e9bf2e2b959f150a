//! Dataset management feature
//!
//! CRUD over datasets and their ownership rows, plus the engine-backed
//! column listing. Budget consumption lives in the `budget` feature.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::dataset_routes;
