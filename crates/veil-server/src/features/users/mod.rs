//! User account feature

pub mod commands;
pub mod routes;

pub use routes::user_routes;
