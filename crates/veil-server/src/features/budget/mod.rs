//! Privacy-budget ledger feature
//!
//! The only code path allowed to consume budget is the spend command; the
//! administrative update command can set it but never flows through the
//! engine.

pub mod commands;
pub mod routes;

pub use routes::budget_routes;
