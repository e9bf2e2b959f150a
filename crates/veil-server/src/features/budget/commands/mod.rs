//! Budget ledger commands

pub mod spend;
pub mod update_budget;

pub use spend::{SpendBudgetCommand, SpendBudgetError, SpendBudgetResponse};
pub use update_budget::{UpdateBudgetCommand, UpdateBudgetError, UpdateBudgetResponse};
