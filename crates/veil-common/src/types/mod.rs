//! Common types used across Veil

use serde::{Deserialize, Serialize};

use crate::error::VeilError;

/// Statistic operations the noisy-statistics engine understands.
///
/// The engine exposes one endpoint per operation (`/get_noisy/{operation}`);
/// anything outside this set is rejected before any I/O happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticOperation {
    Mean,
    Median,
    Mode,
    Min,
    Max,
}

impl StatisticOperation {
    /// All operations, in display order
    pub const ALL: [StatisticOperation; 5] = [
        StatisticOperation::Mean,
        StatisticOperation::Median,
        StatisticOperation::Mode,
        StatisticOperation::Min,
        StatisticOperation::Max,
    ];

    /// The lowercase wire name used in engine URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticOperation::Mean => "mean",
            StatisticOperation::Median => "median",
            StatisticOperation::Mode => "mode",
            StatisticOperation::Min => "min",
            StatisticOperation::Max => "max",
        }
    }
}

impl std::str::FromStr for StatisticOperation {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(StatisticOperation::Mean),
            "median" => Ok(StatisticOperation::Median),
            "mode" => Ok(StatisticOperation::Mode),
            "min" => Ok(StatisticOperation::Min),
            "max" => Ok(StatisticOperation::Max),
            other => Err(VeilError::InvalidOperation(other.to_string())),
        }
    }
}

impl std::fmt::Display for StatisticOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns datasets and spends their privacy budget
    #[default]
    DataOwner,
    /// Queries datasets shared with them
    DataScientist,
    /// Administers budgets and users
    DataAdmin,
}

impl Role {
    /// Database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::DataOwner => "data_owner",
            Role::DataScientist => "data_scientist",
            Role::DataAdmin => "data_admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_owner" => Ok(Role::DataOwner),
            "data_scientist" => Ok(Role::DataScientist),
            "data_admin" => Ok(Role::DataAdmin),
            other => Err(VeilError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
