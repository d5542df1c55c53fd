use serde::{Deserialize, Serialize};

/// Default sum every allocation level should reach.
pub const DEFAULT_TARGET: f64 = 100.0;

/// Absolute tolerance, in percentage points, for treating a sum as the target.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Patrimony a fresh session starts with.
pub const DEFAULT_TOTAL_PATRIMONY: f64 = 100_000.0;

/// User-configurable settings for validation and value display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Sum each allocation level must reach (percentage points).
    pub target: f64,

    /// Absolute tolerance around `target`. Not relative: inputs carry at most
    /// two decimals of practical precision.
    pub tolerance: f64,

    /// Total patrimony used to derive currency amounts.
    pub total_patrimony: f64,

    /// Prefix used when formatting currency amounts (e.g., "R$", "US$").
    pub currency_symbol: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            tolerance: DEFAULT_TOLERANCE,
            total_patrimony: DEFAULT_TOTAL_PATRIMONY,
            currency_symbol: "R$".to_string(),
        }
    }
}
