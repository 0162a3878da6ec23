//! Economy tuning shared by production and the scheduler.

use crate::fixed::{Fixed64, Hours};
use serde::{Deserialize, Serialize};

/// Tunables with defaults matching the stock rules. Every field may be
/// omitted from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Delay before a person created by production reaches the base.
    pub person_transfer_hours: Hours,
    /// Spawned-person type that arrives as a scientist.
    pub scientist_type: String,
    /// Spawned-person type that arrives as an engineer.
    pub engineer_type: String,
    /// Target used when an old save's "sell forever" sentinel is migrated.
    pub legacy_unbounded_amount: u32,
    /// Multiplier applied to item sell costs.
    #[serde(with = "crate::fixed::serde_f64")]
    pub sell_price_factor: Fixed64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            person_transfer_hours: 24,
            scientist_type: "STR_SCIENTIST".to_string(),
            engineer_type: "STR_ENGINEER".to_string(),
            legacy_unbounded_amount: 999,
            sell_price_factor: Fixed64::from_num(1),
        }
    }
}
