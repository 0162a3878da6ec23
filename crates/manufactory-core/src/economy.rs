//! Global economic state: funds, score and serial-number counters.

use crate::config::EconomyConfig;
use crate::fixed::scale_money;
use crate::id::{CraftTypeId, SoldierTypeId};
use crate::registry::ItemRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Economy {
    funds: i64,
    research_score: i64,
    craft_serials: BTreeMap<CraftTypeId, u32>,
    soldier_serials: BTreeMap<SoldierTypeId, u32>,
    pub config: EconomyConfig,
}

impl Economy {
    pub fn new(funds: i64, config: EconomyConfig) -> Self {
        Self {
            funds,
            config,
            ..Default::default()
        }
    }

    pub fn funds(&self) -> i64 {
        self.funds
    }

    pub fn set_funds(&mut self, funds: i64) {
        self.funds = funds;
    }

    /// Credit (positive) or debit (negative) the funds ledger.
    pub fn add_funds(&mut self, delta: i64) {
        self.funds = self.funds.saturating_add(delta);
    }

    pub fn research_score(&self) -> i64 {
        self.research_score
    }

    /// Add to the cumulative research score. Negative deltas are allowed.
    pub fn add_research_score(&mut self, delta: i32) {
        self.research_score += i64::from(delta);
    }

    /// Sell price of one item after the economy's sell factor.
    pub fn sell_value(&self, item: &ItemRule) -> i64 {
        scale_money(item.sell_cost, self.config.sell_price_factor)
    }

    /// Next serial number for a craft of the given type, starting at 1.
    pub fn next_craft_serial(&mut self, craft: CraftTypeId) -> u32 {
        let n = self.craft_serials.entry(craft).or_insert(0);
        *n += 1;
        *n
    }

    /// Next serial number for a soldier of the given type, starting at 1.
    pub fn next_soldier_serial(&mut self, soldier: SoldierTypeId) -> u32 {
        let n = self.soldier_serials.entry(soldier).or_insert(0);
        *n += 1;
        *n
    }
}
