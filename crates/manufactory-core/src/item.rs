use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base storage: fungible item counts keyed by item type.
///
/// Keys with a zero count are never stored, so two containers holding the
/// same items compare equal regardless of history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContainer {
    items: BTreeMap<ItemTypeId, u32>,
}

impl ItemContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get quantity of a specific item type.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.items.get(&item_type).copied().unwrap_or(0)
    }

    /// Add items. Saturates at `u32::MAX`.
    pub fn add(&mut self, item_type: ItemTypeId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.items.entry(item_type).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Remove items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let Some(current) = self.items.get_mut(&item_type) else {
            return 0;
        };
        let removed = quantity.min(*current);
        *current -= removed;
        if *current == 0 {
            self.items.remove(&item_type);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over (item, quantity) pairs in item id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemTypeId, u32)> + '_ {
        self.items.iter().map(|(&id, &q)| (id, q))
    }
}
