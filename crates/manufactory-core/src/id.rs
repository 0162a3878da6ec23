use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a base owned by the player.
    pub struct BaseId;
}

/// Identifies an item type in the ruleset. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Identifies a craft type (interceptor, transport, ...) in the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CraftTypeId(pub u32);

/// Identifies a craft weapon type in the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CraftWeaponId(pub u32);

/// Identifies a soldier type in the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SoldierTypeId(pub u32);

/// Identifies a manufacture rule (recipe) in the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManufactureId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_id_equality() {
        let a = ItemTypeId(0);
        let b = ItemTypeId(0);
        let c = ItemTypeId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ManufactureId(0), "laser_rifle");
        map.insert(ManufactureId(1), "interceptor");
        assert_eq!(map[&ManufactureId(1)], "interceptor");
    }

    #[test]
    fn base_ids_from_slotmap_are_distinct() {
        let mut bases: slotmap::SlotMap<BaseId, &str> = slotmap::SlotMap::with_key();
        let a = bases.insert("alpha");
        let b = bases.insert("beta");
        assert_ne!(a, b);
        assert_eq!(bases[a], "alpha");
    }
}
