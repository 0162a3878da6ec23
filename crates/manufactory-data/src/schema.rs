//! Serde data file structs for ruleset content.
//!
//! These structs define the on-disk format for items, craft, soldiers and
//! manufacture rules. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into core types by the loader. Cross references
//! are by name; quantities use the short `("NAME", quantity)` tuple form.

use manufactory_core::registry::{BattleType, SoldierStats, SoldierTemplate};
use serde::Deserialize;

// ===========================================================================
// Items
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub sell_cost: i64,
    #[serde(default)]
    pub battle_type: BattleType,
}

// ===========================================================================
// Craft
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CraftWeaponData {
    pub name: String,
    #[serde(default)]
    pub ammo_item: Option<String>,
    #[serde(default)]
    pub ammo_max: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CraftData {
    pub name: String,
    pub max_fuel: u32,
    #[serde(default)]
    pub refuel_item: Option<String>,
    #[serde(default)]
    pub max_damage: u32,
    /// Weapon names mounted on every new craft, one per slot.
    #[serde(default)]
    pub weapons: Vec<String>,
}

// ===========================================================================
// Soldiers
// ===========================================================================

/// Geographic box in degrees.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RegionData {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NationalityData {
    pub name: String,
    #[serde(default)]
    pub first_names: Vec<String>,
    #[serde(default)]
    pub last_names: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub region: Option<RegionData>,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoldierData {
    pub name: String,
    #[serde(default)]
    pub min_stats: SoldierStats,
    #[serde(default)]
    pub max_stats: SoldierStats,
    #[serde(default)]
    pub nationalities: Vec<NationalityData>,
}

// ===========================================================================
// Manufacture
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RandomOutputData {
    pub weight: u32,
    pub items: Vec<(String, u32)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpawnedPersonData {
    #[serde(rename = "type")]
    pub person_type: String,
    #[serde(default)]
    pub template: SoldierTemplate,
    #[serde(default)]
    pub custom_name: Option<String>,
}

/// A manufacture rule (recipe) in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ManufactureData {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub cost: i64,
    /// Labor per unit.
    pub time: u32,
    #[serde(default)]
    pub space: u32,
    #[serde(default)]
    pub required_items: Vec<(String, u32)>,
    #[serde(default)]
    pub required_craft: Vec<(String, u32)>,
    #[serde(default)]
    pub produced_craft: Option<String>,
    #[serde(default)]
    pub produced_items: Vec<(String, u32)>,
    #[serde(default)]
    pub random_outputs: Vec<RandomOutputData>,
    #[serde(default)]
    pub spawned_person: Option<SpawnedPersonData>,
    #[serde(default)]
    pub score: i32,
}
