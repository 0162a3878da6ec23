use crate::fixed::Fixed64;
use crate::id::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// How an item is used in combat. Anything other than `None` is combat gear
/// and is never offered to craft for refuelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleType {
    #[default]
    None,
    Firearm,
    Ammo,
    Melee,
    Grenade,
    Equipment,
}

/// An item type definition in the ruleset.
#[derive(Debug, Clone)]
pub struct ItemRule {
    pub name: String,
    /// Base price paid when the item is sold, before the economy's sell factor.
    pub sell_cost: i64,
    pub battle_type: BattleType,
}

/// An item/quantity pair used by recipes and random outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAmount {
    pub item: ItemTypeId,
    pub quantity: u32,
}

impl ItemAmount {
    pub fn new(item: ItemTypeId, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

// ---------------------------------------------------------------------------
// Craft
// ---------------------------------------------------------------------------

/// A craft weapon definition.
#[derive(Debug, Clone)]
pub struct CraftWeaponRule {
    pub name: String,
    /// Item loaded when rearming. `None` for weapons that never run dry.
    pub ammo_item: Option<ItemTypeId>,
    pub ammo_max: u32,
}

/// A craft type definition.
#[derive(Debug, Clone)]
pub struct CraftRule {
    pub name: String,
    pub max_fuel: u32,
    /// Item consumed when refuelling. `None` means the craft refuels for free.
    pub refuel_item: Option<ItemTypeId>,
    pub max_damage: u32,
    /// Weapons mounted on every new craft of this type, one per slot.
    pub fixed_weapons: Vec<CraftWeaponId>,
}

/// A craft type/count pair consumed by a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftAmount {
    pub craft: CraftTypeId,
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Soldiers
// ---------------------------------------------------------------------------

/// Soldier ranks, lowest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoldierRank {
    #[default]
    Rookie,
    Squaddie,
    Sergeant,
    Captain,
    Colonel,
    Commander,
}

/// Primary soldier attributes. Missing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoldierStats {
    pub time_units: u32,
    pub stamina: u32,
    pub health: u32,
    pub bravery: u32,
    pub reactions: u32,
    pub firing: u32,
    pub throwing: u32,
    pub strength: u32,
    pub melee: u32,
}

/// Geographic box in degrees. Longitudes wrap: a box with
/// `min_lon > max_lon` crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_lon: Fixed64,
    pub max_lon: Fixed64,
    pub min_lat: Fixed64,
    pub max_lat: Fixed64,
}

impl Region {
    pub fn contains(&self, lon: Fixed64, lat: Fixed64) -> bool {
        let lon_ok = if self.min_lon <= self.max_lon {
            lon >= self.min_lon && lon <= self.max_lon
        } else {
            lon >= self.min_lon || lon <= self.max_lon
        };
        lon_ok && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// A nationality: a name pool with a selection weight and an optional home
/// region used for location-weighted selection.
#[derive(Debug, Clone)]
pub struct NamePool {
    pub nationality: String,
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub weight: u32,
    pub region: Option<Region>,
}

/// A soldier type definition.
#[derive(Debug, Clone)]
pub struct SoldierRule {
    pub name: String,
    pub min_stats: SoldierStats,
    pub max_stats: SoldierStats,
    pub nationalities: Vec<NamePool>,
}

/// Overrides applied to a freshly generated soldier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoldierTemplate {
    #[serde(default)]
    pub rank: Option<SoldierRank>,
    #[serde(default)]
    pub stats: Option<SoldierStats>,
}

// ---------------------------------------------------------------------------
// Manufacture rules
// ---------------------------------------------------------------------------

/// One alternative of a weighted random output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomOutput {
    pub weight: u32,
    pub items: Vec<ItemAmount>,
}

/// A person created by each completed unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedPerson {
    /// Either a staff key (scientist/engineer) or a soldier type name.
    pub person_type: String,
    pub template: SoldierTemplate,
    /// Text key looked up for the generated soldier's name.
    pub custom_name: Option<String>,
}

/// A manufacturing job definition (recipe).
///
/// Produced craft and produced items are mutually exclusive: when
/// `produced_craft` is set, `produced_items` is ignored. Random outputs,
/// person spawning and score are independent facets.
#[derive(Debug, Clone)]
pub struct ManufactureRule {
    pub name: String,
    pub category: String,
    /// Money debited when a unit is started.
    pub cost: i64,
    /// Labor needed per unit. Zero means the whole target completes at once.
    pub time_per_unit: u32,
    /// Workshop space occupied while the job runs.
    pub required_space: u32,
    pub required_items: Vec<ItemAmount>,
    pub required_craft: Vec<CraftAmount>,
    pub produced_craft: Option<CraftTypeId>,
    pub produced_items: Vec<ItemAmount>,
    pub random_outputs: Vec<RandomOutput>,
    pub spawned_person: Option<SpawnedPerson>,
    /// Added to the research score per unit. Negative values are allowed.
    pub score: i32,
}

impl ManufactureRule {
    /// A rule with the given name and labor time and every other field empty.
    pub fn new(name: &str, cost: i64, time_per_unit: u32) -> Self {
        Self {
            name: name.to_string(),
            category: String::new(),
            cost,
            time_per_unit,
            required_space: 0,
            required_items: Vec::new(),
            required_craft: Vec::new(),
            produced_craft: None,
            produced_items: Vec::new(),
            random_outputs: Vec::new(),
            spawned_person: None,
            score: 0,
        }
    }

    pub fn has_random_outputs(&self) -> bool {
        !self.random_outputs.is_empty()
    }

    pub fn spawns_person(&self) -> bool {
        self.spawned_person.is_some()
    }

    /// Sum of all random output weights, saturating at `u32::MAX`.
    /// [`RulesetBuilder::build`] rejects tables that would saturate.
    pub fn total_random_weight(&self) -> u32 {
        self.random_outputs
            .iter()
            .fold(0u32, |total, o| total.saturating_add(o.weight))
    }

    pub fn have_enough_money_for_one_more_unit(&self, funds: i64) -> bool {
        funds >= self.cost
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable Ruleset.
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct RulesetBuilder {
    items: Vec<ItemRule>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    craft_weapons: Vec<CraftWeaponRule>,
    craft_weapon_name_to_id: HashMap<String, CraftWeaponId>,
    crafts: Vec<CraftRule>,
    craft_name_to_id: HashMap<String, CraftTypeId>,
    soldiers: Vec<SoldierRule>,
    soldier_name_to_id: HashMap<String, SoldierTypeId>,
    manufacture: Vec<ManufactureRule>,
    manufacture_name_to_id: HashMap<String, ManufactureId>,
    duplicates: Vec<String>,
}

fn note_duplicate<V>(map: &HashMap<String, V>, name: &str, duplicates: &mut Vec<String>) {
    if map.contains_key(name) {
        duplicates.push(name.to_string());
    }
}

impl RulesetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register an item type. Returns its ID.
    pub fn register_item(&mut self, name: &str, sell_cost: i64, battle_type: BattleType) -> ItemTypeId {
        note_duplicate(&self.item_name_to_id, name, &mut self.duplicates);
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemRule {
            name: name.to_string(),
            sell_cost,
            battle_type,
        });
        self.item_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Phase 1: Register a craft weapon. Returns its ID.
    pub fn register_craft_weapon(&mut self, rule: CraftWeaponRule) -> CraftWeaponId {
        note_duplicate(&self.craft_weapon_name_to_id, &rule.name, &mut self.duplicates);
        let id = CraftWeaponId(self.craft_weapons.len() as u32);
        self.craft_weapon_name_to_id.insert(rule.name.clone(), id);
        self.craft_weapons.push(rule);
        id
    }

    /// Phase 1: Register a craft type. Returns its ID.
    pub fn register_craft(&mut self, rule: CraftRule) -> CraftTypeId {
        note_duplicate(&self.craft_name_to_id, &rule.name, &mut self.duplicates);
        let id = CraftTypeId(self.crafts.len() as u32);
        self.craft_name_to_id.insert(rule.name.clone(), id);
        self.crafts.push(rule);
        id
    }

    /// Phase 1: Register a soldier type. Returns its ID.
    pub fn register_soldier(&mut self, rule: SoldierRule) -> SoldierTypeId {
        note_duplicate(&self.soldier_name_to_id, &rule.name, &mut self.duplicates);
        let id = SoldierTypeId(self.soldiers.len() as u32);
        self.soldier_name_to_id.insert(rule.name.clone(), id);
        self.soldiers.push(rule);
        id
    }

    /// Phase 1: Register a manufacture rule. Returns its ID.
    pub fn register_manufacture(&mut self, rule: ManufactureRule) -> ManufactureId {
        note_duplicate(&self.manufacture_name_to_id, &rule.name, &mut self.duplicates);
        let id = ManufactureId(self.manufacture.len() as u32);
        self.manufacture_name_to_id.insert(rule.name.clone(), id);
        self.manufacture.push(rule);
        id
    }

    /// Phase 2: Mutate an existing manufacture rule by name.
    pub fn mutate_manufacture<F>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut ManufactureRule),
    {
        let id = self
            .manufacture_name_to_id
            .get(name)
            .ok_or(RegistryError::NotFound(name.to_string()))?;
        f(&mut self.manufacture[id.0 as usize]);
        Ok(())
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn craft_id(&self, name: &str) -> Option<CraftTypeId> {
        self.craft_name_to_id.get(name).copied()
    }

    pub fn soldier_id(&self, name: &str) -> Option<SoldierTypeId> {
        self.soldier_name_to_id.get(name).copied()
    }

    pub fn manufacture_id(&self, name: &str) -> Option<ManufactureId> {
        self.manufacture_name_to_id.get(name).copied()
    }

    /// Phase 3: Validate every cross reference and freeze the ruleset.
    pub fn build(self) -> Result<Ruleset, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateName(name));
        }

        let item_ok = |id: ItemTypeId| (id.0 as usize) < self.items.len();
        let craft_ok = |id: CraftTypeId| (id.0 as usize) < self.crafts.len();

        for weapon in &self.craft_weapons {
            if let Some(ammo) = weapon.ammo_item
                && !item_ok(ammo)
            {
                return Err(RegistryError::InvalidItemRef(ammo));
            }
        }

        for craft in &self.crafts {
            if let Some(fuel) = craft.refuel_item
                && !item_ok(fuel)
            {
                return Err(RegistryError::InvalidItemRef(fuel));
            }
            for weapon in &craft.fixed_weapons {
                if weapon.0 as usize >= self.craft_weapons.len() {
                    return Err(RegistryError::InvalidCraftWeaponRef(*weapon));
                }
            }
        }

        for rule in &self.manufacture {
            let random_items = rule.random_outputs.iter().flat_map(|o| o.items.iter());
            for entry in rule
                .required_items
                .iter()
                .chain(rule.produced_items.iter())
                .chain(random_items)
            {
                if !item_ok(entry.item) {
                    return Err(RegistryError::InvalidItemRef(entry.item));
                }
            }
            for entry in &rule.required_craft {
                if !craft_ok(entry.craft) {
                    return Err(RegistryError::InvalidCraftRef(entry.craft));
                }
            }
            if let Some(craft) = rule.produced_craft
                && !craft_ok(craft)
            {
                return Err(RegistryError::InvalidCraftRef(craft));
            }
            if !weights_fit(rule.random_outputs.iter().map(|o| o.weight)) {
                return Err(RegistryError::WeightOverflow(rule.name.clone()));
            }
        }

        for soldier in &self.soldiers {
            if !weights_fit(soldier.nationalities.iter().map(|n| n.weight)) {
                return Err(RegistryError::WeightOverflow(soldier.name.clone()));
            }
        }

        Ok(Ruleset {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            craft_weapons: self.craft_weapons,
            craft_weapon_name_to_id: self.craft_weapon_name_to_id,
            crafts: self.crafts,
            craft_name_to_id: self.craft_name_to_id,
            soldiers: self.soldiers,
            soldier_name_to_id: self.soldier_name_to_id,
            manufacture: self.manufacture,
            manufacture_name_to_id: self.manufacture_name_to_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Ruleset
// ---------------------------------------------------------------------------

/// Immutable rule catalog. Frozen after build().
#[derive(Debug)]
pub struct Ruleset {
    items: Vec<ItemRule>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    craft_weapons: Vec<CraftWeaponRule>,
    craft_weapon_name_to_id: HashMap<String, CraftWeaponId>,
    crafts: Vec<CraftRule>,
    craft_name_to_id: HashMap<String, CraftTypeId>,
    soldiers: Vec<SoldierRule>,
    soldier_name_to_id: HashMap<String, SoldierTypeId>,
    manufacture: Vec<ManufactureRule>,
    manufacture_name_to_id: HashMap<String, ManufactureId>,
}

impl Ruleset {
    pub fn get_item(&self, id: ItemTypeId) -> Option<&ItemRule> {
        self.items.get(id.0 as usize)
    }

    pub fn get_craft_weapon(&self, id: CraftWeaponId) -> Option<&CraftWeaponRule> {
        self.craft_weapons.get(id.0 as usize)
    }

    pub fn get_craft(&self, id: CraftTypeId) -> Option<&CraftRule> {
        self.crafts.get(id.0 as usize)
    }

    pub fn get_soldier(&self, id: SoldierTypeId) -> Option<&SoldierRule> {
        self.soldiers.get(id.0 as usize)
    }

    pub fn get_manufacture(&self, id: ManufactureId) -> Option<&ManufactureRule> {
        self.manufacture.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn craft_id(&self, name: &str) -> Option<CraftTypeId> {
        self.craft_name_to_id.get(name).copied()
    }

    pub fn craft_weapon_id(&self, name: &str) -> Option<CraftWeaponId> {
        self.craft_weapon_name_to_id.get(name).copied()
    }

    pub fn soldier_id(&self, name: &str) -> Option<SoldierTypeId> {
        self.soldier_name_to_id.get(name).copied()
    }

    pub fn manufacture_id(&self, name: &str) -> Option<ManufactureId> {
        self.manufacture_name_to_id.get(name).copied()
    }

    /// Name of an item type, or `"?"` for ids outside the ruleset.
    pub fn item_name(&self, id: ItemTypeId) -> &str {
        self.get_item(id).map(|i| i.name.as_str()).unwrap_or("?")
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn craft_count(&self) -> usize {
        self.crafts.len()
    }

    pub fn soldier_count(&self) -> usize {
        self.soldiers.len()
    }

    pub fn manufacture_count(&self) -> usize {
        self.manufacture.len()
    }

    /// Iterate over all manufacture rules with their ids, in registration order.
    pub fn manufacture_rules(&self) -> impl Iterator<Item = (ManufactureId, &ManufactureRule)> {
        self.manufacture
            .iter()
            .enumerate()
            .map(|(i, r)| (ManufactureId(i as u32), r))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate rule name: {0}")]
    DuplicateName(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemTypeId),
    #[error("invalid craft reference: {0:?}")]
    InvalidCraftRef(CraftTypeId),
    #[error("invalid craft weapon reference: {0:?}")]
    InvalidCraftWeaponRef(CraftWeaponId),
    #[error("weights of {0} add up to more than {max}", max = u32::MAX)]
    WeightOverflow(String),
}

/// Roulette draws are `u32`, so a weight table's total must fit one.
fn weights_fit(mut weights: impl Iterator<Item = u32>) -> bool {
    weights
        .try_fold(0u32, |total, w| total.checked_add(w))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_builder() -> RulesetBuilder {
        let mut b = RulesetBuilder::new();
        let alloys = b.register_item("STR_ALIEN_ALLOYS", 6_500, BattleType::None);
        let rifle = b.register_item("STR_LASER_RIFLE", 36_900, BattleType::Firearm);
        let mut rule = ManufactureRule::new("STR_LASER_RIFLE", 8_000, 300);
        rule.required_items.push(ItemAmount::new(alloys, 1));
        rule.produced_items.push(ItemAmount::new(rifle, 1));
        b.register_manufacture(rule);
        b
    }

    #[test]
    fn register_and_build() {
        let reg = setup_builder().build().unwrap();
        assert_eq!(reg.item_count(), 2);
        assert_eq!(reg.manufacture_count(), 1);
        assert_eq!(reg.craft_count(), 0);
    }

    #[test]
    fn lookup_by_name() {
        let reg = setup_builder().build().unwrap();
        assert!(reg.item_id("STR_ALIEN_ALLOYS").is_some());
        assert!(reg.item_id("STR_NONEXISTENT").is_none());
        let id = reg.manufacture_id("STR_LASER_RIFLE").unwrap();
        assert_eq!(reg.get_manufacture(id).unwrap().time_per_unit, 300);
    }

    #[test]
    fn mutate_manufacture() {
        let mut builder = setup_builder();
        builder
            .mutate_manufacture("STR_LASER_RIFLE", |rule| rule.score = -5)
            .unwrap();
        let reg = builder.build().unwrap();
        let rule = reg
            .get_manufacture(reg.manufacture_id("STR_LASER_RIFLE").unwrap())
            .unwrap();
        assert_eq!(rule.score, -5);
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut builder = setup_builder();
        match builder.mutate_manufacture("nope", |_| {}) {
            Err(RegistryError::NotFound(name)) => assert_eq!(name, "nope"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_item_ref_in_random_output_fails() {
        let mut b = RulesetBuilder::new();
        let mut rule = ManufactureRule::new("bad", 0, 1);
        rule.random_outputs.push(RandomOutput {
            weight: 1,
            items: vec![ItemAmount::new(ItemTypeId(42), 1)],
        });
        b.register_manufacture(rule);
        assert!(matches!(
            b.build(),
            Err(RegistryError::InvalidItemRef(ItemTypeId(42)))
        ));
    }

    #[test]
    fn invalid_craft_ref_fails() {
        let mut b = RulesetBuilder::new();
        let mut rule = ManufactureRule::new("bad", 0, 1);
        rule.produced_craft = Some(CraftTypeId(3));
        b.register_manufacture(rule);
        let err = b.build().unwrap_err();
        assert!(format!("{err}").contains("invalid craft reference"), "got: {err}");
    }

    #[test]
    fn invalid_fixed_weapon_ref_fails() {
        let mut b = RulesetBuilder::new();
        b.register_craft(CraftRule {
            name: "STR_SKYRANGER".into(),
            max_fuel: 1500,
            refuel_item: None,
            max_damage: 150,
            fixed_weapons: vec![CraftWeaponId(7)],
        });
        assert!(matches!(
            b.build(),
            Err(RegistryError::InvalidCraftWeaponRef(CraftWeaponId(7)))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut b = setup_builder();
        b.register_item("STR_ALIEN_ALLOYS", 1, BattleType::None);
        match b.build() {
            Err(RegistryError::DuplicateName(name)) => assert_eq!(name, "STR_ALIEN_ALLOYS"),
            other => panic!("expected DuplicateName, got: {other:?}"),
        }
    }

    #[test]
    fn region_contains_handles_antimeridian() {
        let pacific = Region {
            min_lon: Fixed64::from_num(170),
            max_lon: Fixed64::from_num(-170),
            min_lat: Fixed64::from_num(-10),
            max_lat: Fixed64::from_num(10),
        };
        assert!(pacific.contains(Fixed64::from_num(175), Fixed64::from_num(0)));
        assert!(pacific.contains(Fixed64::from_num(-175), Fixed64::from_num(0)));
        assert!(!pacific.contains(Fixed64::from_num(0), Fixed64::from_num(0)));
        assert!(!pacific.contains(Fixed64::from_num(175), Fixed64::from_num(20)));
    }

    #[test]
    fn oversized_weight_tables_are_rejected() {
        let mut b = RulesetBuilder::new();
        let mut rule = ManufactureRule::new("STR_JACKPOT", 0, 1);
        for _ in 0..2 {
            rule.random_outputs.push(RandomOutput {
                weight: 3_000_000_000,
                items: vec![],
            });
        }
        b.register_manufacture(rule);
        match b.build() {
            Err(RegistryError::WeightOverflow(name)) => assert_eq!(name, "STR_JACKPOT"),
            other => panic!("expected WeightOverflow, got: {other:?}"),
        }

        let mut b = RulesetBuilder::new();
        let pool = |weight| NamePool {
            nationality: "STR_NOWHERE".into(),
            first_names: vec![],
            last_names: vec![],
            weight,
            region: None,
        };
        b.register_soldier(SoldierRule {
            name: "STR_SOLDIER".into(),
            min_stats: SoldierStats::default(),
            max_stats: SoldierStats::default(),
            nationalities: vec![pool(u32::MAX), pool(1)],
        });
        assert!(matches!(b.build(), Err(RegistryError::WeightOverflow(_))));
    }

    #[test]
    fn random_weight_sums() {
        let mut rule = ManufactureRule::new("r", 0, 1);
        assert!(!rule.has_random_outputs());
        rule.random_outputs.push(RandomOutput { weight: 3, items: vec![] });
        rule.random_outputs.push(RandomOutput { weight: 7, items: vec![] });
        assert!(rule.has_random_outputs());
        assert_eq!(rule.total_random_weight(), 10);
    }

    #[test]
    fn empty_ruleset_builds_successfully() {
        let reg = RulesetBuilder::new().build().unwrap();
        assert_eq!(reg.item_count(), 0);
        assert_eq!(reg.manufacture_count(), 0);
        assert!(reg.get_manufacture(ManufactureId(0)).is_none());
    }
}
