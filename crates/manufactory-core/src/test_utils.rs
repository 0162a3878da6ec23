//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::base::Base;
use crate::config::EconomyConfig;
use crate::economy::Economy;
use crate::fixed::Fixed64;
use crate::id::*;
use crate::production::{ProductionOrder, ProductionProgress, StepContext, StepOutcome};
use crate::registry::*;
use crate::rng::{RandomDraw, SimRng};
use crate::text::StringTable;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Standard ruleset ids (registration order in `standard_rules`)
// ===========================================================================

pub fn alloys() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn elerium() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn laser_rifle() -> ItemTypeId {
    ItemTypeId(2)
}
pub fn missiles() -> ItemTypeId {
    ItemTypeId(3)
}

pub fn stingray() -> CraftWeaponId {
    CraftWeaponId(0)
}

pub fn interceptor() -> CraftTypeId {
    CraftTypeId(0)
}
pub fn skyranger() -> CraftTypeId {
    CraftTypeId(1)
}

pub fn soldier_type() -> SoldierTypeId {
    SoldierTypeId(0)
}

/// 100 per unit, 10 labor, one alloy in, one laser rifle out.
pub fn laser_rifle_recipe() -> ManufactureId {
    ManufactureId(0)
}
/// 1000 per unit, 20 labor, builds an interceptor.
pub fn interceptor_recipe() -> ManufactureId {
    ManufactureId(1)
}
/// 50 per unit, 5 labor, one elerium out.
pub fn elerium_recipe() -> ManufactureId {
    ManufactureId(2)
}
/// Consumes a skyranger: two alloys plus a 3:1 roll of elerium or missiles.
pub fn dismantle_recipe() -> ManufactureId {
    ManufactureId(3)
}
/// 10 per unit, 5 labor, one scientist.
pub fn scientist_recipe() -> ManufactureId {
    ManufactureId(4)
}
/// 1000 per unit, 100 labor, one named sergeant, score -5.
pub fn clone_recipe() -> ManufactureId {
    ManufactureId(5)
}

// ===========================================================================
// Ruleset
// ===========================================================================

/// Builder pre-loaded with the standard rules, for tests that add more.
pub fn standard_builder() -> RulesetBuilder {
    let mut b = RulesetBuilder::new();
    let alloys = b.register_item("STR_ALIEN_ALLOYS", 6_500, BattleType::None);
    let elerium = b.register_item("STR_ELERIUM_115", 5_000, BattleType::None);
    let rifle = b.register_item("STR_LASER_RIFLE", 36_900, BattleType::Firearm);
    let missiles = b.register_item("STR_STINGRAY_MISSILES", 3_000, BattleType::None);

    let stingray = b.register_craft_weapon(CraftWeaponRule {
        name: "STR_STINGRAY".into(),
        ammo_item: Some(missiles),
        ammo_max: 6,
    });
    let interceptor = b.register_craft(CraftRule {
        name: "STR_INTERCEPTOR".into(),
        max_fuel: 1_000,
        refuel_item: Some(elerium),
        max_damage: 100,
        fixed_weapons: vec![stingray],
    });
    let skyranger = b.register_craft(CraftRule {
        name: "STR_SKYRANGER".into(),
        max_fuel: 1_500,
        refuel_item: None,
        max_damage: 150,
        fixed_weapons: Vec::new(),
    });

    b.register_soldier(SoldierRule {
        name: "STR_SOLDIER".into(),
        min_stats: SoldierStats {
            time_units: 50,
            stamina: 40,
            health: 25,
            bravery: 10,
            reactions: 30,
            firing: 40,
            throwing: 50,
            strength: 20,
            melee: 20,
        },
        max_stats: SoldierStats {
            time_units: 60,
            stamina: 70,
            health: 40,
            bravery: 60,
            reactions: 60,
            firing: 70,
            throwing: 80,
            strength: 40,
            melee: 40,
        },
        nationalities: vec![NamePool {
            nationality: "STR_AMERICAN".into(),
            first_names: vec!["John".into(), "Mary".into()],
            last_names: vec!["Smith".into(), "Jones".into()],
            weight: 1,
            region: None,
        }],
    });

    let mut rifle_rule = ManufactureRule::new("STR_LASER_RIFLE", 100, 10);
    rifle_rule.category = "STR_WEAPON".into();
    rifle_rule.required_space = 2;
    rifle_rule.required_items.push(ItemAmount::new(alloys, 1));
    rifle_rule.produced_items.push(ItemAmount::new(rifle, 1));
    b.register_manufacture(rifle_rule);

    let mut interceptor_rule = ManufactureRule::new("STR_INTERCEPTOR", 1_000, 20);
    interceptor_rule.required_space = 20;
    interceptor_rule.produced_craft = Some(interceptor);
    // Ignored: craft output replaces item output.
    interceptor_rule.produced_items.push(ItemAmount::new(alloys, 1));
    b.register_manufacture(interceptor_rule);

    let mut elerium_rule = ManufactureRule::new("STR_ELERIUM_115", 50, 5);
    elerium_rule.required_space = 1;
    elerium_rule.produced_items.push(ItemAmount::new(elerium, 1));
    b.register_manufacture(elerium_rule);

    let mut dismantle = ManufactureRule::new("STR_DISMANTLE_SKYRANGER", 500, 50);
    dismantle.required_space = 10;
    dismantle.required_craft.push(CraftAmount {
        craft: skyranger,
        quantity: 1,
    });
    dismantle.produced_items.push(ItemAmount::new(alloys, 2));
    dismantle.random_outputs.push(RandomOutput {
        weight: 3,
        items: vec![ItemAmount::new(elerium, 1)],
    });
    dismantle.random_outputs.push(RandomOutput {
        weight: 1,
        items: vec![ItemAmount::new(missiles, 2)],
    });
    b.register_manufacture(dismantle);

    let mut scientist = ManufactureRule::new("STR_TRAIN_SCIENTIST", 10, 5);
    scientist.required_space = 1;
    scientist.spawned_person = Some(SpawnedPerson {
        person_type: "STR_SCIENTIST".into(),
        template: SoldierTemplate::default(),
        custom_name: None,
    });
    b.register_manufacture(scientist);

    let mut clone = ManufactureRule::new("STR_CLONE_SOLDIER", 1_000, 100);
    clone.required_space = 5;
    clone.score = -5;
    clone.spawned_person = Some(SpawnedPerson {
        person_type: "STR_SOLDIER".into(),
        template: SoldierTemplate {
            rank: Some(SoldierRank::Sergeant),
            stats: None,
        },
        custom_name: Some("STR_CLONE_NAME".into()),
    });
    b.register_manufacture(clone);

    b
}

pub fn standard_rules() -> Ruleset {
    standard_builder()
        .build()
        .expect("standard ruleset should build")
}

/// A base with ten idle engineers, twenty beds and fifty workshop space.
pub fn test_base() -> Base {
    let mut base = Base::new("Alpha", fixed(-77.0), fixed(39.0));
    base.engineers = 10;
    base.living_quarters = 20;
    base.workshop_space = 50;
    base
}

// ===========================================================================
// Random draws
// ===========================================================================

/// Replays fixed values, clamped into the requested range. Returns `lo`
/// once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    rolls: Vec<u32>,
    next: usize,
}

impl ScriptedRng {
    pub fn new(rolls: Vec<u32>) -> Self {
        Self { rolls, next: 0 }
    }
}

impl RandomDraw for ScriptedRng {
    fn generate(&mut self, lo: u32, hi: u32) -> u32 {
        let value = self.rolls.get(self.next).copied().unwrap_or(lo);
        self.next += 1;
        value.clamp(lo, hi.max(lo))
    }
}

// ===========================================================================
// Step harness
// ===========================================================================

/// Everything one order needs to be stepped in isolation.
pub struct Harness {
    pub rules: Ruleset,
    pub economy: Economy,
    pub lang: StringTable,
    pub rng: Box<dyn RandomDraw>,
    pub base: Base,
}

impl Harness {
    pub fn new(funds: i64) -> Self {
        Self {
            rules: standard_rules(),
            economy: Economy::new(funds, EconomyConfig::default()),
            lang: StringTable::new(),
            rng: Box::new(SimRng::new(42)),
            base: test_base(),
        }
    }

    /// A harness whose random draws replay `rolls`.
    pub fn with_rolls(funds: i64, rolls: Vec<u32>) -> Self {
        Self {
            rng: Box::new(ScriptedRng::new(rolls)),
            ..Self::new(funds)
        }
    }

    pub fn rule(&self, id: ManufactureId) -> &ManufactureRule {
        self.rules
            .get_manufacture(id)
            .expect("recipe should exist in the standard ruleset")
    }

    pub fn step(&mut self, order: &mut ProductionOrder) -> ProductionProgress {
        self.step_detailed(order).progress
    }

    pub fn step_detailed(&mut self, order: &mut ProductionOrder) -> StepOutcome {
        let rule = self
            .rules
            .get_manufacture(order.recipe())
            .expect("recipe should exist in the standard ruleset");
        let mut ctx = StepContext {
            economy: &mut self.economy,
            rules: &self.rules,
            lang: &self.lang,
            rng: &mut *self.rng,
        };
        order.step_detailed(rule, &mut self.base, &mut ctx)
    }

    pub fn realize_pending(&mut self, order: &mut ProductionOrder, pending: u32) -> StepOutcome {
        let rule = self
            .rules
            .get_manufacture(order.recipe())
            .expect("recipe should exist in the standard ruleset");
        let mut ctx = StepContext {
            economy: &mut self.economy,
            rules: &self.rules,
            lang: &self.lang,
            rng: &mut *self.rng,
        };
        order.realize_pending(rule, &mut self.base, &mut ctx, pending)
    }
}
