//! Craft instances stationed at a base.
//!
//! Only the parts production touches are modelled: construction with the
//! type's fixed weapons, the maintenance checkup that decides what a craft
//! needs next, and the reuse hook that lets a newly stocked item wake up a
//! craft that stalled for lack of fuel or ammunition.

use crate::id::{CraftTypeId, CraftWeaponId, ItemTypeId};
use crate::registry::Ruleset;
use serde::{Deserialize, Serialize};

/// What the hangar crew is doing with a craft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CraftStatus {
    #[default]
    Ready,
    Refuelling,
    Rearming,
    Repairs,
}

/// A weapon mounted in one of a craft's slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftWeapon {
    pub rule: CraftWeaponId,
    pub ammo: u32,
    pub rearming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Craft {
    pub rule: CraftTypeId,
    /// Per-type serial number ("Interceptor-3").
    pub serial: u32,
    pub fuel: u32,
    pub damage: u32,
    pub weapons: Vec<CraftWeapon>,
    pub status: CraftStatus,
}

impl Craft {
    /// A new, empty-tanked craft with no weapons mounted.
    pub fn new(rule: CraftTypeId, serial: u32) -> Self {
        Self {
            rule,
            serial,
            fuel: 0,
            damage: 0,
            weapons: Vec::new(),
            status: CraftStatus::Ready,
        }
    }

    /// Mount the craft type's fixed weapons, fully loaded.
    pub fn init_fixed_weapons(&mut self, rules: &Ruleset) {
        let Some(craft_rule) = rules.get_craft(self.rule) else {
            return;
        };
        for &weapon_id in &craft_rule.fixed_weapons {
            if let Some(weapon_rule) = rules.get_craft_weapon(weapon_id) {
                self.weapons.push(CraftWeapon {
                    rule: weapon_id,
                    ammo: weapon_rule.ammo_max,
                    rearming: false,
                });
            }
        }
    }

    /// Decide what maintenance the craft needs next.
    ///
    /// Repairs take priority over rearming, rearming over refuelling.
    pub fn checkup(&mut self, rules: &Ruleset) {
        let mut needs_ammo = false;
        for weapon in &mut self.weapons {
            let full = rules
                .get_craft_weapon(weapon.rule)
                .map(|w| weapon.ammo >= w.ammo_max)
                .unwrap_or(true);
            weapon.rearming = !full;
            needs_ammo |= !full;
        }
        let max_fuel = rules.get_craft(self.rule).map(|c| c.max_fuel).unwrap_or(0);

        self.status = if self.damage > 0 {
            CraftStatus::Repairs
        } else if needs_ammo {
            CraftStatus::Rearming
        } else if self.fuel < max_fuel {
            CraftStatus::Refuelling
        } else {
            CraftStatus::Ready
        };
    }

    /// Offer a freshly stocked item to the craft.
    ///
    /// A craft parked as `Ready` with empty magazines or tanks was waiting on
    /// supplies; if `item` is what it was missing, maintenance resumes.
    pub fn reuse_item(&mut self, item: ItemTypeId, rules: &Ruleset) {
        if self.status != CraftStatus::Ready {
            return;
        }
        for weapon in &mut self.weapons {
            let Some(weapon_rule) = rules.get_craft_weapon(weapon.rule) else {
                continue;
            };
            if weapon_rule.ammo_item == Some(item) && weapon.ammo < weapon_rule.ammo_max {
                weapon.rearming = true;
                self.status = CraftStatus::Rearming;
            }
        }
        if let Some(craft_rule) = rules.get_craft(self.rule)
            && craft_rule.refuel_item == Some(item)
            && self.fuel < craft_rule.max_fuel
        {
            self.status = CraftStatus::Refuelling;
        }
    }
}
