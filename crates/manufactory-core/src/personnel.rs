//! Personnel created by production: staff arrivals and generated soldiers.

use crate::fixed::{Fixed64, Hours};
use crate::id::SoldierTypeId;
use crate::registry::{SoldierRank, SoldierRule, SoldierStats, SoldierTemplate};
use crate::rng::RandomDraw;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Soldiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Soldier {
    pub rule: SoldierTypeId,
    /// Per-type serial number.
    pub serial: u32,
    pub name: String,
    /// Index into the soldier rule's nationality list.
    pub nationality: usize,
    pub rank: SoldierRank,
    pub stats: SoldierStats,
}

impl Soldier {
    /// Apply a template on top of the generated soldier.
    pub fn apply_template(&mut self, template: &SoldierTemplate) {
        if let Some(rank) = template.rank {
            self.rank = rank;
        }
        if let Some(stats) = template.stats {
            self.stats = stats;
        }
    }

    /// Pick a first and last name from the soldier's nationality pool.
    ///
    /// Falls back to "<type> <serial>" when the pool has no names.
    pub fn generate_name(&mut self, rule: &SoldierRule, rng: &mut dyn RandomDraw) {
        let pool = rule.nationalities.get(self.nationality);
        let first = pool.and_then(|p| pick(&p.first_names, rng));
        let last = pool.and_then(|p| pick(&p.last_names, rng));
        self.name = match (first, last) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(n), None) | (None, Some(n)) => n.to_string(),
            (None, None) => format!("{} {}", rule.name, self.serial),
        };
    }
}

fn pick<'a>(names: &'a [String], rng: &mut dyn RandomDraw) -> Option<&'a str> {
    if names.is_empty() {
        return None;
    }
    let i = rng.generate(0, names.len() as u32 - 1) as usize;
    names.get(i).map(String::as_str)
}

fn roll(lo: u32, hi: u32, rng: &mut dyn RandomDraw) -> u32 {
    rng.generate(lo.min(hi), hi.max(lo))
}

/// Roll a new soldier with stats inside the rule's ranges. The name is left
/// empty; callers either set a custom name or call [`Soldier::generate_name`].
pub fn generate_soldier(
    rule_id: SoldierTypeId,
    rule: &SoldierRule,
    nationality: usize,
    serial: u32,
    rng: &mut dyn RandomDraw,
) -> Soldier {
    let (lo, hi) = (&rule.min_stats, &rule.max_stats);
    let stats = SoldierStats {
        time_units: roll(lo.time_units, hi.time_units, rng),
        stamina: roll(lo.stamina, hi.stamina, rng),
        health: roll(lo.health, hi.health, rng),
        bravery: roll(lo.bravery, hi.bravery, rng),
        reactions: roll(lo.reactions, hi.reactions, rng),
        firing: roll(lo.firing, hi.firing, rng),
        throwing: roll(lo.throwing, hi.throwing, rng),
        strength: roll(lo.strength, hi.strength, rng),
        melee: roll(lo.melee, hi.melee, rng),
    };
    Soldier {
        rule: rule_id,
        serial,
        name: String::new(),
        nationality,
        rank: SoldierRank::Rookie,
        stats,
    }
}

/// Choose a nationality for a soldier recruited at the given location.
///
/// Nationalities whose region contains the location are preferred; among
/// the candidates the choice is weighted. With no regional match every
/// nationality is a candidate. Returns 0 when the rule defines none or all
/// weights are zero.
pub fn select_nationality(
    rule: &SoldierRule,
    lon: Fixed64,
    lat: Fixed64,
    rng: &mut dyn RandomDraw,
) -> usize {
    let local: Vec<usize> = rule
        .nationalities
        .iter()
        .enumerate()
        .filter(|(_, p)| p.region.is_some_and(|r| r.contains(lon, lat)) && p.weight > 0)
        .map(|(i, _)| i)
        .collect();
    let candidates: Vec<usize> = if local.is_empty() {
        (0..rule.nationalities.len()).collect()
    } else {
        local
    };

    let total = candidates
        .iter()
        .fold(0u32, |total, &i| total.saturating_add(rule.nationalities[i].weight));
    if total == 0 {
        return 0;
    }
    let draw = rng.generate(1, total);
    let mut running: u32 = 0;
    for &i in &candidates {
        running = running.saturating_add(rule.nationalities[i].weight);
        if running >= draw {
            return i;
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Payload of an incoming transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferCargo {
    Scientists(u32),
    Engineers(u32),
    Soldier(Box<Soldier>),
}

/// A pending arrival at a base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub hours: Hours,
    pub cargo: TransferCargo,
}

impl Transfer {
    pub fn new(hours: Hours, cargo: TransferCargo) -> Self {
        Self { hours, cargo }
    }

    /// Number of people travelling with this transfer.
    pub fn person_count(&self) -> u32 {
        match &self.cargo {
            TransferCargo::Scientists(n) | TransferCargo::Engineers(n) => *n,
            TransferCargo::Soldier(_) => 1,
        }
    }

    /// Count down the arrival timer. Returns `true` once the transfer has arrived.
    pub fn advance(&mut self, hours: Hours) -> bool {
        self.hours = self.hours.saturating_sub(hours);
        self.hours == 0
    }
}
