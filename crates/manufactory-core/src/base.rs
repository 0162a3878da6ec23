//! A player base: storage, hangars, personnel and incoming transfers.
//!
//! Facility layout is not modelled here. Living-quarter and workshop
//! capacities are plain numbers set by whoever builds the facilities.

use crate::craft::Craft;
use crate::fixed::{Fixed64, Hours};
use crate::id::CraftTypeId;
use crate::item::ItemContainer;
use crate::personnel::{Soldier, Transfer, TransferCargo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub name: String,
    /// Degrees east.
    pub longitude: Fixed64,
    /// Degrees north.
    pub latitude: Fixed64,
    pub items: ItemContainer,
    /// Hangar roster in arrival order.
    pub crafts: Vec<Craft>,
    /// Pending arrivals in creation order.
    pub transfers: Vec<Transfer>,
    pub soldiers: Vec<Soldier>,
    pub scientists: u32,
    /// Engineers not assigned to any job.
    pub engineers: u32,
    /// Engineers working on production orders.
    pub assigned_engineers: u32,
    /// Living-quarter capacity provided by facilities.
    pub living_quarters: u32,
    /// Workshop capacity provided by facilities.
    pub workshop_space: u32,
}

impl Base {
    pub fn new(name: &str, longitude: Fixed64, latitude: Fixed64) -> Self {
        Self {
            name: name.to_string(),
            longitude,
            latitude,
            items: ItemContainer::new(),
            crafts: Vec::new(),
            transfers: Vec::new(),
            soldiers: Vec::new(),
            scientists: 0,
            engineers: 0,
            assigned_engineers: 0,
            living_quarters: 0,
            workshop_space: 0,
        }
    }

    pub fn available_quarters(&self) -> u32 {
        self.living_quarters
    }

    /// Quarters occupied by everyone living at or travelling to the base.
    pub fn used_quarters(&self) -> u32 {
        let in_transit: u32 = self.transfers.iter().map(Transfer::person_count).sum();
        self.soldiers.len() as u32
            + self.scientists
            + self.engineers
            + self.assigned_engineers
            + in_transit
    }

    /// Number of craft of the given type currently in the hangars.
    pub fn craft_count(&self, rule: CraftTypeId) -> u32 {
        self.crafts.iter().filter(|c| c.rule == rule).count() as u32
    }

    /// Detach the first craft of the given type from the roster.
    pub fn remove_craft(&mut self, rule: CraftTypeId) -> Option<Craft> {
        let index = self.crafts.iter().position(|c| c.rule == rule)?;
        Some(self.crafts.remove(index))
    }

    /// Count down all transfers by `hours` and move arrivals into the base.
    /// Returns the number of transfers that arrived.
    pub fn advance_transfers(&mut self, hours: Hours) -> usize {
        let mut arrived = Vec::new();
        let mut pending = Vec::with_capacity(self.transfers.len());
        for mut transfer in self.transfers.drain(..) {
            if transfer.advance(hours) {
                arrived.push(transfer);
            } else {
                pending.push(transfer);
            }
        }
        self.transfers = pending;

        let count = arrived.len();
        for transfer in arrived {
            match transfer.cargo {
                TransferCargo::Scientists(n) => self.scientists += n,
                TransferCargo::Engineers(n) => self.engineers += n,
                TransferCargo::Soldier(soldier) => self.soldiers.push(*soldier),
            }
        }
        count
    }
}
