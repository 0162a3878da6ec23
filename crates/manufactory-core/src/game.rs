//! Top-level game state: the economy, the bases and their workshops.
//!
//! `Game` is the single owner of everything production mutates. Commands
//! and the hourly pass borrow it mutably, so at most one of them runs at a
//! time.

use crate::base::Base;
use crate::config::EconomyConfig;
use crate::economy::Economy;
use crate::event::ProductionEvent;
use crate::fixed::Hours;
use crate::id::{BaseId, ManufactureId};
use crate::production::{ProductionOrder, StepContext};
use crate::registry::Ruleset;
use crate::rng::SimRng;
use crate::text::TextLookup;
use crate::workshop::{ProductionError, Workshop};
use serde::{Deserialize, Serialize};
use slotmap::{SecondaryMap, SlotMap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub economy: Economy,
    pub rng: SimRng,
    bases: SlotMap<BaseId, Base>,
    workshops: SecondaryMap<BaseId, Workshop>,
    /// Hourly production passes run so far.
    hour: u64,
}

impl Game {
    pub fn new(funds: i64, config: EconomyConfig, seed: u64) -> Self {
        Self {
            economy: Economy::new(funds, config),
            rng: SimRng::new(seed),
            bases: SlotMap::with_key(),
            workshops: SecondaryMap::new(),
            hour: 0,
        }
    }

    pub fn hour(&self) -> u64 {
        self.hour
    }

    // -----------------------------------------------------------------------
    // Bases
    // -----------------------------------------------------------------------

    pub fn add_base(&mut self, base: Base) -> BaseId {
        let id = self.bases.insert(base);
        self.workshops.insert(id, Workshop::new());
        id
    }

    /// Remove a base. Its orders are discarded without refunds.
    pub fn remove_base(&mut self, id: BaseId) -> Option<Base> {
        if let Some(workshop) = self.workshops.remove(id)
            && !workshop.is_empty()
        {
            log::info!("base removed with {} orders in progress", workshop.len());
        }
        self.bases.remove(id)
    }

    pub fn base(&self, id: BaseId) -> Option<&Base> {
        self.bases.get(id)
    }

    pub fn base_mut(&mut self, id: BaseId) -> Option<&mut Base> {
        self.bases.get_mut(id)
    }

    pub fn bases(&self) -> impl Iterator<Item = (BaseId, &Base)> {
        self.bases.iter()
    }

    pub fn workshop(&self, id: BaseId) -> Option<&Workshop> {
        self.workshops.get(id)
    }

    /// Replace a base's production queue, e.g. after loading saved orders.
    pub fn set_workshop(&mut self, id: BaseId, workshop: Workshop) -> Result<(), ProductionError> {
        if !self.bases.contains_key(id) {
            return Err(ProductionError::UnknownBase(id));
        }
        self.workshops.insert(id, workshop);
        Ok(())
    }

    fn parts_mut(&mut self, id: BaseId) -> Result<(&mut Base, &mut Workshop), ProductionError> {
        let base = self
            .bases
            .get_mut(id)
            .ok_or(ProductionError::UnknownBase(id))?;
        if !self.workshops.contains_key(id) {
            self.workshops.insert(id, Workshop::new());
        }
        let workshop = self
            .workshops
            .get_mut(id)
            .ok_or(ProductionError::UnknownBase(id))?;
        Ok((base, workshop))
    }

    // -----------------------------------------------------------------------
    // Player commands
    // -----------------------------------------------------------------------

    pub fn start_order(
        &mut self,
        id: BaseId,
        rules: &Ruleset,
        recipe: ManufactureId,
        amount: u32,
    ) -> Result<usize, ProductionError> {
        let base = self
            .bases
            .get_mut(id)
            .ok_or(ProductionError::UnknownBase(id))?;
        let workshop = self.workshops.entry(id).map(|e| e.or_default());
        let workshop = workshop.ok_or(ProductionError::UnknownBase(id))?;
        workshop.start_order(base, &mut self.economy, rules, recipe, amount)
    }

    pub fn set_assigned_workers(
        &mut self,
        id: BaseId,
        rules: &Ruleset,
        index: usize,
        workers: u32,
    ) -> Result<(), ProductionError> {
        let (base, workshop) = self.parts_mut(id)?;
        workshop.set_assigned_workers(base, rules, index, workers)
    }

    pub fn set_target_amount(
        &mut self,
        id: BaseId,
        rules: &Ruleset,
        index: usize,
        amount: u32,
    ) -> Result<(), ProductionError> {
        let (_, workshop) = self.parts_mut(id)?;
        workshop.set_target_amount(rules, index, amount)
    }

    pub fn set_unbounded(
        &mut self,
        id: BaseId,
        index: usize,
        unbounded: bool,
    ) -> Result<(), ProductionError> {
        let (_, workshop) = self.parts_mut(id)?;
        workshop.set_unbounded(index, unbounded)
    }

    pub fn set_liquidate_output(
        &mut self,
        id: BaseId,
        index: usize,
        liquidate: bool,
    ) -> Result<(), ProductionError> {
        let (_, workshop) = self.parts_mut(id)?;
        workshop.set_liquidate_output(index, liquidate)
    }

    pub fn cancel_order(
        &mut self,
        id: BaseId,
        rules: &Ruleset,
        index: usize,
    ) -> Result<ProductionOrder, ProductionError> {
        let base = self
            .bases
            .get_mut(id)
            .ok_or(ProductionError::UnknownBase(id))?;
        let workshop = self
            .workshops
            .get_mut(id)
            .ok_or(ProductionError::InvalidOrderIndex(index))?;
        workshop.cancel_order(base, &mut self.economy, rules, index)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Run one hourly production pass over every base, in base-id order.
    pub fn advance_production(
        &mut self,
        rules: &Ruleset,
        lang: &dyn TextLookup,
    ) -> Vec<ProductionEvent> {
        self.hour += 1;
        let mut events = Vec::new();
        for (id, base) in self.bases.iter_mut() {
            let Some(workshop) = self.workshops.get_mut(id) else {
                continue;
            };
            let mut ctx = StepContext {
                economy: &mut self.economy,
                rules,
                lang,
                rng: &mut self.rng,
            };
            events.extend(workshop.advance(id, base, &mut ctx, self.hour));
        }
        events
    }

    /// Count down every base's incoming transfers. Returns the number of
    /// arrivals.
    pub fn advance_transfers(&mut self, hours: Hours) -> usize {
        self.bases
            .values_mut()
            .map(|base| base.advance_transfers(hours))
            .sum()
    }
}
