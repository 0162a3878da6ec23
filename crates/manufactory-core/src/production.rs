//! A single manufacturing job at a base and its per-tick advancement.
//!
//! A job is split into units. Starting a unit debits its cost
//! ([`ProductionOrder::start_item`]); finishing it realizes its outputs
//! inside [`ProductionOrder::step`]. Labor accumulates in
//! `elapsed_labor` and the number of finished units is always derived from
//! it, so a blocked tick never has to undo progress.

use crate::base::Base;
use crate::craft::Craft;
use crate::economy::Economy;
use crate::id::{ItemTypeId, ManufactureId};
use crate::personnel::{Transfer, TransferCargo, generate_soldier, select_nationality};
use crate::registry::{BattleType, ManufactureRule, RandomOutput, Ruleset, SpawnedPerson};
use crate::rng::RandomDraw;
use crate::text::TextLookup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Outcome of one [`ProductionOrder::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionProgress {
    /// No blocking condition; keep stepping.
    NotComplete,
    /// Target reached. The order should be removed.
    Complete,
    NotEnoughMoney,
    NotEnoughMaterials,
    NotEnoughLivingSpace,
}

/// Why an order cannot start its next unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StallReason {
    NotEnoughMoney,
    NotEnoughMaterials,
    NotEnoughLivingSpace,
}

impl ProductionProgress {
    /// The blocking condition, if this status is one.
    pub fn stall_reason(self) -> Option<StallReason> {
        match self {
            ProductionProgress::NotEnoughMoney => Some(StallReason::NotEnoughMoney),
            ProductionProgress::NotEnoughMaterials => Some(StallReason::NotEnoughMaterials),
            ProductionProgress::NotEnoughLivingSpace => Some(StallReason::NotEnoughLivingSpace),
            ProductionProgress::NotComplete | ProductionProgress::Complete => None,
        }
    }

    pub fn is_blocked(self) -> bool {
        self.stall_reason().is_some()
    }
}

/// Detailed result of a step, for schedulers that report deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub progress: ProductionProgress,
    /// Units whose outputs were realized during this step.
    pub units_realized: u32,
    /// Units whose labor is done but which a blocked batch could neither pay
    /// for nor realize. See [`ProductionOrder::realize_pending`].
    pub units_pending: u32,
}

// ---------------------------------------------------------------------------
// Step context
// ---------------------------------------------------------------------------

/// Game-wide collaborators a step reads or mutates.
pub struct StepContext<'a> {
    pub economy: &'a mut Economy,
    pub rules: &'a Ruleset,
    pub lang: &'a dyn TextLookup,
    pub rng: &'a mut dyn RandomDraw,
}

// ---------------------------------------------------------------------------
// Roulette
// ---------------------------------------------------------------------------

/// Index of the first outcome whose cumulative weight reaches `roll`.
///
/// `roll` is expected in `[1, total_weight]`. Returns `None` when the roll
/// exceeds the total weight (including the empty table).
pub fn select_random_output(outputs: &[RandomOutput], roll: u32) -> Option<usize> {
    let mut running: u32 = 0;
    for (i, outcome) in outputs.iter().enumerate() {
        running = running.saturating_add(outcome.weight);
        if running >= roll {
            return Some(i);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// ProductionOrder
// ---------------------------------------------------------------------------

/// One active manufacturing job at one base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrder {
    recipe: ManufactureId,
    target_amount: u32,
    unbounded: bool,
    elapsed_labor: u32,
    assigned_workers: u32,
    liquidate_output: bool,
    /// Output item name -> quantity produced while the recipe has random outputs.
    random_output_tally: BTreeMap<String, u32>,
}

impl ProductionOrder {
    pub fn new(recipe: ManufactureId, target_amount: u32) -> Self {
        Self {
            recipe,
            target_amount,
            unbounded: false,
            elapsed_labor: 0,
            assigned_workers: 0,
            liquidate_output: false,
            random_output_tally: BTreeMap::new(),
        }
    }

    pub fn recipe(&self) -> ManufactureId {
        self.recipe
    }

    pub fn target_amount(&self) -> u32 {
        self.target_amount
    }

    pub fn set_target_amount(&mut self, amount: u32) {
        self.target_amount = amount;
    }

    pub fn unbounded(&self) -> bool {
        self.unbounded
    }

    pub fn set_unbounded(&mut self, unbounded: bool) {
        self.unbounded = unbounded;
    }

    pub fn elapsed_labor(&self) -> u32 {
        self.elapsed_labor
    }

    pub fn set_elapsed_labor(&mut self, labor: u32) {
        self.elapsed_labor = labor;
    }

    pub fn assigned_workers(&self) -> u32 {
        self.assigned_workers
    }

    pub fn set_assigned_workers(&mut self, workers: u32) {
        self.assigned_workers = workers;
    }

    pub fn liquidate_output(&self) -> bool {
        self.liquidate_output
    }

    pub fn set_liquidate_output(&mut self, liquidate: bool) {
        self.liquidate_output = liquidate;
    }

    pub fn random_output_tally(&self) -> &BTreeMap<String, u32> {
        &self.random_output_tally
    }

    pub(crate) fn set_random_output_tally(&mut self, tally: BTreeMap<String, u32>) {
        self.random_output_tally = tally;
    }

    /// No progress made yet and nobody assigned.
    pub fn is_queued_only(&self) -> bool {
        self.elapsed_labor == 0 && self.assigned_workers == 0
    }

    /// Units finished so far. Instantaneous recipes report the target.
    pub fn completed_units(&self, rule: &ManufactureRule) -> u32 {
        if rule.time_per_unit > 0 {
            self.elapsed_labor / rule.time_per_unit
        } else {
            self.target_amount
        }
    }

    /// A bounded order whose labor covers its whole target.
    pub fn is_finished(&self, rule: &ManufactureRule) -> bool {
        !self.unbounded && self.completed_units(rule) >= self.target_amount
    }

    // -----------------------------------------------------------------------
    // Affordability
    // -----------------------------------------------------------------------

    pub fn have_enough_money_for_one_more_unit(
        &self,
        rule: &ManufactureRule,
        economy: &Economy,
    ) -> bool {
        rule.have_enough_money_for_one_more_unit(economy.funds())
    }

    /// Only person-producing recipes need quarters.
    pub fn have_enough_living_space_for_one_more_unit(
        &self,
        rule: &ManufactureRule,
        base: &Base,
    ) -> bool {
        !rule.spawns_person() || base.used_quarters() < base.available_quarters()
    }

    pub fn have_enough_materials_for_one_more_unit(
        &self,
        rule: &ManufactureRule,
        base: &Base,
    ) -> bool {
        rule.required_items
            .iter()
            .all(|req| base.items.quantity(req.item) >= req.quantity)
            && rule
                .required_craft
                .iter()
                .all(|req| base.craft_count(req.craft) >= req.quantity)
    }

    // -----------------------------------------------------------------------
    // Unit commit / refund
    // -----------------------------------------------------------------------

    /// Pay for the next unit: money, required items, and one craft per
    /// required craft entry. Consumed craft are destroyed.
    pub fn start_item(&self, rule: &ManufactureRule, base: &mut Base, economy: &mut Economy) {
        economy.add_funds(-rule.cost);
        for req in &rule.required_items {
            let _ = base.items.remove(req.item, req.quantity);
        }
        for req in &rule.required_craft {
            if let Some(craft) = base.remove_craft(req.craft) {
                log::debug!(
                    "{}: craft {:?}-{} dismantled for {}",
                    base.name,
                    craft.rule,
                    craft.serial,
                    rule.name
                );
            }
        }
    }

    /// Give back the money and items of an unfinished unit. Craft consumed by
    /// [`start_item`](Self::start_item) are not restored.
    pub fn refund_item(&self, rule: &ManufactureRule, base: &mut Base, economy: &mut Economy) {
        economy.add_funds(rule.cost);
        for req in &rule.required_items {
            base.items.add(req.item, req.quantity);
        }
    }

    /// Check money, living space and materials, in that order, and start the
    /// next unit when all pass.
    pub fn try_start_next_unit(
        &self,
        rule: &ManufactureRule,
        base: &mut Base,
        economy: &mut Economy,
    ) -> ProductionProgress {
        if !self.have_enough_money_for_one_more_unit(rule, economy) {
            return ProductionProgress::NotEnoughMoney;
        }
        if !self.have_enough_living_space_for_one_more_unit(rule, base) {
            return ProductionProgress::NotEnoughLivingSpace;
        }
        if !self.have_enough_materials_for_one_more_unit(rule, base) {
            return ProductionProgress::NotEnoughMaterials;
        }
        self.start_item(rule, base, economy);
        ProductionProgress::NotComplete
    }

    // -----------------------------------------------------------------------
    // Advancement
    // -----------------------------------------------------------------------

    /// Advance the order by one tick. See [`step_detailed`](Self::step_detailed).
    pub fn step(
        &mut self,
        rule: &ManufactureRule,
        base: &mut Base,
        ctx: &mut StepContext<'_>,
    ) -> ProductionProgress {
        self.step_detailed(rule, base, ctx).progress
    }

    /// Advance the order by one tick: add the assigned workers' labor,
    /// realize every unit that finished, and pay for the next one.
    ///
    /// Units realized before a blocking condition is hit stay realized.
    pub fn step_detailed(
        &mut self,
        rule: &ManufactureRule,
        base: &mut Base,
        ctx: &mut StepContext<'_>,
    ) -> StepOutcome {
        let done = self.completed_units(rule);
        self.elapsed_labor = self.elapsed_labor.saturating_add(self.assigned_workers);
        let now = self.completed_units(rule);
        let mut realized = 0;

        if done < now {
            // Never overproduce a bounded order.
            let produced = if self.unbounded {
                now - done
            } else {
                now.min(self.target_amount).saturating_sub(done)
            };
            while realized < produced {
                self.realize_unit(rule, base, ctx);
                realized += 1;
                if realized < produced {
                    if !self.have_enough_money_for_one_more_unit(rule, ctx.economy) {
                        return StepOutcome {
                            progress: ProductionProgress::NotEnoughMoney,
                            units_realized: realized,
                            units_pending: produced - realized,
                        };
                    }
                    if !self.have_enough_materials_for_one_more_unit(rule, base) {
                        return StepOutcome {
                            progress: ProductionProgress::NotEnoughMaterials,
                            units_realized: realized,
                            units_pending: produced - realized,
                        };
                    }
                    self.start_item(rule, base, ctx.economy);
                }
            }
        }

        let progress = if self.is_finished(rule) {
            ProductionProgress::Complete
        } else if done < self.completed_units(rule) {
            self.try_start_next_unit(rule, base, ctx.economy)
        } else {
            ProductionProgress::NotComplete
        };

        StepOutcome {
            progress,
            units_realized: realized,
            units_pending: 0,
        }
    }

    /// Deliver units left behind by a blocked batch, then finish the order
    /// or start its next unit the way the end of a step does.
    ///
    /// Each pending unit is paid for (money, living space, materials) right
    /// before it is realized. Labor is not touched. With `pending == 0` this
    /// is a plain retry of the next unit's start.
    pub fn realize_pending(
        &mut self,
        rule: &ManufactureRule,
        base: &mut Base,
        ctx: &mut StepContext<'_>,
        pending: u32,
    ) -> StepOutcome {
        let mut realized = 0;
        while realized < pending {
            let status = self.try_start_next_unit(rule, base, ctx.economy);
            if status.is_blocked() {
                return StepOutcome {
                    progress: status,
                    units_realized: realized,
                    units_pending: pending - realized,
                };
            }
            self.realize_unit(rule, base, ctx);
            realized += 1;
        }

        let progress = if self.is_finished(rule) {
            ProductionProgress::Complete
        } else {
            self.try_start_next_unit(rule, base, ctx.economy)
        };
        StepOutcome {
            progress,
            units_realized: realized,
            units_pending: 0,
        }
    }

    /// Materialize the outputs of one finished unit.
    fn realize_unit(&mut self, rule: &ManufactureRule, base: &mut Base, ctx: &mut StepContext<'_>) {
        let rules = ctx.rules;

        if let Some(craft_type) = rule.produced_craft {
            let serial = ctx.economy.next_craft_serial(craft_type);
            let mut craft = Craft::new(craft_type, serial);
            craft.init_fixed_weapons(rules);
            craft.checkup(rules);
            base.crafts.push(craft);
        } else {
            for output in &rule.produced_items {
                if self.liquidate_output {
                    if let Some(item) = rules.get_item(output.item) {
                        let value = ctx
                            .economy
                            .sell_value(item)
                            .saturating_mul(i64::from(output.quantity));
                        ctx.economy.add_funds(value);
                    }
                } else {
                    let tally = rule.has_random_outputs();
                    self.stock_item(output.item, output.quantity, tally, base, rules);
                }
            }
        }

        if rule.has_random_outputs() {
            let roll = ctx.rng.generate(1, rule.total_random_weight());
            if let Some(index) = select_random_output(&rule.random_outputs, roll) {
                for output in &rule.random_outputs[index].items {
                    self.stock_item(output.item, output.quantity, true, base, rules);
                }
            }
        }

        if let Some(person) = &rule.spawned_person {
            spawn_person(person, base, ctx);
        }

        if rule.score != 0 {
            ctx.economy.add_research_score(rule.score);
        }
    }

    /// Put produced items into base storage and let craft waiting on
    /// supplies pick them up.
    fn stock_item(
        &mut self,
        item: ItemTypeId,
        quantity: u32,
        tally: bool,
        base: &mut Base,
        rules: &Ruleset,
    ) {
        base.items.add(item, quantity);
        if tally {
            *self
                .random_output_tally
                .entry(rules.item_name(item).to_string())
                .or_insert(0) += quantity;
        }
        let non_combat = rules
            .get_item(item)
            .is_some_and(|i| i.battle_type == BattleType::None);
        if non_combat {
            for craft in &mut base.crafts {
                craft.reuse_item(item, rules);
            }
        }
    }
}

/// Queue the arrival of one person produced by a finished unit.
fn spawn_person(person: &SpawnedPerson, base: &mut Base, ctx: &mut StepContext<'_>) {
    let config = &ctx.economy.config;
    let hours = config.person_transfer_hours;

    if person.person_type == config.scientist_type {
        base.transfers
            .push(Transfer::new(hours, TransferCargo::Scientists(1)));
        return;
    }
    if person.person_type == config.engineer_type {
        base.transfers
            .push(Transfer::new(hours, TransferCargo::Engineers(1)));
        return;
    }

    let rules = ctx.rules;
    let Some((soldier_id, soldier_rule)) = rules
        .soldier_id(&person.person_type)
        .and_then(|id| rules.get_soldier(id).map(|r| (id, r)))
    else {
        log::warn!(
            "{}: unknown spawned person type {}, nobody was created",
            base.name,
            person.person_type
        );
        return;
    };

    let nationality = select_nationality(soldier_rule, base.longitude, base.latitude, ctx.rng);
    let serial = ctx.economy.next_soldier_serial(soldier_id);
    let mut soldier = generate_soldier(soldier_id, soldier_rule, nationality, serial, ctx.rng);
    soldier.apply_template(&person.template);
    match &person.custom_name {
        Some(key) => soldier.name = ctx.lang.get_string(key),
        None => soldier.generate_name(soldier_rule, ctx.rng),
    }
    base.transfers
        .push(Transfer::new(hours, TransferCargo::Soldier(Box::new(soldier))));
}
