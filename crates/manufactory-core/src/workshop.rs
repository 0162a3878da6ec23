//! Per-base production queue.
//!
//! The workshop owns a base's orders, enforces engineer and workshop-space
//! limits on player edits, and runs the hourly pass that steps every order
//! and turns the results into [`ProductionEvent`]s.
//!
//! An order whose next unit could not be started is *stalled*: it keeps its
//! place and its engineers but accrues no labor. Each pass retries the
//! start and resumes the order as soon as it succeeds. Units whose labor
//! finished inside a blocked batch are kept as a backlog and delivered,
//! each paid for in turn, before the order resumes.

use crate::base::Base;
use crate::economy::Economy;
use crate::event::ProductionEvent;
use crate::id::{BaseId, ManufactureId};
use crate::production::{ProductionOrder, ProductionProgress, StallReason, StepContext};
use crate::registry::Ruleset;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected player commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductionError {
    #[error("unknown base: {0:?}")]
    UnknownBase(BaseId),
    #[error("unknown manufacture rule: {0:?}")]
    UnknownRecipe(ManufactureId),
    #[error("not enough money: need {needed}, have {available}")]
    NotEnoughMoney { needed: i64, available: i64 },
    #[error("not enough materials to start {0}")]
    NotEnoughMaterials(String),
    #[error("not enough engineers: need {needed}, have {available}")]
    NotEnoughEngineers { needed: u32, available: u32 },
    #[error("not enough workshop space: need {needed}, have {available}")]
    NotEnoughWorkshopSpace { needed: u32, available: u32 },
    #[error("no order at index {0}")]
    InvalidOrderIndex(usize),
    #[error("target amount {requested} is below the minimum of {minimum}")]
    InvalidTargetAmount { requested: u32, minimum: u32 },
}

// ---------------------------------------------------------------------------
// Workshop
// ---------------------------------------------------------------------------

/// An order plus the scheduler's view of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOrder {
    pub order: ProductionOrder,
    /// Set while the order waits for money, materials or quarters.
    pub stall: Option<StallReason>,
    /// Units already worked but not yet paid for or delivered.
    pub backlog: u32,
}

impl QueuedOrder {
    pub fn new(order: ProductionOrder) -> Self {
        Self {
            order,
            stall: None,
            backlog: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workshop {
    orders: Vec<QueuedOrder>,
}

impl Workshop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order(&self, index: usize) -> Option<&ProductionOrder> {
        self.orders.get(index).map(|q| &q.order)
    }

    pub fn queued(&self) -> &[QueuedOrder] {
        &self.orders
    }

    pub fn orders(&self) -> impl Iterator<Item = &ProductionOrder> {
        self.orders.iter().map(|q| &q.order)
    }

    /// Append an already constructed order, e.g. one restored from a save.
    /// No unit is paid for.
    pub fn push(&mut self, order: ProductionOrder) {
        self.orders.push(QueuedOrder::new(order));
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut QueuedOrder, ProductionError> {
        self.orders
            .get_mut(index)
            .ok_or(ProductionError::InvalidOrderIndex(index))
    }

    /// Workshop space taken by every order: its recipe footprint plus its
    /// engineers.
    pub fn used_space(&self, rules: &Ruleset) -> u32 {
        self.orders
            .iter()
            .map(|q| {
                let footprint = rules
                    .get_manufacture(q.order.recipe())
                    .map(|r| r.required_space)
                    .unwrap_or(0);
                footprint + q.order.assigned_workers()
            })
            .sum()
    }

    // -----------------------------------------------------------------------
    // Player commands
    // -----------------------------------------------------------------------

    /// Queue a new order and pay for its first unit. Returns the order's index.
    pub fn start_order(
        &mut self,
        base: &mut Base,
        economy: &mut Economy,
        rules: &Ruleset,
        recipe: ManufactureId,
        amount: u32,
    ) -> Result<usize, ProductionError> {
        let rule = rules
            .get_manufacture(recipe)
            .ok_or(ProductionError::UnknownRecipe(recipe))?;
        if amount == 0 {
            return Err(ProductionError::InvalidTargetAmount {
                requested: 0,
                minimum: 1,
            });
        }

        let order = ProductionOrder::new(recipe, amount);
        if !order.have_enough_money_for_one_more_unit(rule, economy) {
            return Err(ProductionError::NotEnoughMoney {
                needed: rule.cost,
                available: economy.funds(),
            });
        }
        if !order.have_enough_materials_for_one_more_unit(rule, base) {
            return Err(ProductionError::NotEnoughMaterials(rule.name.clone()));
        }
        let free = base.workshop_space.saturating_sub(self.used_space(rules));
        if rule.required_space > free {
            return Err(ProductionError::NotEnoughWorkshopSpace {
                needed: rule.required_space,
                available: free,
            });
        }

        order.start_item(rule, base, economy);
        log::debug!("{}: queued {} x{}", base.name, rule.name, amount);
        self.orders.push(QueuedOrder::new(order));
        Ok(self.orders.len() - 1)
    }

    /// Move engineers between the base's idle pool and an order.
    pub fn set_assigned_workers(
        &mut self,
        base: &mut Base,
        rules: &Ruleset,
        index: usize,
        workers: u32,
    ) -> Result<(), ProductionError> {
        let used = self.used_space(rules);
        let current = self.get_mut(index)?.order.assigned_workers();

        if workers > current {
            let extra = workers - current;
            if extra > base.engineers {
                return Err(ProductionError::NotEnoughEngineers {
                    needed: extra,
                    available: base.engineers,
                });
            }
            let free = base.workshop_space.saturating_sub(used);
            if extra > free {
                return Err(ProductionError::NotEnoughWorkshopSpace {
                    needed: extra,
                    available: free,
                });
            }
            base.engineers -= extra;
            base.assigned_engineers += extra;
        } else {
            let freed = current - workers;
            base.assigned_engineers = base.assigned_engineers.saturating_sub(freed);
            base.engineers += freed;
        }

        self.get_mut(index)?.order.set_assigned_workers(workers);
        Ok(())
    }

    /// Change the target. It may not drop below the units already finished
    /// plus the one in progress.
    pub fn set_target_amount(
        &mut self,
        rules: &Ruleset,
        index: usize,
        amount: u32,
    ) -> Result<(), ProductionError> {
        let queued = self.get_mut(index)?;
        let recipe = queued.order.recipe();
        let rule = rules
            .get_manufacture(recipe)
            .ok_or(ProductionError::UnknownRecipe(recipe))?;
        let minimum = queued.order.completed_units(rule).saturating_add(1);
        if amount < minimum {
            return Err(ProductionError::InvalidTargetAmount {
                requested: amount,
                minimum,
            });
        }
        queued.order.set_target_amount(amount);
        Ok(())
    }

    pub fn set_unbounded(&mut self, index: usize, unbounded: bool) -> Result<(), ProductionError> {
        self.get_mut(index)?.order.set_unbounded(unbounded);
        Ok(())
    }

    pub fn set_liquidate_output(
        &mut self,
        index: usize,
        liquidate: bool,
    ) -> Result<(), ProductionError> {
        self.get_mut(index)?.order.set_liquidate_output(liquidate);
        Ok(())
    }

    /// Remove an order, release its engineers and refund the unit it has
    /// paid for. Craft consumed by that unit are gone for good.
    pub fn cancel_order(
        &mut self,
        base: &mut Base,
        economy: &mut Economy,
        rules: &Ruleset,
        index: usize,
    ) -> Result<ProductionOrder, ProductionError> {
        if index >= self.orders.len() {
            return Err(ProductionError::InvalidOrderIndex(index));
        }
        let queued = self.orders.remove(index);
        release_engineers(base, &queued.order);
        if queued.stall.is_none()
            && let Some(rule) = rules.get_manufacture(queued.order.recipe())
        {
            queued.order.refund_item(rule, base, economy);
        }
        Ok(queued.order)
    }

    // -----------------------------------------------------------------------
    // Hourly pass
    // -----------------------------------------------------------------------

    /// Step every order once, in queue order.
    pub fn advance(
        &mut self,
        base_id: BaseId,
        base: &mut Base,
        ctx: &mut StepContext<'_>,
        hour: u64,
    ) -> Vec<ProductionEvent> {
        let rules = ctx.rules;
        let mut events = Vec::new();
        let mut finished = Vec::new();

        for (index, queued) in self.orders.iter_mut().enumerate() {
            let recipe = queued.order.recipe();
            let Some(rule) = rules.get_manufacture(recipe) else {
                log::warn!("{}: dropping order for unknown recipe {:?}", base.name, recipe);
                events.push(ProductionEvent::OrderDropped {
                    base: base_id,
                    recipe,
                    hour,
                });
                finished.push(index);
                continue;
            };

            if let Some(reason) = queued.stall {
                let retry = queued
                    .order
                    .realize_pending(rule, base, ctx, queued.backlog);
                queued.backlog = retry.units_pending;
                if retry.units_realized > 0 {
                    events.push(ProductionEvent::UnitsCompleted {
                        base: base_id,
                        recipe,
                        units: retry.units_realized,
                        hour,
                    });
                }
                match retry.progress {
                    ProductionProgress::NotComplete => {
                        log::debug!("{}: {} resumed", base.name, rule.name);
                        queued.stall = None;
                        events.push(ProductionEvent::OrderResumed {
                            base: base_id,
                            recipe,
                            hour,
                        });
                    }
                    ProductionProgress::Complete => {
                        log::debug!("{}: {} complete after backlog", base.name, rule.name);
                        queued.stall = None;
                        events.push(ProductionEvent::OrderCompleted {
                            base: base_id,
                            recipe,
                            hour,
                        });
                        finished.push(index);
                        continue;
                    }
                    status => {
                        let now = status.stall_reason().unwrap_or(reason);
                        if now != reason {
                            queued.stall = Some(now);
                            events.push(ProductionEvent::OrderStalled {
                                base: base_id,
                                recipe,
                                reason: now,
                                hour,
                            });
                        }
                        continue;
                    }
                }
            }

            let outcome = queued.order.step_detailed(rule, base, ctx);
            if outcome.units_realized > 0 {
                events.push(ProductionEvent::UnitsCompleted {
                    base: base_id,
                    recipe,
                    units: outcome.units_realized,
                    hour,
                });
            }
            match outcome.progress {
                ProductionProgress::NotComplete => {}
                ProductionProgress::Complete => {
                    log::debug!("{}: {} complete", base.name, rule.name);
                    events.push(ProductionEvent::OrderCompleted {
                        base: base_id,
                        recipe,
                        hour,
                    });
                    finished.push(index);
                }
                blocked => {
                    if let Some(reason) = blocked.stall_reason() {
                        log::debug!("{}: {} stalled: {:?}", base.name, rule.name, reason);
                        queued.stall = Some(reason);
                        queued.backlog = outcome.units_pending;
                        events.push(ProductionEvent::OrderStalled {
                            base: base_id,
                            recipe,
                            reason,
                            hour,
                        });
                    }
                }
            }
        }

        for index in finished.into_iter().rev() {
            let queued = self.orders.remove(index);
            release_engineers(base, &queued.order);
        }
        events
    }
}

fn release_engineers(base: &mut Base, order: &ProductionOrder) {
    let workers = order.assigned_workers();
    base.assigned_engineers = base.assigned_engineers.saturating_sub(workers);
    base.engineers += workers;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::test_utils::*;

    fn advance(h: &mut Harness, workshop: &mut Workshop, hour: u64) -> Vec<ProductionEvent> {
        let mut ctx = StepContext {
            economy: &mut h.economy,
            rules: &h.rules,
            lang: &h.lang,
            rng: &mut *h.rng,
        };
        workshop.advance(BaseId::default(), &mut h.base, &mut ctx, hour)
    }

    #[test]
    fn start_order_pays_first_unit() {
        let mut h = Harness::new(1_000);
        h.base.items.add(alloys(), 2);
        let mut ws = Workshop::new();
        let index = ws
            .start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 2)
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(h.economy.funds(), 900);
        assert_eq!(h.base.items.quantity(alloys()), 1);
        assert!(ws.order(0).unwrap().is_queued_only());
    }

    #[test]
    fn start_order_rejections() {
        let mut h = Harness::new(50);
        let mut ws = Workshop::new();
        let err = ws
            .start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 1)
            .unwrap_err();
        assert_eq!(
            err,
            ProductionError::NotEnoughMoney {
                needed: 100,
                available: 50
            }
        );

        h.economy.set_funds(10_000);
        let err = ws
            .start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 1)
            .unwrap_err();
        assert!(matches!(err, ProductionError::NotEnoughMaterials(_)));

        let err = ws
            .start_order(&mut h.base, &mut h.economy, &h.rules, ManufactureId(99), 1)
            .unwrap_err();
        assert_eq!(err, ProductionError::UnknownRecipe(ManufactureId(99)));

        h.base.workshop_space = 10;
        let err = ws
            .start_order(&mut h.base, &mut h.economy, &h.rules, interceptor_recipe(), 1)
            .unwrap_err();
        assert!(matches!(err, ProductionError::NotEnoughWorkshopSpace { .. }));
        assert_eq!(h.economy.funds(), 10_000);
        assert!(ws.is_empty());
    }

    #[test]
    fn workers_move_between_pools() {
        let mut h = Harness::new(10_000);
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, elerium_recipe(), 5)
            .unwrap();

        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 6).unwrap();
        assert_eq!(h.base.engineers, 4);
        assert_eq!(h.base.assigned_engineers, 6);
        assert_eq!(ws.used_space(&h.rules), 7);

        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 2).unwrap();
        assert_eq!(h.base.engineers, 8);
        assert_eq!(h.base.assigned_engineers, 2);

        let err = ws.set_assigned_workers(&mut h.base, &h.rules, 0, 11).unwrap_err();
        assert_eq!(
            err,
            ProductionError::NotEnoughEngineers {
                needed: 9,
                available: 8
            }
        );
        assert_eq!(
            ws.set_assigned_workers(&mut h.base, &h.rules, 3, 1),
            Err(ProductionError::InvalidOrderIndex(3))
        );
    }

    #[test]
    fn workers_limited_by_space() {
        let mut h = Harness::new(10_000);
        h.base.workshop_space = 4;
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, elerium_recipe(), 5)
            .unwrap();
        let err = ws.set_assigned_workers(&mut h.base, &h.rules, 0, 4).unwrap_err();
        assert_eq!(
            err,
            ProductionError::NotEnoughWorkshopSpace {
                needed: 4,
                available: 3
            }
        );
        assert_eq!(h.base.engineers, 10);
    }

    #[test]
    fn target_cannot_drop_below_progress() {
        let mut h = Harness::new(10_000);
        h.base.items.add(alloys(), 10);
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 5)
            .unwrap();
        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 10).unwrap();
        advance(&mut h, &mut ws, 1);
        advance(&mut h, &mut ws, 2);

        assert_eq!(
            ws.set_target_amount(&h.rules, 0, 2),
            Err(ProductionError::InvalidTargetAmount {
                requested: 2,
                minimum: 3
            })
        );
        ws.set_target_amount(&h.rules, 0, 3).unwrap();
        assert_eq!(ws.order(0).unwrap().target_amount(), 3);
    }

    #[test]
    fn cancel_refunds_and_frees_engineers() {
        let mut h = Harness::new(1_000);
        h.base.items.add(alloys(), 1);
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 3)
            .unwrap();
        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 3).unwrap();

        let order = ws.cancel_order(&mut h.base, &mut h.economy, &h.rules, 0).unwrap();
        assert_eq!(order.recipe(), laser_rifle_recipe());
        assert_eq!(h.economy.funds(), 1_000);
        assert_eq!(h.base.items.quantity(alloys()), 1);
        assert_eq!(h.base.engineers, 10);
        assert_eq!(h.base.assigned_engineers, 0);
        assert!(ws.is_empty());
    }

    #[test]
    fn cancel_stalled_order_does_not_refund() {
        let mut h = Harness::new(100);
        h.base.items.add(alloys(), 5);
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 3)
            .unwrap();
        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 10).unwrap();
        let events = advance(&mut h, &mut ws, 1);
        assert!(events.iter().any(|e| e.kind() == EventKind::OrderStalled));
        assert_eq!(h.economy.funds(), 0);

        ws.cancel_order(&mut h.base, &mut h.economy, &h.rules, 0).unwrap();
        assert_eq!(h.economy.funds(), 0);
    }

    #[test]
    fn stalled_order_resumes_when_funded() {
        let mut h = Harness::new(100);
        h.base.items.add(alloys(), 5);
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 3)
            .unwrap();
        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 10).unwrap();

        let events = advance(&mut h, &mut ws, 1);
        let kinds: Vec<_> = events.iter().map(ProductionEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::UnitsCompleted, EventKind::OrderStalled]);
        assert_eq!(ws.queued()[0].stall, Some(StallReason::NotEnoughMoney));

        // Still broke: no labor accrues and no repeat event.
        assert!(advance(&mut h, &mut ws, 2).is_empty());
        assert_eq!(ws.order(0).unwrap().elapsed_labor(), 10);

        h.economy.add_funds(1_000);
        let events = advance(&mut h, &mut ws, 3);
        assert_eq!(events[0].kind(), EventKind::OrderResumed);
        assert_eq!(events[1].kind(), EventKind::UnitsCompleted);
        assert_eq!(h.base.items.quantity(laser_rifle()), 2);
    }

    #[test]
    fn order_blocked_mid_batch_delivers_backlog_on_resume() {
        let mut h = Harness::new(100);
        h.base.items.add(alloys(), 5);
        h.base.engineers = 30;
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, laser_rifle_recipe(), 3)
            .unwrap();
        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 30).unwrap();

        let events = advance(&mut h, &mut ws, 1);
        let kinds: Vec<_> = events.iter().map(ProductionEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::UnitsCompleted, EventKind::OrderStalled]);
        assert_eq!(ws.queued()[0].backlog, 2);
        assert_eq!(h.economy.funds(), 0);

        // Only one more unit affordable: it is delivered, the last one waits.
        h.economy.add_funds(100);
        let events = advance(&mut h, &mut ws, 2);
        assert!(matches!(
            events[..],
            [ProductionEvent::UnitsCompleted { units: 1, .. }]
        ));
        assert_eq!(ws.queued()[0].backlog, 1);
        assert_eq!(ws.queued()[0].stall, Some(StallReason::NotEnoughMoney));

        h.economy.add_funds(1_000);
        let events = advance(&mut h, &mut ws, 3);
        let kinds: Vec<_> = events.iter().map(ProductionEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::UnitsCompleted, EventKind::OrderCompleted]);
        assert!(ws.is_empty());
        assert_eq!(h.base.items.quantity(laser_rifle()), 3);
        assert_eq!(h.base.items.quantity(alloys()), 2);
        assert_eq!(h.economy.funds(), 1_000 - 100);
        assert_eq!(h.base.engineers, 30);
    }

    #[test]
    fn completed_orders_are_removed() {
        let mut h = Harness::new(10_000);
        let mut ws = Workshop::new();
        ws.start_order(&mut h.base, &mut h.economy, &h.rules, elerium_recipe(), 2)
            .unwrap();
        ws.set_assigned_workers(&mut h.base, &h.rules, 0, 5).unwrap();

        advance(&mut h, &mut ws, 1);
        let events = advance(&mut h, &mut ws, 2);
        assert_eq!(events.last().unwrap().kind(), EventKind::OrderCompleted);
        assert!(ws.is_empty());
        assert_eq!(h.base.items.quantity(elerium()), 2);
        assert_eq!(h.base.engineers, 10);
        assert_eq!(h.economy.funds(), 10_000 - 100);
    }

    #[test]
    fn unknown_recipe_is_dropped() {
        let mut h = Harness::new(0);
        let mut ws = Workshop::new();
        let mut order = ProductionOrder::new(ManufactureId(77), 1);
        order.set_assigned_workers(2);
        h.base.engineers = 8;
        h.base.assigned_engineers = 2;
        ws.push(order);

        let events = advance(&mut h, &mut ws, 5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::OrderDropped);
        assert!(ws.is_empty());
        assert_eq!(h.base.engineers, 10);
    }
}
