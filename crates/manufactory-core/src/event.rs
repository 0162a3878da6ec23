//! Production events reported by the hourly workshop pass.
//!
//! Events are collected into a plain `Vec` per pass and handed back to the
//! caller, who decides what to show the player.

use crate::id::{BaseId, ManufactureId};
use crate::production::StallReason;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A production event. All events carry the hour at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionEvent {
    /// One or more units were finished and their outputs delivered.
    UnitsCompleted {
        base: BaseId,
        recipe: ManufactureId,
        units: u32,
        hour: u64,
    },
    /// The order reached its target and was removed.
    OrderCompleted {
        base: BaseId,
        recipe: ManufactureId,
        hour: u64,
    },
    /// The order could not start its next unit.
    OrderStalled {
        base: BaseId,
        recipe: ManufactureId,
        reason: StallReason,
        hour: u64,
    },
    /// A stalled order started its next unit again.
    OrderResumed {
        base: BaseId,
        recipe: ManufactureId,
        hour: u64,
    },
    /// The order referenced a recipe missing from the ruleset and was dropped.
    OrderDropped {
        base: BaseId,
        recipe: ManufactureId,
        hour: u64,
    },
}

/// Discriminant-only mirror of [`ProductionEvent`], for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UnitsCompleted,
    OrderCompleted,
    OrderStalled,
    OrderResumed,
    OrderDropped,
}

impl ProductionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProductionEvent::UnitsCompleted { .. } => EventKind::UnitsCompleted,
            ProductionEvent::OrderCompleted { .. } => EventKind::OrderCompleted,
            ProductionEvent::OrderStalled { .. } => EventKind::OrderStalled,
            ProductionEvent::OrderResumed { .. } => EventKind::OrderResumed,
            ProductionEvent::OrderDropped { .. } => EventKind::OrderDropped,
        }
    }

    pub fn base(&self) -> BaseId {
        match self {
            ProductionEvent::UnitsCompleted { base, .. }
            | ProductionEvent::OrderCompleted { base, .. }
            | ProductionEvent::OrderStalled { base, .. }
            | ProductionEvent::OrderResumed { base, .. }
            | ProductionEvent::OrderDropped { base, .. } => *base,
        }
    }

    pub fn hour(&self) -> u64 {
        match self {
            ProductionEvent::UnitsCompleted { hour, .. }
            | ProductionEvent::OrderCompleted { hour, .. }
            | ProductionEvent::OrderStalled { hour, .. }
            | ProductionEvent::OrderResumed { hour, .. }
            | ProductionEvent::OrderDropped { hour, .. } => *hour,
        }
    }
}
