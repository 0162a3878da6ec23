//! Manufactory Core -- base manufacturing for a strategy-layer simulation.
//!
//! A base runs manufacturing jobs ([`production::ProductionOrder`]) that
//! turn labor, money and materials into items, craft or people. Every hour
//! the scheduler ([`workshop::Workshop`]) adds each order's assigned labor,
//! delivers the units that finished, and pays for the next unit.
//!
//! # Unit Lifecycle
//!
//! 1. **Start** -- the unit's cost is debited and its materials consumed
//!    (`start_item`). Starting the first unit is part of queueing the order.
//! 2. **Work** -- assigned engineers add labor every hour.
//! 3. **Realize** -- when labor crosses a unit boundary the unit's outputs
//!    are delivered: a craft, items (or their sale value), a random bonus,
//!    a person in transit, and a score change.
//! 4. **Next** -- the next unit is started, or the order stalls for lack of
//!    money, quarters or materials, or completes.
//!
//! # Key Types
//!
//! - [`game::Game`] -- Owner of the economy, bases and workshops.
//! - [`production::ProductionOrder`] -- One job and its advancement algorithm.
//! - [`workshop::Workshop`] -- Per-base queue, engineer and space accounting.
//! - [`registry::Ruleset`] -- Immutable catalog of items, craft, soldiers and
//!   manufacture rules (frozen at startup).
//! - [`economy::Economy`] -- Funds, research score and serial counters.
//! - [`serialize`] -- JSON records and versioned bitcode snapshots.

pub mod base;
pub mod config;
pub mod craft;
pub mod economy;
pub mod event;
pub mod fixed;
pub mod game;
pub mod id;
pub mod item;
pub mod personnel;
pub mod production;
pub mod registry;
pub mod rng;
pub mod serialize;
pub mod text;
pub mod workshop;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
