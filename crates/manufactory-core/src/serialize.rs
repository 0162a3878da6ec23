//! Save-game support for production state.
//!
//! Two encodings are provided:
//!
//! - **Records** ([`ProductionRecord`]): the human-readable per-order format
//!   stored in save files, encoded as JSON. Orders reference their recipe by
//!   name, so records survive ruleset reordering.
//! - **Snapshots**: binary `bitcode` images of a whole [`Game`] or a single
//!   [`Workshop`], prefixed by a header with a magic number and format
//!   version. Snapshots reference recipes by id and are only valid against
//!   the ruleset they were taken with.

use crate::config::EconomyConfig;
use crate::game::Game;
use crate::production::ProductionOrder;
use crate::registry::{ManufactureRule, Ruleset};
use crate::workshop::Workshop;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a production snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x4D46_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

/// Amount written by old saves for orders that sold their output forever.
pub const LEGACY_UNBOUNDED_SENTINEL: u32 = i32::MAX as u32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("data too short for snapshot header")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("json decoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown manufacture rule: {0}")]
    UnknownRecipe(String),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Persisted form of one [`ProductionOrder`].
///
/// Every field except `item` may be absent; absent fields leave the order's
/// current value untouched. JSON only: the optional keys rely on
/// `skip_serializing_if`, which non-self-describing formats cannot decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Recipe name.
    #[serde(default)]
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infinite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell: Option<bool>,
    #[serde(
        rename = "randomProductionInfo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub random_production_info: Option<BTreeMap<String, u32>>,
}

impl ProductionOrder {
    /// Capture this order as a record. `sell` is written only when set and
    /// the random tally only when the recipe has random outputs.
    pub fn save(&self, rule: &ManufactureRule) -> ProductionRecord {
        ProductionRecord {
            item: rule.name.clone(),
            assigned: Some(self.assigned_workers()),
            spent: Some(self.elapsed_labor()),
            amount: Some(self.target_amount()),
            infinite: Some(self.unbounded()),
            sell: self.liquidate_output().then_some(true),
            random_production_info: rule
                .has_random_outputs()
                .then(|| self.random_output_tally().clone()),
        }
    }

    /// Apply a record on top of this order.
    ///
    /// An amount equal to the old "sell forever" sentinel is rewritten to
    /// the configured bounded target with unbounded selling switched on.
    pub fn load(&mut self, record: &ProductionRecord, rule: &ManufactureRule, config: &EconomyConfig) {
        if let Some(assigned) = record.assigned {
            self.set_assigned_workers(assigned);
        }
        if let Some(spent) = record.spent {
            self.set_elapsed_labor(spent);
        }
        if let Some(amount) = record.amount {
            self.set_target_amount(amount);
        }
        if let Some(infinite) = record.infinite {
            self.set_unbounded(infinite);
        }
        if let Some(sell) = record.sell {
            self.set_liquidate_output(sell);
        }
        if rule.has_random_outputs()
            && let Some(tally) = &record.random_production_info
        {
            self.set_random_output_tally(tally.clone());
        }

        if self.target_amount() == LEGACY_UNBOUNDED_SENTINEL {
            log::info!(
                "{}: migrating legacy sell-forever order to target {}",
                rule.name,
                config.legacy_unbounded_amount
            );
            self.set_target_amount(config.legacy_unbounded_amount);
            self.set_unbounded(true);
            self.set_liquidate_output(true);
        }
    }

    /// Build a fresh order from a record, resolving the recipe by name.
    pub fn from_record(
        record: &ProductionRecord,
        rules: &Ruleset,
        config: &EconomyConfig,
    ) -> Result<Self, DeserializeError> {
        let (id, rule) = rules
            .manufacture_id(&record.item)
            .and_then(|id| rules.get_manufacture(id).map(|r| (id, r)))
            .ok_or_else(|| DeserializeError::UnknownRecipe(record.item.clone()))?;
        let mut order = ProductionOrder::new(id, 0);
        order.load(record, rule, config);
        Ok(order)
    }
}

/// Records for every order in queue order. Orders whose recipe has left the
/// ruleset are skipped.
pub fn save_workshop(workshop: &Workshop, rules: &Ruleset) -> Vec<ProductionRecord> {
    workshop
        .orders()
        .filter_map(|order| rules.get_manufacture(order.recipe()).map(|r| order.save(r)))
        .collect()
}

/// Rebuild a queue from records. Unknown recipes are skipped with a warning.
pub fn load_workshop(records: &[ProductionRecord], rules: &Ruleset, config: &EconomyConfig) -> Workshop {
    let mut workshop = Workshop::new();
    for record in records {
        match ProductionOrder::from_record(record, rules, config) {
            Ok(order) => workshop.push(order),
            Err(e) => log::warn!("skipping saved order: {e}"),
        }
    }
    workshop
}

pub fn records_to_json(records: &[ProductionRecord]) -> Result<String, SerializeError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn records_from_json(json: &str) -> Result<Vec<ProductionRecord>, DeserializeError> {
    Ok(serde_json::from_str(json)?)
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot. Enables format detection and version
/// checking before the payload is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Production hour at the time the snapshot was taken.
    pub hour: u64,
}

impl SnapshotHeader {
    pub fn new(hour: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            hour,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GameSnapshot {
    header: SnapshotHeader,
    game: Game,
}

#[derive(Debug, Serialize, Deserialize)]
struct WorkshopSnapshot {
    header: SnapshotHeader,
    workshop: Workshop,
}

fn decode<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, DeserializeError> {
    if data.is_empty() {
        return Err(DeserializeError::TooShort);
    }
    bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
}

impl Game {
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = GameSnapshot {
            header: SnapshotHeader::new(self.hour()),
            game: self.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: GameSnapshot = decode(data)?;
        snapshot.header.validate()?;
        Ok(snapshot.game)
    }
}

impl Workshop {
    pub fn serialize(&self, hour: u64) -> Result<Vec<u8>, SerializeError> {
        let snapshot = WorkshopSnapshot {
            header: SnapshotHeader::new(hour),
            workshop: self.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: WorkshopSnapshot = decode(data)?;
        snapshot.header.validate()?;
        Ok(snapshot.workshop)
    }
}

/// Read only the header of a game snapshot.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: GameSnapshot = decode(data)?;
    Ok(snapshot.header)
}
