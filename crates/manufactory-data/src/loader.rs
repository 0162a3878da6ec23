//! Resolution pipeline: reads data files, resolves cross-references, builds the ruleset.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and deserialization
//! helpers, plus [`load_game_data`], which turns a data directory into a
//! frozen [`Ruleset`], a string table and the economy config.
//!
//! # Data directory layout
//!
//! | base name       | required | contents                          |
//! |-----------------|----------|-----------------------------------|
//! | `items`         | yes      | list of [`ItemData`]              |
//! | `craft_weapons` | no       | list of [`CraftWeaponData`]       |
//! | `crafts`        | no       | list of [`CraftData`]             |
//! | `soldiers`      | no       | list of [`SoldierData`]           |
//! | `manufacture`   | yes      | list of [`ManufactureData`]       |
//! | `strings`       | no       | map of text key to display string |
//! | `config`        | no       | [`EconomyConfig`]                 |
//!
//! Each may be `.ron`, `.json` or `.toml`. TOML lists live under a
//! top-level key equal to the base name.

use crate::schema::*;
use manufactory_core::config::EconomyConfig;
use manufactory_core::fixed::f64_to_fixed64;
use manufactory_core::id::{CraftTypeId, CraftWeaponId, ItemTypeId};
use manufactory_core::registry::{
    CraftAmount, CraftRule, CraftWeaponRule, ItemAmount, ManufactureRule, NamePool, RandomOutput,
    Region, RegistryError, Ruleset, RulesetBuilder, SoldierRule, SpawnedPerson,
};
use manufactory_core::text::StringTable;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved rules failed validation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn resolve_items(
    ids: &HashMap<String, ItemTypeId>,
    entries: &[(String, u32)],
    file: &Path,
) -> Result<Vec<ItemAmount>, DataLoadError> {
    entries
        .iter()
        .map(|(name, qty)| -> Result<ItemAmount, DataLoadError> {
            Ok(ItemAmount::new(*resolve_name(ids, name, file, "item")?, *qty))
        })
        .collect()
}

fn resolve_optional<V: Copy>(
    map: &HashMap<String, V>,
    name: Option<&str>,
    file: &Path,
    expected_kind: &'static str,
) -> Result<Option<V>, DataLoadError> {
    name.map(|n| resolve_name(map, n, file, expected_kind).copied())
        .transpose()
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything read from a data directory.
#[derive(Debug)]
pub struct GameData {
    pub rules: Ruleset,
    pub strings: StringTable,
    pub config: EconomyConfig,
}

/// Load, resolve and validate every data file in `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let mut builder = RulesetBuilder::new();

    // -- Items --
    let path = require_data_file(dir, "items")?;
    let mut item_ids: HashMap<String, ItemTypeId> = HashMap::new();
    for item in deserialize_list::<ItemData>(&path, "items")? {
        check_duplicate(&item_ids, &item.name, &path)?;
        let id = builder.register_item(&item.name, item.sell_cost, item.battle_type);
        item_ids.insert(item.name, id);
    }

    // -- Craft weapons --
    let mut weapon_ids: HashMap<String, CraftWeaponId> = HashMap::new();
    if let Some(path) = find_data_file(dir, "craft_weapons")? {
        for weapon in deserialize_list::<CraftWeaponData>(&path, "craft_weapons")? {
            check_duplicate(&weapon_ids, &weapon.name, &path)?;
            let ammo_item = resolve_optional(&item_ids, weapon.ammo_item.as_deref(), &path, "item")?;
            let id = builder.register_craft_weapon(CraftWeaponRule {
                name: weapon.name.clone(),
                ammo_item,
                ammo_max: weapon.ammo_max,
            });
            weapon_ids.insert(weapon.name, id);
        }
    }

    // -- Craft --
    let mut craft_ids: HashMap<String, CraftTypeId> = HashMap::new();
    if let Some(path) = find_data_file(dir, "crafts")? {
        for craft in deserialize_list::<CraftData>(&path, "crafts")? {
            check_duplicate(&craft_ids, &craft.name, &path)?;
            let refuel_item =
                resolve_optional(&item_ids, craft.refuel_item.as_deref(), &path, "item")?;
            let fixed_weapons = craft
                .weapons
                .iter()
                .map(|w| resolve_name(&weapon_ids, w, &path, "craft weapon").copied())
                .collect::<Result<Vec<_>, _>>()?;
            let id = builder.register_craft(CraftRule {
                name: craft.name.clone(),
                max_fuel: craft.max_fuel,
                refuel_item,
                max_damage: craft.max_damage,
                fixed_weapons,
            });
            craft_ids.insert(craft.name, id);
        }
    }

    // -- Soldiers --
    if let Some(path) = find_data_file(dir, "soldiers")? {
        let mut seen: HashMap<String, ()> = HashMap::new();
        for soldier in deserialize_list::<SoldierData>(&path, "soldiers")? {
            check_duplicate(&seen, &soldier.name, &path)?;
            seen.insert(soldier.name.clone(), ());
            let nationalities = soldier
                .nationalities
                .into_iter()
                .map(|n| NamePool {
                    nationality: n.name,
                    first_names: n.first_names,
                    last_names: n.last_names,
                    weight: n.weight,
                    region: n.region.map(|r| Region {
                        min_lon: f64_to_fixed64(r.min_lon),
                        max_lon: f64_to_fixed64(r.max_lon),
                        min_lat: f64_to_fixed64(r.min_lat),
                        max_lat: f64_to_fixed64(r.max_lat),
                    }),
                })
                .collect();
            builder.register_soldier(SoldierRule {
                name: soldier.name,
                min_stats: soldier.min_stats,
                max_stats: soldier.max_stats,
                nationalities,
            });
        }
    }

    // -- Manufacture --
    let path = require_data_file(dir, "manufacture")?;
    let mut recipe_names: HashMap<String, ()> = HashMap::new();
    for data in deserialize_list::<ManufactureData>(&path, "manufacture")? {
        check_duplicate(&recipe_names, &data.name, &path)?;
        recipe_names.insert(data.name.clone(), ());

        let mut rule = ManufactureRule::new(&data.name, data.cost, data.time);
        rule.category = data.category;
        rule.required_space = data.space;
        rule.required_items = resolve_items(&item_ids, &data.required_items, &path)?;
        rule.required_craft = data
            .required_craft
            .iter()
            .map(|(name, quantity)| -> Result<CraftAmount, DataLoadError> {
                Ok(CraftAmount {
                    craft: *resolve_name(&craft_ids, name, &path, "craft")?,
                    quantity: *quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rule.produced_craft =
            resolve_optional(&craft_ids, data.produced_craft.as_deref(), &path, "craft")?;
        rule.produced_items = resolve_items(&item_ids, &data.produced_items, &path)?;
        rule.random_outputs = data
            .random_outputs
            .iter()
            .map(|o| -> Result<RandomOutput, DataLoadError> {
                Ok(RandomOutput {
                    weight: o.weight,
                    items: resolve_items(&item_ids, &o.items, &path)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Person types are matched at production time; unknown ones spawn nothing.
        rule.spawned_person = data.spawned_person.map(|p| SpawnedPerson {
            person_type: p.person_type,
            template: p.template,
            custom_name: p.custom_name,
        });
        rule.score = data.score;
        builder.register_manufacture(rule);
    }

    let rules = builder.build()?;

    // -- Strings --
    let strings = match find_data_file(dir, "strings")? {
        Some(path) => deserialize_file::<HashMap<String, String>>(&path)?
            .into_iter()
            .collect(),
        None => StringTable::new(),
    };

    // -- Config --
    let config = match find_data_file(dir, "config")? {
        Some(path) => deserialize_file::<EconomyConfig>(&path)?,
        None => EconomyConfig::default(),
    };

    log::info!(
        "loaded {} items, {} craft, {} manufacture rules and {} strings from {}",
        rules.item_count(),
        rules.craft_count(),
        rules.manufacture_count(),
        strings.len(),
        dir.display()
    );

    Ok(GameData {
        rules,
        strings,
        config,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
