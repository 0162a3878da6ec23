//! Data-file loading for Manufactory.
//!
//! Reads the rule catalog, string table and economy config from a directory
//! of RON, JSON or TOML files and resolves name references into the core
//! crate's typed ids. See [`loader`] for the expected directory layout.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, GameData, load_game_data};
