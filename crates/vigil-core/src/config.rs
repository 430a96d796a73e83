//! Store configuration, loadable from a TOML document.

use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::{StoreError, StoreResult};

/// Settings for opening a store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file path; `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    /// Prefix prepended to every table name.
    pub table_prefix: String,
    /// Character set emitted on CREATE TABLE (server deployments).
    pub charset: Option<String>,
    /// Reader connections in the embedded driver's pool.
    pub read_pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            table_prefix: "vigil_".to_string(),
            charset: None,
            read_pool_size: 2,
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document; absent keys fall back to defaults.
    pub fn from_toml(text: &str) -> StoreResult<Self> {
        toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))
    }
}
