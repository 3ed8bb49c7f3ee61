//! Configuration for the SQLite store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the database lives and whether to create it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    /// Path to the database file. Omit for a private in-memory database
    /// (useful for tests and experiments; nothing survives the process).
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Create the database file if it does not exist.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_create_if_missing() -> bool {
    true
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            create_if_missing: default_create_if_missing(),
        }
    }
}
