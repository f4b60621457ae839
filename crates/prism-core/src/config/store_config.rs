//! Store location.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database holding responses and results. Required.
    pub database_path: Option<PathBuf>,
}
