//! Environment-driven runtime configuration.
//!
//! Every field has a default under the system temp directory so the core can
//! run without any setup.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "ROADMATE_DATA_DIR";
pub const LOG_DIR_ENV: &str = "ROADMATE_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "ROADMATE_LOG_LEVEL";

const DEFAULT_DIR_NAME: &str = "roadmate";
const CACHE_DB_FILE_NAME: &str = "roadmate_cache.sqlite3";

/// Resolved paths and log level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let base = std::env::temp_dir().join(DEFAULT_DIR_NAME);
        Self {
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `ROADMATE_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from any key lookup; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let defaults = Self::default();
        Self {
            data_dir: value(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_dir: value(LOG_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: value(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
        }
    }

    /// SQLite file holding session snapshots.
    pub fn cache_db_path(&self) -> PathBuf {
        self.data_dir.join(CACHE_DB_FILE_NAME)
    }
}
