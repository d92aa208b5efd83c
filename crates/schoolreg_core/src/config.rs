//! Registry configuration.
//!
//! # Responsibility
//! - Describe where records are stored and how long writers wait on locks.
//! - Build that description from `SCHOOLREG_*` environment variables.
//!
//! # Invariants
//! - An unset `SCHOOLREG_DB_PATH` selects in-memory storage.
//! - Malformed values are rejected, never silently replaced by defaults.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

/// Database file path. Unset or empty means in-memory.
pub const ENV_DB_PATH: &str = "SCHOOLREG_DB_PATH";
/// SQLite busy timeout in milliseconds.
pub const ENV_BUSY_TIMEOUT_MS: &str = "SCHOOLREG_BUSY_TIMEOUT_MS";

pub(crate) const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage location for the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// Process-local database, discarded on drop.
    InMemory,
    /// SQLite database file.
    File(PathBuf),
}

/// Settings used to open a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub storage: StorageTarget,
    /// How long a writer waits on a locked database file.
    pub busy_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            storage: StorageTarget::InMemory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}` value `{}`: {}", self.key, self.value, self.reason)
    }
}

impl Error for ConfigError {}

impl RegistryConfig {
    /// Configuration for a file-backed registry.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageTarget::File(path.into()),
            ..Self::default()
        }
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                config.storage = StorageTarget::File(PathBuf::from(trimmed));
            }
        }

        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|_| ConfigError {
                key: ENV_BUSY_TIMEOUT_MS,
                value: raw.clone(),
                reason: "expected a whole number of milliseconds",
            })?;
            config.busy_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}
