//! # Pool Configuration
//!
//! Runtime configuration: where the flat files live plus the engine and
//! scheduler settings.
//!
//! ## Environment Overrides
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `RP_DATA_DIR` | `storage.data_dir` | path |
//! | `RP_TICK_INTERVAL_SECS` | `scheduler.tick_interval` | seconds, > 0 |
//! | `RP_IO_TIMEOUT_SECS` | `rotation.io_timeout` | seconds, > 0 |
//! | `RP_ORPHAN_POLICY` | `rotation.orphan_policy` | `drop` \| `requeue` \| `alert` |
//! | `RP_RETENTION_RATE` | `rotation.retention_rate` | decimal in [0, 1] |
//!
//! Malformed values are rejected rather than ignored.

use rotation_core::{
    ConfigValidationError, JsonFilePoolStore, JsonFileRegistry, OrphanPolicy,
    PayoutTable, RotationConfig, SchedulerConfig,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "RP_DATA_DIR";
pub const ENV_TICK_INTERVAL_SECS: &str = "RP_TICK_INTERVAL_SECS";
pub const ENV_IO_TIMEOUT_SECS: &str = "RP_IO_TIMEOUT_SECS";
pub const ENV_ORPHAN_POLICY: &str = "RP_ORPHAN_POLICY";
pub const ENV_RETENTION_RATE: &str = "RP_RETENTION_RATE";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var}={value:?} is not valid: {reason}")]
    Malformed {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// Parsed values are out of range.
    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    /// Flat-file storage.
    pub storage: StorageConfig,
    /// Advancement engine.
    pub rotation: RotationConfig,
    /// Periodic task.
    pub scheduler: SchedulerConfig,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding queues, ledger, participants and payouts.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl StorageConfig {
    pub fn queues_path(&self) -> PathBuf {
        self.data_dir.join(JsonFilePoolStore::QUEUES_FILE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(JsonFilePoolStore::LEDGER_FILE)
    }

    pub fn participants_path(&self) -> PathBuf {
        self.data_dir.join(JsonFileRegistry::FILE)
    }

    pub fn payouts_path(&self) -> PathBuf {
        self.data_dir.join(PayoutTable::FILE)
    }
}

impl PoolConfig {
    /// Defaults overridden from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by `lookup`, validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_TICK_INTERVAL_SECS) {
            config.scheduler.tick_interval = parse_secs(ENV_TICK_INTERVAL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_IO_TIMEOUT_SECS) {
            config.rotation.io_timeout = parse_secs(ENV_IO_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ORPHAN_POLICY) {
            config.rotation.orphan_policy = OrphanPolicy::from_str(&raw)
                .map_err(|reason| malformed(ENV_ORPHAN_POLICY, &raw, reason))?;
        }
        if let Some(raw) = lookup(ENV_RETENTION_RATE) {
            config.rotation.retention_rate = Decimal::from_str(raw.trim())
                .map_err(|e| malformed(ENV_RETENTION_RATE, &raw, e))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rotation.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| malformed(var, raw, e))
}

fn malformed(var: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Malformed {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
