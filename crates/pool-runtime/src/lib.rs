//! # Rotation Pool Runtime
//!
//! Hosts the rotation engine over a flat-file data directory.
//!
//! - `config` - `PoolConfig` with environment overrides
//! - `runtime` - `PoolRuntime`: directory lock, adapter wiring, scheduler lifecycle

pub mod config;
pub mod runtime;

pub use config::{ConfigError, PoolConfig, StorageConfig};
pub use runtime::{FileEngine, FileService, PoolRuntime, RuntimeError};
