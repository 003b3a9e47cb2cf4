//! Flat-file pool store.
//!
//! Queues and ledger live in two independent JSON documents. A missing or
//! unparseable file loads as fresh state. Writes go to a temp file that is
//! synced and renamed over the target.

use crate::domain::{LevelQueues, RetentionLedger};
use crate::error::{RotationError, RotationResult};
use crate::ports::PoolStore;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// JSON-file backed `PoolStore`.
#[derive(Debug, Clone)]
pub struct JsonFilePoolStore {
    queues_path: PathBuf,
    ledger_path: PathBuf,
}

impl JsonFilePoolStore {
    pub const QUEUES_FILE: &'static str = "queues.json";
    pub const LEDGER_FILE: &'static str = "ledger.json";

    pub fn new(queues_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            queues_path: queues_path.into(),
            ledger_path: ledger_path.into(),
        }
    }

    /// Store using the standard file names inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(
            data_dir.join(Self::QUEUES_FILE),
            data_dir.join(Self::LEDGER_FILE),
        )
    }

    pub fn queues_path(&self) -> &Path {
        &self.queues_path
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }
}

/// Reads `path` as JSON, falling back to `T::default()` when the file is
/// absent or cannot be read or parsed.
pub(crate) async fn read_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(
                "[rotation] 📁 No existing file at {}, starting empty",
                path.display()
            );
            return T::default();
        }
        Err(e) => {
            warn!(
                "[rotation] ⚠️ Could not read {}: {}, starting empty",
                path.display(),
                e
            );
            return T::default();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => {
            debug!(
                "[rotation] 💾 Loaded {} ({} bytes)",
                path.display(),
                bytes.len()
            );
            value
        }
        Err(e) => {
            warn!(
                "[rotation] ⚠️ Unreadable JSON in {}: {}, starting empty",
                path.display(),
                e
            );
            T::default()
        }
    }
}

/// Pretty-prints `value` to `path` atomically via a temp file.
pub(crate) async fn write_json_atomic<T>(
    path: &Path,
    value: &T,
    operation: &'static str,
) -> RotationResult<()>
where
    T: Serialize + ?Sized,
{
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| RotationError::store_io(operation, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RotationError::store_io(operation, e))?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .map_err(|e| RotationError::store_io(operation, e))?;
    file.write_all(&bytes)
        .await
        .map_err(|e| RotationError::store_io(operation, e))?;
    file.sync_all()
        .await
        .map_err(|e| RotationError::store_io(operation, e))?;
    drop(file);

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| RotationError::store_io(operation, e))
}

#[async_trait]
impl PoolStore for JsonFilePoolStore {
    async fn load_queues(&self) -> RotationResult<LevelQueues> {
        let queues: LevelQueues = read_json_or_default(&self.queues_path).await;
        Ok(queues.normalize())
    }

    async fn save_queues(&self, queues: &LevelQueues) -> RotationResult<()> {
        write_json_atomic(&self.queues_path, queues, "save_queues").await
    }

    async fn load_ledger(&self) -> RotationResult<RetentionLedger> {
        Ok(read_json_or_default(&self.ledger_path).await)
    }

    async fn save_ledger(&self, ledger: &RetentionLedger) -> RotationResult<()> {
        write_json_atomic(&self.ledger_path, ledger, "save_ledger").await
    }
}
