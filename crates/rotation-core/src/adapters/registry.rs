//! Participant registry adapters.
//!
//! The registry belongs to the excluded registration layer. These adapters
//! give the runtime and the tests something concrete to talk to.

use super::json_store::write_json_atomic;
use crate::domain::{Handle, Level, Participant};
use crate::error::{RotationError, RotationResult};
use crate::ports::ParticipantRegistry;
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

// =============================================================================
// IN-MEMORY REGISTRY
// =============================================================================

/// Volatile registry.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    participants: RwLock<HashMap<Handle, Participant>>,
    fail_level_writes: AtomicBool,
    fail_date_writes: AtomicBool,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participant(self, participant: Participant) -> Self {
        self.insert(participant);
        self
    }

    pub fn insert(&self, participant: Participant) {
        self.participants
            .write()
            .insert(participant.handle.clone(), participant);
    }

    pub fn remove(&self, handle: &Handle) -> Option<Participant> {
        self.participants.write().remove(handle)
    }

    pub fn get(&self, handle: &Handle) -> Option<Participant> {
        self.participants.read().get(handle).cloned()
    }

    /// Makes both `set_level` and `set_last_advanced` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_level_writes.store(fail, Ordering::SeqCst);
        self.fail_date_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes only `set_last_advanced` fail.
    pub fn fail_date_writes(&self, fail: bool) {
        self.fail_date_writes.store(fail, Ordering::SeqCst);
    }

    fn update(
        &self,
        handle: &Handle,
        fail: &AtomicBool,
        f: impl FnOnce(&mut Participant),
    ) -> RotationResult<()> {
        if fail.load(Ordering::SeqCst) {
            return Err(RotationError::Registry {
                reason: "injected write failure".into(),
            });
        }
        let mut participants = self.participants.write();
        let participant =
            participants
                .get_mut(handle)
                .ok_or_else(|| RotationError::ParticipantNotFound {
                    handle: handle.clone(),
                })?;
        f(participant);
        Ok(())
    }
}

#[async_trait]
impl ParticipantRegistry for InMemoryRegistry {
    async fn get_by_handle(&self, handle: &Handle) -> RotationResult<Option<Participant>> {
        Ok(self.get(handle))
    }

    async fn set_level(&self, handle: &Handle, level: Level) -> RotationResult<()> {
        self.update(handle, &self.fail_level_writes, |p| p.level = level)
    }

    async fn set_last_advanced(&self, handle: &Handle, date: NaiveDate) -> RotationResult<()> {
        self.update(handle, &self.fail_date_writes, |p| {
            p.last_advanced = Some(date)
        })
    }
}

// =============================================================================
// JSON FILE REGISTRY
// =============================================================================

/// One record in `participants.json`.
///
/// Profile fields the core does not own are carried through untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RegistryRecord {
    handle: Handle,
    level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_advanced: Option<NaiveDate>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryRecord {
    fn participant(&self) -> Participant {
        Participant {
            handle: self.handle.clone(),
            level: self.level,
            last_advanced: self.last_advanced,
        }
    }
}

/// Registry backed by a JSON array of participant records.
///
/// The file is shared with the registration layer, so nothing is cached:
/// every lookup reads it and every update is a read-modify-write of the
/// current contents. A file that exists but cannot be parsed is an error,
/// never an empty registry.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileRegistry {
    pub const FILE: &'static str = "participants.json";

    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let registry = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        match registry.load_records().await {
            Ok(records) => info!(
                "[rotation] 👥 {} participants in {}",
                records.len(),
                registry.path.display()
            ),
            Err(e) => warn!("[rotation] ⚠️ Registry not readable yet: {}", e),
        }
        registry
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records currently in the file.
    pub async fn len(&self) -> RotationResult<usize> {
        Ok(self.load_records().await?.len())
    }

    async fn load_records(&self) -> RotationResult<Vec<RegistryRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(registry_error(&self.path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| registry_error(&self.path, e))
    }

    async fn update(
        &self,
        handle: &Handle,
        operation: &'static str,
        f: impl FnOnce(&mut RegistryRecord),
    ) -> RotationResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load_records().await?;
        let record = records
            .iter_mut()
            .find(|r| &r.handle == handle)
            .ok_or_else(|| RotationError::ParticipantNotFound {
                handle: handle.clone(),
            })?;
        f(record);

        write_json_atomic(&self.path, &records, operation)
            .await
            .map_err(|e| RotationError::Registry {
                reason: e.to_string(),
            })
    }
}

fn registry_error(path: &Path, err: impl std::fmt::Display) -> RotationError {
    RotationError::Registry {
        reason: format!("{}: {}", path.display(), err),
    }
}

#[async_trait]
impl ParticipantRegistry for JsonFileRegistry {
    async fn get_by_handle(&self, handle: &Handle) -> RotationResult<Option<Participant>> {
        Ok(self
            .load_records()
            .await?
            .iter()
            .find(|r| &r.handle == handle)
            .map(RegistryRecord::participant))
    }

    async fn set_level(&self, handle: &Handle, level: Level) -> RotationResult<()> {
        self.update(handle, "registry_set_level", |r| r.level = level)
            .await
    }

    async fn set_last_advanced(&self, handle: &Handle, date: NaiveDate) -> RotationResult<()> {
        self.update(handle, "registry_set_last_advanced", |r| {
            r.last_advanced = Some(date)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_registry_updates() {
        let registry = InMemoryRegistry::new().with_participant(Participant::new("bob").at_level(2));
        let bob = Handle::from("bob");
        let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

        registry.set_level(&bob, Level::new(3)).await.unwrap();
        registry.set_last_advanced(&bob, day).await.unwrap();

        let stored = registry.get_by_handle(&bob).await.unwrap().unwrap();
        assert_eq!(stored.level, Level::new(3));
        assert_eq!(stored.last_advanced, Some(day));
    }

    #[tokio::test]
    async fn test_in_memory_registry_unknown_handle() {
        let registry = InMemoryRegistry::new();
        let ghost = Handle::from("ghost");
        assert_eq!(registry.get_by_handle(&ghost).await.unwrap(), None);
        assert!(matches!(
            registry.set_level(&ghost, Level::new(3)).await,
            Err(RotationError::ParticipantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_json_registry_preserves_profile_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JsonFileRegistry::FILE);
        std::fs::write(
            &path,
            r#"[{"handle": "bob", "level": 2, "email": "bob@example.org", "sponsor": "admin"}]"#,
        )
        .unwrap();

        let registry = JsonFileRegistry::open(&path).await;
        assert_eq!(registry.len().await.unwrap(), 1);

        let bob = Handle::from("bob");
        let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        registry.set_level(&bob, Level::new(3)).await.unwrap();
        registry.set_last_advanced(&bob, day).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written[0]["level"], 3);
        assert_eq!(written[0]["last_advanced"], "2026-02-02");
        assert_eq!(written[0]["email"], "bob@example.org");
        assert_eq!(written[0]["sponsor"], "admin");

        let reopened = JsonFileRegistry::open(&path).await;
        let stored = reopened.get_by_handle(&bob).await.unwrap().unwrap();
        assert_eq!(stored.level, Level::new(3));
    }

    #[tokio::test]
    async fn test_json_registry_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = JsonFileRegistry::open(dir.path().join("absent.json")).await;
        assert_eq!(registry.len().await.unwrap(), 0);
        assert_eq!(registry.get_by_handle(&"bob".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_registry_sees_records_added_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JsonFileRegistry::FILE);
        std::fs::write(&path, r#"[{"handle": "bob", "level": 2}]"#).unwrap();
        let registry = JsonFileRegistry::open(&path).await;

        // Registration layer appends a participant
        std::fs::write(
            &path,
            r#"[{"handle": "bob", "level": 2}, {"handle": "carol", "level": 4, "email": "c@example.org"}]"#,
        )
        .unwrap();

        let carol = registry.get_by_handle(&"carol".into()).await.unwrap().unwrap();
        assert_eq!(carol.level, Level::new(4));

        registry.set_level(&"bob".into(), Level::new(3)).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 2);
        assert_eq!(written[0]["level"], 3);
        assert_eq!(written[1]["handle"], "carol");
        assert_eq!(written[1]["email"], "c@example.org");
    }

    #[tokio::test]
    async fn test_json_registry_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(JsonFileRegistry::FILE);
        std::fs::write(&path, b"[{\"handle\": \"bob\"").unwrap();
        let registry = JsonFileRegistry::open(&path).await;

        let lookup = registry.get_by_handle(&"bob".into()).await;
        assert!(matches!(lookup, Err(RotationError::Registry { .. })));
        assert!(lookup.unwrap_err().is_store_failure());

        assert!(registry.set_level(&"bob".into(), Level::new(3)).await.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"[{\"handle\": \"bob\"");
    }

    #[tokio::test]
    async fn test_in_memory_date_failure_leaves_level_write() {
        let registry = InMemoryRegistry::new().with_participant(Participant::new("d").at_level(2));
        let d = Handle::from("d");
        registry.fail_date_writes(true);

        registry.set_level(&d, Level::new(3)).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        assert!(registry.set_last_advanced(&d, day).await.is_err());
        assert_eq!(registry.get(&d).unwrap().level, Level::new(3));
    }
}
