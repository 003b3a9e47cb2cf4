//! # Pool Runtime
//!
//! Wires the file-backed adapters to the engine and owns the scheduler task.
//!
//! ## Startup Sequence
//!
//! 1. Lock the data directory (one writer process)
//! 2. Open the participant registry and payout schedule
//! 3. Build the advancement engine over the JSON pool store
//! 4. Start the scheduler (first tick fires immediately)
//!
//! Shutdown stops the scheduler after any in-flight tick and then releases
//! the directory lock.

use crate::config::PoolConfig;
use rotation_core::{
    AdvancementEngine, DataDirLock, JsonFilePoolStore, JsonFileRegistry, PayoutTable,
    RotationScheduler, RotationService, SchedulerHandle, SystemTimeSource, TracingAlertSink,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Engine over the flat-file adapters.
pub type FileEngine = AdvancementEngine<JsonFileRegistry, PayoutTable, JsonFilePoolStore>;

/// API service over the flat-file adapters.
pub type FileService = RotationService<JsonFileRegistry, PayoutTable, JsonFilePoolStore>;

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Lock(#[from] rotation_core::LockError),

    #[error("Scheduler already running")]
    AlreadyStarted,
}

/// The running pool: engine, API service and scheduler.
pub struct PoolRuntime {
    config: PoolConfig,
    engine: Arc<FileEngine>,
    service: FileService,
    scheduler: RotationScheduler<JsonFileRegistry, PayoutTable, JsonFilePoolStore>,
    handle: Option<SchedulerHandle>,
    _lock: DataDirLock,
}

impl PoolRuntime {
    /// Locks the data directory and builds every component.
    pub async fn new(config: PoolConfig) -> Result<Self, RuntimeError> {
        let storage = &config.storage;
        info!(
            "[rotation] Opening data directory {}",
            storage.data_dir.display()
        );

        let lock = DataDirLock::acquire(&storage.data_dir)?;

        let registry = JsonFileRegistry::open(storage.participants_path()).await;
        let schedule = PayoutTable::load(&storage.payouts_path()).await;
        if schedule.is_empty() {
            warn!(
                "[rotation] ⚠️ No payouts configured in {}, nothing is queueable",
                storage.payouts_path().display()
            );
        }

        let engine = Arc::new(AdvancementEngine::new(
            config.rotation.clone(),
            Arc::new(JsonFilePoolStore::new(
                storage.queues_path(),
                storage.ledger_path(),
            )),
            Arc::new(registry),
            Arc::new(schedule),
            Arc::new(TracingAlertSink),
            Arc::new(SystemTimeSource),
        ));
        let service = RotationService::new(Arc::clone(&engine));
        let scheduler = RotationScheduler::new(Arc::clone(&engine), config.scheduler.clone());

        Ok(Self {
            config,
            engine,
            service,
            scheduler,
            handle: None,
            _lock: lock,
        })
    }

    /// Starts the periodic scheduler.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if self.handle.is_some() {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.handle = Some(self.scheduler.start());
        info!(
            "[rotation] 🚀 Pool running (retention {}, orphan policy {:?})",
            self.config.rotation.retention_rate, self.config.rotation.orphan_policy
        );
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<FileEngine> {
        &self.engine
    }

    /// API surface for the (external) request layer.
    pub fn service(&self) -> &FileService {
        &self.service
    }

    pub fn scheduler(&self) -> &RotationScheduler<JsonFileRegistry, PayoutTable, JsonFilePoolStore> {
        &self.scheduler
    }

    /// Stops the scheduler, letting an in-flight tick finish.
    pub async fn shutdown(mut self) {
        info!("[rotation] Initiating graceful shutdown...");
        if let Some(handle) = self.handle.take() {
            handle.shutdown().await;
        }
        info!("[rotation] Shutdown complete");
    }
}
