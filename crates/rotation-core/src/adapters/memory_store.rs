//! In-memory pool store with failure injection.

use crate::domain::{LevelQueues, RetentionLedger};
use crate::error::{RotationError, RotationResult};
use crate::ports::PoolStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Volatile `PoolStore`, mainly for tests.
///
/// Saves can be made to fail or stall to exercise rollback and deadlines.
#[derive(Debug, Default)]
pub struct InMemoryPoolStore {
    queues: RwLock<Option<LevelQueues>>,
    ledger: RwLock<Option<RetentionLedger>>,
    fail_queue_saves: AtomicBool,
    fail_ledger_saves: AtomicBool,
    stall_loads: AtomicBool,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(queues: LevelQueues, ledger: RetentionLedger) -> Self {
        let store = Self::default();
        *store.queues.write() = Some(queues);
        *store.ledger.write() = Some(ledger);
        store
    }

    /// What is currently persisted (fresh state if nothing was saved).
    pub fn persisted_queues(&self) -> LevelQueues {
        self.queues.read().clone().unwrap_or_default()
    }

    pub fn persisted_ledger(&self) -> RetentionLedger {
        self.ledger.read().clone().unwrap_or_default()
    }

    pub fn fail_queue_saves(&self, fail: bool) {
        self.fail_queue_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_ledger_saves(&self, fail: bool) {
        self.fail_ledger_saves.store(fail, Ordering::SeqCst);
    }

    /// Makes every load sleep far beyond any sane deadline.
    pub fn stall_loads(&self, stall: bool) {
        self.stall_loads.store(stall, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    async fn maybe_stall(&self) {
        if self.stall_loads.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

#[async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn load_queues(&self) -> RotationResult<LevelQueues> {
        self.maybe_stall().await;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.persisted_queues())
    }

    async fn save_queues(&self, queues: &LevelQueues) -> RotationResult<()> {
        if self.fail_queue_saves.load(Ordering::SeqCst) {
            return Err(RotationError::store_io("save_queues", "injected failure"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.queues.write() = Some(queues.clone());
        Ok(())
    }

    async fn load_ledger(&self) -> RotationResult<RetentionLedger> {
        self.maybe_stall().await;
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.persisted_ledger())
    }

    async fn save_ledger(&self, ledger: &RetentionLedger) -> RotationResult<()> {
        if self.fail_ledger_saves.load(Ordering::SeqCst) {
            return Err(RotationError::store_io("save_ledger", "injected failure"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.ledger.write() = Some(ledger.clone());
        Ok(())
    }
}
