//! # Shared Pool State
//!
//! Single-writer view of the durable state (queues + ledger).
//!
//! Every operation holds one async mutex across its whole
//! load-mutate-save cycle, so:
//!
//! - an enqueue and a dequeue on the same level never interleave;
//! - a scheduled tick and a manual trigger never run concurrently;
//! - readers never observe a ledger entry without its queue change.
//!
//! Mutations are staged on copies and swapped in only after the store
//! accepted them. When a save fails the cached state is marked stale and the
//! next lock re-reads the store.

use crate::domain::{LevelQueues, RetentionLedger};
use crate::error::{RotationError, RotationResult};
use crate::ports::PoolStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Runs `fut` under `timeout`, mapping expiry to `StoreTimeout`.
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> RotationResult<T>
where
    F: Future<Output = RotationResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(RotationError::StoreTimeout {
            operation,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

struct PoolState {
    queues: LevelQueues,
    ledger: RetentionLedger,
    /// Cache matches the store; `false` forces a reload on next lock.
    fresh: bool,
}

/// Mutex-guarded cache over a `PoolStore`.
pub struct SharedPool<S: PoolStore> {
    state: Mutex<PoolState>,
    store: Arc<S>,
    io_timeout: Duration,
}

impl<S: PoolStore> SharedPool<S> {
    pub fn new(store: Arc<S>, io_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(PoolState {
                queues: LevelQueues::new(),
                ledger: RetentionLedger::new(),
                fresh: false,
            }),
            store,
            io_timeout,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Takes exclusive access, loading from the store if the cache is stale.
    pub async fn lock(&self) -> RotationResult<PoolGuard<'_, S>> {
        let mut state = self.state.lock().await;

        if !state.fresh {
            let queues =
                with_deadline(self.io_timeout, "load_queues", self.store.load_queues()).await?;
            let mut ledger =
                with_deadline(self.io_timeout, "load_ledger", self.store.load_ledger()).await?;

            match ledger.repair_total() {
                Ok(true) => warn!(
                    "[rotation] ⚠️ Ledger running total disagreed with entries, recomputed to {}",
                    ledger.running_total()
                ),
                Ok(false) => {}
                Err(e) => {
                    error!(
                        "[rotation] ❌ Stored ledger is unusable ({}), starting empty",
                        e
                    );
                    ledger = RetentionLedger::new();
                }
            }

            info!(
                "[rotation] 💾 Pool state loaded ({} ledger entries, total {})",
                ledger.entries().len(),
                ledger.running_total()
            );

            state.queues = queues.normalize();
            state.ledger = ledger;
            state.fresh = true;
        }

        Ok(PoolGuard {
            state,
            store: &self.store,
            io_timeout: self.io_timeout,
        })
    }
}

/// Previously committed state, used to undo a commit.
#[derive(Debug)]
pub struct Committed {
    queues: LevelQueues,
    ledger: RetentionLedger,
}

/// Exclusive access to the pool state.
pub struct PoolGuard<'a, S: PoolStore> {
    state: MutexGuard<'a, PoolState>,
    store: &'a Arc<S>,
    io_timeout: Duration,
}

impl<'a, S: PoolStore> PoolGuard<'a, S> {
    pub fn queues(&self) -> &LevelQueues {
        &self.state.queues
    }

    pub fn ledger(&self) -> &RetentionLedger {
        &self.state.ledger
    }

    /// Persists new queues only (enqueue path).
    pub async fn commit_queues(&mut self, queues: LevelQueues) -> RotationResult<()> {
        if let Err(e) = self.save_queues(&queues).await {
            self.state.fresh = false;
            return Err(e);
        }
        self.state.queues = queues;
        Ok(())
    }

    /// Persists queues and ledger as one unit.
    ///
    /// If the ledger save fails after the queues were written, the previous
    /// queues are written back before the error is returned.
    pub async fn commit(
        &mut self,
        queues: LevelQueues,
        ledger: RetentionLedger,
    ) -> RotationResult<Committed> {
        if let Err(e) = self.save_queues(&queues).await {
            self.state.fresh = false;
            return Err(e);
        }

        if let Err(e) = self.save_ledger(&ledger).await {
            let previous = self.state.queues.clone();
            if let Err(undo) = self.save_queues(&previous).await {
                error!(
                    "[rotation] ❌ Could not restore queues after ledger save failure: {}",
                    undo
                );
            }
            self.state.fresh = false;
            return Err(e);
        }

        let queues = std::mem::replace(&mut self.state.queues, queues);
        let ledger = std::mem::replace(&mut self.state.ledger, ledger);
        Ok(Committed { queues, ledger })
    }

    /// Writes back the state that `commit` replaced.
    pub async fn revert(&mut self, previous: Committed) -> RotationResult<()> {
        let saved = match self.save_queues(&previous.queues).await {
            Ok(()) => self.save_ledger(&previous.ledger).await,
            Err(e) => Err(e),
        };

        self.state.queues = previous.queues;
        self.state.ledger = previous.ledger;

        if let Err(e) = saved {
            error!("[rotation] ❌ Revert could not be persisted: {}", e);
            self.state.fresh = false;
            return Err(e);
        }
        Ok(())
    }

    async fn save_queues(&self, queues: &LevelQueues) -> RotationResult<()> {
        with_deadline(self.io_timeout, "save_queues", self.store.save_queues(queues)).await
    }

    async fn save_ledger(&self, ledger: &RetentionLedger) -> RotationResult<()> {
        with_deadline(self.io_timeout, "save_ledger", self.store.save_ledger(ledger)).await
    }
}
