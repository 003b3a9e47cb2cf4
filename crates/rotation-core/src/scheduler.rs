//! # Rotation Scheduler
//!
//! Owns the periodic advancement task. Each tick walks levels 2..=5 in
//! ascending order and calls the engine exactly once per level, so a long
//! queue drains one promotion per tick.
//!
//! ```text
//! start() ──► spawn ──► loop {
//!                         select! {
//!                           shutdown.changed() ──► break
//!                           interval.tick()    ──► run_tick()   (runs to completion)
//!                         }
//!                       }
//! ```
//!
//! Shutdown is only observed between ticks, so an advancement that already
//! took the pool lock always completes (or reverts) before the task exits.

use crate::config::SchedulerConfig;
use crate::domain::{AdvancementOutcome, Level, Promotion};
use crate::engine::AdvancementEngine;
use crate::error::{RotationError, RotationResult};
use crate::ports::{ParticipantRegistry, PayoutSchedule, PoolStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

// =============================================================================
// TICK REPORT
// =============================================================================

/// What happened to one level during a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelTick {
    Advanced(AdvancementOutcome),
    Empty,
    Failed(RotationError),
}

/// Result of one pass over all queue levels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Levels in the order they were processed.
    pub levels: Vec<(Level, LevelTick)>,
    /// A store failure stopped the tick early.
    pub aborted: bool,
}

impl TickReport {
    pub fn outcome(&self, level: Level) -> Option<&LevelTick> {
        self.levels
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, tick)| tick)
    }

    pub fn promotions(&self) -> impl Iterator<Item = &Promotion> {
        self.levels.iter().filter_map(|(_, tick)| match tick {
            LevelTick::Advanced(outcome) => outcome.promotion(),
            _ => None,
        })
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Drives the advancement engine on a fixed interval.
pub struct RotationScheduler<R, P, S>
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    engine: Arc<AdvancementEngine<R, P, S>>,
    config: SchedulerConfig,
}

impl<R, P, S> RotationScheduler<R, P, S>
where
    R: ParticipantRegistry + 'static,
    P: PayoutSchedule + 'static,
    S: PoolStore + 'static,
{
    pub fn new(engine: Arc<AdvancementEngine<R, P, S>>, config: SchedulerConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &Arc<AdvancementEngine<R, P, S>> {
        &self.engine
    }

    /// Out-of-band advancement of one level through the same engine.
    pub async fn trigger_advancement(&self, level: Level) -> RotationResult<AdvancementOutcome> {
        info!(level = level.value(), "[rotation] 🖐️ Manual advancement requested");
        self.engine.advance(level).await
    }

    /// One pass over every queue level.
    pub async fn run_tick(&self) -> TickReport {
        run_tick(&self.engine).await
    }

    /// Spawns the periodic task. The first tick fires immediately.
    pub fn start(&self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = Arc::clone(&self.engine);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            run_loop(engine, config, shutdown_rx).await;
        });

        info!(
            "[rotation] ⏱️ Scheduler started (interval {}s)",
            self.config.tick_interval.as_secs()
        );
        SchedulerHandle { shutdown_tx, task }
    }
}

// =============================================================================
// PERIODIC TASK
// =============================================================================

async fn run_loop<R, P, S>(
    engine: Arc<AdvancementEngine<R, P, S>>,
    config: SchedulerConfig,
    mut shutdown: watch::Receiver<bool>,
) where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("[rotation] Shutdown signal received");
                    break;
                }
            }
            _ = interval.tick() => {
                run_tick(&engine).await;
            }
        }
    }
}

async fn run_tick<R, P, S>(engine: &AdvancementEngine<R, P, S>) -> TickReport
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    let mut report = TickReport::default();

    for level in Level::queue_levels() {
        match engine.advance(level).await {
            Ok(outcome) => report.levels.push((level, LevelTick::Advanced(outcome))),
            Err(RotationError::EmptyQueue { .. }) => {
                debug!(level = level.value(), "[rotation] Queue empty");
                report.levels.push((level, LevelTick::Empty));
            }
            Err(e) if e.is_store_failure() => {
                error!(
                    level = level.value(),
                    "[rotation] ❌ Tick aborted at level {}: {}", level, e
                );
                report.levels.push((level, LevelTick::Failed(e)));
                report.aborted = true;
                break;
            }
            Err(e) => {
                warn!(
                    level = level.value(),
                    "[rotation] ⚠️ Level {} not advanced: {}", level, e
                );
                report.levels.push((level, LevelTick::Failed(e)));
            }
        }
    }

    let promoted = report.promotions().count();
    if promoted > 0 {
        info!("[rotation] 🔄 Tick complete, {} promoted", promoted);
    }
    report
}

// =============================================================================
// SCHEDULER HANDLE
// =============================================================================

/// Owned handle to the running scheduler task.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the task and waits for any in-flight tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("[rotation] ❌ Scheduler task ended abnormally: {}", e);
        }
        info!("[rotation] Scheduler stopped");
    }
}
