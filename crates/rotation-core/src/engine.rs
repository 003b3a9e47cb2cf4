//! # Advancement Engine
//!
//! The one path through which a participant is promoted. Both the scheduler
//! and the manual trigger call [`AdvancementEngine::advance`], so retention is
//! recorded for every promotion.
//!
//! ## Algorithm (per level, per call)
//!
//! 1. Dequeue the head of the level's queue (`EmptyQueue` if none).
//! 2. Look up the participant; missing → orphan policy.
//! 3. Look up the payout for the participant's **live** level (which may
//!    differ from the queue's level); missing → orphan policy.
//! 4. Record `payout × retention_rate` in the ledger.
//! 5. Promote the participant by exactly one level and stamp today's date.
//! 6. Persist queues + ledger together, then update the registry. A registry
//!    failure reverts the persisted queues + ledger.
//!
//! The pool lock is held from step 1 to step 6, so no reader observes a
//! promotion without its ledger entry, or the reverse.

use crate::config::RotationConfig;
use crate::domain::{
    AdvancementOutcome, Handle, Level, LevelQueues, OrphanPolicy, OrphanReason, Participant,
    Promotion, QueueEntry,
};
use crate::error::{RotationError, RotationResult};
use crate::pool::{with_deadline, PoolGuard, SharedPool};
use crate::ports::{AlertSink, ParticipantRegistry, PayoutSchedule, PoolStore, TimeSource};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{error, info, warn};

// =============================================================================
// ADVANCEMENT ENGINE
// =============================================================================

/// Promotes queue heads and keeps the retention ledger.
pub struct AdvancementEngine<R, P, S>
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    config: RotationConfig,
    pool: SharedPool<S>,
    registry: Arc<R>,
    schedule: Arc<P>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn TimeSource>,
}

impl<R, P, S> AdvancementEngine<R, P, S>
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    pub fn new(
        config: RotationConfig,
        store: Arc<S>,
        registry: Arc<R>,
        schedule: Arc<P>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let pool = SharedPool::new(store, config.io_timeout);
        Self {
            config,
            pool,
            registry,
            schedule,
            alerts,
            clock,
        }
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn pool(&self) -> &SharedPool<S> {
        &self.pool
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn schedule(&self) -> &Arc<P> {
        &self.schedule
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Looks up a participant under the I/O deadline.
    pub async fn lookup(&self, handle: &Handle) -> RotationResult<Option<Participant>> {
        with_deadline(
            self.config.io_timeout,
            "registry_get",
            self.registry.get_by_handle(handle),
        )
        .await
    }

    // =========================================================================
    // ADVANCEMENT
    // =========================================================================

    /// Advances one participant from `level`'s queue.
    pub async fn advance(&self, level: Level) -> RotationResult<AdvancementOutcome> {
        if !level.is_queueable() {
            return Err(RotationError::InvalidLevel { level });
        }

        let mut guard = self.pool.lock().await?;

        let mut queues = guard.queues().clone();
        let entry = queues.dequeue(level)?;

        let Some(participant) = self.lookup(&entry.handle).await? else {
            return self
                .settle_orphan(&mut guard, queues, level, entry, OrphanReason::ParticipantNotFound)
                .await;
        };

        let live_level = participant.level;
        let Some(payout) = self.schedule.get_payout(live_level) else {
            return self
                .settle_orphan(
                    &mut guard,
                    queues,
                    level,
                    entry,
                    OrphanReason::PayoutNotFound { live_level },
                )
                .await;
        };

        let to_level = live_level
            .next()
            .ok_or(RotationError::LevelOverflow { level: live_level })?;
        let today = self.today();
        let retained = payout * self.config.retention_rate;

        let mut ledger = guard.ledger().clone();
        ledger.record(
            today,
            retained,
            format!("Retention level {} - {}", live_level, participant.handle),
        )?;

        let previous = guard.commit(queues, ledger).await?;

        if let Err(e) = self.promote_in_registry(&participant, to_level, today).await {
            error!(
                "[rotation] ❌ Registry update failed for {}: {}, reverting level {} advancement",
                participant.handle, e, level
            );
            if let Err(revert) = guard.revert(previous).await {
                error!("[rotation] ❌ Revert after registry failure failed: {}", revert);
            }
            return Err(e);
        }

        if live_level != level {
            warn!(
                level = level.value(),
                handle = %participant.handle,
                live_level = live_level.value(),
                "[rotation] ⚠️ Queue level differs from live level, payout taken from live level"
            );
        }

        info!(
            level = level.value(),
            handle = %participant.handle,
            amount = %retained,
            "[rotation] ✅ {} advanced to level {} (retained {})",
            participant.handle,
            to_level,
            retained
        );

        Ok(AdvancementOutcome::Promoted(Promotion {
            handle: participant.handle,
            queue_level: level,
            from_level: live_level,
            to_level,
            payout,
            retained,
            date: today,
        }))
    }

    // =========================================================================
    // REGISTRY PROMOTION
    // =========================================================================

    /// Sets the new level and date; undoes the level if the date write fails.
    async fn promote_in_registry(
        &self,
        participant: &Participant,
        to_level: Level,
        today: NaiveDate,
    ) -> RotationResult<()> {
        let timeout = self.config.io_timeout;
        let handle = &participant.handle;

        with_deadline(
            timeout,
            "registry_set_level",
            self.registry.set_level(handle, to_level),
        )
        .await?;

        if let Err(e) = with_deadline(
            timeout,
            "registry_set_last_advanced",
            self.registry.set_last_advanced(handle, today),
        )
        .await
        {
            if let Err(undo) = with_deadline(
                timeout,
                "registry_set_level",
                self.registry.set_level(handle, participant.level),
            )
            .await
            {
                error!(
                    "[rotation] ❌ Could not restore level {} for {}: {}",
                    participant.level, handle, undo
                );
            }
            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // ORPHAN HANDLING
    // =========================================================================

    /// Applies the orphan policy to a dequeued entry.
    async fn settle_orphan(
        &self,
        guard: &mut PoolGuard<'_, S>,
        mut queues: LevelQueues,
        level: Level,
        entry: QueueEntry,
        reason: OrphanReason,
    ) -> RotationResult<AdvancementOutcome> {
        let handle = entry.handle.clone();

        match self.config.orphan_policy {
            OrphanPolicy::Requeue => {
                queues.requeue(level, entry)?;
                guard.commit_queues(queues).await?;
                warn!(
                    level = level.value(),
                    handle = %handle,
                    "[rotation] 🔁 Entry requeued at tail ({})",
                    reason
                );
                Ok(AdvancementOutcome::Requeued {
                    level,
                    handle,
                    reason,
                })
            }
            OrphanPolicy::Drop | OrphanPolicy::Alert => {
                guard.commit_queues(queues).await?;
                if self.config.orphan_policy == OrphanPolicy::Alert {
                    self.alerts.orphaned_entry(level, &handle, &reason);
                } else {
                    warn!(
                        level = level.value(),
                        handle = %handle,
                        "[rotation] 🗑️ Entry discarded ({})",
                        reason
                    );
                }
                Ok(AdvancementOutcome::Discarded {
                    level,
                    handle,
                    reason,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        FixedTimeSource, InMemoryPoolStore, InMemoryRegistry, PayoutTable, RecordingAlertSink,
    };
    use crate::domain::RetentionLedger;
    use rust_decimal_macros::dec;

    type TestEngine = AdvancementEngine<InMemoryRegistry, PayoutTable, InMemoryPoolStore>;

    struct Fixture {
        engine: TestEngine,
        store: Arc<InMemoryPoolStore>,
        registry: Arc<InMemoryRegistry>,
        alerts: Arc<RecordingAlertSink>,
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn fixture(policy: OrphanPolicy, queued: &[(u32, &str)], participants: &[(&str, u32)]) -> Fixture {
        let mut queues = LevelQueues::new();
        for (level, handle) in queued {
            queues
                .enqueue(Level::new(*level), (*handle).into(), day())
                .unwrap();
        }
        let store = Arc::new(InMemoryPoolStore::with_state(queues, RetentionLedger::new()));

        let registry = Arc::new(InMemoryRegistry::new());
        for (handle, level) in participants {
            registry.insert(Participant::new(*handle).at_level(*level));
        }

        let schedule = Arc::new(
            PayoutTable::default()
                .with_payout(2, dec!(100))
                .with_payout(3, dec!(200))
                .with_payout(4, dec!(400)),
        );
        let alerts = Arc::new(RecordingAlertSink::new());
        let config = RotationConfig {
            orphan_policy: policy,
            ..Default::default()
        };

        let engine = AdvancementEngine::new(
            config,
            Arc::clone(&store),
            Arc::clone(&registry),
            schedule,
            Arc::clone(&alerts) as Arc<dyn AlertSink>,
            Arc::new(FixedTimeSource::new(day())),
        );

        Fixture {
            engine,
            store,
            registry,
            alerts,
        }
    }

    #[tokio::test]
    async fn test_promotes_using_live_level() {
        // bob waits in queue 3 but is live at level 2
        let f = fixture(OrphanPolicy::Drop, &[(3, "bob"), (3, "carol")], &[("bob", 2), ("carol", 3)]);

        let outcome = f.engine.advance(Level::new(3)).await.unwrap();
        let promotion = outcome.promotion().unwrap();
        assert_eq!(promotion.handle.as_str(), "bob");
        assert_eq!(promotion.from_level, Level::new(2));
        assert_eq!(promotion.to_level, Level::new(3));
        assert_eq!(promotion.retained, dec!(10));

        let bob = f.registry.get(&"bob".into()).unwrap();
        assert_eq!(bob.level, Level::new(3));
        assert_eq!(bob.last_advanced, Some(day()));

        let ledger = f.store.persisted_ledger();
        assert_eq!(ledger.running_total(), dec!(10));
        assert_eq!(ledger.entries()[0].description, "Retention level 2 - bob");

        let remaining = f.store.persisted_queues().snapshot(Level::new(3));
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].handle.as_str(), "carol");
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let f = fixture(OrphanPolicy::Drop, &[], &[]);
        assert_eq!(
            f.engine.advance(Level::new(4)).await,
            Err(RotationError::EmptyQueue {
                level: Level::new(4)
            })
        );
        assert_eq!(f.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_level() {
        let f = fixture(OrphanPolicy::Drop, &[], &[]);
        assert_eq!(
            f.engine.advance(Level::new(1)).await,
            Err(RotationError::InvalidLevel {
                level: Level::new(1)
            })
        );
    }

    #[tokio::test]
    async fn test_drop_policy_discards_missing_participant() {
        let f = fixture(OrphanPolicy::Drop, &[(2, "ghost"), (2, "ann")], &[("ann", 2)]);

        let outcome = f.engine.advance(Level::new(2)).await.unwrap();
        assert_eq!(
            outcome,
            AdvancementOutcome::Discarded {
                level: Level::new(2),
                handle: "ghost".into(),
                reason: OrphanReason::ParticipantNotFound,
            }
        );
        assert_eq!(f.store.persisted_queues().len(Level::new(2)), 1);
        assert!(f.store.persisted_ledger().entries().is_empty());
        assert!(f.alerts.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_requeue_policy_moves_entry_to_tail() {
        let f = fixture(OrphanPolicy::Requeue, &[(2, "ghost"), (2, "ann")], &[("ann", 2)]);

        let outcome = f.engine.advance(Level::new(2)).await.unwrap();
        assert!(matches!(outcome, AdvancementOutcome::Requeued { .. }));

        let queue = f.store.persisted_queues().snapshot(Level::new(2));
        let order: Vec<&str> = queue.iter().map(|e| e.handle.as_str()).collect();
        assert_eq!(order, vec!["ann", "ghost"]);
        assert!(f.store.persisted_ledger().entries().is_empty());
    }

    #[tokio::test]
    async fn test_alert_policy_on_missing_payout() {
        // dan is live at level 5, which has no payout
        let f = fixture(OrphanPolicy::Alert, &[(4, "dan")], &[("dan", 5)]);

        let outcome = f.engine.advance(Level::new(4)).await.unwrap();
        assert!(matches!(outcome, AdvancementOutcome::Discarded { .. }));

        let alerts = f.alerts.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0].2,
            OrphanReason::PayoutNotFound {
                live_level: Level::new(5)
            }
        );
        assert_eq!(f.registry.get(&"dan".into()).unwrap().level, Level::new(5));
        assert_eq!(f.store.persisted_queues().len(Level::new(4)), 0);
    }

    #[tokio::test]
    async fn test_registry_failure_reverts_store() {
        let f = fixture(OrphanPolicy::Drop, &[(2, "ann")], &[("ann", 2)]);
        f.registry.fail_writes(true);

        let err = f.engine.advance(Level::new(2)).await.unwrap_err();
        assert!(err.is_store_failure());

        // Entry still queued, no retention recorded, level untouched
        assert_eq!(f.store.persisted_queues().len(Level::new(2)), 1);
        assert!(f.store.persisted_ledger().entries().is_empty());
        assert_eq!(f.registry.get(&"ann".into()).unwrap().level, Level::new(2));

        f.registry.fail_writes(false);
        let outcome = f.engine.advance(Level::new(2)).await.unwrap();
        assert_eq!(outcome.handle().as_str(), "ann");
    }

    #[tokio::test]
    async fn test_date_write_failure_restores_level() {
        let f = fixture(OrphanPolicy::Drop, &[(3, "dee"), (3, "eli")], &[("dee", 3), ("eli", 3)]);
        // set_level succeeds, set_last_advanced fails
        f.registry.fail_date_writes(true);

        let err = f.engine.advance(Level::new(3)).await.unwrap_err();
        assert!(matches!(err, RotationError::Registry { .. }));

        let dee = f.registry.get(&"dee".into()).unwrap();
        assert_eq!(dee.level, Level::new(3));
        assert_eq!(dee.last_advanced, None);

        // Queue and ledger reverted: dee is still the head, nothing retained
        let queues = f.store.persisted_queues();
        assert_eq!(queues.position_of(Level::new(3), &"dee".into()), Some(1));
        assert_eq!(queues.len(Level::new(3)), 2);
        let ledger = f.store.persisted_ledger();
        assert!(ledger.entries().is_empty());
        assert_eq!(ledger.running_total(), dec!(0));

        f.registry.fail_date_writes(false);
        let outcome = f.engine.advance(Level::new(3)).await.unwrap();
        let promotion = outcome.promotion().unwrap();
        assert_eq!(promotion.handle.as_str(), "dee");
        assert_eq!(promotion.to_level, Level::new(4));
        assert_eq!(f.registry.get(&"dee".into()).unwrap().last_advanced, Some(day()));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_entry_for_retry() {
        let f = fixture(OrphanPolicy::Drop, &[(3, "cy")], &[("cy", 3)]);
        f.store.fail_ledger_saves(true);

        assert!(f.engine.advance(Level::new(3)).await.is_err());
        assert_eq!(f.store.persisted_queues().len(Level::new(3)), 1);
        assert_eq!(f.registry.get(&"cy".into()).unwrap().level, Level::new(3));

        f.store.fail_ledger_saves(false);
        let outcome = f.engine.advance(Level::new(3)).await.unwrap();
        assert_eq!(outcome.promotion().unwrap().retained, dec!(20));
    }
}
