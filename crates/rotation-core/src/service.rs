//! Rotation Service - API facade over the advancement engine.
//!
//! Enqueue and read operations take the same pool lock as the engine, so an
//! enqueue for level L and an advancement of level L are always serialized.

use crate::domain::{AdvancementOutcome, Handle, LedgerSnapshot, Level, QueueEntry};
use crate::engine::AdvancementEngine;
use crate::error::{RotationError, RotationResult};
use crate::ports::inbound::{ParticipantStatus, RotationApi};
use crate::ports::{ParticipantRegistry, PayoutSchedule, PoolStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// `RotationApi` implementation.
pub struct RotationService<R, P, S>
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    engine: Arc<AdvancementEngine<R, P, S>>,
}

impl<R, P, S> Clone for RotationService<R, P, S>
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R, P, S> RotationService<R, P, S>
where
    R: ParticipantRegistry,
    P: PayoutSchedule,
    S: PoolStore,
{
    pub fn new(engine: Arc<AdvancementEngine<R, P, S>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<AdvancementEngine<R, P, S>> {
        &self.engine
    }

    /// Queueable and has a payout configured.
    fn check_queueable(&self, level: Level) -> RotationResult<()> {
        if !level.is_queueable() || self.engine.schedule().get_payout(level).is_none() {
            return Err(RotationError::InvalidLevel { level });
        }
        Ok(())
    }
}

#[async_trait]
impl<R, P, S> RotationApi for RotationService<R, P, S>
where
    R: ParticipantRegistry + 'static,
    P: PayoutSchedule + 'static,
    S: PoolStore + 'static,
{
    async fn enqueue_participant(&self, handle: Handle, level: Level) -> RotationResult<()> {
        self.check_queueable(level)?;

        let mut guard = self.engine.pool().lock().await?;
        let mut queues = guard.queues().clone();
        queues.enqueue(level, handle.clone(), self.engine.today())?;
        guard.commit_queues(queues).await?;

        info!(
            level = level.value(),
            handle = %handle,
            "[rotation] 📥 {} joined the level {} queue",
            handle,
            level
        );
        Ok(())
    }

    async fn join_queue(&self, handle: Handle) -> RotationResult<Level> {
        let participant = self
            .engine
            .lookup(&handle)
            .await?
            .ok_or_else(|| RotationError::ParticipantNotFound {
                handle: handle.clone(),
            })?;
        let level = participant.level;
        self.enqueue_participant(handle, level).await?;
        Ok(level)
    }

    async fn get_queue_snapshot(&self, level: Level) -> RotationResult<Vec<QueueEntry>> {
        if !level.is_queueable() {
            return Err(RotationError::InvalidLevel { level });
        }
        let guard = self.engine.pool().lock().await?;
        Ok(guard.queues().snapshot(level))
    }

    async fn get_all_queues(&self) -> RotationResult<BTreeMap<Level, Vec<QueueEntry>>> {
        let guard = self.engine.pool().lock().await?;
        Ok(guard.queues().all())
    }

    async fn position_of(&self, level: Level, handle: &Handle) -> RotationResult<Option<usize>> {
        if !level.is_queueable() {
            return Err(RotationError::InvalidLevel { level });
        }
        let guard = self.engine.pool().lock().await?;
        Ok(guard.queues().position_of(level, handle))
    }

    async fn participant_status(&self, handle: &Handle) -> RotationResult<ParticipantStatus> {
        // Held across the registry read so level and position agree.
        let guard = self.engine.pool().lock().await?;
        let participant = self
            .engine
            .lookup(handle)
            .await?
            .ok_or_else(|| RotationError::ParticipantNotFound {
                handle: handle.clone(),
            })?;

        Ok(ParticipantStatus {
            position: guard.queues().position_of(participant.level, handle),
            handle: participant.handle,
            level: participant.level,
        })
    }

    async fn get_ledger_snapshot(&self) -> RotationResult<LedgerSnapshot> {
        let guard = self.engine.pool().lock().await?;
        Ok(guard.ledger().snapshot())
    }

    async fn trigger_advancement(&self, level: Level) -> RotationResult<AdvancementOutcome> {
        info!(level = level.value(), "[rotation] 🖐️ Manual advancement requested");
        self.engine.advance(level).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        FixedTimeSource, InMemoryPoolStore, InMemoryRegistry, PayoutTable, TracingAlertSink,
    };
    use crate::config::RotationConfig;
    use crate::domain::Participant;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    type TestService = RotationService<InMemoryRegistry, PayoutTable, InMemoryPoolStore>;

    fn create_test_service(registry: InMemoryRegistry) -> (TestService, Arc<InMemoryPoolStore>) {
        let store = Arc::new(InMemoryPoolStore::new());
        let schedule = PayoutTable::default()
            .with_payout(2, dec!(100))
            .with_payout(3, dec!(200))
            .with_payout(4, dec!(400))
            .with_payout(5, dec!(800));
        let engine = AdvancementEngine::new(
            RotationConfig::default(),
            Arc::clone(&store),
            Arc::new(registry),
            Arc::new(schedule),
            Arc::new(TracingAlertSink),
            Arc::new(FixedTimeSource::new(
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            )),
        );
        (RotationService::new(Arc::new(engine)), store)
    }

    #[tokio::test]
    async fn test_enqueue_twice_is_already_queued() {
        let (service, store) = create_test_service(InMemoryRegistry::new());
        let level = Level::new(3);

        service.enqueue_participant("alice".into(), level).await.unwrap();
        let err = service
            .enqueue_participant("alice".into(), level)
            .await
            .unwrap_err();

        assert!(matches!(err, RotationError::AlreadyQueued { .. }));
        assert_eq!(service.get_queue_snapshot(level).await.unwrap().len(), 1);
        assert_eq!(store.persisted_queues().len(level), 1);
    }

    #[tokio::test]
    async fn test_level_one_is_invalid() {
        let (service, _) = create_test_service(InMemoryRegistry::new());
        assert_eq!(
            service.enqueue_participant("h".into(), Level::new(1)).await,
            Err(RotationError::InvalidLevel {
                level: Level::new(1)
            })
        );
    }

    #[tokio::test]
    async fn test_level_without_payout_is_invalid() {
        let store = Arc::new(InMemoryPoolStore::new());
        let engine = AdvancementEngine::new(
            RotationConfig::default(),
            store,
            Arc::new(InMemoryRegistry::new()),
            Arc::new(PayoutTable::default().with_payout(2, dec!(100))),
            Arc::new(TracingAlertSink),
            Arc::new(FixedTimeSource::new(
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            )),
        );
        let service = RotationService::new(Arc::new(engine));

        assert!(service
            .enqueue_participant("h".into(), Level::new(2))
            .await
            .is_ok());
        assert_eq!(
            service.enqueue_participant("h".into(), Level::new(4)).await,
            Err(RotationError::InvalidLevel {
                level: Level::new(4)
            })
        );
    }

    #[tokio::test]
    async fn test_join_queue_uses_current_level() {
        let registry = InMemoryRegistry::new()
            .with_participant(Participant::new("bea").at_level(4))
            .with_participant(Participant::new("newbie"));
        let (service, _) = create_test_service(registry);

        assert_eq!(
            service.join_queue("bea".into()).await.unwrap(),
            Level::new(4)
        );
        assert_eq!(
            service.join_queue("newbie".into()).await,
            Err(RotationError::InvalidLevel {
                level: Level::new(1)
            })
        );
        assert!(matches!(
            service.join_queue("nobody".into()).await,
            Err(RotationError::ParticipantNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_participant_status_position() {
        let registry = InMemoryRegistry::new()
            .with_participant(Participant::new("a").at_level(2))
            .with_participant(Participant::new("b").at_level(2));
        let (service, _) = create_test_service(registry);

        service.join_queue("a".into()).await.unwrap();
        service.join_queue("b".into()).await.unwrap();

        let status = service.participant_status(&"b".into()).await.unwrap();
        assert_eq!(status.level, Level::new(2));
        assert_eq!(status.position, Some(2));
        assert_eq!(
            service.position_of(Level::new(2), &"a".into()).await.unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_all_queues_lists_every_level() {
        let (service, _) = create_test_service(InMemoryRegistry::new());
        service.enqueue_participant("x".into(), Level::new(5)).await.unwrap();

        let all = service.get_all_queues().await.unwrap();
        let levels: Vec<u32> = all.keys().map(|l| l.value()).collect();
        assert_eq!(levels, vec![2, 3, 4, 5]);
        assert_eq!(all[&Level::new(5)].len(), 1);
        assert!(service.get_queue_snapshot(Level::new(7)).await.is_err());
    }

    #[tokio::test]
    async fn test_trigger_records_retention() {
        let registry = InMemoryRegistry::new().with_participant(Participant::new("m").at_level(5));
        let (service, _) = create_test_service(registry);
        service.join_queue("m".into()).await.unwrap();

        let outcome = service.trigger_advancement(Level::new(5)).await.unwrap();
        assert_eq!(outcome.handle().as_str(), "m");

        let ledger = service.get_ledger_snapshot().await.unwrap();
        assert_eq!(ledger.running_total, dec!(80));
        assert_eq!(ledger.entries.len(), 1);

        assert_eq!(
            service.trigger_advancement(Level::new(5)).await,
            Err(RotationError::EmptyQueue {
                level: Level::new(5)
            })
        );
    }
}
