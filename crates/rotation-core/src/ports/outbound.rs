//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{Handle, LevelQueues, Level, OrphanReason, Participant, RetentionLedger};
use crate::error::RotationResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Participant records, owned outside the core.
#[async_trait]
pub trait ParticipantRegistry: Send + Sync {
    /// `Ok(None)` when no participant has this handle.
    async fn get_by_handle(&self, handle: &Handle) -> RotationResult<Option<Participant>>;

    async fn set_level(&self, handle: &Handle, level: Level) -> RotationResult<()>;

    async fn set_last_advanced(&self, handle: &Handle, date: NaiveDate) -> RotationResult<()>;
}

/// Read-only mapping level -> payout amount.
pub trait PayoutSchedule: Send + Sync {
    fn get_payout(&self, level: Level) -> Option<Decimal>;
}

/// Durable load/save of queues and ledger.
///
/// Loads treat a missing or unreadable backing store as fresh state; only a
/// failure to *read* the medium itself may surface as an error.
#[async_trait]
pub trait PoolStore: Send + Sync {
    async fn load_queues(&self) -> RotationResult<LevelQueues>;

    async fn save_queues(&self, queues: &LevelQueues) -> RotationResult<()>;

    async fn load_ledger(&self) -> RotationResult<RetentionLedger>;

    async fn save_ledger(&self, ledger: &RetentionLedger) -> RotationResult<()>;
}

/// Receives orphaned entries under the `Alert` policy.
pub trait AlertSink: Send + Sync {
    fn orphaned_entry(&self, level: Level, handle: &Handle, reason: &OrphanReason);
}

/// Calendar source for entry and ledger dates.
///
/// Abstracted to allow testing with a fixed day.
pub trait TimeSource: Send + Sync {
    fn today(&self) -> NaiveDate;
}
