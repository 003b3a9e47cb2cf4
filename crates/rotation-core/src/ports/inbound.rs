//! Driving Ports (API - Inbound)
//!
//! Authorization is the caller's responsibility; every method assumes the
//! request has already been allowed.

use crate::domain::{AdvancementOutcome, Handle, LedgerSnapshot, Level, QueueEntry};
use crate::error::RotationResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Where a participant stands right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantStatus {
    pub handle: Handle,
    pub level: Level,
    /// 1-based position in the queue of `level`, if waiting there.
    pub position: Option<usize>,
}

/// Primary rotation pool API.
#[async_trait]
pub trait RotationApi: Send + Sync {
    /// Put `handle` at the tail of `level`'s queue.
    ///
    /// # Errors
    /// - `InvalidLevel` for levels outside 2..=5 or without a configured payout
    /// - `AlreadyQueued` if the handle is already waiting at `level`
    async fn enqueue_participant(&self, handle: Handle, level: Level) -> RotationResult<()>;

    /// Enqueue a participant at their current registry level.
    async fn join_queue(&self, handle: Handle) -> RotationResult<Level>;

    /// Ordered entries waiting at `level`.
    async fn get_queue_snapshot(&self, level: Level) -> RotationResult<Vec<QueueEntry>>;

    /// Every queue, keyed by level.
    async fn get_all_queues(&self) -> RotationResult<BTreeMap<Level, Vec<QueueEntry>>>;

    /// 1-based index of `handle` in `level`'s queue.
    async fn position_of(&self, level: Level, handle: &Handle) -> RotationResult<Option<usize>>;

    /// Current level and queue position of a participant.
    async fn participant_status(&self, handle: &Handle) -> RotationResult<ParticipantStatus>;

    /// Running total and all retention entries.
    async fn get_ledger_snapshot(&self) -> RotationResult<LedgerSnapshot>;

    /// Out-of-band advancement of one level (privileged callers only).
    ///
    /// Goes through the same engine as the scheduler, so retention is
    /// always recorded.
    async fn trigger_advancement(&self, level: Level) -> RotationResult<AdvancementOutcome>;
}
