//! # Level Queues
//!
//! Per-level FIFO queues of waiting participants.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Strict insertion order | `VecDeque` push-back / pop-front, never sorted |
//! | One entry per handle per level | `enqueue()` duplicate check, `normalize()` on load |
//! | Only levels 2..=5 hold queues | `enqueue()` / `dequeue()` level check |
//!
//! Enqueue dates are day-granular and collide freely, so order is never
//! derived from them.

use super::{Handle, Level};
use crate::error::{RotationError, RotationResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// A participant waiting at some level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub handle: Handle,
    pub enqueued_on: NaiveDate,
}

/// All four level queues.
///
/// Serialized as a map from level to ordered entries, e.g.
/// `{"2": [{"handle": "bob", "enqueued_on": "2026-01-01"}], "3": [], ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelQueues {
    queues: BTreeMap<Level, VecDeque<QueueEntry>>,
}

impl LevelQueues {
    /// Fresh state with every queueable level present and empty.
    pub fn new() -> Self {
        Self {
            queues: Level::queue_levels().map(|l| (l, VecDeque::new())).collect(),
        }
    }

    /// Appends `handle` to the tail of `level`'s queue.
    pub fn enqueue(&mut self, level: Level, handle: Handle, today: NaiveDate) -> RotationResult<()> {
        if self.contains(level, &handle) {
            return Err(RotationError::AlreadyQueued { handle, level });
        }
        self.queue_mut(level)?.push_back(QueueEntry {
            handle,
            enqueued_on: today,
        });
        Ok(())
    }

    /// Re-appends a previously dequeued entry, keeping its original date.
    pub fn requeue(&mut self, level: Level, entry: QueueEntry) -> RotationResult<()> {
        if self.contains(level, &entry.handle) {
            return Err(RotationError::AlreadyQueued {
                handle: entry.handle,
                level,
            });
        }
        self.queue_mut(level)?.push_back(entry);
        Ok(())
    }

    /// Removes and returns the head of `level`'s queue.
    pub fn dequeue(&mut self, level: Level) -> RotationResult<QueueEntry> {
        self.queue_mut(level)?
            .pop_front()
            .ok_or(RotationError::EmptyQueue { level })
    }

    pub fn contains(&self, level: Level, handle: &Handle) -> bool {
        self.queues
            .get(&level)
            .is_some_and(|q| q.iter().any(|e| &e.handle == handle))
    }

    /// Ordered copy of `level`'s queue. Non-queueable levels read as empty.
    pub fn snapshot(&self, level: Level) -> Vec<QueueEntry> {
        self.queues
            .get(&level)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 1-based position of `handle` in `level`'s queue.
    pub fn position_of(&self, level: Level, handle: &Handle) -> Option<usize> {
        self.queues
            .get(&level)?
            .iter()
            .position(|e| &e.handle == handle)
            .map(|idx| idx + 1)
    }

    pub fn len(&self, level: Level) -> usize {
        self.queues.get(&level).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Ordered copy of every queue, keyed by level.
    pub fn all(&self) -> BTreeMap<Level, Vec<QueueEntry>> {
        self.queues
            .iter()
            .map(|(level, q)| (*level, q.iter().cloned().collect()))
            .collect()
    }

    /// Restores any queueable level missing from a loaded file, drops
    /// levels that cannot hold a queue, and keeps only the first entry for
    /// a handle repeated within one level.
    pub fn normalize(mut self) -> Self {
        self.queues.retain(|level, _| level.is_queueable());
        for level in Level::queue_levels() {
            self.queues.entry(level).or_default();
        }
        for queue in self.queues.values_mut() {
            let mut seen = HashSet::new();
            queue.retain(|e| seen.insert(e.handle.clone()));
        }
        self
    }

    fn queue_mut(&mut self, level: Level) -> RotationResult<&mut VecDeque<QueueEntry>> {
        if !level.is_queueable() {
            return Err(RotationError::InvalidLevel { level });
        }
        Ok(self.queues.entry(level).or_default())
    }
}

impl Default for LevelQueues {
    fn default() -> Self {
        Self::new()
    }
}
