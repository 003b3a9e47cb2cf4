//! Error types for the rotation pool.
//!
//! Caller-facing outcomes (`AlreadyQueued`, `InvalidLevel`, `EmptyQueue`) are
//! ordinary typed results. Store failures are non-fatal to the scheduler: the
//! tick is aborted and the next one starts from a fresh read.

use crate::domain::{Handle, Level};
use rust_decimal::Decimal;
use thiserror::Error;

/// Rotation pool errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// Handle is already waiting in this level's queue
    #[error("{handle} is already queued at level {level}")]
    AlreadyQueued { handle: Handle, level: Level },

    /// Level cannot hold a queue (only 2..=5 are queueable)
    #[error("Level {level} is not valid for queueing")]
    InvalidLevel { level: Level },

    /// Nothing is waiting at this level
    #[error("Queue for level {level} is empty")]
    EmptyQueue { level: Level },

    /// Participant is unknown to the registry
    #[error("Participant not found: {handle}")]
    ParticipantNotFound { handle: Handle },

    /// Ledger rejected an amount that is negative or overflows the total
    #[error("Ledger invariant violation: amount {amount} rejected")]
    LedgerInvariantViolation { amount: Decimal },

    /// Promotion would overflow the level counter
    #[error("Level {level} cannot be promoted further")]
    LevelOverflow { level: Level },

    /// Durable store I/O failed
    #[error("Store I/O error during {operation}: {reason}")]
    StoreIo {
        operation: &'static str,
        reason: String,
    },

    /// Durable store did not answer within the deadline
    #[error("Store operation {operation} timed out after {timeout_ms}ms")]
    StoreTimeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Participant registry failed
    #[error("Registry error: {reason}")]
    Registry { reason: String },
}

impl RotationError {
    /// Failures of the durable side (store or registry I/O).
    ///
    /// The scheduler aborts the current tick on these.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreIo { .. } | Self::StoreTimeout { .. } | Self::Registry { .. }
        )
    }

    pub(crate) fn store_io(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::StoreIo {
            operation,
            reason: err.to_string(),
        }
    }
}

/// Result type for rotation operations
pub type RotationResult<T> = Result<T, RotationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_queued_display() {
        let err = RotationError::AlreadyQueued {
            handle: Handle::from("alice"),
            level: Level::new(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("alice"));
        assert!(msg.contains("level 3"));
    }

    #[test]
    fn test_store_failure_classification() {
        assert!(RotationError::store_io("save_queues", "disk full").is_store_failure());
        assert!(RotationError::StoreTimeout {
            operation: "load_ledger",
            timeout_ms: 5000
        }
        .is_store_failure());
        assert!(!RotationError::EmptyQueue {
            level: Level::new(2)
        }
        .is_store_failure());
        assert!(!RotationError::InvalidLevel {
            level: Level::new(1)
        }
        .is_store_failure());
    }
}
