//! # Domain Layer - Rotation Pool
//!
//! Pure state and rules. No I/O happens here; persistence and lookups go
//! through the ports.
//!
//! ## Components
//!
//! - `level`: `Level` and the queueable range 2..=5
//! - `participant`: `Handle`, `Participant`
//! - `queue`: `LevelQueues` (strict FIFO per level)
//! - `ledger`: `RetentionLedger` (append-only, running total)
//! - `policy`: `OrphanPolicy`, `AdvancementOutcome`

pub mod ledger;
pub mod level;
pub mod participant;
pub mod policy;
pub mod queue;

pub use ledger::{EntryKind, LedgerEntry, LedgerSnapshot, RetentionLedger};
pub use level::{Level, MAX_QUEUE_LEVEL, MIN_QUEUE_LEVEL};
pub use participant::{Handle, Participant};
pub use policy::{AdvancementOutcome, OrphanPolicy, OrphanReason, Promotion};
pub use queue::{LevelQueues, QueueEntry};
