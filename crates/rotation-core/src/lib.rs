//! # Rotation Pool Engine
//!
//! Multi-level rotation pool: participants wait in per-level FIFO queues
//! (levels 2..=5), a periodic scheduler promotes the head of each queue by
//! one level, and a fixed share of every payout is withheld into an
//! append-only retention ledger.
//!
//! ## Architecture
//!
//! ```text
//! API layer ── enqueue / join / snapshots ──→ RotationService ─┐
//!           └─ manual trigger ─────────────────────────────────┤
//!                                                              ├──→ AdvancementEngine
//! RotationScheduler ── every tick, levels 2→5 ─────────────────┘        │
//!                                                                       ↓
//!                                  SharedPool (queues + ledger, one lock)
//!                                        │                       │
//!                                   PoolStore              ParticipantRegistry
//! ```
//!
//! Scheduled and manual advancement share one engine, so retention is
//! recorded for every promotion no matter how it was triggered.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Strict FIFO | Only the head of a queue is ever promoted |
//! | 2 | Unique Membership | A handle appears at most once per level queue |
//! | 3 | Ledger Consistency | Running total equals the sum of entry amounts |
//! | 4 | Append Only | Ledger entries are never changed or removed |
//! | 5 | Non-negative Amounts | Negative retention is rejected before persistence |
//! | 6 | Single Increment | One advancement raises the level by exactly one |
//! | 7 | Atomic Advancement | Dequeue, ledger entry and promotion commit together or not at all |
//! | 8 | Mutual Exclusion | Enqueue, tick and manual trigger never interleave |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Levels, queues, ledger, orphan policy (no I/O)
//! - `ports/` - Inbound API and outbound registry/schedule/store traits
//! - `adapters/` - JSON file and in-memory implementations of the ports
//! - `pool.rs` - Lock-guarded cache over the store, commit and revert
//! - `engine.rs` - The advancement algorithm
//! - `service.rs` - `RotationApi` implementation
//! - `scheduler.rs` - Periodic task with cooperative shutdown
//!
//! ## Usage
//!
//! ```ignore
//! use rotation_core::*;
//!
//! let engine = Arc::new(AdvancementEngine::new(
//!     RotationConfig::default(),
//!     Arc::new(JsonFilePoolStore::in_dir(&data_dir)),
//!     Arc::new(JsonFileRegistry::open(data_dir.join(JsonFileRegistry::FILE)).await),
//!     Arc::new(PayoutTable::load(&data_dir.join(PayoutTable::FILE)).await),
//!     Arc::new(TracingAlertSink),
//!     Arc::new(SystemTimeSource),
//! ));
//!
//! let service = RotationService::new(Arc::clone(&engine));
//! service.enqueue_participant("bob".into(), Level::new(3)).await?;
//!
//! let handle = RotationScheduler::new(engine, SchedulerConfig::default()).start();
//! // ...
//! handle.shutdown().await;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod pool;
pub mod ports;
pub mod scheduler;
pub mod service;

// Re-export key types for convenience
pub use config::{ConfigValidationError, RotationConfig, SchedulerConfig};
pub use domain::{
    AdvancementOutcome, EntryKind, Handle, LedgerEntry, LedgerSnapshot, Level, LevelQueues,
    OrphanPolicy, OrphanReason, Participant, Promotion, QueueEntry, RetentionLedger,
};
pub use engine::AdvancementEngine;
pub use error::{RotationError, RotationResult};
pub use pool::SharedPool;
pub use ports::inbound::{ParticipantStatus, RotationApi};
pub use ports::outbound::{AlertSink, ParticipantRegistry, PayoutSchedule, PoolStore, TimeSource};
pub use scheduler::{LevelTick, RotationScheduler, SchedulerHandle, TickReport};
pub use service::RotationService;

// Re-export adapters
pub use adapters::{
    DataDirLock, FixedTimeSource, InMemoryPoolStore, InMemoryRegistry, JsonFilePoolStore,
    JsonFileRegistry, LockError, PayoutTable, RecordingAlertSink, SystemTimeSource,
    TracingAlertSink,
};
