//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for the flat-file deployment and for tests.

mod alerts;
mod clock;
mod json_store;
mod lock;
mod memory_store;
mod registry;
mod schedule;

pub use alerts::{RecordingAlertSink, TracingAlertSink};
pub use clock::{FixedTimeSource, SystemTimeSource};
pub use json_store::JsonFilePoolStore;
pub use lock::{DataDirLock, LockError};
pub use memory_store::InMemoryPoolStore;
pub use registry::{InMemoryRegistry, JsonFileRegistry};
pub use schedule::PayoutTable;
