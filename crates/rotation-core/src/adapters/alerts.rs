//! Alert sinks for orphaned queue entries.

use crate::domain::{Handle, Level, OrphanReason};
use crate::ports::AlertSink;
use parking_lot::RwLock;
use tracing::error;

/// Emits an `error` event per orphaned entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn orphaned_entry(&self, level: Level, handle: &Handle, reason: &OrphanReason) {
        error!(
            level = level.value(),
            handle = %handle,
            "[rotation] 🚨 ALERT: queue entry discarded ({})",
            reason
        );
    }
}

/// Keeps every alert in memory.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: RwLock<Vec<(Level, Handle, OrphanReason)>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<(Level, Handle, OrphanReason)> {
        self.alerts.read().clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn orphaned_entry(&self, level: Level, handle: &Handle, reason: &OrphanReason) {
        self.alerts
            .write()
            .push((level, handle.clone(), reason.clone()));
    }
}
