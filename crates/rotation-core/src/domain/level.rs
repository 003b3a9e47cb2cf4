//! Participant levels.
//!
//! Level 1 is entry-only. Levels 2..=5 each own a FIFO queue. Promotion past
//! level 5 is allowed; such participants simply cannot queue again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest level that owns a queue.
pub const MIN_QUEUE_LEVEL: u32 = 2;

/// Highest level that owns a queue.
pub const MAX_QUEUE_LEVEL: u32 = 5;

/// Integer tier of a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u32);

impl Level {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this level owns a queue.
    pub const fn is_queueable(self) -> bool {
        self.0 >= MIN_QUEUE_LEVEL && self.0 <= MAX_QUEUE_LEVEL
    }

    /// The level reached by one promotion.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Queueable levels in ascending order.
    pub fn queue_levels() -> impl Iterator<Item = Level> {
        (MIN_QUEUE_LEVEL..=MAX_QUEUE_LEVEL).map(Level)
    }
}

impl From<u32> for Level {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
