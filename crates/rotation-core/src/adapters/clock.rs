//! Calendar sources.

use crate::ports::TimeSource;
use chrono::NaiveDate;
use parking_lot::Mutex;

/// UTC calendar day from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// Settable day for tests and replays.
#[derive(Debug)]
pub struct FixedTimeSource {
    day: Mutex<NaiveDate>,
}

impl FixedTimeSource {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: Mutex::new(day),
        }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock() = day;
    }

    /// Moves the clock forward by `days`.
    pub fn advance_days(&self, days: u64) {
        let mut day = self.day.lock();
        if let Some(next) = day.checked_add_days(chrono::Days::new(days)) {
            *day = next;
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn today(&self) -> NaiveDate {
        *self.day.lock()
    }
}
