//! Participants as seen by the rotation engine.
//!
//! The registry owns these records; only the advancement engine mutates the
//! level and last-advancement date.

use super::Level;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique participant handle.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Handle {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Handle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry record of a participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub handle: Handle,
    pub level: Level,
    /// Date of the most recent promotion, if any.
    #[serde(default)]
    pub last_advanced: Option<NaiveDate>,
}

impl Participant {
    /// A freshly registered participant at level 1.
    pub fn new(handle: impl Into<Handle>) -> Self {
        Self {
            handle: handle.into(),
            level: Level::new(1),
            last_advanced: None,
        }
    }

    pub fn at_level(mut self, level: u32) -> Self {
        self.level = Level::new(level);
        self
    }
}
