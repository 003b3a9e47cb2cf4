//! Orphan handling and advancement outcomes.

use super::{Handle, Level};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do with a dequeued entry whose participant or payout is missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Consume the entry and log a warning.
    #[default]
    Drop,
    /// Put the entry back at the tail of the same queue.
    Requeue,
    /// Consume the entry and raise an alert.
    Alert,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "requeue" => Ok(Self::Requeue),
            "alert" => Ok(Self::Alert),
            other => Err(format!("unknown orphan policy '{other}'")),
        }
    }
}

/// Why a dequeued entry could not be promoted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrphanReason {
    ParticipantNotFound,
    /// No payout for the participant's live level.
    PayoutNotFound { live_level: Level },
}

impl fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParticipantNotFound => write!(f, "participant not found"),
            Self::PayoutNotFound { live_level } => {
                write!(f, "no payout for live level {}", live_level)
            }
        }
    }
}

/// A completed promotion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Promotion {
    pub handle: Handle,
    /// Queue the entry was taken from.
    pub queue_level: Level,
    /// Participant level before promotion (drives the payout lookup).
    pub from_level: Level,
    pub to_level: Level,
    pub payout: Decimal,
    pub retained: Decimal,
    pub date: NaiveDate,
}

/// Result of one advancement on one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdvancementOutcome {
    Promoted(Promotion),
    /// Entry consumed without promotion (Drop or Alert policy).
    Discarded {
        level: Level,
        handle: Handle,
        reason: OrphanReason,
    },
    /// Entry moved to the tail of its queue (Requeue policy).
    Requeued {
        level: Level,
        handle: Handle,
        reason: OrphanReason,
    },
}

impl AdvancementOutcome {
    pub fn handle(&self) -> &Handle {
        match self {
            Self::Promoted(p) => &p.handle,
            Self::Discarded { handle, .. } | Self::Requeued { handle, .. } => handle,
        }
    }

    pub fn promotion(&self) -> Option<&Promotion> {
        match self {
            Self::Promoted(p) => Some(p),
            _ => None,
        }
    }
}
