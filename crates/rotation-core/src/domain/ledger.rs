//! # Retention Ledger
//!
//! Append-only record of retained amounts plus a running total.
//!
//! ## Invariants
//!
//! - `running_total` always equals the sum of all entry amounts.
//! - Entries are never modified or removed once appended.
//! - Negative amounts are rejected before anything changes.

use crate::error::{RotationError, RotationResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of ledger movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Retention,
}

/// One immutable ledger line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: EntryKind,
    pub description: String,
}

/// Retention ledger state, persisted as
/// `{"running_total": "...", "entries": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionLedger {
    running_total: Decimal,
    entries: Vec<LedgerEntry>,
}

/// Read-only view handed to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub running_total: Decimal,
    pub entries: Vec<LedgerEntry>,
}

impl RetentionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a retention entry and bumps the running total.
    pub fn record(
        &mut self,
        date: NaiveDate,
        amount: Decimal,
        description: impl Into<String>,
    ) -> RotationResult<&LedgerEntry> {
        if amount < Decimal::ZERO {
            return Err(RotationError::LedgerInvariantViolation { amount });
        }
        let total = self
            .running_total
            .checked_add(amount)
            .ok_or(RotationError::LedgerInvariantViolation { amount })?;

        self.running_total = total;
        self.entries.push(LedgerEntry {
            date,
            amount,
            kind: EntryKind::Retention,
            description: description.into(),
        });

        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn running_total(&self) -> Decimal {
        self.running_total
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            running_total: self.running_total,
            entries: self.entries.clone(),
        }
    }

    /// Sum of all entry amounts, `None` if it does not fit a `Decimal`.
    pub fn entries_total(&self) -> Option<Decimal> {
        self.entries
            .iter()
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
    }

    pub fn is_consistent(&self) -> bool {
        self.entries_total() == Some(self.running_total)
    }

    /// Recomputes the running total from the entries.
    ///
    /// Returns `Ok(true)` when the stored total had drifted. Entries whose
    /// sum overflows cannot be repaired.
    pub fn repair_total(&mut self) -> RotationResult<bool> {
        let total = self
            .entries_total()
            .ok_or(RotationError::LedgerInvariantViolation {
                amount: Decimal::MAX,
            })?;
        let drifted = total != self.running_total;
        self.running_total = total;
        Ok(drifted)
    }
}
