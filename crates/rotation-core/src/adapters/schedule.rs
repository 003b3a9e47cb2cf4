//! Payout schedule table.

use super::json_store::read_json_or_default;
use crate::domain::Level;
use crate::ports::PayoutSchedule;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// One row of `payouts.json`: `{"level": 2, "amount": 100}`.
#[derive(Debug, Deserialize)]
struct PayoutRow {
    level: Level,
    amount: Decimal,
}

/// Fixed level -> payout mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PayoutTable {
    payouts: BTreeMap<Level, Decimal>,
}

impl PayoutTable {
    pub const FILE: &'static str = "payouts.json";

    pub fn new(payouts: impl IntoIterator<Item = (Level, Decimal)>) -> Self {
        Self {
            payouts: payouts.into_iter().collect(),
        }
    }

    pub fn with_payout(mut self, level: u32, amount: Decimal) -> Self {
        self.payouts.insert(Level::new(level), amount);
        self
    }

    /// Loads the table from a JSON array of `{level, amount}` rows.
    ///
    /// A missing or unreadable file yields an empty table; rows with a
    /// negative amount are skipped.
    pub async fn load(path: &Path) -> Self {
        let rows: Vec<PayoutRow> = read_json_or_default(path).await;
        let mut table = Self::default();
        for row in rows {
            if row.amount < Decimal::ZERO {
                warn!(
                    "[rotation] ⚠️ Skipping negative payout {} for level {}",
                    row.amount, row.level
                );
                continue;
            }
            table.payouts.insert(row.level, row.amount);
        }
        info!(
            "[rotation] 💰 Payout schedule has {} levels",
            table.payouts.len()
        );
        table
    }

    pub fn len(&self) -> usize {
        self.payouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }
}

impl PayoutSchedule for PayoutTable {
    fn get_payout(&self, level: Level) -> Option<Decimal> {
        self.payouts.get(&level).copied()
    }
}
