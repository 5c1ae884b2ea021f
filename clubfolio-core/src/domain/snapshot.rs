use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ids::SnapshotHash;
use super::position::{DatedPosition, Position};

/// Every investor's holdings as published on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub positions: Vec<Position>,
}

impl Snapshot {
    pub fn new(date: NaiveDate, positions: Vec<Position>) -> Self {
        Self { date, positions }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Investors in order of first appearance (the page order).
    pub fn investors(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.positions
            .iter()
            .filter(|p| seen.insert(p.investor.as_str()))
            .map(|p| p.investor.as_str())
            .collect()
    }

    /// Distinct instruments, sorted.
    pub fn instruments(&self) -> BTreeSet<&str> {
        self.positions.iter().map(|p| p.instrument.as_str()).collect()
    }

    pub fn positions_of<'a>(&'a self, investor: &'a str) -> impl Iterator<Item = &'a Position> + 'a {
        self.positions.iter().filter(move |p| p.investor == investor)
    }

    /// Content hash independent of row order.
    ///
    /// Two scrapes of an unchanged page hash equal even when the site
    /// reorders its tables.
    pub fn fingerprint(&self) -> SnapshotHash {
        let mut lines: Vec<String> = self
            .positions
            .iter()
            .map(|p| {
                format!(
                    "{}|{}|{}|{}|{}|{}",
                    p.investor, p.instrument, p.quantity, p.opening_price, p.currency, p.exchange
                )
            })
            .collect();
        lines.sort();
        SnapshotHash::of_bytes(lines.join("\n").as_bytes())
    }

    pub fn into_dated(self) -> Vec<DatedPosition> {
        let date = self.date;
        self.positions.into_iter().map(|p| p.on(date)).collect()
    }
}
