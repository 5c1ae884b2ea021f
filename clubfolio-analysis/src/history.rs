//! Corrected holdings history: every archived row, cleaned and filtered.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use clubfolio_core::config::{AnalysisConfig, Config};
use clubfolio_core::corrections::{apply_backfills, apply_corrections};
use clubfolio_core::data::{unique_targets, PriceTarget};
use clubfolio_core::domain::{DatedPosition, Position};
use clubfolio_core::SnapshotArchive;

use crate::error::AnalysisError;

/// A dated row with the conversion rate into the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(flatten)]
    pub row: DatedPosition,
    pub fx: f64,
}

impl std::ops::Deref for HistoryRow {
    type Target = DatedPosition;

    fn deref(&self) -> &DatedPosition {
        &self.row
    }
}

/// Which rows to keep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub start: Option<NaiveDate>,
    /// Empty keeps every investor.
    pub investors: Vec<String>,
}

impl HistoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_config(analysis: &AnalysisConfig) -> Self {
        Self {
            start: Some(analysis.start_date),
            investors: analysis.investors.clone(),
        }
    }

    /// Restrict to one configured investor, matched case-insensitively.
    pub fn only(analysis: &AnalysisConfig, investor: &str) -> Result<Self, AnalysisError> {
        let name = analysis
            .investors
            .iter()
            .find(|i| i.to_lowercase() == investor.to_lowercase())
            .ok_or_else(|| AnalysisError::UnknownInvestor(investor.to_string()))?;
        Ok(Self {
            start: Some(analysis.start_date),
            investors: vec![name.clone()],
        })
    }

    fn keeps_investor(&self, investor: &str) -> bool {
        self.investors.is_empty() || self.investors.iter().any(|i| i == investor)
    }
}

/// What happened to the raw rows on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub files_read: usize,
    pub files_skipped: usize,
    pub raw_rows: usize,
    /// Rule applications that changed a row (a row can count more than once).
    pub corrected: usize,
    pub excluded: usize,
    pub backfilled: usize,
    pub other_investors: usize,
    pub before_start: usize,
    /// Rows dropped because their currency has no configured rate.
    pub unknown_currency: BTreeMap<String, usize>,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    /// Sorted by (date, investor, instrument).
    pub rows: Vec<HistoryRow>,
    pub stats: HistoryStats,
}

impl History {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct snapshot dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.dedup();
        dates
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Investors in order of first appearance.
    pub fn investors(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.investor.as_str()))
            .map(|r| r.investor.clone())
            .collect()
    }

    pub fn instruments(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.instrument.as_str()).collect()
    }

    /// One (instrument, ticker) per instrument, for price downloads.
    pub fn price_targets(&self) -> Vec<PriceTarget> {
        unique_targets(
            self.rows
                .iter()
                .map(|r| (r.instrument.as_str(), r.ticker.as_str())),
        )
    }

    /// Latest FX rate seen per instrument.
    pub fn instrument_fx(&self) -> BTreeMap<String, f64> {
        self.rows
            .iter()
            .map(|r| (r.instrument.clone(), r.fx))
            .collect()
    }
}

/// Load the archive and run it through [`prepare_history`].
pub fn load_history(
    config: &Config,
    archive: &SnapshotArchive,
    filter: &HistoryFilter,
) -> Result<History, AnalysisError> {
    let (rows, report) = archive.load_all()?;
    let mut history = prepare_history(rows, config, filter);
    history.stats.files_read = report.files_read;
    history.stats.files_skipped = report.skipped.len();
    if let (Some(start), true) = (filter.start, history.is_empty()) {
        return Err(AnalysisError::NoHistory { start });
    }
    Ok(history)
}

/// Correct, backfill, filter and price-convert raw archive rows.
pub fn prepare_history(
    mut rows: Vec<DatedPosition>,
    config: &Config,
    filter: &HistoryFilter,
) -> History {
    let mut stats = HistoryStats {
        raw_rows: rows.len(),
        ..HistoryStats::default()
    };

    let report = apply_corrections(&mut rows, &config.corrections, &config.exchanges);
    stats.corrected = report.total_changed() - report.dropped;
    stats.excluded = report.dropped;
    stats.backfilled = apply_backfills(&mut rows, &config.backfills);

    let before = rows.len();
    rows.retain(|r| filter.keeps_investor(&r.investor));
    stats.other_investors = before - rows.len();

    if let Some(start) = filter.start {
        let before = rows.len();
        rows.retain(|r| r.date >= start);
        stats.before_start = before - rows.len();
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match config.fx.rate(&row.currency) {
            Some(fx) => out.push(HistoryRow { row, fx }),
            None => {
                *stats
                    .unknown_currency
                    .entry(row.currency.clone())
                    .or_insert(0) += 1;
            }
        }
    }
    for (currency, count) in &stats.unknown_currency {
        log::warn!("dropped {count} row(s) in {currency:?}: no FX rate configured");
    }

    out.sort_by(|a, b| {
        (a.date, &a.investor, &a.instrument).cmp(&(b.date, &b.investor, &b.instrument))
    });
    stats.rows = out.len();
    log::info!(
        "history: {} rows over {} days ({} corrected, {} excluded, {} backfilled)",
        stats.rows,
        out.iter().map(|r| r.date).collect::<BTreeSet<_>>().len(),
        stats.corrected,
        stats.excluded,
        stats.backfilled
    );
    History { rows: out, stats }
}

/// Build a dated row. Used by tests and benches that synthesise history.
pub fn row(date: NaiveDate, position: Position, fx: f64) -> HistoryRow {
    HistoryRow {
        row: position.on(date),
        fx,
    }
}
