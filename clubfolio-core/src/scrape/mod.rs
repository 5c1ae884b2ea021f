//! Scraping the club's holdings page into a [`Snapshot`].

pub mod fetch;
pub mod html;
pub mod normalize;
pub mod page;

pub use fetch::fetch_page;
pub use normalize::{normalize_row, normalize_tables, parse_number, split_instrument_cell, SkippedRow};
pub use page::{parse_page, InvestorTable, RawRow};

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::SourceConfig;
use crate::domain::{ExchangeMap, Snapshot};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} answered HTTP {status}")]
    Http { url: String, status: u16 },

    #[error("no holdings tables found on the page")]
    NoTables,

    #[error("found {investors} investor headings but {tables} holdings tables")]
    InvestorTableMismatch { investors: usize, tables: usize },

    #[error("table {table} has no {column} column")]
    MissingColumn { table: usize, column: String },
}

/// A parsed page plus the rows that could not be used.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedRow>,
}

/// Parse already-downloaded HTML into the snapshot for `date`.
pub fn snapshot_from_html(
    html: &str,
    exchanges: &ExchangeMap,
    date: NaiveDate,
) -> Result<ScrapeOutcome, ScrapeError> {
    let tables = parse_page(html)?;
    let (snapshot, skipped) = normalize_tables(&tables, exchanges, date);
    log::info!(
        "parsed {} positions for {} investors ({} rows skipped)",
        snapshot.positions.len(),
        tables.len(),
        skipped.len()
    );
    Ok(ScrapeOutcome { snapshot, skipped })
}

/// Fetch and parse the live page.
pub fn scrape(
    source: &SourceConfig,
    exchanges: &ExchangeMap,
    date: NaiveDate,
) -> Result<ScrapeOutcome, ScrapeError> {
    let html = fetch_page(source)?;
    snapshot_from_html(&html, exchanges, date)
}
