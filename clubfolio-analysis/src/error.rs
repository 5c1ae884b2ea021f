use chrono::NaiveDate;
use thiserror::Error;

use clubfolio_core::data::DataError;
use clubfolio_core::SnapshotError;

/// Errors from building an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("snapshot archive: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("price data: {0}")]
    Prices(#[from] DataError),

    #[error("no holdings on or after {start} for the selected investors")]
    NoHistory { start: NaiveDate },

    #[error("unknown investor '{0}'")]
    UnknownInvestor(String),
}
