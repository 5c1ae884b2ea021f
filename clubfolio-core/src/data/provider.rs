//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over price sources so the download loop
//! can be driven by Yahoo in production and by a fixed table in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily close for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Errors from fetching or storing prices.
///
/// Displayable in both CLI and dashboard contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("ticker not found: {ticker}")]
    TickerNotFound { ticker: String },

    #[error("hard stop: price provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("instrument {instrument} has no ticker")]
    MissingTicker { instrument: String },

    #[error("price database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("cannot create {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("price error: {0}")]
    Other(String),
}

/// Source of daily prices.
pub trait PriceProvider {
    fn name(&self) -> &str;

    /// Daily bars for `ticker` over `[start, end]`, oldest first.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PriceBar>, DataError>;

    /// Whether the provider currently accepts requests.
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-instrument downloads.
pub trait DownloadProgress {
    fn on_start(&self, instrument: &str, index: usize, total: usize);

    /// `result` carries the number of bars stored.
    fn on_complete(
        &self,
        instrument: &str,
        index: usize,
        total: usize,
        result: &Result<usize, DataError>,
    );

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Prints progress lines to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, instrument: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {instrument}...", index + 1, total);
    }

    fn on_complete(
        &self,
        instrument: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, DataError>,
    ) {
        match result {
            Ok(0) => println!("  up to date: {instrument}"),
            Ok(n) => println!("  OK: {instrument} (+{n} days)"),
            Err(e) => println!("  FAIL: {instrument}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nPrice download complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress sink that only logs, for non-interactive callers.
pub struct LogProgress;

impl DownloadProgress for LogProgress {
    fn on_start(&self, instrument: &str, index: usize, total: usize) {
        log::debug!("[{}/{}] fetching {instrument}", index + 1, total);
    }

    fn on_complete(
        &self,
        instrument: &str,
        _index: usize,
        _total: usize,
        result: &Result<usize, DataError>,
    ) {
        if let Err(e) = result {
            log::warn!("{instrument}: {e}");
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        log::info!("price download: {succeeded}/{total} succeeded, {failed} failed");
    }
}
