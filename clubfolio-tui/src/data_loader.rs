//! Load the analysis the dashboard shows.
//!
//! The app talks to an [`AnalysisSource`] so tests can hand it prepared data
//! instead of a snapshot directory and price database.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use clubfolio_analysis::{analyse_history, load_history, load_prices, Analysis, HistoryFilter};
use clubfolio_core::config::Config;
use clubfolio_core::data::{PriceStore, PriceTable};
use clubfolio_core::SnapshotArchive;

/// One loaded analysis plus the local-currency closes behind it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub analysis: Analysis,
    pub prices: PriceTable,
}

pub trait AnalysisSource {
    /// Build the analysis for holdings on or after `start`.
    fn load(&self, start: NaiveDate) -> Result<Loaded>;

    /// Days shown either side of a trade in price charts.
    fn price_window_days(&self) -> i64;
}

/// Snapshot archive + SQLite price store, as configured.
pub struct ArchiveSource {
    config: Config,
}

impl ArchiveSource {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl AnalysisSource for ArchiveSource {
    fn load(&self, start: NaiveDate) -> Result<Loaded> {
        let mut filter = HistoryFilter::from_config(&self.config.analysis);
        filter.start = Some(start);

        let archive = SnapshotArchive::from_config(&self.config.storage);
        let history = load_history(&self.config, &archive, &filter)?;
        let store = PriceStore::open(&self.config.storage.price_db).with_context(|| {
            format!(
                "failed to open price database {}",
                self.config.storage.price_db.display()
            )
        })?;
        let prices = load_prices(&store, &history)?;
        let analysis = analyse_history(&history, &prices, &self.config)?;
        Ok(Loaded { analysis, prices })
    }

    fn price_window_days(&self) -> i64 {
        self.config.analysis.price_window_days
    }
}
