//! Clubfolio analysis: holdings history, prices, returns and reports.
//!
//! This crate builds on `clubfolio-core` to provide:
//! - Corrected, filtered holdings history from the snapshot archive
//! - Quantity matrix and holding spans (buy date, last sighting)
//! - Price join in the base currency and per-investor value series
//! - Holding returns and time-weighted portfolio returns
//! - Recent trading activity
//! - JSON/CSV report export

pub mod activity;
pub mod error;
pub mod history;
pub mod holdings;
pub mod pricing;
pub mod report;
pub mod returns;

#[cfg(test)]
mod testutil;

pub use activity::{activity, recently_bought, recently_sold, trade_window, Activity};
pub use error::AnalysisError;
pub use history::{load_history, prepare_history, History, HistoryFilter, HistoryRow, HistoryStats};
pub use holdings::{holding_spans, quantity_matrix, HoldingSpan, QuantityMatrix};
pub use pricing::{base_prices, load_prices, value_series, InvestorSeries};
pub use report::{analyse, analyse_history, save_report, Analysis, InvestorSummary, SCHEMA_VERSION};
pub use returns::{holding_returns, sorted_by_return, time_weighted_returns, HoldingReturn, TimeWeightedReturn};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn analysis_is_send_sync() {
        assert_send::<Analysis>();
        assert_sync::<Analysis>();
    }

    #[test]
    fn history_is_send_sync() {
        assert_send::<History>();
        assert_sync::<History>();
        assert_send::<HistoryFilter>();
        assert_sync::<HistoryFilter>();
    }

    #[test]
    fn analysis_error_is_send_sync() {
        assert_send::<AnalysisError>();
        assert_sync::<AnalysisError>();
    }
}
