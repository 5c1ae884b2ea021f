//! Price data: provider abstraction, Yahoo client, SQLite store, downloads.

pub mod circuit_breaker;
pub mod download;
pub mod provider;
pub mod store;
pub mod table;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use download::{download_prices, unique_targets, DownloadOptions, DownloadSummary, PriceTarget};
pub use provider::{DataError, DownloadProgress, LogProgress, PriceBar, PriceProvider, StdoutProgress};
pub use store::{Coverage, PriceStore};
pub use table::PriceTable;
pub use yahoo::YahooProvider;
