//! clubfolio core: the club's holdings as data.
//!
//! - Domain types (positions, snapshots, holding keys, exchange suffixes)
//! - Configuration loaded from TOML
//! - Scraping the holdings page into a daily snapshot
//! - The CSV snapshot archive and day-to-day diffs
//! - Correction rules for the naming drift in the archive
//! - Price provider, SQLite price store and incremental downloads

pub mod archive;
pub mod config;
pub mod corrections;
pub mod data;
pub mod diff;
pub mod domain;
pub mod scrape;

pub use archive::{LoadReport, SnapshotArchive, SnapshotError};
pub use config::{Config, ConfigError};
