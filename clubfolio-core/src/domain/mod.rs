//! Domain types: scraped positions, daily snapshots, exchanges and keys.

pub mod exchange;
pub mod ids;
pub mod position;
pub mod snapshot;

pub use exchange::{derive_ticker, ExchangeMap};
pub use ids::{HoldingKey, SnapshotHash};
pub use position::{DatedPosition, Position};
pub use snapshot::Snapshot;

/// Investor display name as shown on the club page.
pub type Investor = String;
