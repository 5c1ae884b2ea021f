//! Price corrections for splits that happened while a position was held.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Divide the stored buy price of an instrument when a split took effect
/// during the holding period.
///
/// The price database keeps unadjusted closes, so a holding opened before a
/// 10:1 split would otherwise show a -90% return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub instrument: String,
    pub divide_buy_price_by: f64,
    /// First trading day at the new price basis.
    pub effective: NaiveDate,
}

impl PriceAdjustment {
    pub fn defaults() -> Vec<PriceAdjustment> {
        vec![PriceAdjustment {
            instrument: "NVDA".into(),
            divide_buy_price_by: 10.0,
            effective: NaiveDate::from_ymd_opt(2024, 6, 10).expect("valid date"),
        }]
    }

    /// True when a holding bought on `buy_date` and last seen on `last_seen`
    /// straddles the split.
    pub fn applies(&self, instrument: &str, buy_date: NaiveDate, last_seen: NaiveDate) -> bool {
        self.instrument == instrument && buy_date < self.effective && self.effective <= last_seen
    }

    /// Adjusted buy price, or the input when the adjustment does not apply.
    pub fn adjust_buy_price(
        &self,
        instrument: &str,
        buy_date: NaiveDate,
        last_seen: NaiveDate,
        buy_price: f64,
    ) -> f64 {
        if self.applies(instrument, buy_date, last_seen) && self.divide_buy_price_by > 0.0 {
            buy_price / self.divide_buy_price_by
        } else {
            buy_price
        }
    }
}
