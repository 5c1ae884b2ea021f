//! Builders shared by the unit tests.

use chrono::NaiveDate;

use clubfolio_core::data::PriceTable;
use clubfolio_core::domain::{derive_ticker, ExchangeMap, Position};

use crate::history::{row, History, HistoryRow};

pub fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(day) - 1)
}

pub fn pos(investor: &str, instrument: &str, quantity: f64, opening_price: f64) -> Position {
    Position {
        investor: investor.into(),
        instrument: instrument.into(),
        quantity,
        opening_price,
        amount: quantity * opening_price,
        currency: "DKK".into(),
        exchange: "xcse".into(),
        ticker: derive_ticker(instrument, "xcse", &ExchangeMap::default()).unwrap_or_default(),
    }
}

/// History from `(day, investor, instrument, quantity)` rows, all in DKK.
pub fn history(rows: &[(u32, &str, &str, f64)]) -> History {
    let mut rows: Vec<HistoryRow> = rows
        .iter()
        .map(|(day, investor, instrument, qty)| row(d(*day), pos(investor, instrument, *qty, 100.0), 1.0))
        .collect();
    rows.sort_by(|a, b| (a.date, &a.investor, &a.instrument).cmp(&(b.date, &b.investor, &b.instrument)));
    History {
        rows,
        ..History::default()
    }
}

/// Prices from `(instrument, day, close)`.
pub fn prices(points: &[(&str, u32, f64)]) -> PriceTable {
    let mut table = PriceTable::new();
    for (instrument, day, close) in points {
        table.insert(instrument, d(*day), *close);
    }
    table
}
