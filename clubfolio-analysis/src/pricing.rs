//! Joining holdings with prices in the base currency.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use clubfolio_core::data::{PriceStore, PriceTable};

use crate::error::AnalysisError;
use crate::history::History;
use crate::holdings::QuantityMatrix;

/// How far before the first history date closes are loaded, so the first
/// calendar days can be filled from an earlier trading day.
const LOOKBACK_DAYS: u64 = 14;

/// Calendar-filled local-currency closes for every instrument in `history`.
pub fn load_prices(store: &PriceStore, history: &History) -> Result<PriceTable, AnalysisError> {
    let (Some(first), Some(last)) = (history.first_date(), history.latest_date()) else {
        return Ok(PriceTable::new());
    };
    let instruments: Vec<&str> = history.instruments().into_iter().collect();
    let from = first.checked_sub_days(Days::new(LOOKBACK_DAYS)).unwrap_or(first);
    let raw = store.load_closes(&instruments, from, last)?;
    let missing: Vec<&str> = instruments
        .iter()
        .copied()
        .filter(|i| raw.series(i).is_none())
        .collect();
    if !missing.is_empty() {
        log::warn!("no stored prices for {}", missing.join(", "));
    }
    Ok(raw.fill_calendar(first, last))
}

/// Prices converted with each instrument's FX rate. Instruments without a
/// rate are left out.
pub fn base_prices(table: &PriceTable, fx: &BTreeMap<String, f64>) -> PriceTable {
    let mut out = PriceTable::new();
    for instrument in table.instruments() {
        let Some(rate) = fx.get(instrument) else {
            log::debug!("{instrument}: no FX rate, left out of base prices");
            continue;
        };
        if let Some(series) = table.series(instrument) {
            for (date, close) in series {
                out.insert(instrument, *date, close * rate);
            }
        }
    }
    out
}

/// Daily portfolio value of one investor in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorSeries {
    pub investor: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl InvestorSeries {
    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }
}

/// Σ quantity × base price per investor per snapshot date. Holdings without a
/// price that day are skipped; a day with no priced holding gets no point.
pub fn value_series(matrix: &QuantityMatrix, base: &PriceTable) -> Vec<InvestorSeries> {
    let mut by_investor: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for (di, date) in matrix.dates.iter().enumerate() {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for (key, quantity) in matrix.holdings_on(di) {
            if let Some(price) = base.get(&key.instrument, *date) {
                *totals.entry(key.investor.as_str()).or_insert(0.0) += quantity * price;
            }
        }
        for (investor, total) in totals {
            by_investor.entry(investor).or_default().push((*date, total));
        }
    }
    by_investor
        .into_iter()
        .map(|(investor, points)| InvestorSeries {
            investor: investor.to_string(),
            points,
        })
        .collect()
}
