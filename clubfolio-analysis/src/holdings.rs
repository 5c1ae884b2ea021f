//! Holdings reconstruction: quantities per day and holding spans.
//!
//! A holding is keyed by (investor, instrument). Its span runs from the first
//! snapshot that lists it to the last one. Re-buying an instrument after
//! selling it extends the same span, so one key has exactly one span.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use clubfolio_core::domain::HoldingKey;

use crate::history::History;

/// Quantity held per snapshot date and holding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityMatrix {
    pub dates: Vec<NaiveDate>,
    pub keys: Vec<HoldingKey>,
    /// `cells[date_index][key_index]`; `None` where the holding was not listed.
    cells: Vec<Vec<Option<f64>>>,
}

impl QuantityMatrix {
    pub fn get(&self, date_index: usize, key_index: usize) -> Option<f64> {
        self.cells.get(date_index)?.get(key_index).copied().flatten()
    }

    /// Listed holdings on one date with their quantity.
    pub fn holdings_on(&self, date_index: usize) -> impl Iterator<Item = (&HoldingKey, f64)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter_map(move |(k, key)| self.get(date_index, k).map(|q| (key, q)))
    }

    pub fn investors(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.keys.iter().map(|k| k.investor.as_str()).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

pub fn quantity_matrix(history: &History) -> QuantityMatrix {
    let dates = history.dates();
    let mut keys: Vec<HoldingKey> = history.rows.iter().map(|r| r.key()).collect();
    keys.sort();
    keys.dedup();

    let key_index: BTreeMap<&HoldingKey, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let date_index: BTreeMap<NaiveDate, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut cells = vec![vec![None; keys.len()]; dates.len()];
    for row in &history.rows {
        let key = row.key();
        let (Some(&di), Some(&ki)) = (date_index.get(&row.date), key_index.get(&key)) else {
            continue;
        };
        if cells[di][ki].is_some() {
            log::warn!("{key} listed twice on {}, keeping the later row", row.date);
        }
        cells[di][ki] = Some(row.quantity);
    }

    QuantityMatrix { dates, keys, cells }
}

/// First and last sighting of a holding plus its latest listed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSpan {
    pub investor: String,
    pub instrument: String,
    pub buy_date: NaiveDate,
    pub last_seen: NaiveDate,
    pub quantity: f64,
    pub opening_price: f64,
    pub amount: f64,
    pub currency: String,
    pub fx: f64,
    /// `amount × fx`, in the base currency.
    pub invested: f64,
    pub days: i64,
}

impl HoldingSpan {
    pub fn key(&self) -> HoldingKey {
        HoldingKey::new(&self.investor, &self.instrument)
    }

    /// Held on the latest snapshot with a positive quantity.
    pub fn is_open(&self, latest: NaiveDate) -> bool {
        self.quantity > 0.0 && self.last_seen == latest
    }
}

/// One span per holding, ordered by investor then instrument.
pub fn holding_spans(history: &History) -> Vec<HoldingSpan> {
    let mut spans: BTreeMap<HoldingKey, HoldingSpan> = BTreeMap::new();
    // rows are date-sorted, so the last write per key is the latest row
    for row in &history.rows {
        let span = spans.entry(row.key()).or_insert_with(|| HoldingSpan {
            investor: row.investor.clone(),
            instrument: row.instrument.clone(),
            buy_date: row.date,
            last_seen: row.date,
            quantity: 0.0,
            opening_price: 0.0,
            amount: 0.0,
            currency: String::new(),
            fx: 1.0,
            invested: 0.0,
            days: 0,
        });
        span.last_seen = row.date;
        span.quantity = row.quantity;
        span.opening_price = row.opening_price;
        span.amount = row.amount;
        span.currency = row.currency.clone();
        span.fx = row.fx;
    }

    spans
        .into_values()
        .map(|mut s| {
            s.invested = s.amount * s.fx;
            s.days = (s.last_seen - s.buy_date).num_days();
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{d, history};

    #[test]
    fn matrix_cells() {
        let h = history(&[
            (1, "A", "KO", 3.0),
            (1, "B", "PEP", 1.0),
            (2, "A", "KO", 4.0),
        ]);
        let m = quantity_matrix(&h);
        assert_eq!(m.dates, vec![d(1), d(2)]);
        assert_eq!(m.keys.len(), 2);
        assert_eq!(m.get(1, 0), Some(4.0));
        assert_eq!(m.get(1, 1), None);
        assert_eq!(m.holdings_on(0).count(), 2);
        assert_eq!(m.investors(), vec!["A", "B"]);
    }

    #[test]
    fn spans_take_first_and_last_sighting() {
        let h = history(&[
            (1, "A", "KO", 3.0),
            (2, "A", "KO", 3.0),
            (5, "A", "KO", 0.0),
            (5, "A", "PEP", 2.0),
        ]);
        let spans = holding_spans(&h);
        assert_eq!(spans.len(), 2);
        let ko = &spans[0];
        assert_eq!((ko.buy_date, ko.last_seen, ko.days), (d(1), d(5), 4));
        assert_eq!(ko.quantity, 0.0);
        assert!(!ko.is_open(d(5)));
        assert!(spans[1].is_open(d(5)));
        assert_eq!(spans[1].invested, 200.0);
    }

    #[test]
    fn disappeared_holding_is_closed() {
        let h = history(&[(1, "A", "KO", 3.0), (2, "A", "PEP", 1.0)]);
        let spans = holding_spans(&h);
        assert!(!spans[0].is_open(d(2)));
        assert_eq!(spans[0].quantity, 3.0);
    }

    #[test]
    fn rebuy_extends_the_span() {
        let h = history(&[(1, "A", "KO", 3.0), (2, "A", "PEP", 1.0), (3, "A", "KO", 2.0)]);
        let spans = holding_spans(&h);
        assert_eq!((spans[0].buy_date, spans[0].last_seen), (d(1), d(3)));
        assert_eq!(spans[0].quantity, 2.0);
    }
}
