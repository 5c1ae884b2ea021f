//! Recent trades: holdings sold or bought within a trailing window.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use clubfolio_core::data::PriceTable;

use crate::returns::HoldingReturn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub window_days: i64,
    pub sold: Vec<HoldingReturn>,
    pub bought: Vec<HoldingReturn>,
}

fn window_start(end: NaiveDate, window_days: i64) -> NaiveDate {
    end.checked_sub_days(Days::new(window_days.max(0) as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// Closed holdings whose last sighting lies within `window_days` of the
/// latest last sighting.
pub fn recently_sold(returns: &[HoldingReturn], latest: NaiveDate, window_days: i64) -> Vec<HoldingReturn> {
    let Some(end) = returns.iter().map(|r| r.last_seen).max() else {
        return Vec::new();
    };
    let start = window_start(end, window_days);
    returns
        .iter()
        .filter(|r| !r.is_open(latest) && (start..=end).contains(&r.last_seen))
        .cloned()
        .collect()
}

/// Open holdings bought within `window_days` of the latest buy date.
pub fn recently_bought(returns: &[HoldingReturn], latest: NaiveDate, window_days: i64) -> Vec<HoldingReturn> {
    let open: Vec<&HoldingReturn> = returns.iter().filter(|r| r.is_open(latest)).collect();
    let Some(end) = open.iter().map(|r| r.buy_date).max() else {
        return Vec::new();
    };
    let start = window_start(end, window_days);
    open.into_iter()
        .filter(|r| (start..=end).contains(&r.buy_date))
        .cloned()
        .collect()
}

pub fn activity(returns: &[HoldingReturn], latest: NaiveDate, window_days: i64) -> Activity {
    Activity {
        window_days,
        sold: recently_sold(returns, latest, window_days),
        bought: recently_bought(returns, latest, window_days),
    }
}

/// Closes of `instrument` in `[from, to]`.
pub fn price_window(table: &PriceTable, instrument: &str, from: NaiveDate, to: NaiveDate) -> Vec<(NaiveDate, f64)> {
    table.window(instrument, from, to)
}

/// Prices around one trade, padded by `pad_days` on both sides.
///
/// Tables from [`load_prices`](crate::pricing::load_prices) are filled from
/// the history's first date, so the padding of an early trade is cut there.
pub fn trade_window(table: &PriceTable, trade: &HoldingReturn, pad_days: i64) -> Vec<(NaiveDate, f64)> {
    let pad = Days::new(pad_days.max(0) as u64);
    let from = trade.buy_date.checked_sub_days(pad).unwrap_or(trade.buy_date);
    let to = trade.last_seen.checked_add_days(pad).unwrap_or(trade.last_seen);
    price_window(table, &trade.instrument, from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::holding_spans;
    use crate::returns::holding_returns;
    use crate::testutil::{d, history, prices};

    fn returns() -> Vec<HoldingReturn> {
        let h = history(&[
            (1, "A", "OLD", 1.0),
            (2, "A", "KO", 1.0),
            (20, "A", "KO", 0.0),
            (18, "B", "GONE", 1.0),
            (5, "B", "EARLY", 1.0),
            (30, "B", "EARLY", 1.0),
            (25, "B", "NEW", 1.0),
            (30, "B", "NEW", 1.0),
        ]);
        holding_returns(&holding_spans(&h), &PriceTable::new(), &[])
    }

    fn names(rs: &[HoldingReturn]) -> Vec<&str> {
        rs.iter().map(|r| r.instrument.as_str()).collect()
    }

    #[test]
    fn sold_within_window_of_last_sale() {
        let sold = recently_sold(&returns(), d(30), 14);
        // latest last_seen is d(30) (open holdings); window is d(16)..=d(30)
        assert_eq!(names(&sold), vec!["KO", "GONE"]);
    }

    #[test]
    fn bought_within_window_of_last_buy() {
        let bought = recently_bought(&returns(), d(30), 14);
        // last open buy is d(25); EARLY (d5) is outside d(11)..=d(25)
        assert_eq!(names(&bought), vec!["NEW"]);
    }

    #[test]
    fn empty_inputs() {
        assert!(recently_sold(&[], d(1), 14).is_empty());
        assert!(recently_bought(&[], d(1), 14).is_empty());
    }

    #[test]
    fn trade_window_pads_both_sides() {
        let rs = returns();
        let ko = rs.iter().find(|r| r.instrument == "KO").unwrap();
        let table = prices(&[("KO", 1, 1.0), ("KO", 10, 2.0), ("KO", 25, 3.0), ("KO", 40, 4.0)]);
        let window = trade_window(&table, ko, 10);
        assert_eq!(window.iter().map(|(_, p)| *p).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn trade_window_stops_at_history_start() {
        let rs = returns();
        let ko = rs.iter().find(|r| r.instrument == "KO").unwrap();
        // d(1) is a lookback close before the history window d(2)..=d(20)
        let table = prices(&[("KO", 1, 1.0), ("KO", 10, 2.0)]).fill_calendar(d(2), d(20));
        let window = trade_window(&table, ko, 10);
        assert_eq!(window.first(), Some(&(d(2), 1.0)));
        assert_eq!(window.last(), Some(&(d(20), 2.0)));
        assert_eq!(window.len(), 19);
    }
}
