//! Property tests for holdings reconstruction and time-weighted returns.
//!
//! 1. Every holding key gets exactly one span, with buy_date <= last_seen
//! 2. An open span is always listed on the latest snapshot
//! 3. Flat prices give a zero time-weighted return

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeSet;

use clubfolio_analysis::history::row;
use clubfolio_analysis::{holding_spans, quantity_matrix, time_weighted_returns, History};
use clubfolio_core::data::PriceTable;
use clubfolio_core::domain::Position;

const INSTRUMENTS: [&str; 4] = ["KO", "PEP", "NOVO_B", "NVDA"];

fn day(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Days::new(u64::from(offset))
}

fn arb_rows() -> impl Strategy<Value = Vec<(u32, &'static str, &'static str, f64)>> {
    prop::collection::vec(
        (
            0u32..30,
            prop::sample::select(vec!["Anna", "Bo", "Carl"]),
            prop::sample::select(INSTRUMENTS.to_vec()),
            (0u32..50).prop_map(f64::from),
        ),
        1..60,
    )
}

fn build(rows: &[(u32, &str, &str, f64)]) -> History {
    let mut rows: Vec<_> = rows
        .iter()
        .map(|(offset, investor, instrument, qty)| {
            let position = Position {
                investor: investor.to_string(),
                instrument: instrument.to_string(),
                quantity: *qty,
                opening_price: 10.0,
                amount: qty * 10.0,
                currency: "DKK".into(),
                exchange: "xcse".into(),
                ticker: format!("{instrument}.CO"),
            };
            row(day(*offset), position, 1.0)
        })
        .collect();
    rows.sort_by(|a, b| (a.date, &a.investor, &a.instrument).cmp(&(b.date, &b.investor, &b.instrument)));
    History {
        rows,
        ..History::default()
    }
}

proptest! {
    #[test]
    fn one_span_per_holding(rows in arb_rows()) {
        let history = build(&rows);
        let spans = holding_spans(&history);
        let keys: BTreeSet<_> = history.rows.iter().map(|r| r.key()).collect();

        prop_assert_eq!(spans.len(), keys.len());
        for span in &spans {
            prop_assert!(span.buy_date <= span.last_seen);
            prop_assert_eq!(span.days, (span.last_seen - span.buy_date).num_days());
        }
    }

    #[test]
    fn open_spans_are_on_latest_snapshot(rows in arb_rows()) {
        let history = build(&rows);
        let latest = history.latest_date().unwrap();
        let listed: BTreeSet<_> = history
            .rows
            .iter()
            .filter(|r| r.date == latest)
            .map(|r| r.key())
            .collect();

        for span in holding_spans(&history).iter().filter(|s| s.is_open(latest)) {
            prop_assert!(listed.contains(&span.key()));
            prop_assert!(span.quantity > 0.0);
        }
    }

    #[test]
    fn flat_prices_give_zero_twr(rows in arb_rows(), close in 1.0..500.0_f64) {
        let history = build(&rows);
        let mut prices = PriceTable::new();
        for offset in 0..30 {
            for instrument in INSTRUMENTS {
                prices.insert(instrument, day(offset), close);
            }
        }

        let matrix = quantity_matrix(&history);
        for twr in time_weighted_returns(&matrix, &prices, &[]) {
            prop_assert!(twr.twr.abs() < 1e-9, "{} twr {}", twr.investor, twr.twr);
            prop_assert!(twr.periods >= 1);
        }
    }
}
