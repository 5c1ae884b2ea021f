//! Property tests for correction rules and ticker derivation.
//!
//! 1. Applying the default rule set twice equals applying it once
//! 2. Corrections never invent rows and never touch investors or dates
//! 3. Derived tickers never contain `_` and carry the exchange suffix

use chrono::NaiveDate;
use proptest::prelude::*;

use clubfolio_core::corrections::{apply_corrections, Correction};
use clubfolio_core::domain::{derive_ticker, DatedPosition, ExchangeMap, Position};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_instrument() -> impl Strategy<Value = String> {
    prop_oneof![
        // names the default rules know about
        prop::sample::select(vec![
            "AKERBP", "ALKb", "BEL", "ATOS", "NOVOb", "NOVO-B", "NOVO_B", "NZYMb", "NZYM-B",
            "MAERSKb", "INRGxmil", "INRG", "IQQH", "GOMX_TR", "GOMX", "CARLb", "VOYG", "EURN",
            "TEST", "TEN_NEW", "ALCC",
        ])
        .prop_map(String::from),
        "[A-Z]{2,5}(_[A-Z])?",
    ]
}

fn arb_exchange() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["xcse", "xnas", "xome", "xmil", "xetr", "xosl", "xfoo"])
        .prop_map(String::from)
}

fn arb_row() -> impl Strategy<Value = DatedPosition> {
    (
        prop::sample::select(vec!["Lars Persson", "Lau Svenssen", "Anders Bæk"]),
        arb_instrument(),
        arb_exchange(),
        1u32..5000,
        (1.0..2000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0),
        0u32..60,
    )
        .prop_map(|(investor, instrument, exchange, qty, price, offset)| {
            let map = ExchangeMap::default();
            let ticker = derive_ticker(&instrument, &exchange, &map).unwrap_or_default();
            let quantity = qty as f64;
            Position {
                investor: investor.into(),
                instrument,
                quantity,
                opening_price: price,
                amount: quantity * price,
                currency: "DKK".into(),
                exchange,
                ticker,
            }
            .on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(offset as u64))
        })
}

// ── 1 + 2. Corrections ───────────────────────────────────────────────

proptest! {
    #[test]
    fn default_corrections_are_idempotent(rows in prop::collection::vec(arb_row(), 0..40)) {
        let map = ExchangeMap::default();
        let rules = Correction::defaults();

        let mut once = rows.clone();
        apply_corrections(&mut once, &rules, &map);
        let mut twice = once.clone();
        let second = apply_corrections(&mut twice, &rules, &map);

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(second.dropped, 0);
        prop_assert_eq!(second.total_changed(), 0);
    }

    #[test]
    fn corrections_keep_row_identity(rows in prop::collection::vec(arb_row(), 0..40)) {
        let map = ExchangeMap::default();
        let mut corrected = rows.clone();
        let report = apply_corrections(&mut corrected, &Correction::defaults(), &map);

        prop_assert_eq!(corrected.len() + report.dropped, rows.len());
        // retain keeps order, so surviving rows line up with the originals in sequence
        let mut originals = rows.iter();
        for row in &corrected {
            let original = originals
                .by_ref()
                .find(|o| o.date == row.date && o.investor == row.investor && o.opening_price == row.opening_price);
            prop_assert!(original.is_some());
        }
    }
}

// ── 3. Ticker derivation ─────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_tickers_use_dashes_and_suffix(
        instrument in "[A-Z]{1,6}(_[A-Z0-9]{1,2})?",
        exchange in arb_exchange(),
    ) {
        let map = ExchangeMap::default();
        match (derive_ticker(&instrument, &exchange, &map), map.suffix(&exchange)) {
            (Some(ticker), Some(suffix)) => {
                prop_assert!(!ticker.contains('_'));
                prop_assert!(ticker.ends_with(suffix));
                prop_assert_eq!(ticker.len(), instrument.len() + suffix.len());
            }
            (None, None) => {}
            (t, s) => prop_assert!(false, "ticker {:?} vs suffix {:?}", t, s),
        }
    }
}
