//! Naming corrections for instruments published by the club page.
//!
//! The page's symbols drift between scrape sessions (`NOVOb`, `NOVO-B`,
//! `NOVO_B`), instruments get delisted or split, and some listings cannot be
//! priced at their home venue. Corrections are an ordered rule list applied
//! to every row on load, so the CSV archive keeps exactly what the page
//! published.
//!
//! Rules run in list order. A `Split` must be followed by a rename of the
//! same instrument so that applying the list twice is a no-op.

pub mod adjust;
pub mod backfill;

pub use adjust::PriceAdjustment;
pub use backfill::{apply_backfills, Backfill};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::{derive_ticker, DatedPosition, ExchangeMap, Position};

/// One correction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Correction {
    /// Rename an instrument. The ticker is re-derived from the new name when
    /// the exchange is known.
    RenameInstrument { from: String, to: String },

    /// Force the listing used for pricing (e.g. a Milan ETF priced in Xetra).
    SetListing {
        instrument: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exchange: Option<String>,
        ticker: String,
    },

    /// Replace a ticker verbatim.
    RenameTicker { from: String, to: String },

    /// Reverse split: quantity is divided by `ratio`. The invested amount is
    /// what was paid and stays as published.
    Split { instrument: String, ratio: f64 },

    /// Drop every row of an instrument (delisted, unpriceable, unknown venue).
    Exclude {
        instrument: String,
        #[serde(default)]
        reason: String,
    },
}

/// What a rule did to one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Changed,
    Drop,
}

impl Correction {
    fn rename(from: &str, to: &str) -> Self {
        Correction::RenameInstrument {
            from: from.into(),
            to: to.into(),
        }
    }

    fn exclude(instrument: &str, reason: &str) -> Self {
        Correction::Exclude {
            instrument: instrument.into(),
            reason: reason.into(),
        }
    }

    /// The club's accumulated rule set, in the order it must run.
    pub fn defaults() -> Vec<Correction> {
        vec![
            Self::rename("AKERBP", "AKRBP"),
            Self::rename("ALKb", "ALK_B"),
            Self::rename("BEL", "BELCO"),
            Self::rename("ATOS", "ATO"),
            Self::rename("NOVOb", "NOVO_B"),
            Self::rename("NOVO-B", "NOVO_B"),
            Self::rename("NZYMb", "NZYM_B"),
            Self::rename("NZYM-B", "NZYM_B"),
            Self::rename("MAERSKb", "MAERSK_B"),
            // Milan listing of the clean-energy ETF has no price history
            Self::rename("INRGxmil", "IQQH"),
            Self::rename("INRG", "IQQH"),
            Correction::SetListing {
                instrument: "IQQH".into(),
                exchange: Some("xetr".into()),
                ticker: "IQQH.DE".into(),
            },
            Correction::Split {
                instrument: "GOMX_TR".into(),
                ratio: 3.0,
            },
            Self::rename("GOMX_TR", "GOMX"),
            Correction::RenameTicker {
                from: "GOMX-TR.ST".into(),
                to: "GOMX.ST".into(),
            },
            Self::rename("CARLb", "CARL_B"),
            Correction::RenameTicker {
                from: "CARLb.CO".into(),
                to: "CARL-B.CO".into(),
            },
            Self::exclude("VOYG", "delisted"),
            Self::exclude("EURN", "no price history"),
            Self::exclude("TEST", "unknown exchange"),
            Self::exclude("LOCK-A017", "unknown instrument"),
            Self::exclude("TEN_NEW", "share exchange"),
            Self::exclude("ALCC", "delisted"),
        ]
    }

    /// Apply this rule to one row.
    pub fn apply(&self, row: &mut Position, exchanges: &ExchangeMap) -> Outcome {
        match self {
            Correction::RenameInstrument { from, to } => {
                if row.instrument != *from {
                    return Outcome::Unchanged;
                }
                row.instrument = to.clone();
                if let Some(ticker) = derive_ticker(to, &row.exchange, exchanges) {
                    row.ticker = ticker;
                }
                Outcome::Changed
            }
            Correction::SetListing {
                instrument,
                exchange,
                ticker,
            } => {
                if row.instrument != *instrument {
                    return Outcome::Unchanged;
                }
                let already = row.ticker == *ticker
                    && exchange.as_ref().map_or(true, |e| row.exchange == *e);
                if already {
                    return Outcome::Unchanged;
                }
                if let Some(exchange) = exchange {
                    row.exchange = exchange.clone();
                }
                row.ticker = ticker.clone();
                Outcome::Changed
            }
            Correction::RenameTicker { from, to } => {
                if row.ticker != *from {
                    return Outcome::Unchanged;
                }
                row.ticker = to.clone();
                Outcome::Changed
            }
            Correction::Split { instrument, ratio } => {
                if row.instrument != *instrument || *ratio <= 0.0 {
                    return Outcome::Unchanged;
                }
                row.quantity /= ratio;
                Outcome::Changed
            }
            Correction::Exclude { instrument, .. } => {
                if row.instrument == *instrument {
                    Outcome::Drop
                } else {
                    Outcome::Unchanged
                }
            }
        }
    }

    /// Short human label for reports.
    pub fn describe(&self) -> String {
        match self {
            Correction::RenameInstrument { from, to } => format!("rename {from} -> {to}"),
            Correction::SetListing {
                instrument, ticker, ..
            } => format!("list {instrument} as {ticker}"),
            Correction::RenameTicker { from, to } => format!("ticker {from} -> {to}"),
            Correction::Split { instrument, ratio } => format!("split {instrument} 1:{ratio}"),
            Correction::Exclude { instrument, reason } if reason.is_empty() => {
                format!("exclude {instrument}")
            }
            Correction::Exclude { instrument, reason } => {
                format!("exclude {instrument} ({reason})")
            }
        }
    }
}

/// Rows that carry a [`Position`].
pub trait PositionRow {
    fn position(&self) -> &Position;
    fn position_mut(&mut self) -> &mut Position;
}

impl PositionRow for Position {
    fn position(&self) -> &Position {
        self
    }

    fn position_mut(&mut self) -> &mut Position {
        self
    }
}

impl PositionRow for DatedPosition {
    fn position(&self) -> &Position {
        &self.position
    }

    fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }
}

/// Per-rule effect of a correction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionReport {
    /// Rows touched by each rule, index-aligned with the rule list.
    pub touched: Vec<usize>,
    pub dropped: usize,
}

impl CorrectionReport {
    pub fn total_changed(&self) -> usize {
        self.touched.iter().sum()
    }
}

/// Run every rule over every row, dropping excluded rows.
pub fn apply_corrections<R: PositionRow>(
    rows: &mut Vec<R>,
    rules: &[Correction],
    exchanges: &ExchangeMap,
) -> CorrectionReport {
    let mut report = CorrectionReport {
        touched: vec![0; rules.len()],
        dropped: 0,
    };

    rows.retain_mut(|row| {
        for (i, rule) in rules.iter().enumerate() {
            match rule.apply(row.position_mut(), exchanges) {
                Outcome::Unchanged => {}
                Outcome::Changed => report.touched[i] += 1,
                Outcome::Drop => {
                    report.touched[i] += 1;
                    report.dropped += 1;
                    return false;
                }
            }
        }
        true
    });

    for (rule, count) in rules.iter().zip(&report.touched) {
        if *count > 0 {
            log::debug!("{}: {count} row(s)", rule.describe());
        }
    }

    report
}

/// Rule list problems that would break idempotence.
pub fn validate_rules(rules: &[Correction]) -> Result<(), ConfigError> {
    let invalid = |index: usize, reason: String| ConfigError::InvalidRule { index, reason };
    for (i, rule) in rules.iter().enumerate() {
        match rule {
            Correction::Split { instrument, ratio } => {
                if *ratio <= 0.0 || !ratio.is_finite() {
                    return Err(invalid(i, format!("split of {instrument} has invalid ratio {ratio}")));
                }
                let renamed_later = rules[i + 1..].iter().any(|r| {
                    matches!(r, Correction::RenameInstrument { from, .. } if from == instrument)
                });
                if !renamed_later {
                    return Err(invalid(
                        i,
                        format!("split of {instrument} must be followed by a rename of {instrument}"),
                    ));
                }
            }
            Correction::RenameInstrument { from, to } if from == to => {
                return Err(invalid(i, format!("rename of {from} to itself")));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::sample;

    fn corrected(instrument: &str, exchange: &str) -> Vec<Position> {
        let mut row = sample("Lars Persson", instrument, 30.0);
        row.exchange = exchange.into();
        row.ticker = derive_ticker(instrument, exchange, &ExchangeMap::default()).unwrap_or_default();
        let mut rows = vec![row];
        apply_corrections(&mut rows, &Correction::defaults(), &ExchangeMap::default());
        rows
    }

    #[test]
    fn share_class_suffixes_are_normalized() {
        assert_eq!(corrected("ALKb", "xcse")[0].instrument, "ALK_B");
        assert_eq!(corrected("NOVOb", "xcse")[0].instrument, "NOVO_B");
        assert_eq!(corrected("NOVO-B", "xcse")[0].instrument, "NOVO_B");
        assert_eq!(corrected("NZYM-B", "xcse")[0].instrument, "NZYM_B");
        assert_eq!(corrected("MAERSKb", "xcse")[0].instrument, "MAERSK_B");
    }

    #[test]
    fn rename_rederives_ticker() {
        let rows = corrected("ALKb", "xcse");
        assert_eq!(rows[0].ticker, "ALK-B.CO");
        let rows = corrected("CARLb", "xcse");
        assert_eq!(rows[0].instrument, "CARL_B");
        assert_eq!(rows[0].ticker, "CARL-B.CO");
    }

    #[test]
    fn milan_etf_is_priced_in_xetra() {
        let rows = corrected("INRGxmil", "xmil");
        assert_eq!(rows[0].instrument, "IQQH");
        assert_eq!(rows[0].exchange, "xetr");
        assert_eq!(rows[0].ticker, "IQQH.DE");
    }

    #[test]
    fn gomx_split_divides_quantity_once() {
        let rows = corrected("GOMX_TR", "xome");
        assert_eq!(rows[0].instrument, "GOMX");
        assert_eq!(rows[0].quantity, 10.0);
        assert_eq!(rows[0].amount, 3000.0);
        assert_eq!(rows[0].ticker, "GOMX.ST");
    }

    #[test]
    fn split_keeps_invested_amount() {
        let mut row = sample("Anders Bæk", "GOMX_TR", 3000.0);
        row.opening_price = 1.2;
        row.amount = 3600.0;
        let mut rows = vec![row];
        apply_corrections(&mut rows, &Correction::defaults(), &ExchangeMap::default());
        assert_eq!(rows[0].quantity, 1000.0);
        assert_eq!(rows[0].amount, 3600.0);
        assert_eq!(rows[0].opening_price, 1.2);
    }

    #[test]
    fn legacy_gomx_ticker_is_fixed_without_rename() {
        let mut row = sample("Lau Svenssen", "GOMX", 10.0);
        row.ticker = "GOMX-TR.ST".into();
        let mut rows = vec![row];
        apply_corrections(&mut rows, &Correction::defaults(), &ExchangeMap::default());
        assert_eq!(rows[0].ticker, "GOMX.ST");
    }

    #[test]
    fn excluded_instruments_are_dropped() {
        for name in ["VOYG", "EURN", "TEST", "LOCK-A017", "TEN_NEW", "ALCC"] {
            assert!(corrected(name, "xcse").is_empty(), "{name} should be dropped");
        }
    }

    #[test]
    fn clean_names_pass_through() {
        let rows = corrected("NVDA", "xnas");
        assert_eq!(rows[0].instrument, "NVDA");
        assert_eq!(rows[0].ticker, "NVDA");
        assert_eq!(rows[0].quantity, 30.0);
    }

    #[test]
    fn report_counts_touches_and_drops() {
        let mut rows = vec![
            sample("A", "ALKb", 1.0),
            sample("A", "VOYG", 1.0),
            sample("B", "NVDA", 1.0),
        ];
        let rules = Correction::defaults();
        let report = apply_corrections(&mut rows, &rules, &ExchangeMap::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.total_changed(), 2);
    }

    #[test]
    fn default_rules_validate() {
        assert!(validate_rules(&Correction::defaults()).is_ok());
    }

    #[test]
    fn split_without_rename_is_rejected() {
        let rules = vec![Correction::Split {
            instrument: "GOMX_TR".into(),
            ratio: 3.0,
        }];
        let err = validate_rules(&rules).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { index: 0, .. }));
    }

    #[test]
    fn self_rename_reports_its_position() {
        let rules = vec![
            Correction::rename("ALKb", "ALK_B"),
            Correction::rename("BEL", "BEL"),
        ];
        let err = validate_rules(&rules).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { index: 1, .. }));
        assert!(err.to_string().contains("rule 2"));
    }
}
