//! Turning raw table text into [`Position`] rows.

use chrono::NaiveDate;

use super::page::{InvestorTable, RawRow};
use crate::domain::{derive_ticker, ExchangeMap, Position, Snapshot};

/// Parse a Danish-formatted number: `.` groups thousands, `,` is the decimal
/// separator. Spaces and non-breaking spaces are ignored.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parts of an instrument cell such as `NOVOb:xcse. DKK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentCell {
    pub instrument: String,
    pub exchange: String,
    pub currency: String,
}

pub fn split_instrument_cell(cell: &str) -> InstrumentCell {
    let cell = cell.trim();
    let currency: String = {
        let chars: Vec<char> = cell.chars().collect();
        chars[chars.len().saturating_sub(3)..].iter().collect()
    };
    let without_currency = cell.replace(&format!(". {currency}"), "");
    let (instrument, exchange) = match without_currency.split_once(':') {
        Some((i, e)) => (i, e),
        None => (without_currency.as_str(), ""),
    };
    InstrumentCell {
        instrument: instrument.trim().to_string(),
        exchange: exchange.chars().filter(|c| !c.is_whitespace()).collect(),
        currency: currency.to_ascii_uppercase(),
    }
}

/// Reason a table row could not become a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub investor: String,
    pub cell: String,
    pub reason: String,
}

pub fn normalize_row(
    investor: &str,
    raw: &RawRow,
    exchanges: &ExchangeMap,
) -> Result<Position, SkippedRow> {
    let skip = |reason: String| SkippedRow {
        investor: investor.to_string(),
        cell: raw.instrument.clone(),
        reason,
    };
    let quantity = parse_number(&raw.quantity)
        .ok_or_else(|| skip(format!("bad quantity {:?}", raw.quantity)))?;
    let opening_price = parse_number(&raw.opening_price)
        .ok_or_else(|| skip(format!("bad opening price {:?}", raw.opening_price)))?;

    let parts = split_instrument_cell(&raw.instrument);
    if parts.instrument.is_empty() {
        return Err(skip("empty instrument".into()));
    }
    let ticker = match derive_ticker(&parts.instrument, &parts.exchange, exchanges) {
        Some(t) => t,
        None => {
            log::warn!(
                "{investor}: unknown exchange {:?} for {}, ticker left empty",
                parts.exchange,
                parts.instrument
            );
            String::new()
        }
    };

    Ok(Position {
        investor: investor.to_string(),
        instrument: parts.instrument,
        quantity,
        opening_price,
        amount: quantity * opening_price,
        currency: parts.currency,
        exchange: parts.exchange,
        ticker,
    })
}

/// Build the day's snapshot from parsed tables. Rows that fail to parse are
/// returned alongside instead of aborting the whole page.
pub fn normalize_tables(
    tables: &[InvestorTable],
    exchanges: &ExchangeMap,
    date: NaiveDate,
) -> (Snapshot, Vec<SkippedRow>) {
    let mut positions = Vec::new();
    let mut skipped = Vec::new();
    for table in tables {
        for raw in &table.rows {
            match normalize_row(&table.investor, raw, exchanges) {
                Ok(p) => positions.push(p),
                Err(s) => {
                    log::warn!("{}: skipping {:?}: {}", s.investor, s.cell, s.reason);
                    skipped.push(s);
                }
            }
        }
    }
    (Snapshot::new(date, positions), skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn danish_numbers() {
        assert_eq!(parse_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_number("712,4"), Some(712.4));
        assert_eq!(parse_number("1.000"), Some(1000.0));
        assert_eq!(parse_number("1\u{a0}000,5"), Some(1000.5));
        assert_eq!(parse_number("-3,5"), Some(-3.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn instrument_cell_parts() {
        let cell = split_instrument_cell("NOVOb:xcse. DKK");
        assert_eq!(
            cell,
            InstrumentCell {
                instrument: "NOVOb".into(),
                exchange: "xcse".into(),
                currency: "DKK".into(),
            }
        );
        let cell = split_instrument_cell(" GOMX_TR: xome. SEK ");
        assert_eq!(cell.instrument, "GOMX_TR");
        assert_eq!(cell.exchange, "xome");
        assert_eq!(cell.currency, "SEK");
    }

    #[test]
    fn cell_without_exchange() {
        let cell = split_instrument_cell("ABC. USD");
        assert_eq!(cell.instrument, "ABC");
        assert_eq!(cell.exchange, "");
    }

    #[test]
    fn row_gets_amount_and_raw_ticker() {
        let raw = RawRow {
            instrument: "NOVOb:xcse. DKK".into(),
            quantity: "25".into(),
            opening_price: "700,00".into(),
        };
        let p = normalize_row("Lars Persson", &raw, &ExchangeMap::default()).unwrap();
        assert_eq!(p.instrument, "NOVOb");
        assert_eq!(p.amount, 17_500.0);
        assert_eq!(p.ticker, "NOVOb.CO");
    }

    #[test]
    fn unknown_exchange_leaves_ticker_empty() {
        let raw = RawRow {
            instrument: "XYZ:xfoo. EUR".into(),
            quantity: "1".into(),
            opening_price: "1".into(),
        };
        let p = normalize_row("A", &raw, &ExchangeMap::default()).unwrap();
        assert_eq!(p.ticker, "");
        assert_eq!(p.exchange, "xfoo");
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let tables = vec![InvestorTable {
            investor: "Lau Svenssen".into(),
            rows: vec![
                RawRow {
                    instrument: "KO:xnys. USD".into(),
                    quantity: "3".into(),
                    opening_price: "60,10".into(),
                },
                RawRow {
                    instrument: "PEP:xnas. USD".into(),
                    quantity: "-".into(),
                    opening_price: "170".into(),
                },
            ],
        }];
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let (snapshot, skipped) = normalize_tables(&tables, &ExchangeMap::default(), date);
        assert_eq!(snapshot.positions.len(), 1);
        assert_eq!(snapshot.positions[0].ticker, "KO");
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].reason.contains("quantity"));
    }
}
