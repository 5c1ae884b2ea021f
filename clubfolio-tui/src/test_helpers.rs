//! Sample data sources for the unit tests.

use anyhow::{bail, Result};
use chrono::NaiveDate;

use clubfolio_analysis::history::row;
use clubfolio_analysis::{analyse_history, History};
use clubfolio_core::config::Config;
use clubfolio_core::data::PriceTable;
use clubfolio_core::domain::Position;

use crate::app::AppState;
use crate::data_loader::{AnalysisSource, Loaded};

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn position(investor: &str, instrument: &str, quantity: f64) -> Position {
    Position {
        investor: investor.into(),
        instrument: instrument.into(),
        quantity,
        opening_price: 100.0,
        amount: quantity * 100.0,
        currency: "DKK".into(),
        exchange: "xcse".into(),
        ticker: format!("{instrument}.CO"),
    }
}

/// Anna holds KO throughout; Bo sells PEP after the 8th and buys NEW on the 10th.
pub struct SampleSource;

impl AnalysisSource for SampleSource {
    fn load(&self, _start: NaiveDate) -> Result<Loaded> {
        let rows = vec![
            row(date(1), position("Anna", "KO", 2.0), 1.0),
            row(date(1), position("Bo", "PEP", 1.0), 1.0),
            row(date(8), position("Anna", "KO", 2.0), 1.0),
            row(date(8), position("Bo", "PEP", 1.0), 1.0),
            row(date(10), position("Anna", "KO", 2.0), 1.0),
            row(date(10), position("Bo", "NEW", 3.0), 1.0),
        ];
        let history = History {
            rows,
            ..History::default()
        };

        let mut prices = PriceTable::new();
        for (instrument, day, close) in [
            ("KO", 1, 50.0),
            ("KO", 8, 52.0),
            ("KO", 10, 55.0),
            ("PEP", 1, 10.0),
            ("PEP", 8, 12.0),
            ("NEW", 10, 7.0),
        ] {
            prices.insert(instrument, date(day), close);
        }
        let prices = prices.fill_calendar(date(1), date(10));

        let mut config = Config::default();
        config.analysis.activity_window_days = 3;
        let analysis = analyse_history(&history, &prices, &config)?;
        Ok(Loaded { analysis, prices })
    }

    fn price_window_days(&self) -> i64 {
        5
    }
}

pub struct FailingSource;

impl AnalysisSource for FailingSource {
    fn load(&self, start: NaiveDate) -> Result<Loaded> {
        bail!("no holdings on or after {start}")
    }

    fn price_window_days(&self) -> i64 {
        5
    }
}

pub fn app_with_sample() -> AppState {
    let mut app = AppState::new(Box::new(SampleSource), date(1));
    app.reload();
    app
}
