//! Download orchestrator: incremental price updates for many instruments.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::provider::{DataError, DownloadProgress, PriceProvider};
use super::store::PriceStore;

/// An instrument and the ticker its prices are fetched under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriceTarget {
    pub instrument: String,
    pub ticker: String,
}

impl PriceTarget {
    pub fn new(instrument: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            ticker: ticker.into(),
        }
    }
}

/// Unique targets, one per instrument. When an instrument was seen under
/// several tickers the last one wins.
pub fn unique_targets<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<PriceTarget> {
    let mut by_instrument: BTreeMap<&str, &str> = BTreeMap::new();
    for (instrument, ticker) in pairs {
        if let Some(prev) = by_instrument.insert(instrument, ticker) {
            if prev != ticker {
                log::debug!("{instrument}: ticker {prev} replaced by {ticker}");
            }
        }
    }
    by_instrument
        .into_iter()
        .map(|(i, t)| PriceTarget::new(i, t))
        .collect()
}

/// Options for one download run.
#[derive(Debug, Clone, Copy)]
pub struct DownloadOptions {
    /// First date requested for instruments with nothing stored.
    pub default_start: NaiveDate,
    pub today: NaiveDate,
    /// Discard stored rows and fetch from `default_start` again.
    pub force: bool,
}

/// Fetch missing prices for each target and store them.
pub fn download_prices(
    provider: &dyn PriceProvider,
    store: &mut PriceStore,
    targets: &[PriceTarget],
    options: DownloadOptions,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = targets.len();
    let mut summary = DownloadSummary {
        total,
        ..DownloadSummary::default()
    };

    for (i, target) in targets.iter().enumerate() {
        progress.on_start(&target.instrument, i, total);
        let result = download_single(provider, store, target, options);
        progress.on_complete(&target.instrument, i, total, &result);

        match result {
            Ok(rows) => {
                summary.succeeded += 1;
                summary.rows_written += rows;
            }
            Err(e) => {
                summary.failed += 1;
                summary.errors.push((target.instrument.clone(), e));
            }
        }

        if !provider.is_available() {
            for rest in &targets[(i + 1)..] {
                summary.failed += 1;
                summary
                    .errors
                    .push((rest.instrument.clone(), DataError::CircuitBreakerTripped));
            }
            break;
        }
    }

    progress.on_batch_complete(summary.succeeded, summary.failed, total);
    summary
}

fn download_single(
    provider: &dyn PriceProvider,
    store: &mut PriceStore,
    target: &PriceTarget,
    options: DownloadOptions,
) -> Result<usize, DataError> {
    if target.ticker.is_empty() {
        return Err(DataError::MissingTicker {
            instrument: target.instrument.clone(),
        });
    }
    if options.force {
        // stored rows go only once the fresh fetch is in hand
        let bars = provider.fetch(&target.ticker, options.default_start, options.today)?;
        return store.replace(&target.instrument, &target.ticker, &bars);
    }
    let start = match store.last_date(&target.instrument)? {
        Some(last) => last.succ_opt().unwrap_or(last),
        None => options.default_start,
    };
    if start > options.today {
        return Ok(0);
    }
    let bars = provider.fetch(&target.ticker, start, options.today)?;
    store.upsert(&target.instrument, &target.ticker, &bars)
}

#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows_written: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{LogProgress, PriceBar};
    use std::cell::RefCell;

    struct FixedProvider {
        calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
        fail_on: Option<&'static str>,
        available: RefCell<bool>,
    }

    impl FixedProvider {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on,
                available: RefCell::new(true),
            }
        }
    }

    impl PriceProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(
            &self,
            ticker: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<PriceBar>, DataError> {
            self.calls.borrow_mut().push((ticker.to_string(), start, end));
            if Some(ticker) == self.fail_on {
                *self.available.borrow_mut() = false;
                return Err(DataError::CircuitBreakerTripped);
            }
            Ok(start
                .iter_days()
                .take_while(|d| *d <= end)
                .map(|date| PriceBar {
                    date,
                    close: 1.0,
                    adj_close: 1.0,
                    volume: 0,
                })
                .collect())
        }

        fn is_available(&self) -> bool {
            *self.available.borrow()
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn options(today: u32) -> DownloadOptions {
        DownloadOptions {
            default_start: d(1),
            today: d(today),
            force: false,
        }
    }

    #[test]
    fn unique_targets_keep_last_ticker() {
        let targets = unique_targets([
            ("GOMX", "GOMX-TR.ST"),
            ("KO", "KO"),
            ("GOMX", "GOMX.ST"),
        ]);
        assert_eq!(
            targets,
            vec![PriceTarget::new("GOMX", "GOMX.ST"), PriceTarget::new("KO", "KO")]
        );
    }

    #[test]
    fn second_run_is_incremental() {
        let provider = FixedProvider::new(None);
        let mut store = PriceStore::open_in_memory().unwrap();
        let targets = vec![PriceTarget::new("KO", "KO")];

        let first = download_prices(&provider, &mut store, &targets, options(3), &LogProgress);
        assert_eq!(first.rows_written, 3);
        let second = download_prices(&provider, &mut store, &targets, options(5), &LogProgress);
        assert_eq!(second.rows_written, 2);
        assert_eq!(provider.calls.borrow()[1].1, d(4));

        let third = download_prices(&provider, &mut store, &targets, options(5), &LogProgress);
        assert!(third.all_succeeded());
        assert_eq!(third.rows_written, 0);
        assert_eq!(provider.calls.borrow().len(), 2);
    }

    #[test]
    fn missing_ticker_fails_that_instrument_only() {
        let provider = FixedProvider::new(None);
        let mut store = PriceStore::open_in_memory().unwrap();
        let targets = vec![PriceTarget::new("TEST", ""), PriceTarget::new("KO", "KO")];
        let summary = download_prices(&provider, &mut store, &targets, options(2), &LogProgress);
        assert_eq!(summary.succeeded, 1);
        assert!(matches!(summary.errors[0].1, DataError::MissingTicker { .. }));
    }

    #[test]
    fn stops_once_provider_is_unavailable() {
        let provider = FixedProvider::new(Some("A"));
        let mut store = PriceStore::open_in_memory().unwrap();
        let targets = vec![
            PriceTarget::new("A", "A"),
            PriceTarget::new("B", "B"),
            PriceTarget::new("C", "C"),
        ];
        let summary = download_prices(&provider, &mut store, &targets, options(2), &LogProgress);
        assert_eq!(summary.failed, 3);
        assert_eq!(provider.calls.borrow().len(), 1);
    }

    #[test]
    fn force_refetches_from_default_start() {
        let provider = FixedProvider::new(None);
        let mut store = PriceStore::open_in_memory().unwrap();
        let targets = vec![PriceTarget::new("KO", "KO")];
        download_prices(&provider, &mut store, &targets, options(3), &LogProgress);
        let forced = DownloadOptions {
            force: true,
            ..options(3)
        };
        let summary = download_prices(&provider, &mut store, &targets, forced, &LogProgress);
        assert_eq!(summary.rows_written, 3);
        assert_eq!(provider.calls.borrow()[1].1, d(1));
    }

    #[test]
    fn failed_forced_fetch_keeps_stored_history() {
        let mut store = PriceStore::open_in_memory().unwrap();
        let targets = vec![PriceTarget::new("KO", "KO")];
        let ok = FixedProvider::new(None);
        download_prices(&ok, &mut store, &targets, options(3), &LogProgress);

        let failing = FixedProvider::new(Some("KO"));
        let forced = DownloadOptions {
            force: true,
            ..options(5)
        };
        let summary = download_prices(&failing, &mut store, &targets, forced, &LogProgress);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.last_date("KO").unwrap(), Some(d(3)));
        assert_eq!(store.coverage().unwrap()[0].rows, 3);
    }
}
