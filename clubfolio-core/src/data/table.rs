//! In-memory close prices, keyed by instrument.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Daily closes per instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: &str, date: NaiveDate, close: f64) {
        self.series
            .entry(instrument.to_string())
            .or_default()
            .insert(date, close);
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn series(&self, instrument: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.series.get(instrument)
    }

    /// Close on exactly `date`.
    pub fn get(&self, instrument: &str, date: NaiveDate) -> Option<f64> {
        self.series.get(instrument)?.get(&date).copied()
    }

    /// Most recent close on or before `date`.
    pub fn on_or_before(&self, instrument: &str, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        self.series
            .get(instrument)?
            .range(..=date)
            .next_back()
            .map(|(d, p)| (*d, *p))
    }

    /// Every calendar day in `[from, to]` carrying the latest close at or
    /// before it. Days before an instrument's first close stay empty, so a
    /// weekend or holiday takes the preceding trading day's close.
    pub fn fill_calendar(&self, from: NaiveDate, to: NaiveDate) -> PriceTable {
        let mut filled = PriceTable::new();
        for (instrument, closes) in &self.series {
            let mut last = closes.range(..from).next_back().map(|(_, p)| *p);
            let mut out = BTreeMap::new();
            for day in from.iter_days().take_while(|d| *d <= to) {
                if let Some(p) = closes.get(&day) {
                    last = Some(*p);
                }
                if let Some(p) = last {
                    out.insert(day, p);
                }
            }
            if !out.is_empty() {
                filled.series.insert(instrument.clone(), out);
            }
        }
        filled
    }

    /// Closes of one instrument within `[from, to]`.
    pub fn window(&self, instrument: &str, from: NaiveDate, to: NaiveDate) -> Vec<(NaiveDate, f64)> {
        self.series
            .get(instrument)
            .map(|s| s.range(from..=to).map(|(d, p)| (*d, *p)).collect())
            .unwrap_or_default()
    }
}
