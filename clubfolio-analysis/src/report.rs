//! The full analysis bundle and its exports.
//!
//! - **JSON**: the whole [`Analysis`], with a `schema_version` checked on load
//! - **CSV**: holding returns and the per-investor value series
//!
//! `save_report` writes all three into a timestamped directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use clubfolio_core::config::Config;
use clubfolio_core::data::{PriceStore, PriceTable};
use clubfolio_core::SnapshotArchive;

use crate::activity::{activity, Activity};
use crate::error::AnalysisError;
use crate::history::{load_history, History, HistoryFilter, HistoryStats};
use crate::holdings::{holding_spans, quantity_matrix};
use crate::pricing::{base_prices, load_prices, value_series, InvestorSeries};
use crate::returns::{holding_returns, time_weighted_returns, HoldingReturn, TimeWeightedReturn};

pub const SCHEMA_VERSION: u32 = 1;

/// Everything the CLI and dashboard show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub schema_version: u32,
    pub start: NaiveDate,
    pub latest: NaiveDate,
    pub base_currency: String,
    pub investors: Vec<String>,
    pub stats: HistoryStats,
    /// One per holding, ordered by investor then instrument.
    pub returns: Vec<HoldingReturn>,
    pub values: Vec<InvestorSeries>,
    pub twr: Vec<TimeWeightedReturn>,
    pub activity: Activity,
    /// Instruments held in the period with no stored prices.
    pub unpriced: Vec<String>,
}

/// Per-investor totals over open holdings.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestorSummary {
    pub investor: String,
    pub open_holdings: usize,
    pub invested: f64,
    pub profit: f64,
    pub value: Option<f64>,
    pub twr: Option<f64>,
}

impl Analysis {
    /// Open holdings of one investor, largest investment first.
    pub fn open_holdings(&self, investor: &str) -> Vec<&HoldingReturn> {
        let mut out: Vec<&HoldingReturn> = self
            .returns
            .iter()
            .filter(|r| r.investor == investor && r.is_open(self.latest))
            .collect();
        out.sort_by(|a, b| b.invested.total_cmp(&a.invested));
        out
    }

    pub fn twr_of(&self, investor: &str) -> Option<&TimeWeightedReturn> {
        self.twr.iter().find(|t| t.investor == investor)
    }

    pub fn values_of(&self, investor: &str) -> Option<&InvestorSeries> {
        self.values.iter().find(|v| v.investor == investor)
    }

    pub fn summaries(&self) -> Vec<InvestorSummary> {
        self.investors
            .iter()
            .map(|investor| {
                let open = self.open_holdings(investor);
                InvestorSummary {
                    investor: investor.clone(),
                    open_holdings: open.len(),
                    invested: open.iter().map(|r| r.invested).sum(),
                    profit: open.iter().filter_map(|r| r.profit).sum(),
                    value: self.values_of(investor).and_then(|s| s.latest()).map(|(_, v)| v),
                    twr: self.twr_of(investor).map(|t| t.twr),
                }
            })
            .collect()
    }
}

/// Load history and prices, then build the analysis.
pub fn analyse(
    config: &Config,
    archive: &SnapshotArchive,
    store: &PriceStore,
    filter: &HistoryFilter,
) -> Result<Analysis, AnalysisError> {
    let history = load_history(config, archive, filter)?;
    let prices = load_prices(store, &history)?;
    analyse_history(&history, &prices, config)
}

/// Build the analysis from loaded history and calendar-filled prices.
pub fn analyse_history(
    history: &History,
    prices: &PriceTable,
    config: &Config,
) -> Result<Analysis, AnalysisError> {
    let (Some(first), Some(latest)) = (history.first_date(), history.latest_date()) else {
        return Err(AnalysisError::NoHistory {
            start: config.analysis.start_date,
        });
    };

    let matrix = quantity_matrix(history);
    let spans = holding_spans(history);
    let base = base_prices(prices, &history.instrument_fx());
    let returns = holding_returns(&spans, prices, &config.price_adjustments);
    let values = value_series(&matrix, &base);
    let twr = time_weighted_returns(&matrix, &base, &config.price_adjustments);
    let activity = activity(&returns, latest, config.analysis.activity_window_days);
    let unpriced = history
        .instruments()
        .into_iter()
        .filter(|i| prices.series(i).is_none())
        .map(String::from)
        .collect();

    log::info!(
        "analysed {} holdings of {} investors from {first} to {latest}",
        returns.len(),
        history.investors().len()
    );

    Ok(Analysis {
        schema_version: SCHEMA_VERSION,
        start: first,
        latest,
        base_currency: config.fx.base.clone(),
        investors: history.investors(),
        stats: history.stats.clone(),
        returns,
        values,
        twr,
        activity,
        unpriced,
    })
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(analysis: &Analysis) -> Result<String> {
    serde_json::to_string_pretty(analysis).context("failed to serialize analysis to JSON")
}

/// Parse an exported analysis, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<Analysis> {
    let analysis: Analysis =
        serde_json::from_str(json).context("failed to deserialize analysis from JSON")?;
    if analysis.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            analysis.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(analysis)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}")).unwrap_or_default()
}

/// Columns: investor, instrument, buy_date, last_seen, days, quantity,
/// currency, fx, invested, buy_price, last_price, return_pct, profit, adjusted
pub fn export_returns_csv(returns: &[HoldingReturn]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "investor",
        "instrument",
        "buy_date",
        "last_seen",
        "days",
        "quantity",
        "currency",
        "fx",
        "invested",
        "buy_price",
        "last_price",
        "return_pct",
        "profit",
        "adjusted",
    ])?;
    for r in returns {
        wtr.write_record([
            &r.investor,
            &r.instrument,
            &r.buy_date.to_string(),
            &r.last_seen.to_string(),
            &r.days.to_string(),
            &format!("{}", r.quantity),
            &r.currency,
            &format!("{}", r.fx),
            &format!("{:.2}", r.invested),
            &opt(r.buy_price, 4),
            &opt(r.last_price, 4),
            &opt(r.return_pct(), 2),
            &opt(r.profit, 2),
            &r.adjusted.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Wide table: one row per date, one column per investor.
pub fn export_values_csv(values: &[InvestorSeries]) -> Result<String> {
    let mut dates: Vec<NaiveDate> = values
        .iter()
        .flat_map(|s| s.points.iter().map(|(d, _)| *d))
        .collect();
    dates.sort();
    dates.dedup();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string()];
    header.extend(values.iter().map(|s| s.investor.clone()));
    wtr.write_record(&header)?;
    for date in dates {
        let mut record = vec![date.to_string()];
        for series in values {
            let v = series
                .points
                .binary_search_by_key(&date, |(d, _)| *d)
                .ok()
                .map(|i| series.points[i].1);
            record.push(opt(v, 2));
        }
        wtr.write_record(&record)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `analysis.json`, `returns.csv` and `values.csv` into
/// `{output_dir}/analysis_{timestamp}/`. Returns the created directory.
pub fn save_report(analysis: &Analysis, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("analysis_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create report dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("analysis.json"), export_json(analysis)?)?;
    std::fs::write(run_dir.join("returns.csv"), export_returns_csv(&analysis.returns)?)?;
    std::fs::write(run_dir.join("values.csv"), export_values_csv(&analysis.values)?)?;
    Ok(run_dir)
}

/// Load `analysis.json` from a report directory.
pub fn load_report(dir: &Path) -> Result<Analysis> {
    let path = dir.join("analysis.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{d, history, prices};

    fn sample_analysis() -> Analysis {
        let h = history(&[
            (1, "A", "KO", 2.0),
            (1, "B", "PEP", 1.0),
            (2, "A", "KO", 2.0),
            (2, "B", "PEP", 0.0),
        ]);
        let table = prices(&[("KO", 1, 50.0), ("KO", 2, 55.0), ("PEP", 1, 10.0), ("PEP", 2, 9.0)]);
        analyse_history(&h, &table, &Config::default()).unwrap()
    }

    #[test]
    fn bundle_contents() {
        let a = sample_analysis();
        assert_eq!((a.start, a.latest), (d(1), d(2)));
        assert_eq!(a.investors, vec!["A", "B"]);
        assert_eq!(a.returns.len(), 2);
        assert_eq!(a.activity.sold.len(), 1);
        assert_eq!(a.activity.sold[0].instrument, "PEP");
        assert_eq!(a.open_holdings("A").len(), 1);
        assert!(a.open_holdings("B").is_empty());
        assert!(a.unpriced.is_empty());

        let summaries = a.summaries();
        assert_eq!(summaries[0].open_holdings, 1);
        assert!((summaries[0].profit - 20.0).abs() < 1e-9);
        assert_eq!(summaries[0].value, Some(110.0));
        assert!((summaries[0].twr.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn empty_history_is_an_error() {
        let err = analyse_history(&History::default(), &PriceTable::new(), &Config::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::NoHistory { .. }));
    }

    #[test]
    fn json_roundtrip_and_version_check() {
        let a = sample_analysis();
        let json = export_json(&a).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.latest, a.latest);
        assert_eq!(back.investors, a.investors);
        assert_eq!(back.returns.len(), 2);
        assert_eq!(back.returns[0].instrument, "KO");
        assert_eq!(back.activity.sold[0].span, a.activity.sold[0].span);

        let newer = json.replacen("\"schema_version\": 1", "\"schema_version\": 99", 1);
        assert!(import_json(&newer).is_err());
    }

    #[test]
    fn returns_csv_columns() {
        let csv = export_returns_csv(&sample_analysis().returns).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("investor,instrument,buy_date"));
        let ko = lines.next().unwrap();
        assert!(ko.starts_with("A,KO,2024-01-01,2024-01-02,1,2,DKK,1,200.00,50.0000,55.0000,10.00,20.00,false"));
    }

    #[test]
    fn values_csv_is_wide() {
        let csv = export_values_csv(&sample_analysis().values).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,A,B");
        assert_eq!(lines[1], "2024-01-01,100.00,10.00");
        // B still lists PEP with quantity zero
        assert_eq!(lines[2], "2024-01-02,110.00,0.00");
    }

    #[test]
    fn save_and_load_report() {
        let dir = tempfile::tempdir().unwrap();
        let a = sample_analysis();
        let run_dir = save_report(&a, dir.path()).unwrap();
        assert!(run_dir.join("returns.csv").exists());
        assert!(run_dir.join("values.csv").exists());
        let back = load_report(&run_dir).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.stats, a.stats);
    }
}
