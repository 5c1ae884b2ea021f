//! Clubfolio CLI: scrape, diff, prices, analyse and database commands.
//!
//! Commands:
//! - `scrape`: fetch the club page, archive today's snapshot, print changes
//! - `diff`: compare a snapshot with the one before it
//! - `prices`: download missing closes into the SQLite price store
//! - `analyse`: values, returns, TWR and recent activity per investor
//! - `db status`: per-instrument coverage of the price store
//! - `config`: print the effective configuration

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use clubfolio_analysis::report::export_returns_csv;
use clubfolio_analysis::{
    analyse, load_history, save_report, sorted_by_return, Analysis, HistoryFilter,
};
use clubfolio_core::config::Config;
use clubfolio_core::data::{
    download_prices, CircuitBreaker, DownloadOptions, PriceStore, StdoutProgress, YahooProvider,
};
use clubfolio_core::diff::{diff_snapshots, Change};
use clubfolio_core::domain::Snapshot;
use clubfolio_core::scrape::scrape;
use clubfolio_core::SnapshotArchive;

#[derive(Parser)]
#[command(
    name = "clubfolio",
    about = "Clubfolio: investment club holdings tracker"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./clubfolio.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the holdings page and archive today's snapshot.
    Scrape {
        /// Page URL. Defaults to `source.url` from the config.
        #[arg(long)]
        url: Option<String>,

        /// Snapshot directory. Defaults to `storage.data_dir`.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Parse and diff without writing the CSV file.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Download prices for the archived holdings afterwards.
        #[arg(long, default_value_t = false)]
        prices: bool,
    },
    /// Diff a snapshot against the previous one.
    Diff {
        /// Snapshot date (YYYY-MM-DD). Defaults to the latest snapshot.
        #[arg(long)]
        date: Option<String>,
    },
    /// Download missing prices for every instrument in the archive.
    Prices {
        /// First date for instruments with nothing stored (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Discard stored prices and download again.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Price database. Defaults to `storage.price_db`.
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print values, returns, TWR and recent activity.
    Analyse {
        /// Ignore snapshots before this date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Only this investor.
        #[arg(long)]
        investor: Option<String>,

        /// Write analysis.json, returns.csv and values.csv under this directory.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Price database commands.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Subcommand)]
enum DbAction {
    /// Report date ranges and row counts per instrument.
    Status {
        /// Price database. Defaults to `storage.price_db`.
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Scrape {
            url,
            data_dir,
            dry_run,
            prices,
        } => run_scrape(config, url, data_dir, dry_run, prices),
        Commands::Diff { date } => run_diff(&config, date),
        Commands::Prices { start, force, db } => run_prices(&config, start, force, db),
        Commands::Analyse {
            start,
            investor,
            export,
        } => run_analyse(&config, start, investor, export),
        Commands::Db { action } => match action {
            DbAction::Status { db } => run_db_status(&config, db),
        },
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_scrape(
    mut config: Config,
    url: Option<String>,
    data_dir: Option<PathBuf>,
    dry_run: bool,
    with_prices: bool,
) -> Result<()> {
    if let Some(url) = url {
        config.source.url = url;
    }
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    let archive = SnapshotArchive::from_config(&config.storage);
    let today = today();

    let outcome = match scrape(&config.source, &config.exchanges, today) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("ERROR: scrape failed: {e}");
            match archive.previous(today)? {
                Some(prev) => {
                    println!(
                        "Using the snapshot of {} as fallback ({} positions).",
                        prev.date,
                        prev.positions.len()
                    );
                    if with_prices {
                        run_prices(&config, None, false, None)?;
                    }
                }
                None => eprintln!("ERROR: no earlier snapshot in {}", archive.dir().display()),
            }
            std::process::exit(1);
        }
    };

    for row in &outcome.skipped {
        println!("Skipped {} / {}: {}", row.investor, row.cell, row.reason);
    }
    let snapshot = outcome.snapshot;
    println!(
        "Scraped {} positions for {} investors (fingerprint {}).",
        snapshot.positions.len(),
        snapshot.investors().len(),
        snapshot.fingerprint().short()
    );
    for investor in snapshot.investors() {
        println!("  {:<20} {:>3}", investor, snapshot.positions_of(investor).count());
    }

    if dry_run {
        println!("Dry run, nothing written.");
    } else {
        let path = archive.write(&snapshot)?;
        println!("Saved to: {}", path.display());
    }

    match archive.previous(today)? {
        Some(prev) => print_changes(&prev, &snapshot),
        None => println!("No earlier snapshot to compare with."),
    }

    if with_prices && !dry_run {
        run_prices(&config, None, false, None)?;
    }
    Ok(())
}

fn print_changes(old: &Snapshot, new: &Snapshot) {
    let changes: Vec<Change> = diff_snapshots(old, new);
    if changes.is_empty() {
        println!("No changes since {}.", old.date);
        return;
    }
    println!();
    println!("=== Changes {} → {} ===", old.date, new.date);
    for change in &changes {
        println!("{change}");
    }
}

fn run_diff(config: &Config, date: Option<String>) -> Result<()> {
    let archive = SnapshotArchive::from_config(&config.storage);
    let snapshot = match date.as_deref().map(parse_date).transpose()? {
        Some(date) => match archive.get(date)? {
            Some(s) => s,
            None => bail!("no snapshot for {date} in {}", archive.dir().display()),
        },
        None => match archive.latest()? {
            Some(s) => s,
            None => bail!("no snapshots in {}", archive.dir().display()),
        },
    };

    match archive.previous(snapshot.date)? {
        Some(prev) => print_changes(&prev, &snapshot),
        None => println!("{} is the first snapshot.", snapshot.date),
    }
    Ok(())
}

fn run_prices(
    config: &Config,
    start: Option<String>,
    force: bool,
    db: Option<PathBuf>,
) -> Result<()> {
    let default_start = match start {
        Some(s) => parse_date(&s)?,
        None => config.storage.price_history_start,
    };
    let db_path = db.unwrap_or_else(|| config.storage.price_db.clone());

    let archive = SnapshotArchive::from_config(&config.storage);
    let history = load_history(config, &archive, &HistoryFilter::all())?;
    let targets = history.price_targets();
    if targets.is_empty() {
        println!("No instruments with a ticker in the archive.");
        return Ok(());
    }

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(Arc::clone(&circuit_breaker))?;
    let mut store = PriceStore::open(&db_path)?;
    let options = DownloadOptions {
        default_start,
        today: today(),
        force,
    };

    let summary = download_prices(&provider, &mut store, &targets, options, &StdoutProgress);
    println!("Stored {} rows in {}", summary.rows_written, db_path.display());

    if !summary.all_succeeded() {
        for (instrument, err) in &summary.errors {
            eprintln!("Error for {instrument}: {err}");
        }
        if !circuit_breaker.is_allowed() {
            eprintln!(
                "Yahoo is blocked for another {} minutes.",
                circuit_breaker.remaining_cooldown().as_secs().div_ceil(60)
            );
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run_analyse(
    config: &Config,
    start: Option<String>,
    investor: Option<String>,
    export: Option<PathBuf>,
) -> Result<()> {
    let mut filter = match investor {
        Some(name) => HistoryFilter::only(&config.analysis, &name)?,
        None => HistoryFilter::from_config(&config.analysis),
    };
    if let Some(s) = start {
        filter.start = Some(parse_date(&s)?);
    }

    let archive = SnapshotArchive::from_config(&config.storage);
    let store = PriceStore::open(&config.storage.price_db)?;
    let analysis = analyse(config, &archive, &store, &filter)?;

    print_analysis(&analysis);

    if let Some(dir) = export {
        let run_dir = save_report(&analysis, &dir)?;
        println!("Report saved to: {}", run_dir.display());
    } else {
        log::debug!("returns:\n{}", export_returns_csv(&analysis.returns)?);
    }
    Ok(())
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}%", x * 100.0)).unwrap_or_else(|| "—".into())
}

fn fmt_money(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.0}")).unwrap_or_else(|| "—".into())
}

fn print_analysis(a: &Analysis) {
    let base = &a.base_currency;
    println!();
    println!("=== Clubfolio {} to {} ===", a.start, a.latest);
    println!(
        "Rows: {} ({} corrected, {} excluded, {} backfilled)",
        a.stats.rows, a.stats.corrected, a.stats.excluded, a.stats.backfilled
    );
    for (currency, count) in &a.stats.unknown_currency {
        println!("WARNING: {count} row(s) in {currency} dropped (no FX rate)");
    }
    if !a.unpriced.is_empty() {
        println!("WARNING: no prices for {}", a.unpriced.join(", "));
    }

    println!();
    println!("--- Investors ({base}) ---");
    println!(
        "{:<26} {:>5} {:>12} {:>12} {:>10} {:>10} {:>10}",
        "Investor", "Open", "Invested", "Value", "Profit", "TWR", "Annual"
    );
    println!("{}", "-".repeat(91));
    for s in a.summaries() {
        let annual = a.twr_of(&s.investor).and_then(|t| t.annualized);
        println!(
            "{:<26} {:>5} {:>12.0} {:>12} {:>10.0} {:>10} {:>10}",
            s.investor,
            s.open_holdings,
            s.invested,
            fmt_money(s.value),
            s.profit,
            fmt_pct(s.twr),
            fmt_pct(annual)
        );
    }

    println!();
    println!("--- Holding returns ---");
    println!(
        "{:<26} {:<10} {:<11} {:<11} {:>5} {:>10} {:>10}",
        "Investor", "Instrument", "Bought", "Last seen", "Days", "Return", "Profit"
    );
    println!("{}", "-".repeat(89));
    for r in sorted_by_return(&a.returns) {
        let marker = if r.is_open(a.latest) { "" } else { " (sold)" };
        println!(
            "{:<26} {:<10} {:<11} {:<11} {:>5} {:>10} {:>10}{marker}",
            r.investor,
            r.instrument,
            r.buy_date.to_string(),
            r.last_seen.to_string(),
            r.days,
            fmt_pct(r.simple_return),
            fmt_money(r.profit)
        );
    }

    println!();
    println!("--- Activity (last {} days) ---", a.activity.window_days);
    for r in &a.activity.sold {
        println!(
            "SOLD   {} {} on {} ({})",
            r.investor,
            r.instrument,
            r.last_seen,
            fmt_pct(r.simple_return)
        );
    }
    for r in &a.activity.bought {
        println!("BOUGHT {} {} on {}", r.investor, r.instrument, r.buy_date);
    }
    if a.activity.sold.is_empty() && a.activity.bought.is_empty() {
        println!("No trades.");
    }
    println!();
}

fn run_db_status(config: &Config, db: Option<PathBuf>) -> Result<()> {
    let db_path = db.unwrap_or_else(|| config.storage.price_db.clone());
    if !db_path.exists() {
        println!("Price database does not exist: {}", db_path.display());
        return Ok(());
    }

    let store = PriceStore::open(&db_path)?;
    let coverage = store.coverage()?;
    if coverage.is_empty() {
        println!("Price database is empty: {}", db_path.display());
        return Ok(());
    }

    let size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    println!("Database: {}", db_path.display());
    println!("Instruments: {}", coverage.len());
    println!("Total size: {}", format_size(size));
    println!();
    println!("{:<10} {:<12} {:<25} {:>8}", "Instrument", "Ticker", "Date Range", "Rows");
    println!("{}", "-".repeat(58));
    let stale_before = today() - chrono::Duration::days(7);
    for c in &coverage {
        let stale = if c.last < stale_before { " (stale)" } else { "" };
        println!(
            "{:<10} {:<12} {:<25} {:>8}{stale}",
            c.instrument,
            c.ticker,
            format!("{} to {}", c.first, c.last),
            c.rows
        );
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
