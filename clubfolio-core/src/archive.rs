//! Daily snapshot archive: one `;`-separated CSV per scrape.
//!
//! Layout: `{data_dir}/{prefix}{YYYY-MM-DD}.csv`, with a leading row-index
//! column and the page's Danish column names so older archive files load
//! unchanged.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Files without a date in their name are ignored
//! - Unreadable files are skipped and reported, never fatal for a full load

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::StorageConfig;
use crate::domain::{DatedPosition, Position, Snapshot};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("no date in snapshot file name {0}")]
    NoDate(PathBuf),
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One CSV line.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    #[serde(rename = "", default)]
    index: Option<usize>,
    #[serde(rename = "Instrument")]
    instrument: String,
    #[serde(rename = "Antal")]
    quantity: f64,
    #[serde(rename = "Åbningspris")]
    opening_price: f64,
    #[serde(rename = "Investor")]
    investor: String,
    #[serde(rename = "Amount", default)]
    amount: Option<f64>,
    #[serde(rename = "Currency", default)]
    currency: String,
    #[serde(rename = "Stockexchange", default)]
    exchange: String,
    #[serde(rename = "Ticker", default)]
    ticker: String,
}

impl SnapshotRecord {
    fn from_position(index: usize, p: &Position) -> Self {
        Self {
            index: Some(index),
            instrument: p.instrument.clone(),
            quantity: p.quantity,
            opening_price: p.opening_price,
            investor: p.investor.clone(),
            amount: Some(p.amount),
            currency: p.currency.clone(),
            exchange: p.exchange.clone(),
            ticker: p.ticker.clone(),
        }
    }

    fn into_position(self) -> Position {
        Position {
            amount: self
                .amount
                .unwrap_or(self.quantity * self.opening_price),
            investor: self.investor,
            instrument: self.instrument,
            quantity: self.quantity,
            opening_price: self.opening_price,
            currency: self.currency,
            exchange: self.exchange,
            ticker: self.ticker,
        }
    }
}

/// First `YYYY-MM-DD` found in a file name.
pub fn date_from_filename(name: &str) -> Option<NaiveDate> {
    let bytes = name.as_bytes();
    (0..bytes.len().saturating_sub(9)).find_map(|i| {
        let window = name.get(i..i + 10)?;
        let shape_ok = window.bytes().enumerate().all(|(j, b)| match j {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !shape_ok {
            return None;
        }
        NaiveDate::parse_from_str(window, "%Y-%m-%d").ok()
    })
}

/// Outcome of loading the whole archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub files_read: usize,
    pub rows: usize,
    pub skipped: Vec<(PathBuf, String)>,
}

/// The snapshot directory.
#[derive(Debug, Clone)]
pub struct SnapshotArchive {
    dir: PathBuf,
    prefix: String,
}

impl SnapshotArchive {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(&storage.data_dir, &storage.file_prefix)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}{}.csv", self.prefix, date.format("%Y-%m-%d"))
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(self.file_name(date))
    }

    /// Write a snapshot, replacing any file for the same day.
    pub fn write(&self, snapshot: &Snapshot) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|e| SnapshotError::io(&self.dir, e))?;
        let path = self.path_for(snapshot.date);
        let tmp_path = path.with_extension("csv.tmp");

        let result = write_records(&tmp_path, &snapshot.positions);
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            SnapshotError::io(&path, e)
        })?;

        log::info!(
            "wrote {} rows to {}",
            snapshot.positions.len(),
            path.display()
        );
        Ok(path)
    }

    /// Read one snapshot file. Its date comes from the file name.
    pub fn read(&self, path: &Path) -> Result<Snapshot, SnapshotError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let date = date_from_filename(name).ok_or_else(|| SnapshotError::NoDate(path.into()))?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_path(path)
            .map_err(|e| SnapshotError::csv(path, e))?;
        let mut positions = Vec::new();
        for record in reader.deserialize::<SnapshotRecord>() {
            let record = record.map_err(|e| SnapshotError::csv(path, e))?;
            positions.push(record.into_position());
        }
        Ok(Snapshot::new(date, positions))
    }

    /// Snapshot for a given day, if archived.
    pub fn get(&self, date: NaiveDate) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.path_for(date);
        if !path.exists() {
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    /// Dated snapshot files, oldest first.
    pub fn list(&self) -> Result<Vec<(NaiveDate, PathBuf)>, SnapshotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| SnapshotError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnapshotError::io(&self.dir, e))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&self.prefix) || !name.ends_with(".csv") {
                continue;
            }
            match date_from_filename(name) {
                Some(date) => files.push((date, path)),
                None => log::warn!("ignoring {name}: no date in file name"),
            }
        }
        files.sort();
        Ok(files)
    }

    /// Every archived row, sorted by date. Files that fail to read are
    /// skipped and listed in the report.
    pub fn load_all(&self) -> Result<(Vec<DatedPosition>, LoadReport), SnapshotError> {
        let mut rows = Vec::new();
        let mut report = LoadReport::default();
        for (_, path) in self.list()? {
            match self.read(&path) {
                Ok(snapshot) => {
                    report.files_read += 1;
                    rows.extend(snapshot.into_dated());
                }
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    report.skipped.push((path, e.to_string()));
                }
            }
        }
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        report.rows = rows.len();
        log::info!(
            "loaded {} rows from {} snapshot files ({} skipped)",
            report.rows,
            report.files_read,
            report.skipped.len()
        );
        Ok((rows, report))
    }

    /// The latest readable snapshot strictly before `date`.
    pub fn previous(&self, date: NaiveDate) -> Result<Option<Snapshot>, SnapshotError> {
        for (d, path) in self.list()?.into_iter().rev() {
            if d >= date {
                continue;
            }
            match self.read(&path) {
                Ok(snapshot) => return Ok(Some(snapshot)),
                Err(e) => log::warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(None)
    }

    /// The newest readable snapshot.
    pub fn latest(&self) -> Result<Option<Snapshot>, SnapshotError> {
        match self.list()?.last() {
            Some((date, _)) => self.previous(*date + chrono::Days::new(1)),
            None => Ok(None),
        }
    }
}

fn write_records(path: &Path, positions: &[Position]) -> Result<(), SnapshotError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|e| SnapshotError::csv(path, e))?;
    for (i, p) in positions.iter().enumerate() {
        writer
            .serialize(SnapshotRecord::from_position(i, p))
            .map_err(|e| SnapshotError::csv(path, e))?;
    }
    writer.flush().map_err(|e| SnapshotError::io(path, e))
}
