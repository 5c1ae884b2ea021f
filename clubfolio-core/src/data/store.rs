//! SQLite price database.
//!
//! One table, keyed by instrument and date. The ticker used to fetch a row
//! is stored alongside so a renamed ticker can be seen in `db status`.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

use super::provider::{DataError, PriceBar};
use super::table::PriceTable;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS prices (
    instrument TEXT NOT NULL,
    ticker     TEXT NOT NULL,
    date       TEXT NOT NULL,
    close      REAL NOT NULL,
    adj_close  REAL NOT NULL,
    volume     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (instrument, date)
);
"#;

/// Stored range for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub instrument: String,
    pub ticker: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub rows: usize,
}

pub struct PriceStore {
    conn: Connection,
}

impl PriceStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, DataError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DataError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DataError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DataError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or replace bars for an instrument. Returns rows written.
    pub fn upsert(
        &mut self,
        instrument: &str,
        ticker: &str,
        bars: &[PriceBar],
    ) -> Result<usize, DataError> {
        let tx = self.conn.transaction()?;
        insert_bars(&tx, instrument, ticker, bars)?;
        tx.commit()?;
        log::debug!("{instrument}: stored {} bars", bars.len());
        Ok(bars.len())
    }

    /// Swap an instrument's stored history for `bars` in one transaction.
    /// Nothing is deleted unless the new rows are written too.
    pub fn replace(
        &mut self,
        instrument: &str,
        ticker: &str,
        bars: &[PriceBar],
    ) -> Result<usize, DataError> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM prices WHERE instrument = ?1", params![instrument])?;
        insert_bars(&tx, instrument, ticker, bars)?;
        tx.commit()?;
        log::debug!("{instrument}: replaced {removed} stored rows with {} bars", bars.len());
        Ok(bars.len())
    }

    pub fn last_date(&self, instrument: &str) -> Result<Option<NaiveDate>, DataError> {
        let last: Option<NaiveDate> = self
            .conn
            .query_row(
                "SELECT MAX(date) FROM prices WHERE instrument = ?1",
                params![instrument],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(last)
    }

    /// Closes of `instruments` within `[from, to]`. An empty list loads all.
    pub fn load_closes(
        &self,
        instruments: &[&str],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceTable, DataError> {
        let mut table = PriceTable::new();
        let mut stmt = self.conn.prepare(
            "SELECT instrument, date, close FROM prices WHERE date >= ?1 AND date <= ?2 ORDER BY instrument, date",
        )?;
        let rows = stmt.query_map(params![from, to], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, NaiveDate>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;
        for row in rows {
            let (instrument, date, close) = row?;
            if instruments.is_empty() || instruments.contains(&instrument.as_str()) {
                table.insert(&instrument, date, close);
            }
        }
        Ok(table)
    }

    /// Per-instrument stored range, alphabetical.
    pub fn coverage(&self) -> Result<Vec<Coverage>, DataError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT instrument, MAX(ticker), MIN(date), MAX(date), COUNT(*)
            FROM prices GROUP BY instrument ORDER BY instrument
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Coverage {
                instrument: row.get(0)?,
                ticker: row.get(1)?,
                first: row.get(2)?,
                last: row.get(3)?,
                rows: row.get::<_, i64>(4)? as usize,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn insert_bars(
    tx: &Transaction<'_>,
    instrument: &str,
    ticker: &str,
    bars: &[PriceBar],
) -> Result<(), DataError> {
    let mut stmt = tx.prepare(
        r#"
        INSERT OR REPLACE INTO prices (instrument, ticker, date, close, adj_close, volume)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;
    for bar in bars {
        stmt.execute(params![
            instrument,
            ticker,
            bar.date,
            bar.close,
            bar.adj_close,
            bar.volume as i64
        ])?;
    }
    Ok(())
}
