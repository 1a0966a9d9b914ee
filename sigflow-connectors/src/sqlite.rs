//! SQLite storage sink
//!
//! Durable, ordered record storage in an embedded SQLite database. The
//! store opens eagerly (startup failure is fatal to the daemon) and uses
//! write-ahead logging with `synchronous=NORMAL`, which keeps per-record
//! appends cheap while remaining durable across process crashes.
//!
//! Besides the `StorageSink` write path the store exposes the two read
//! queries operators actually run: the most recent record, and summary
//! statistics over the last `k` raw values.

use std::fmt;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use sigflow_core::{SampleRecord, StorageSink};
use thiserror::Error;

/// Errors from the SQLite store
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Database open, schema, or query failure
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database parent directory could not be created
    #[error("failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

/// Summary statistics over recent raw samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of records summarized
    pub count: u64,
    /// Mean of the raw values, 0 when empty
    pub mean: f64,
    /// Population standard deviation of the raw values, 0 when empty
    pub stddev: f64,
}

/// A durable record store backed by a single SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema
    ///
    /// Missing parent directories are created. Fails if the path is not
    /// writable; the daemon treats that as a fatal startup error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        log::info!("sqlite store open: {}", path.display());
        Self::initialize(conn)
    }

    /// Open an in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, SqliteError> {
        // WAL lets the read-side queries run while appends continue
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS samples (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                ts       REAL NOT NULL,
                channel  INTEGER NOT NULL,
                raw      INTEGER NOT NULL,
                filtered REAL NOT NULL,
                mean     REAL NOT NULL,
                sigma    REAL NOT NULL,
                fault    INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_samples_ts ON samples(ts);
            CREATE INDEX IF NOT EXISTS idx_samples_channel ON samples(channel);",
        )?;

        Ok(Self { conn })
    }

    /// Most recently appended record, if any
    pub fn latest(&self) -> Result<Option<SampleRecord>, SqliteError> {
        let record = self
            .conn
            .query_row(
                "SELECT ts, channel, raw, filtered, mean, sigma, fault
                 FROM samples ORDER BY ts DESC, id DESC LIMIT 1",
                [],
                |row| {
                    Ok(SampleRecord {
                        timestamp: row.get(0)?,
                        channel: row.get(1)?,
                        raw: row.get(2)?,
                        filtered: row.get(3)?,
                        mean: row.get(4)?,
                        sigma: row.get(5)?,
                        fault: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    /// Mean and population standard deviation of the last `k` raw values
    ///
    /// An empty store summarizes to all zeros rather than an error.
    pub fn summary(&self, k: u64) -> Result<Summary, SqliteError> {
        let (count, mean, mean_sq): (u64, Option<f64>, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(raw), AVG(raw), AVG(raw * raw) FROM (
                 SELECT raw FROM samples ORDER BY ts DESC, id DESC LIMIT ?1
             )",
            params![k],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mean = mean.unwrap_or(0.0);
        let mean_sq = mean_sq.unwrap_or(0.0);
        // Population variance; clamp the tiny negative residue floating
        // point can leave behind
        let variance = (mean_sq - mean * mean).max(0.0);

        Ok(Summary {
            count,
            mean,
            stddev: variance.sqrt(),
        })
    }

    /// Total number of stored records
    pub fn len(&self) -> Result<u64, SqliteError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> Result<bool, SqliteError> {
        Ok(self.len()? == 0)
    }
}

impl StorageSink for SqliteStore {
    type Error = SqliteError;

    fn append(&mut self, record: &SampleRecord) -> Result<(), Self::Error> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO samples (ts, channel, raw, filtered, mean, sigma, fault)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        stmt.execute(params![
            record.timestamp,
            record.channel,
            record.raw,
            record.filtered,
            record.mean,
            record.sigma,
            record.fault,
        ])?;
        Ok(())
    }
}
