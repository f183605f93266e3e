//! SQLite state database
//!
//! Tracks install receipts and an append-only action history.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State database lock poisoned")]
    Poisoned,
}

/// Record of an installed cask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub token: String,
    pub version: String,
    pub checksum: String,
    pub app_path: PathBuf,
    pub installed_at: i64,
}

/// One row of the action history.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub token: String,
    pub action: String,
    pub version: Option<String>,
    pub success: bool,
    pub at: i64,
}

/// State database for tracking installations
#[derive(Debug)]
pub struct StateDb {
    conn: Connection,
}

impl StateDb {
    /// Open database at a specific path, creating parents and schema.
    pub fn open_at(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database (for testing)
    pub fn in_memory() -> Result<Self, DbError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS casks (
                token TEXT PRIMARY KEY,
                version TEXT NOT NULL,
                checksum TEXT NOT NULL,
                app_path TEXT NOT NULL,
                installed_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL,
                action TEXT NOT NULL,
                version TEXT,
                success INTEGER NOT NULL,
                at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_token ON history(token);
            ",
        )?;
        Ok(())
    }

    /// Record (or replace) the receipt for a cask.
    pub fn record_install(
        &self,
        token: &str,
        version: &str,
        checksum: &str,
        app_path: &Path,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO casks (token, version, checksum, app_path, installed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                token,
                version,
                checksum,
                app_path.to_string_lossy(),
                chrono::Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, token: &str) -> Result<Option<Receipt>, DbError> {
        self.conn
            .query_row(
                "SELECT token, version, checksum, app_path, installed_at FROM casks WHERE token = ?1",
                params![token],
                row_to_receipt,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list(&self) -> Result<Vec<Receipt>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT token, version, checksum, app_path, installed_at FROM casks ORDER BY token",
        )?;
        let rows = stmt.query_map([], row_to_receipt)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a receipt. Returns whether one existed.
    pub fn remove(&self, token: &str) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM casks WHERE token = ?1", params![token])?;
        Ok(deleted > 0)
    }

    pub fn add_history(
        &self,
        token: &str,
        action: &str,
        version: Option<&str>,
        success: bool,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO history (token, action, version, success, at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![token, action, version, success, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// History for one cask, newest first.
    pub fn history(&self, token: &str) -> Result<Vec<HistoryEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT token, action, version, success, at FROM history
             WHERE token = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![token], |row| {
            Ok(HistoryEntry {
                token: row.get(0)?,
                action: row.get(1)?,
                version: row.get(2)?,
                success: row.get(3)?,
                at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn row_to_receipt(row: &rusqlite::Row<'_>) -> rusqlite::Result<Receipt> {
    Ok(Receipt {
        token: row.get(0)?,
        version: row.get(1)?,
        checksum: row.get(2)?,
        app_path: PathBuf::from(row.get::<_, String>(3)?),
        installed_at: row.get(4)?,
    })
}

/// Cloneable, thread-safe handle to the state database.
///
/// `rusqlite::Connection` is not `Sync`; every call takes the lock for the
/// duration of one statement.
#[derive(Debug, Clone)]
pub struct StateHandle {
    inner: Arc<Mutex<StateDb>>,
}

impl StateHandle {
    pub fn new(db: StateDb) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open_at(path: &Path) -> Result<Self, DbError> {
        Ok(Self::new(StateDb::open_at(path)?))
    }

    /// Run `f` with exclusive access to the database.
    pub fn with<T>(&self, f: impl FnOnce(&StateDb) -> Result<T, DbError>) -> Result<T, DbError> {
        let db = self.inner.lock().map_err(|_| DbError::Poisoned)?;
        f(&db)
    }
}
