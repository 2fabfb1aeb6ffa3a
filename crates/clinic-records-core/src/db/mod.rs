//! Database layer for clinic records.

mod bootstrap;
mod records;
mod schema;
mod snapshot;
mod store;

pub use records::*;
pub use schema::*;
pub use snapshot::*;
pub use store::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Protected record: {0}")]
    ProtectedRecord(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
///
/// One instance owns the single storage handle; services borrow it.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| DbError::StorageUnavailable(e.to_string()))?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DbError::StorageUnavailable(e.to_string()))?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema. Safe to run against an existing file.
    fn initialize(&self) -> DbResult<()> {
        let version = self.schema_version().map_err(unavailable)?;
        if version > SCHEMA_VERSION {
            return Err(DbError::StorageUnavailable(format!(
                "database schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }
        self.conn.execute_batch(SCHEMA).map_err(unavailable)?;
        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(unavailable)?;
        Ok(())
    }

    /// Schema version stamped on the file.
    pub fn schema_version(&self) -> DbResult<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

fn unavailable(e: impl std::fmt::Display) -> DbError {
    DbError::StorageUnavailable(e.to_string())
}
