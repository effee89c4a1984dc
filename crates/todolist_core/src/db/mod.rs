//! SQLite bootstrap for the to-do record store.
//!
//! # Responsibility
//! - Open and configure the SQLite connection backing `SqliteRecordStore`.
//! - Apply versioned schema migrations before any record access.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A connection is never handed out with migrations half-applied.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub(crate) use open::configure_connection;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-engine failure surfaced by bootstrap and record operations.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Database file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// WAL checkpoint could not finish because another connection holds a lock.
    CheckpointBusy,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::CheckpointBusy => write!(f, "wal checkpoint blocked by a concurrent reader"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::CheckpointBusy => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
