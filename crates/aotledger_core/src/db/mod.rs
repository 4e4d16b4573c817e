//! SQLite bootstrap for the relational ledger store.
//!
//! # Responsibility
//! - Open and configure SQLite connections holding ledger documents.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No ledger rows are read or written before migrations succeed.

use crate::error::ErrorKind;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File was written by a newer build of the ledger.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Lock contention that outlived the busy timeout is a `Timeout`;
    /// everything else means the ledger file cannot be trusted.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
                if matches!(
                    failure.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) =>
            {
                ErrorKind::Timeout
            }
            Self::Sqlite(_) | Self::SchemaTooNew { .. } => ErrorKind::Integrity,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "ledger database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "ledger schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
