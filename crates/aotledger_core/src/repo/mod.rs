//! Ledger persistence contracts and adapters.
//!
//! # Responsibility
//! - Define the load/save contract the ledger service depends on.
//! - Keep file-format and SQL details out of the service layer.
//!
//! # Invariants
//! - `save` persists the whole document or nothing.
//! - `load` of an absent ledger is `NotFound`, never an empty document.

use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::document::LedgerDocument;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod markdown_store;
pub mod sqlite_store;

pub use markdown_store::MarkdownLedgerStore;
pub use sqlite_store::SqliteLedgerStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    NotFound(PathBuf),
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Db(DbError),
    InvalidData(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Db(err) => err.kind(),
            Self::Io(_) | Self::Yaml(_) | Self::InvalidData(_) => ErrorKind::Integrity,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "State file not found: {}", path.display()),
            Self::Io(err) => write!(f, "{err}"),
            Self::Yaml(err) => write!(f, "invalid ledger frontmatter: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Yaml(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Whole-document ledger persistence.
pub trait LedgerStore {
    fn exists(&self) -> bool;
    fn load(&self) -> StoreResult<LedgerDocument>;
    fn save(&self, doc: &LedgerDocument) -> StoreResult<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn load(&self) -> StoreResult<LedgerDocument> {
        (**self).load()
    }

    fn save(&self, doc: &LedgerDocument) -> StoreResult<()> {
        (**self).save(doc)
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn load(&self) -> StoreResult<LedgerDocument> {
        (**self).load()
    }

    fn save(&self, doc: &LedgerDocument) -> StoreResult<()> {
        (**self).save(doc)
    }
}
