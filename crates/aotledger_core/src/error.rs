//! Cross-layer error classification.
//!
//! Each layer keeps its own error enum; `ErrorKind` is the coarse category a
//! caller branches on (and the CLI prints as `kind`).

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Coarse failure category shared by every ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Document, atom or group is absent.
    NotFound,
    /// Identifier collision.
    Duplicate,
    /// Bad status value, mismatched list lengths, malformed input.
    Invalid,
    /// External command exceeded its time bound.
    Timeout,
    /// Structural damage: cycle, missing section, unreadable document.
    Integrity,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Duplicate => "duplicate",
            Self::Invalid => "invalid",
            Self::Timeout => "timeout",
            Self::Integrity => "integrity",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
