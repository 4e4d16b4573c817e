//! Atom domain model.
//!
//! # Responsibility
//! - Define the unit of work tracked by the dependency graph.
//! - Validate caller-provided identifiers before they enter the ledger.
//!
//! # Invariants
//! - `id` is immutable once the atom is created and is never reused.
//! - An atom never lists itself in `depends_on`.
//! - `decomposed_from` is lineage only; it is not a dependency edge.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Caller-chosen atom identifier, e.g. `A9`.
pub type AtomId = String;

// Commas and whitespace are list separators on the command line.
static ATOM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("valid atom id regex"));

/// Lifecycle state of one atom.
///
/// Transitions are driven externally; any status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomStatus {
    Pending,
    InProgress,
    Resolved,
}

impl AtomStatus {
    /// Stable string used in the persisted ledger.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }
}

impl Display for AtomStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomStatus {
    type Err = AtomValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(AtomValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Atom-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomValidationError {
    /// Identifier is blank after trim.
    EmptyId,
    /// Identifier contains separators or other unsupported characters.
    InvalidId(String),
    /// Atom lists itself as a dependency.
    SelfDependency(AtomId),
    /// Status string is not one of `pending|in_progress|resolved`.
    InvalidStatus(String),
}

impl Display for AtomValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "atom id must not be empty"),
            Self::InvalidId(id) => write!(
                f,
                "atom id `{id}` is invalid; use letters, digits, `_`, `.` or `-`"
            ),
            Self::SelfDependency(id) => write!(f, "atom {id} cannot depend on itself"),
            Self::InvalidStatus(value) => write!(
                f,
                "invalid atom status `{value}`; expected pending|in_progress|resolved"
            ),
        }
    }
}

impl Error for AtomValidationError {}

/// Checks that `id` can be stored and later referenced from list arguments.
pub fn validate_atom_id(id: &str) -> Result<(), AtomValidationError> {
    if id.trim().is_empty() {
        return Err(AtomValidationError::EmptyId);
    }
    if !ATOM_ID_RE.is_match(id) {
        return Err(AtomValidationError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// One unit of work in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub id: AtomId,
    #[serde(default)]
    pub description: String,
    pub status: AtomStatus,
    /// Order is preserved for display only.
    #[serde(default)]
    pub depends_on: Vec<AtomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposed_from: Option<AtomId>,
}

impl Atom {
    /// Creates a pending atom with no dependencies.
    pub fn new(id: impl Into<AtomId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: AtomStatus::Pending,
            depends_on: Vec::new(),
            or_group: None,
            decomposed_from: None,
        }
    }

    /// Builder-style helper used by insertion paths and tests.
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AtomId>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Validates identifier shape and the self-dependency rule.
    pub fn validate(&self) -> Result<(), AtomValidationError> {
        validate_atom_id(&self.id)?;
        if self.depends_on.iter().any(|dep| dep == &self.id) {
            return Err(AtomValidationError::SelfDependency(self.id.clone()));
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == AtomStatus::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.status == AtomStatus::Resolved
    }
}
