//! OR-group and branch-switch audit records.
//!
//! # Invariants
//! - `selected`, when present, is never listed in `failed`.
//! - Trail entries are immutable once appended.

use crate::model::atom::AtomId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named set of alternative strategies with one active selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrGroup {
    #[serde(default)]
    pub choices: Vec<AtomId>,
    #[serde(default)]
    pub selected: Option<AtomId>,
    #[serde(default)]
    pub failed: Vec<AtomId>,
}

impl OrGroup {
    /// Group created lazily by a switch into a never-seen name.
    pub fn with_selection(selection: impl Into<AtomId>) -> Self {
        Self {
            choices: Vec::new(),
            selected: Some(selection.into()),
            failed: Vec::new(),
        }
    }

    /// Changes the current selection.
    ///
    /// A selection that was previously marked failed is taken off the failed
    /// list so the group invariant keeps holding.
    pub fn select(&mut self, selection: impl Into<AtomId>) {
        let selection = selection.into();
        self.failed.retain(|failed| failed != &selection);
        self.selected = Some(selection);
    }

    pub fn is_consistent(&self) -> bool {
        match &self.selected {
            Some(selected) => !self.failed.contains(selected),
            None => true,
        }
    }
}

/// Audit record of one OR-group selection change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailEntry {
    pub or_group: String,
    pub selected: AtomId,
    #[serde(default)]
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
