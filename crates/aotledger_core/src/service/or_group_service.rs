//! OR-group selection management.
//!
//! # Responsibility
//! - Switch the active branch of a named OR-group.
//! - Append one trail entry per switch.
//!
//! # Invariants
//! - Switching into an unknown group creates it; it is never an error.
//! - The trail is the history of record; the group only caches the current
//!   selection.
//! - A switch never marks the previous selection as failed.

use crate::model::atom::AtomId;
use crate::model::document::LedgerDocument;
use crate::model::or_group::{OrGroup, TrailEntry};
use chrono::Utc;
use log::info;

/// Mutating view over the OR-groups and trail of one loaded document.
pub struct OrGroupManager<'doc> {
    doc: &'doc mut LedgerDocument,
}

impl<'doc> OrGroupManager<'doc> {
    pub fn new(doc: &'doc mut LedgerDocument) -> Self {
        Self { doc }
    }

    /// Selects `selection` in `group` and records the switch.
    ///
    /// Returns the appended trail entry.
    pub fn switch_branch(
        &mut self,
        group: &str,
        selection: impl Into<AtomId>,
        reason: impl Into<String>,
    ) -> &TrailEntry {
        let selection = selection.into();
        let created = !self.doc.or_groups.contains_key(group);
        self.doc
            .or_groups
            .entry(group.to_string())
            .and_modify(|existing| existing.select(selection.clone()))
            .or_insert_with(|| OrGroup::with_selection(selection.clone()));

        info!(
            "event=or_switch module=or_group status=ok group={} selected={} created={}",
            group, selection, created
        );
        self.doc.trail.push(TrailEntry {
            or_group: group.to_string(),
            selected: selection,
            reason: reason.into(),
            timestamp: Utc::now(),
        });
        &self.doc.trail[self.doc.trail.len() - 1]
    }
}
