//! Completion bindings keyed by atom ID.
//!
//! # Invariants
//! - At most one binding per atom ID; writes replace, never merge.
//! - No precondition on the bound atom's status or existence.

use crate::model::atom::AtomId;
use crate::model::binding::Binding;
use crate::model::document::LedgerDocument;
use log::{info, warn};

/// Mutating view over the bindings of one loaded document.
pub struct BindingLedger<'doc> {
    doc: &'doc mut LedgerDocument,
}

impl<'doc> BindingLedger<'doc> {
    pub fn new(doc: &'doc mut LedgerDocument) -> Self {
        Self { doc }
    }

    /// Upserts the binding for `atom_id`.
    ///
    /// Returns the replaced binding, if one existed.
    pub fn record(
        &mut self,
        atom_id: impl Into<AtomId>,
        summary: impl Into<String>,
        artifacts: Vec<String>,
    ) -> Option<Binding> {
        let atom_id = atom_id.into();
        if self.doc.atom(&atom_id).is_none() {
            warn!(
                "event=binding_record module=binding status=warn atom_id={} detail=unknown_atom",
                atom_id
            );
        }
        let binding = Binding::new(summary, artifacts);
        info!(
            "event=binding_record module=binding status=ok atom_id={} artifacts={}",
            atom_id,
            binding.artifacts.len()
        );
        self.doc.bindings.insert(atom_id, binding)
    }

    pub fn get(&self, atom_id: &str) -> Option<&Binding> {
        self.doc.bindings.get(atom_id)
    }
}

#[cfg(test)]
mod tests {
    use super::BindingLedger;
    use crate::model::document::LedgerDocument;

    #[test]
    fn second_record_replaces_first() {
        let mut doc = LedgerDocument::default();
        let mut ledger = BindingLedger::new(&mut doc);

        assert!(ledger
            .record("A1", "first", vec!["a.txt".to_string(), "b.txt".to_string()])
            .is_none());
        let replaced = ledger
            .record("A1", "line one\nline two", vec!["c.txt".to_string()])
            .expect("previous binding is returned");
        assert_eq!(replaced.summary, "first");

        let current = ledger.get("A1").expect("binding exists");
        assert_eq!(current.summary, "line one\nline two");
        assert_eq!(current.artifacts, vec!["c.txt".to_string()]);
        assert_eq!(doc.bindings.len(), 1);
    }
}
