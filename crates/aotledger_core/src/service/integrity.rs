//! Ledger integrity validation and the readiness gate.
//!
//! # Responsibility
//! - Report structural errors (fatal) and advisory warnings (non-fatal).
//! - Decide whether the loop may be entered.
//!
//! # Invariants
//! - Validation never mutates the document.
//! - Dangling dependency references are warnings, not errors.

use crate::model::document::{ControlStatus, LedgerDocument};
use crate::service::atom_graph::detect_cycle;
use serde::Serialize;
use std::collections::HashSet;

/// Result of `validate_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub atom_count: usize,
}

/// Result of `check_gate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    pub ready: bool,
    pub missing: Vec<String>,
    pub status: Option<ControlStatus>,
}

const GATE_ALLOWED_STATUSES: &[ControlStatus] = &[
    ControlStatus::Pending,
    ControlStatus::Stopped,
    ControlStatus::Running,
];

/// Checks sections, atom IDs and the dependency graph.
pub fn validate_integrity(doc: &LedgerDocument) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match &doc.objective {
        None => errors.push("Missing required section: objective".to_string()),
        Some(objective) => {
            if objective.goal.trim().is_empty() {
                errors.push("Missing objective.goal".to_string());
            }
            if objective.base_case.is_none() {
                errors.push("Missing objective.base_case".to_string());
            }
        }
    }

    match &doc.control {
        None => errors.push("Missing required section: control".to_string()),
        Some(control) => {
            if control.status.is_none() {
                warnings.push("Missing control.status".to_string());
            }
            if control.iteration.is_none() {
                warnings.push("Missing control.iteration".to_string());
            }
            if control.stall_count.is_none() {
                warnings.push("Missing control.stall_count".to_string());
            }
        }
    }

    for (name, group) in &doc.or_groups {
        if !group.is_consistent() {
            warnings.push(format!("OR group {name} selects an atom listed as failed"));
        }
    }

    if doc.atoms.is_empty() {
        errors.push("No atoms defined (must have at least 1)".to_string());
    } else {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let duplicates: Vec<&str> = doc
            .atoms
            .iter()
            .map(|atom| atom.id.as_str())
            .filter(|id| !seen.insert(*id) && reported.insert(*id))
            .collect();
        if !duplicates.is_empty() {
            errors.push(format!("Duplicate atom IDs: {}", duplicates.join(", ")));
        }

        if let Some(cycle) = detect_cycle(&doc.atoms) {
            errors.push(format!(
                "Circular dependency detected: {}",
                cycle.join(" -> ")
            ));
        }

        for atom in &doc.atoms {
            for dependency in &atom.depends_on {
                if !seen.contains(dependency.as_str()) {
                    warnings.push(format!(
                        "Atom {} depends on undefined atom: {}",
                        atom.id, dependency
                    ));
                }
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        atom_count: doc.atoms.len(),
    }
}

/// Lists every unmet precondition for entering the loop.
pub fn check_gate(doc: &LedgerDocument) -> GateReport {
    let mut missing = Vec::new();
    let objective = doc.objective.clone().unwrap_or_default();

    for (field, value) in [
        ("goal", objective.goal.as_str()),
        ("background_intent", objective.background_intent.as_str()),
    ] {
        if is_blank(value) {
            missing.push(format!("objective.{field} (empty)"));
        }
    }
    if objective.base_case.is_none() {
        missing.push("objective.base_case".to_string());
    }
    if objective.deliverables.iter().all(|value| is_blank(value)) {
        missing.push("objective.deliverables (empty)".to_string());
    }
    if is_blank(&objective.definition_of_done) {
        missing.push("objective.definition_of_done (empty)".to_string());
    }

    if doc.atoms.is_empty() {
        missing.push("atoms (must have at least 1)".to_string());
    }

    let status = doc.control.as_ref().and_then(|control| control.status);
    match status {
        None => missing.push("control.status".to_string()),
        Some(status) if !GATE_ALLOWED_STATUSES.contains(&status) => missing.push(format!(
            "control.status must be 'pending', 'stopped' or 'running', got '{status}'"
        )),
        Some(_) => {}
    }

    GateReport {
        ready: missing.is_empty(),
        missing,
        status,
    }
}

fn is_blank(value: &str) -> bool {
    matches!(value.trim(), "" | "null" | "~" | "\"\"" | "''")
}

#[cfg(test)]
mod tests {
    use super::{check_gate, validate_integrity};
    use crate::model::atom::Atom;
    use crate::model::checklist::{BaseCase, Check, CheckKind};
    use crate::model::document::{Control, ControlStatus, LedgerDocument, Objective};

    fn ready_document() -> LedgerDocument {
        let mut doc = LedgerDocument::new(Objective {
            goal: "Ship the parser".to_string(),
            background_intent: "Unblock the compiler work".to_string(),
            deliverables: vec!["parser crate".to_string()],
            definition_of_done: "tests pass".to_string(),
            base_case: Some(BaseCase::Single(Check::new(CheckKind::Command, "true"))),
        });
        doc.atoms.push(Atom::new("A1", "write grammar"));
        doc
    }

    #[test]
    fn complete_document_passes_gate_and_validation() {
        let doc = ready_document();
        let gate = check_gate(&doc);
        assert!(gate.ready, "unexpected missing: {:?}", gate.missing);
        assert_eq!(gate.status, Some(ControlStatus::Pending));

        let report = validate_integrity(&doc);
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
        assert_eq!(report.atom_count, 1);
    }

    #[test]
    fn completed_status_blocks_gate() {
        let mut doc = ready_document();
        doc.control = Some(Control {
            status: Some(ControlStatus::Completed),
            ..Control::initial()
        });
        let gate = check_gate(&doc);
        assert!(!gate.ready);
        assert_eq!(
            gate.missing,
            vec!["control.status must be 'pending', 'stopped' or 'running', got 'completed'"
                .to_string()]
        );
    }

    #[test]
    fn missing_sections_are_errors_and_missing_counters_are_warnings() {
        let doc = LedgerDocument {
            control: Some(Control::default()),
            ..LedgerDocument::default()
        };
        let report = validate_integrity(&doc);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"Missing required section: objective".to_string()));
        assert!(report
            .errors
            .contains(&"No atoms defined (must have at least 1)".to_string()));
        assert_eq!(
            report.warnings,
            vec![
                "Missing control.status".to_string(),
                "Missing control.iteration".to_string(),
                "Missing control.stall_count".to_string(),
            ]
        );
    }

    #[test]
    fn duplicate_ids_and_dangling_dependencies_are_reported() {
        let mut doc = ready_document();
        doc.atoms.push(Atom::new("A1", "again"));
        doc.atoms.push(Atom::new("A2", "ghost dep").with_depends_on(["A9"]));

        let report = validate_integrity(&doc);
        assert!(!report.valid);
        assert!(report.errors.contains(&"Duplicate atom IDs: A1".to_string()));
        assert_eq!(
            report.warnings,
            vec!["Atom A2 depends on undefined atom: A9".to_string()]
        );
    }

    #[test]
    fn each_duplicate_id_is_listed_once() {
        let mut doc = ready_document();
        doc.atoms.push(Atom::new("A1", "again"));
        doc.atoms.push(Atom::new("A1", "and again"));
        doc.atoms.push(Atom::new("B1", "first"));
        doc.atoms.push(Atom::new("B1", "second"));

        let report = validate_integrity(&doc);
        let duplicates: Vec<&String> = report
            .errors
            .iter()
            .filter(|error| error.starts_with("Duplicate atom IDs"))
            .collect();
        assert_eq!(duplicates, vec!["Duplicate atom IDs: A1, B1"]);
    }
}
