use aotledger_core::{
    AtomStatus, BaseCase, Check, CheckKind, ChecklistVerifier, ControlStatus, ErrorKind,
    FsPathProber, LedgerDocument, LedgerError, LedgerService, LedgerStore, MarkdownLedgerStore,
    Objective, ShellCommandRunner, SqliteLedgerStore,
};
use std::fs;
use std::time::Duration;

fn objective() -> Objective {
    Objective {
        goal: "Ship the ledger".to_string(),
        background_intent: "Replace ad-hoc notes".to_string(),
        deliverables: vec!["aotledger binary".to_string()],
        definition_of_done: "All checks green".to_string(),
        base_case: Some(BaseCase::Single(Check::new(CheckKind::File, "marker.txt"))),
    }
}

fn service_in(dir: &tempfile::TempDir) -> LedgerService<MarkdownLedgerStore> {
    let service = LedgerService::new(MarkdownLedgerStore::new(dir.path().join("state.md")));
    service.initialize(objective()).unwrap();
    service
}

#[test]
fn initialize_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let err = service.initialize(objective()).unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyInitialized));
    assert_eq!(err.kind(), ErrorKind::Duplicate);
}

#[test]
fn operations_on_missing_ledger_report_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let service = LedgerService::new(MarkdownLedgerStore::new(dir.path().join("absent.md")));

    let err = service.read_state().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = service
        .add_atom("A1", "first", Vec::new(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn frontier_scenario_through_the_service() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service.add_atom("A1", "first", Vec::new(), None).unwrap();
    let added = service
        .add_atom("A2", "second", vec!["A1".to_string()], None)
        .unwrap();
    assert_eq!(added.depends_on, vec!["A1"]);

    let frontier = |service: &LedgerService<MarkdownLedgerStore>| -> Vec<String> {
        service
            .read_state()
            .unwrap()
            .executable_atoms
            .into_iter()
            .map(|atom| atom.id)
            .collect()
    };
    assert_eq!(frontier(&service), vec!["A1"]);

    let updated = service.update_atom("A1", "resolved").unwrap();
    assert_eq!(updated.status, AtomStatus::Resolved);
    assert_eq!(frontier(&service), vec!["A2"]);

    let bound = service
        .add_binding("A2", "done", vec!["out.txt".to_string()])
        .unwrap();
    assert_eq!(bound.artifacts_count, 1);
    service.update_atom("A2", "resolved").unwrap();

    let snapshot = service.read_state().unwrap();
    assert!(snapshot.executable_atoms.is_empty());
    assert_eq!(snapshot.summary.total, 2);
    assert_eq!(snapshot.summary.resolved, 2);
    assert_eq!(snapshot.summary.executable, 0);
    assert_eq!(snapshot.bindings["A2"].artifacts, vec!["out.txt"]);
}

#[test]
fn failed_operations_leave_stored_ledger_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service.add_atom("A1", "first", Vec::new(), None).unwrap();
    let path = dir.path().join("state.md");
    let before = fs::read_to_string(&path).unwrap();

    let duplicate = service.add_atom("A1", "again", Vec::new(), None).unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::Duplicate);

    let mismatch = service
        .decompose_atom(
            "A1",
            vec!["A1.1".to_string(), "A1.2".to_string()],
            vec!["only one".to_string()],
            "split",
        )
        .unwrap_err();
    assert_eq!(mismatch.kind(), ErrorKind::Invalid);

    let bad_status = service.update_atom("A1", "done").unwrap_err();
    assert_eq!(bad_status.kind(), ErrorKind::Invalid);

    let missing = service.update_atom("A9", "resolved").unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn decompose_reports_inherited_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service.add_atom("A1", "first", Vec::new(), None).unwrap();
    service
        .add_atom("A2", "second", vec!["A1".to_string()], None)
        .unwrap();

    let outcome = service
        .decompose_atom(
            "A2",
            vec!["A2.1".to_string(), "A2.2".to_string()],
            vec!["left".to_string(), "right".to_string()],
            "too large",
        )
        .unwrap();
    assert_eq!(outcome.parent, "A2");
    assert_eq!(outcome.inherited_deps, vec!["A1"]);

    let doc = service.store().load().unwrap();
    assert_eq!(doc.atoms.len(), 4);
    assert_eq!(doc.decompositions.len(), 1);
}

#[test]
fn switch_branch_persists_group_and_trail() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let outcome = service
        .switch_or_branch("strategy", "A5", "trying alternative")
        .unwrap();
    assert_eq!(outcome.selected, "A5");

    let doc = service.store().load().unwrap();
    assert_eq!(doc.or_groups["strategy"].selected.as_deref(), Some("A5"));
    assert_eq!(doc.trail.len(), 1);
}

#[test]
fn set_status_manages_stop_reason() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let stopped = service
        .set_status("stopped", Some("waiting on review".to_string()))
        .unwrap();
    assert_eq!(stopped.status, ControlStatus::Stopped);
    let snapshot = service.read_state().unwrap();
    assert_eq!(snapshot.stop_reason.as_deref(), Some("waiting on review"));

    service.set_status("running", None).unwrap();
    assert_eq!(
        service.read_state().unwrap().stop_reason.as_deref(),
        Some("waiting on review")
    );

    service.set_status("completed", None).unwrap();
    let snapshot = service.read_state().unwrap();
    assert_eq!(snapshot.status, Some(ControlStatus::Completed));
    assert_eq!(snapshot.stop_reason, None);

    let err = service.set_status("paused", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[test]
fn set_status_creates_missing_control_section() {
    let dir = tempfile::tempdir().unwrap();
    let store = MarkdownLedgerStore::new(dir.path().join("state.md"));
    store.save(&LedgerDocument::default()).unwrap();

    let service = LedgerService::new(&store);
    service.set_status("running", None).unwrap();
    let control = store.load().unwrap().control.unwrap();
    assert_eq!(control.status, Some(ControlStatus::Running));
}

#[test]
fn gate_lists_missing_definition_of_done() {
    let dir = tempfile::tempdir().unwrap();
    let store = MarkdownLedgerStore::new(dir.path().join("state.md"));
    let service = LedgerService::new(&store);
    service
        .initialize(Objective {
            definition_of_done: String::new(),
            ..objective()
        })
        .unwrap();
    service.add_atom("A1", "first", Vec::new(), None).unwrap();

    let gate = service.check_gate().unwrap();
    assert!(!gate.ready);
    assert_eq!(gate.missing, vec!["objective.definition_of_done (empty)"]);
    assert_eq!(gate.status, Some(ControlStatus::Pending));
}

#[test]
fn validate_reports_cycle_from_hand_edit() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service.add_atom("A", "a", Vec::new(), None).unwrap();
    service.add_atom("B", "b", vec!["A".to_string()], None).unwrap();
    service.add_atom("C", "c", vec!["B".to_string()], None).unwrap();

    let mut doc = service.store().load().unwrap();
    doc.atom_mut("A").unwrap().depends_on.push("C".to_string());
    service.store().save(&doc).unwrap();

    let report = service.validate_state().unwrap();
    assert!(!report.valid);
    assert_eq!(report.atom_count, 3);
    assert!(report
        .errors
        .contains(&"Circular dependency detected: A -> C -> B -> A".to_string()));
}

#[test]
fn verify_checklist_uses_filesystem_prober() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    let verifier = ChecklistVerifier::new(
        ShellCommandRunner::new(Duration::from_secs(5)),
        FsPathProber::new(dir.path()),
    );

    let report = service.verify_checklist(&verifier).unwrap();
    assert!(!report.passed);
    assert_eq!(report.checklist[0].evidence, "Path not found: marker.txt");

    fs::write(dir.path().join("marker.txt"), "ok").unwrap();
    let report = service.verify_checklist(&verifier).unwrap();
    assert!(report.passed);
    assert_eq!(report.checklist[0].evidence, "File exists (2B): marker.txt");
}

#[test]
fn export_copies_markdown_ledger_into_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);
    service.add_atom("A1", "first", Vec::new(), None).unwrap();
    service
        .add_binding("A1", "done", vec!["x".to_string()])
        .unwrap();

    let target = SqliteLedgerStore::new(dir.path().join("ledger.db"));
    assert_eq!(service.export_to(&target).unwrap(), 1);
    assert_eq!(target.load().unwrap(), service.store().load().unwrap());
}
