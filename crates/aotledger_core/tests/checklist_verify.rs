use aotledger_core::model::checklist::{CHECK_COMMAND, CHECK_FILE};
use aotledger_core::{
    BaseCase, Check, CheckKind, ChecklistItem, ChecklistVerifier, CommandError, CommandOutput,
    CommandRunner, PathProbe, PathProber, ProbeError, Verdict,
};
use std::collections::HashMap;
use std::time::Duration;

/// Exit codes keyed by command line; `sleep` always times out.
struct FakeRunner {
    exit_codes: HashMap<&'static str, i32>,
}

impl FakeRunner {
    fn new() -> Self {
        let exit_codes = HashMap::from([("true", 0), ("false", 1), ("cargo test", 0)]);
        Self { exit_codes }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, CommandError> {
        if command.starts_with("sleep") {
            return Err(CommandError::Timeout {
                after: Duration::from_secs(120),
            });
        }
        let exit_code = self.exit_codes.get(command).copied().unwrap_or(127);
        Ok(CommandOutput {
            exit_code,
            stdout: format!("ran {command}"),
            stderr: if exit_code == 0 {
                String::new()
            } else {
                "boom".to_string()
            },
        })
    }
}

struct FakeProber;

impl PathProber for FakeProber {
    fn probe(&self, target: &str) -> Result<PathProbe, ProbeError> {
        Ok(match target {
            "README.md" => PathProbe::File { size: 2048 },
            "src" => PathProbe::Directory { file_count: 3 },
            "src/*.rs" => PathProbe::Glob { match_count: 2 },
            "dist/*.tar" => PathProbe::Glob { match_count: 0 },
            _ => PathProbe::Missing,
        })
    }
}

fn verifier() -> ChecklistVerifier<FakeRunner, FakeProber> {
    ChecklistVerifier::new(FakeRunner::new(), FakeProber)
}

fn pass() -> ChecklistItem {
    ChecklistItem::leaf("pass", Check::new(CheckKind::Command, "true"))
}

fn fail() -> ChecklistItem {
    ChecklistItem::leaf("fail", Check::new(CheckKind::Command, "false"))
}

fn skip(name: &str) -> ChecklistItem {
    ChecklistItem::leaf(name, Check::quality("reads well", 0.8))
}

fn verdict_of(item: ChecklistItem) -> Verdict {
    verifier().verify_item(&item).verdict
}

#[test]
fn and_group_aggregation() {
    assert_eq!(
        verdict_of(ChecklistItem::all("g", vec![pass(), pass()])),
        Verdict::Passed
    );
    assert_eq!(
        verdict_of(ChecklistItem::all("g", vec![pass(), fail()])),
        Verdict::Failed
    );

    let report = verifier().verify_item(&ChecklistItem::all("g", vec![skip("s1"), skip("s2")]));
    assert_eq!(report.verdict, Verdict::Passed);
    assert_eq!(report.skipped_items, vec!["s1", "s2"]);
    assert_eq!(report.evidence, "AND group: 0/2 passed");
}

#[test]
fn or_group_aggregation() {
    assert_eq!(
        verdict_of(ChecklistItem::any("g", vec![fail(), fail()])),
        Verdict::Failed
    );

    let report = verifier().verify_item(&ChecklistItem::any("g", vec![fail(), pass()]));
    assert_eq!(report.verdict, Verdict::Passed);
    assert_eq!(report.evidence, "OR group: 1/2 passed (need 1)");

    let skipped = verifier().verify_item(&ChecklistItem::any("g", vec![skip("s1"), skip("s2")]));
    assert_eq!(skipped.verdict, Verdict::Failed);
    assert_eq!(skipped.skipped_items, vec!["s1", "s2"]);
}

#[test]
fn nested_skips_surface_in_top_level_list() {
    let base_case = BaseCase::Checklist {
        checklist: vec![
            ChecklistItem::leaf("Tests pass", Check::new(CheckKind::Command, "cargo test")),
            ChecklistItem::all(
                "Docs",
                vec![
                    ChecklistItem::leaf("Readme", Check::new(CheckKind::File, "README.md")),
                    skip("Docs reviewed"),
                ],
            ),
            skip("Polish"),
        ],
    };

    let report = verifier().verify(Some(&base_case));
    assert!(report.passed);
    assert!(report.error.is_none());
    assert_eq!(report.checklist.len(), 3);
    assert_eq!(
        report.skipped,
        vec!["Docs reviewed (type: quality)", "Polish (type: quality)"]
    );
}

#[test]
fn failing_root_item_fails_report_but_evaluation_continues() {
    let report = verifier().verify_items(&[fail(), pass()]);
    assert!(!report.passed);
    assert_eq!(report.checklist.len(), 2);
    assert_eq!(report.checklist[1].verdict, Verdict::Passed);
}

#[test]
fn legacy_single_check_runs_as_base_case_leaf() {
    let report = verifier().verify(Some(&BaseCase::Single(Check::new(
        CheckKind::NotCommand,
        "false",
    ))));
    assert!(report.passed);
    assert_eq!(report.checklist[0].item, "base_case");
    assert_eq!(
        report.checklist[0].evidence,
        "Command exited with code 1 (expected non-zero)"
    );
}

#[test]
fn missing_base_case_is_an_error_report() {
    let report = verifier().verify(None);
    assert!(!report.passed);
    assert_eq!(
        report.error.as_deref(),
        Some("No checklist or valid base_case found")
    );
}

#[test]
fn command_leaf_evidence() {
    let v = verifier();

    let ok = v.evaluate_check(&Check::new(CheckKind::Command, "true"));
    assert_eq!(ok.verdict, Verdict::Passed);
    assert_eq!(ok.evidence, "Command exited with code 0 (success)");
    assert_eq!(ok.detail.exit_code, Some(0));
    assert_eq!(ok.detail.output_summary.as_deref(), Some("ran true"));

    let bad = v.evaluate_check(&Check::new(CheckKind::Command, "false"));
    assert_eq!(bad.evidence, "Command exited with code 1 (failure)");
    assert_eq!(
        bad.detail.output_summary.as_deref(),
        Some("ran false\nSTDERR: boom")
    );

    let inverted = v.evaluate_check(&Check::new(CheckKind::NotCommand, "true"));
    assert_eq!(inverted.verdict, Verdict::Failed);
    assert_eq!(
        inverted.evidence,
        "Command exited with code 0 (expected failure)"
    );

    let slow = v.evaluate_check(&Check::new(CheckKind::Command, "sleep 999"));
    assert_eq!(slow.verdict, Verdict::Failed);
    assert_eq!(slow.evidence, "Command timed out after 120s");
}

#[test]
fn file_leaf_evidence() {
    let v = verifier();

    let file = v.evaluate_check(&Check::new(CheckKind::File, "README.md"));
    assert_eq!(file.verdict, Verdict::Passed);
    assert_eq!(file.evidence, "File exists (2.0KB): README.md");

    let dir = v.evaluate_check(&Check::new(CheckKind::File, "src"));
    assert_eq!(dir.evidence, "Directory exists with 3 files: src");

    let glob = v.evaluate_check(&Check::new(CheckKind::File, "src/*.rs"));
    assert_eq!(glob.evidence, "2 files match pattern: src/*.rs");

    let absent = v.evaluate_check(&Check::new(CheckKind::File, "missing.txt"));
    assert_eq!(absent.verdict, Verdict::Failed);
    assert_eq!(absent.evidence, "Path not found: missing.txt");

    let none = v.evaluate_check(&Check::new(CheckKind::NotFile, "dist/*.tar"));
    assert_eq!(none.verdict, Verdict::Passed);
    assert_eq!(none.evidence, "No files match pattern (as expected): dist/*.tar");

    let present = v.evaluate_check(&Check::new(CheckKind::NotFile, "README.md"));
    assert_eq!(present.verdict, Verdict::Failed);
    assert_eq!(
        present.evidence,
        "File exists (2.0KB) (expected missing): README.md"
    );
}

#[test]
fn unknown_type_and_undefined_item_fail() {
    let v = verifier();
    let unknown = v.evaluate_check(&Check {
        check_type: "http".to_string(),
        value: "https://example.invalid".to_string(),
        criteria: None,
        pass_threshold: None,
    });
    assert_eq!(unknown.verdict, Verdict::Failed);
    assert_eq!(unknown.evidence, "Unknown check type: http");

    let items: Vec<ChecklistItem> = serde_yaml::from_str("- item: Nothing here\n").unwrap();
    let report = v.verify_item(&items[0]);
    assert_eq!(report.verdict, Verdict::Failed);
    assert_eq!(report.evidence, "No check, group, or any_of defined");
}

#[test]
fn yaml_checklist_shapes_evaluate() {
    let yaml = format!(
        "checklist:
  - item: Build
    check:
      type: {CHECK_COMMAND}
      value: \"true\"
  - item: Artifacts
    any_of:
      - item: Tarball
        check:
          type: {CHECK_FILE}
          value: dist/*.tar
      - item: Sources
        check:
          type: {CHECK_FILE}
          value: src/*.rs
"
    );
    let base_case: BaseCase = serde_yaml::from_str(&yaml).unwrap();
    let report = verifier().verify(Some(&base_case));
    assert!(report.passed);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["checklist"][0]["type"], "command");
    assert_eq!(json["checklist"][0]["verdict"], "passed");
    assert_eq!(json["checklist"][1]["mode"], "any");
    assert_eq!(json["checklist"][1]["children"][0]["verdict"], "failed");
    assert!(json.get("error").is_none());
}

#[test]
fn label_threshold_survives_into_quality_evidence() {
    let result = verifier().evaluate_check(&Check::quality("reads well", "7/10"));
    assert_eq!(result.verdict, Verdict::Skipped);
    assert_eq!(
        result.evidence,
        "Quality check requires LLM judgment (threshold: 7/10): reads well"
    );
}
