//! Recursive base-case checklist evaluation.
//!
//! # Responsibility
//! - Evaluate leaf checks through the command runner and path prober.
//! - Aggregate AND (`group`) and OR (`any_of`) nodes depth-first, pre-order.
//!
//! # Invariants
//! - `quality` leaves are never executed; they are reported as skipped.
//! - Skipped children never count as pass or fail evidence.
//! - An AND node whose children are all skipped passes; an OR node whose
//!   children are all skipped fails. Both surface the skipped names.
//! - Evaluation always runs to completion; there is no early exit.

use crate::model::checklist::{
    BaseCase, Check, CheckKind, ChecklistItem, ChecklistNode, PassThreshold,
};
use crate::probe::command::{truncate_chars, CommandError, CommandRunner};
use crate::probe::path::{format_size, PathProbe, PathProber};
use log::{debug, info, warn};
use serde::Serialize;

const MAX_OUTPUT_SUMMARY_CHARS: usize = 3000;
const SUMMARY_STDOUT_CHARS: usize = 2000;
const SUMMARY_STDERR_CHARS: usize = 500;
const LEGACY_ITEM_NAME: &str = "base_case";

/// Tri-state outcome of one checklist node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
    /// Needs external judgment; excluded from aggregation.
    Skipped,
}

impl Verdict {
    fn from_bool(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// Group aggregation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    All,
    Any,
}

/// Leaf-specific evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafDetail {
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_threshold: Option<PassThreshold>,
}

impl LeafDetail {
    fn of(check: &Check) -> Self {
        Self {
            check_type: check.check_type.clone(),
            exit_code: None,
            output_summary: None,
            criteria: None,
            pass_threshold: None,
        }
    }
}

/// Result of evaluating one check, independent of any checklist item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub verdict: Verdict,
    pub evidence: String,
    #[serde(flatten)]
    pub detail: LeafDetail,
}

/// Evaluated checklist node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub item: String,
    pub verdict: Verdict,
    pub evidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<GroupMode>,
    #[serde(flatten)]
    pub leaf: Option<LeafDetail>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemReport>,
    /// Names of skipped leaves anywhere below this node.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_items: Vec<String>,
}

impl ItemReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn skipped(&self) -> bool {
        self.verdict == Verdict::Skipped
    }
}

/// Result of `verify_checklist`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistReport {
    pub passed: bool,
    pub checklist: Vec<ItemReport>,
    /// Flat list of skipped leaves, e.g. `Docs reviewed (type: quality)`.
    pub skipped: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Checklist evaluator over pluggable leaf collaborators.
pub struct ChecklistVerifier<C: CommandRunner, P: PathProber> {
    commands: C,
    paths: P,
}

impl<C: CommandRunner, P: PathProber> ChecklistVerifier<C, P> {
    pub fn new(commands: C, paths: P) -> Self {
        Self { commands, paths }
    }

    /// Evaluates an objective's base case.
    ///
    /// A missing base case yields a failed report with `error` set.
    pub fn verify(&self, base_case: Option<&BaseCase>) -> ChecklistReport {
        let report = match base_case {
            Some(BaseCase::Checklist { checklist }) => self.verify_items(checklist),
            Some(BaseCase::Single(check)) => {
                self.verify_items(std::slice::from_ref(&ChecklistItem::leaf(
                    LEGACY_ITEM_NAME,
                    check.clone(),
                )))
            }
            None => ChecklistReport {
                passed: false,
                checklist: Vec::new(),
                skipped: Vec::new(),
                error: Some("No checklist or valid base_case found".to_string()),
            },
        };
        info!(
            "event=checklist_verify module=verifier status=ok passed={} items={} skipped={}",
            report.passed,
            report.checklist.len(),
            report.skipped.len()
        );
        report
    }

    /// Evaluates root-level items; every item must pass or be skipped.
    pub fn verify_items(&self, items: &[ChecklistItem]) -> ChecklistReport {
        let mut passed = true;
        let mut skipped = Vec::new();
        let mut checklist = Vec::with_capacity(items.len());

        for item in items {
            let report = self.verify_item(item);
            if report.skipped() {
                skipped.push(skipped_label(&report.item));
            } else {
                skipped.extend(report.skipped_items.iter().map(|name| skipped_label(name)));
                if !report.passed() {
                    passed = false;
                }
            }
            checklist.push(report);
        }

        ChecklistReport {
            passed,
            checklist,
            skipped,
            error: None,
        }
    }

    /// Evaluates one item and everything below it.
    pub fn verify_item(&self, item: &ChecklistItem) -> ItemReport {
        match &item.node {
            ChecklistNode::Leaf(check) => {
                let result = self.evaluate_check(check);
                debug!(
                    "event=checklist_leaf module=verifier status=ok item={} verdict={:?}",
                    item.item, result.verdict
                );
                ItemReport {
                    item: item.item.clone(),
                    verdict: result.verdict,
                    evidence: result.evidence,
                    mode: None,
                    leaf: Some(result.detail),
                    children: Vec::new(),
                    skipped_items: Vec::new(),
                }
            }
            ChecklistNode::All(children) => self.verify_group(item, children, GroupMode::All),
            ChecklistNode::Any(children) => self.verify_group(item, children, GroupMode::Any),
            ChecklistNode::Undefined => ItemReport {
                item: item.item.clone(),
                verdict: Verdict::Failed,
                evidence: "No check, group, or any_of defined".to_string(),
                mode: None,
                leaf: None,
                children: Vec::new(),
                skipped_items: Vec::new(),
            },
        }
    }

    fn verify_group(
        &self,
        item: &ChecklistItem,
        children: &[ChecklistItem],
        mode: GroupMode,
    ) -> ItemReport {
        let reports: Vec<ItemReport> = children
            .iter()
            .map(|child| self.verify_item(child))
            .collect();

        let mut skipped_items = Vec::new();
        for report in &reports {
            if report.skipped() {
                skipped_items.push(report.item.clone());
            } else {
                skipped_items.extend(report.skipped_items.iter().cloned());
            }
        }

        let mut judged = reports.iter().filter(|report| !report.skipped());
        let passed_count = reports.iter().filter(|report| report.passed()).count();
        let (passed, evidence) = match mode {
            GroupMode::All => (
                judged.all(ItemReport::passed),
                format!("AND group: {passed_count}/{} passed", reports.len()),
            ),
            GroupMode::Any => (
                judged.any(ItemReport::passed),
                format!(
                    "OR group: {passed_count}/{} passed (need 1)",
                    reports.len()
                ),
            ),
        };

        ItemReport {
            item: item.item.clone(),
            verdict: Verdict::from_bool(passed),
            evidence,
            mode: Some(mode),
            leaf: None,
            children: reports,
            skipped_items,
        }
    }

    /// Evaluates one leaf check.
    pub fn evaluate_check(&self, check: &Check) -> CheckResult {
        let mut detail = LeafDetail::of(check);
        let kind = match check.kind() {
            Ok(kind) => kind,
            Err(err) => {
                return CheckResult {
                    verdict: Verdict::Failed,
                    evidence: err.to_string(),
                    detail,
                }
            }
        };

        let (verdict, evidence) = match kind {
            CheckKind::Command | CheckKind::NotCommand => {
                self.evaluate_command(&check.value, kind == CheckKind::NotCommand, &mut detail)
            }
            CheckKind::File | CheckKind::NotFile => {
                self.evaluate_path(&check.value, kind == CheckKind::NotFile)
            }
            CheckKind::Quality => {
                let criteria = check.criteria.clone().unwrap_or_default();
                let threshold = check
                    .pass_threshold
                    .as_ref()
                    .map(|value| value.to_string())
                    .unwrap_or_default();
                let evidence = format!(
                    "Quality check requires LLM judgment (threshold: {threshold}): {criteria}"
                );
                detail.criteria = Some(criteria);
                detail.pass_threshold = check.pass_threshold.clone();
                (Verdict::Skipped, evidence)
            }
        };

        CheckResult {
            verdict,
            evidence,
            detail,
        }
    }

    fn evaluate_command(
        &self,
        command: &str,
        expect_failure: bool,
        detail: &mut LeafDetail,
    ) -> (Verdict, String) {
        let output = match self.commands.run(command) {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    "event=check_command module=verifier status=error kind={}",
                    err.kind().as_str()
                );
                detail.exit_code = Some(-1);
                let evidence = match &err {
                    CommandError::Timeout { .. } => err.to_string(),
                    CommandError::Spawn(_) => format!("Command failed to execute: {err}"),
                };
                return (Verdict::Failed, evidence);
            }
        };

        let code = output.exit_code;
        let (passed, evidence) = if expect_failure {
            let passed = code != 0;
            let evidence = if passed {
                format!("Command exited with code {code} (expected non-zero)")
            } else {
                "Command exited with code 0 (expected failure)".to_string()
            };
            (passed, evidence)
        } else {
            let passed = code == 0;
            let suffix = if passed { "success" } else { "failure" };
            (passed, format!("Command exited with code {code} ({suffix})"))
        };

        let mut summary = Vec::new();
        if !output.stdout.is_empty() {
            summary.push(truncate_chars(&output.stdout, SUMMARY_STDOUT_CHARS));
        }
        if !output.stderr.is_empty() && !passed {
            summary.push(format!(
                "STDERR: {}",
                truncate_chars(&output.stderr, SUMMARY_STDERR_CHARS)
            ));
        }
        detail.exit_code = Some(code);
        detail.output_summary = Some(truncate_chars(
            &summary.join("\n"),
            MAX_OUTPUT_SUMMARY_CHARS,
        ));

        (Verdict::from_bool(passed), evidence)
    }

    fn evaluate_path(&self, target: &str, expect_missing: bool) -> (Verdict, String) {
        let probe = match self.paths.probe(target) {
            Ok(probe) => probe,
            Err(err) => return (Verdict::Failed, format!("Path probe failed: {err}")),
        };
        let exists = probe.exists();
        let evidence = if expect_missing {
            match (exists, probe) {
                (false, PathProbe::Glob { .. }) => {
                    format!("No files match pattern (as expected): {target}")
                }
                (false, _) => format!("Path does not exist (as expected): {target}"),
                (true, PathProbe::Glob { match_count }) => {
                    format!("{match_count} files match pattern (expected none): {target}")
                }
                (true, PathProbe::Directory { file_count }) => format!(
                    "Directory exists with {file_count} files (expected missing): {target}"
                ),
                (true, PathProbe::File { size }) => format!(
                    "File exists ({}) (expected missing): {target}",
                    format_size(size)
                ),
                (true, PathProbe::Missing) => format!("Path state unknown: {target}"),
            }
        } else {
            match probe {
                PathProbe::Glob { match_count } if exists => {
                    format!("{match_count} files match pattern: {target}")
                }
                PathProbe::Glob { .. } => format!("No files match pattern: {target}"),
                PathProbe::Directory { file_count } => {
                    format!("Directory exists with {file_count} files: {target}")
                }
                PathProbe::File { size } => {
                    format!("File exists ({}): {target}", format_size(size))
                }
                PathProbe::Missing => format!("Path not found: {target}"),
            }
        };
        (Verdict::from_bool(exists != expect_missing), evidence)
    }
}

fn skipped_label(name: &str) -> String {
    format!("{name} (type: quality)")
}
