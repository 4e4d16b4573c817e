//! Subcommand dispatch and JSON rendering.

use crate::config::{Config, StoreFormat};
use crate::Command;
use aotledger_core::model::checklist::CheckKind;
use aotledger_core::{
    BaseCase, Check, CheckResult, ChecklistVerifier, FsPathProber, LedgerError, LedgerService,
    LedgerStore, MarkdownLedgerStore, Objective, ShellCommandRunner, SqliteLedgerStore,
    StoreError, Verdict,
};
use log::error;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LIST_SEPARATOR: char = ',';
const DESCRIPTION_SEPARATOR: &str = "|||";

/// Successful mutation: `{"success": true, ...outcome}`.
#[derive(Serialize)]
struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    outcome: T,
}

#[derive(Serialize)]
struct Failure<'a> {
    success: bool,
    error: &'a str,
    kind: &'a str,
}

/// Single probe result, shaped like a checklist leaf.
#[derive(Serialize)]
struct ProbeOutcome {
    passed: bool,
    #[serde(flatten)]
    result: CheckResult,
}

/// Runs one subcommand; returns whether the process should exit 0.
pub fn run(command: Command, config: &Config) -> bool {
    let service = LedgerService::new(open_store(config.store, &config.state_file));
    match dispatch(command, config, &service) {
        Ok(passed) => passed,
        Err(err) => {
            error!(
                "event=cli_command module=cli status=error kind={} error={}",
                err.kind(),
                err
            );
            print_failure(&err.to_string(), err.kind().as_str());
            false
        }
    }
}

fn dispatch(
    command: Command,
    config: &Config,
    service: &LedgerService<Box<dyn LedgerStore>>,
) -> Result<bool, LedgerError> {
    match command {
        Command::Init {
            goal,
            background_intent,
            deliverables,
            definition_of_done,
            base_case,
            check_command,
        } => {
            let base_case = match (base_case, check_command) {
                (Some(path), _) => Some(read_base_case(&path)?),
                (None, Some(command)) => {
                    Some(BaseCase::Single(Check::new(CheckKind::Command, command)))
                }
                (None, None) => None,
            };
            let objective = Objective {
                goal,
                background_intent,
                deliverables: split_list(&deliverables),
                definition_of_done,
                base_case,
            };
            print_success(service.initialize(objective)?)
        }
        Command::AddAtom {
            atom_id,
            description,
            depends_on,
            or_group,
        } => print_success(service.add_atom(
            atom_id,
            description,
            split_list(&depends_on),
            or_group.filter(|group| !group.trim().is_empty()),
        )?),
        Command::Decompose {
            parent_id,
            children,
            descriptions,
            reason,
        } => print_success(service.decompose_atom(
            parent_id,
            split_list(&children),
            split_descriptions(&descriptions),
            reason,
        )?),
        Command::SwitchBranch {
            group_name,
            new_selection,
            reason,
        } => print_success(service.switch_or_branch(&group_name, new_selection, reason)?),
        Command::Bind {
            atom_id,
            summary,
            artifacts,
        } => print_success(service.add_binding(atom_id, summary, split_list(&artifacts))?),
        Command::UpdateAtom { atom_id, status } => {
            print_success(service.update_atom(&atom_id, &status)?)
        }
        Command::SetStatus { status, reason } => print_success(service.set_status(
            &status,
            reason.filter(|reason| !reason.trim().is_empty()),
        )?),
        Command::Read => {
            print_json(&service.read_state()?);
            Ok(true)
        }
        Command::Validate => {
            let report = service.validate_state()?;
            print_json(&report);
            Ok(report.valid)
        }
        Command::Gate => {
            let report = service.check_gate()?;
            print_json(&report);
            Ok(report.ready)
        }
        Command::Verify { timeout } => {
            let verifier = verifier(config, timeout);
            let report = service.verify_checklist(&verifier)?;
            print_json(&report);
            Ok(report.passed)
        }
        Command::VerifyCommand {
            command,
            expect_fail,
            timeout,
        } => {
            let kind = if expect_fail {
                CheckKind::NotCommand
            } else {
                CheckKind::Command
            };
            Ok(print_probe(
                verifier(config, timeout).evaluate_check(&Check::new(kind, command)),
            ))
        }
        Command::VerifyFile {
            path,
            expect_missing,
        } => {
            let kind = if expect_missing {
                CheckKind::NotFile
            } else {
                CheckKind::File
            };
            Ok(print_probe(
                verifier(config, None).evaluate_check(&Check::new(kind, path)),
            ))
        }
        Command::Export { to, to_store } => {
            let target = open_store(to_store, &to);
            let atoms = service.export_to(&target)?;
            print_success(ExportOutcome {
                target: to.display().to_string(),
                store: to_store,
                atoms,
            })
        }
    }
}

#[derive(Serialize)]
struct ExportOutcome {
    target: String,
    store: StoreFormat,
    atoms: usize,
}

fn open_store(format: StoreFormat, path: &Path) -> Box<dyn LedgerStore> {
    match format {
        StoreFormat::Markdown => Box::new(MarkdownLedgerStore::new(path)),
        StoreFormat::Sqlite => Box::new(SqliteLedgerStore::new(path)),
    }
}

fn verifier(
    config: &Config,
    timeout: Option<u64>,
) -> ChecklistVerifier<ShellCommandRunner, FsPathProber> {
    let timeout = Duration::from_secs(timeout.unwrap_or(config.command_timeout_secs));
    let root = config
        .probe_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    ChecklistVerifier::new(
        ShellCommandRunner::new(timeout).with_working_dir(root.clone()),
        FsPathProber::new(root),
    )
}

fn read_base_case(path: &Path) -> Result<BaseCase, LedgerError> {
    let contents = fs::read_to_string(path).map_err(StoreError::from)?;
    let base_case: BaseCase = serde_yaml::from_str(&contents).map_err(StoreError::from)?;
    Ok(base_case)
}

/// Comma-separated list; blanks are dropped.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// `|||`-separated descriptions; blanks are kept so counts stay honest.
pub fn split_descriptions(value: &str) -> Vec<String> {
    value
        .split(DESCRIPTION_SEPARATOR)
        .map(|description| description.trim().to_string())
        .collect()
}

fn print_success<T: Serialize>(outcome: T) -> Result<bool, LedgerError> {
    print_json(&Success {
        success: true,
        outcome,
    });
    Ok(true)
}

fn print_probe(result: CheckResult) -> bool {
    let passed = result.verdict == Verdict::Passed;
    print_json(&ProbeOutcome { passed, result });
    passed
}

pub fn print_failure(message: &str, kind: &str) {
    print_json(&Failure {
        success: false,
        error: message,
        kind,
    });
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => println!(
            "{{\"success\": false, \"error\": \"failed to render output: {}\", \"kind\": \"integrity\"}}",
            err.to_string().replace('"', "'")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{split_descriptions, split_list};

    #[test]
    fn lists_are_trimmed_and_blanks_dropped() {
        assert_eq!(split_list("A1, A2,,A3 "), vec!["A1", "A2", "A3"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn descriptions_split_on_triple_pipe_only() {
        assert_eq!(
            split_descriptions("parse a|b ||| emit code"),
            vec!["parse a|b", "emit code"]
        );
        assert_eq!(split_descriptions("one").len(), 1);
    }
}
