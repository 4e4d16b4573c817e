//! Core of the atom-of-thought ledger.
//! Single source of truth for graph, OR-group, binding and checklist rules.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod probe;
pub mod repo;
pub mod service;

pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::atom::{Atom, AtomId, AtomStatus, AtomValidationError};
pub use model::binding::Binding;
pub use model::checklist::{
    BaseCase, Check, CheckKind, ChecklistItem, ChecklistNode, PassThreshold,
};
pub use model::document::{
    Control, ControlStatus, DecompositionRecord, LedgerDocument, Objective,
};
pub use model::or_group::{OrGroup, TrailEntry};
pub use probe::command::{CommandError, CommandOutput, CommandRunner, ShellCommandRunner};
pub use probe::path::{FsPathProber, PathProbe, PathProber, ProbeError};
pub use repo::{LedgerStore, MarkdownLedgerStore, SqliteLedgerStore, StoreError, StoreResult};
pub use service::checklist_verifier::{
    ChecklistReport, ChecklistVerifier, CheckResult, ItemReport, Verdict,
};
pub use service::integrity::{GateReport, ValidationReport};
pub use service::ledger_service::{LedgerError, LedgerResult, LedgerService, LedgerSnapshot};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
