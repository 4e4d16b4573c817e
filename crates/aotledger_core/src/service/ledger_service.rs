//! Ledger operation facade.
//!
//! # Responsibility
//! - Run every ledger verb as load, apply, save against one store.
//! - Return typed, serializable outcomes for callers to render.
//!
//! # Invariants
//! - Mutations run on a freshly loaded document; the store is only written
//!   after the whole operation succeeded.
//! - Read-only verbs never write.

use crate::error::ErrorKind;
use crate::model::atom::{Atom, AtomId, AtomStatus, AtomValidationError};
use crate::model::binding::Binding;
use crate::model::checklist::BaseCase;
use crate::model::document::{
    Control, ControlStatus, InvalidControlStatus, LedgerDocument, Objective,
};
use crate::model::or_group::OrGroup;
use crate::probe::command::CommandRunner;
use crate::probe::path::PathProber;
use crate::repo::{LedgerStore, StoreError};
use crate::service::atom_graph::{
    executable_frontier, AtomGraph, Decomposition, GraphError, NewAtom,
};
use crate::service::binding_ledger::BindingLedger;
use crate::service::checklist_verifier::{ChecklistReport, ChecklistVerifier};
use crate::service::integrity::{check_gate, validate_integrity, GateReport, ValidationReport};
use crate::service::or_group_service::OrGroupManager;
use log::{error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug)]
pub enum LedgerError {
    Store(StoreError),
    Graph(GraphError),
    AtomStatus(AtomValidationError),
    ControlStatus(InvalidControlStatus),
    /// `initialize` on a store that already holds a ledger.
    AlreadyInitialized,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::Graph(err) => err.kind(),
            Self::AtomStatus(_) | Self::ControlStatus(_) => ErrorKind::Invalid,
            Self::AlreadyInitialized => ErrorKind::Duplicate,
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Graph(err) => write!(f, "{err}"),
            Self::AtomStatus(err) => write!(f, "{err}"),
            Self::ControlStatus(err) => write!(f, "{err}"),
            Self::AlreadyInitialized => write!(f, "Ledger already exists"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Graph(err) => Some(err),
            Self::AtomStatus(err) => Some(err),
            Self::ControlStatus(err) => Some(err),
            Self::AlreadyInitialized => None,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<GraphError> for LedgerError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<AtomValidationError> for LedgerError {
    fn from(value: AtomValidationError) -> Self {
        Self::AtomStatus(value)
    }
}

impl From<InvalidControlStatus> for LedgerError {
    fn from(value: InvalidControlStatus) -> Self {
        Self::ControlStatus(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitOutcome {
    pub goal: String,
    pub has_base_case: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddAtomOutcome {
    pub atom_id: AtomId,
    pub depends_on: Vec<AtomId>,
    pub or_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecomposeOutcome {
    pub parent: AtomId,
    pub children: Vec<AtomId>,
    pub inherited_deps: Vec<AtomId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchOutcome {
    pub or_group: String,
    pub selected: AtomId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingOutcome {
    pub atom_id: AtomId,
    pub artifacts_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateAtomOutcome {
    pub atom_id: AtomId,
    pub status: AtomStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetStatusOutcome {
    pub status: ControlStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Atom counts by status plus the frontier size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AtomSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub executable: usize,
}

/// Full read-only view of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub exists: bool,
    pub status: Option<ControlStatus>,
    pub iteration: u64,
    pub stall_count: u64,
    pub stop_requested: bool,
    pub redirect_requested: bool,
    pub stop_reason: Option<String>,
    pub objective: Option<Objective>,
    pub atoms: Vec<Atom>,
    pub executable_atoms: Vec<Atom>,
    pub or_groups: BTreeMap<String, OrGroup>,
    pub bindings: BTreeMap<AtomId, Binding>,
    pub summary: AtomSummary,
}

impl LedgerSnapshot {
    pub fn of(doc: &LedgerDocument) -> Self {
        let control = doc.control.clone().unwrap_or_default();
        let executable: Vec<Atom> = executable_frontier(doc).into_iter().cloned().collect();
        let count = |status: AtomStatus| doc.atoms.iter().filter(|a| a.status == status).count();
        let summary = AtomSummary {
            total: doc.atoms.len(),
            pending: count(AtomStatus::Pending),
            in_progress: count(AtomStatus::InProgress),
            resolved: count(AtomStatus::Resolved),
            executable: executable.len(),
        };

        Self {
            exists: true,
            status: control.status,
            iteration: control.iteration.unwrap_or(0),
            stall_count: control.stall_count.unwrap_or(0),
            stop_requested: control.stop_requested,
            redirect_requested: control.redirect_requested,
            stop_reason: control.stop_reason,
            objective: doc.objective.clone(),
            atoms: doc.atoms.clone(),
            executable_atoms: executable,
            or_groups: doc.or_groups.clone(),
            bindings: doc.bindings.clone(),
            summary,
        }
    }
}

/// Ledger verbs over one store.
pub struct LedgerService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads, applies `op`, and saves only when `op` succeeded.
    fn mutate<T>(
        &self,
        op_name: &str,
        op: impl FnOnce(&mut LedgerDocument) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut doc = self.store.load()?;
        match op(&mut doc) {
            Ok(outcome) => {
                self.store.save(&doc)?;
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=ledger_op module=service status=error op={} kind={} error={}",
                    op_name,
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    fn read(&self) -> LedgerResult<LedgerDocument> {
        Ok(self.store.load()?)
    }

    /// Writes a fresh ledger with `objective` and an initial control section.
    pub fn initialize(&self, objective: Objective) -> LedgerResult<InitOutcome> {
        if self.store.exists() {
            return Err(LedgerError::AlreadyInitialized);
        }
        let outcome = InitOutcome {
            goal: objective.goal.clone(),
            has_base_case: objective.base_case.is_some(),
        };
        self.store.save(&LedgerDocument::new(objective))?;
        info!(
            "event=ledger_init module=service status=ok base_case={}",
            outcome.has_base_case
        );
        Ok(outcome)
    }

    pub fn add_atom(
        &self,
        id: impl Into<AtomId>,
        description: impl Into<String>,
        depends_on: Vec<AtomId>,
        or_group: Option<String>,
    ) -> LedgerResult<AddAtomOutcome> {
        let request = NewAtom {
            id: id.into(),
            description: description.into(),
            depends_on,
            or_group,
        };
        self.mutate("add_atom", |doc| {
            let mut graph = AtomGraph::new(doc);
            let atom = graph.add_atom(request)?;
            Ok(AddAtomOutcome {
                atom_id: atom.id.clone(),
                depends_on: atom.depends_on.clone(),
                or_group: atom.or_group.clone(),
            })
        })
    }

    pub fn decompose_atom(
        &self,
        parent_id: impl Into<AtomId>,
        children: Vec<AtomId>,
        descriptions: Vec<String>,
        reason: impl Into<String>,
    ) -> LedgerResult<DecomposeOutcome> {
        let request = Decomposition {
            parent_id: parent_id.into(),
            children,
            descriptions,
            reason: reason.into(),
        };
        let parent = request.parent_id.clone();
        let children = request.children.clone();
        self.mutate("decompose_atom", |doc| {
            let inherited_deps = AtomGraph::new(doc).decompose_atom(request)?;
            Ok(DecomposeOutcome {
                parent,
                children,
                inherited_deps,
            })
        })
    }

    pub fn switch_or_branch(
        &self,
        group: &str,
        selection: impl Into<AtomId>,
        reason: impl Into<String>,
    ) -> LedgerResult<SwitchOutcome> {
        let selection = selection.into();
        let reason = reason.into();
        self.mutate("switch_or_branch", |doc| {
            let mut manager = OrGroupManager::new(doc);
            let entry = manager.switch_branch(group, selection, reason);
            Ok(SwitchOutcome {
                or_group: entry.or_group.clone(),
                selected: entry.selected.clone(),
                reason: entry.reason.clone(),
            })
        })
    }

    pub fn add_binding(
        &self,
        atom_id: impl Into<AtomId>,
        summary: impl Into<String>,
        artifacts: Vec<String>,
    ) -> LedgerResult<BindingOutcome> {
        let atom_id = atom_id.into();
        let summary = summary.into();
        let artifacts_count = artifacts.len();
        self.mutate("add_binding", |doc| {
            BindingLedger::new(doc).record(atom_id.clone(), summary, artifacts);
            Ok(BindingOutcome {
                atom_id,
                artifacts_count,
            })
        })
    }

    /// Sets an atom's status from its textual form.
    pub fn update_atom(&self, atom_id: &str, status: &str) -> LedgerResult<UpdateAtomOutcome> {
        let status = AtomStatus::from_str(status)?;
        self.mutate("update_atom", |doc| {
            AtomGraph::new(doc).update_status(atom_id, status)?;
            Ok(UpdateAtomOutcome {
                atom_id: atom_id.to_string(),
                status,
            })
        })
    }

    /// Sets the loop status.
    ///
    /// `reason` replaces `stop_reason`; `completed` without a reason clears
    /// it; otherwise the previous reason is kept.
    pub fn set_status(&self, status: &str, reason: Option<String>) -> LedgerResult<SetStatusOutcome> {
        let status = ControlStatus::from_str(status)?;
        self.mutate("set_status", |doc| {
            let control = doc.control.get_or_insert_with(Control::default);
            let previous = control.status;
            control.status = Some(status);
            match &reason {
                Some(reason) => control.stop_reason = Some(reason.clone()),
                None if status == ControlStatus::Completed => control.stop_reason = None,
                None => {}
            }
            info!(
                "event=loop_status module=service status=ok from={} to={}",
                previous.map_or("none", ControlStatus::as_str),
                status
            );
            Ok(SetStatusOutcome { status, reason })
        })
    }

    pub fn read_state(&self) -> LedgerResult<LedgerSnapshot> {
        let doc = self.read()?;
        Ok(LedgerSnapshot::of(&doc))
    }

    pub fn validate_state(&self) -> LedgerResult<ValidationReport> {
        let doc = self.read()?;
        let report = validate_integrity(&doc);
        info!(
            "event=ledger_validate module=service status=ok valid={} errors={} warnings={}",
            report.valid,
            report.errors.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    pub fn check_gate(&self) -> LedgerResult<GateReport> {
        let doc = self.read()?;
        let report = check_gate(&doc);
        info!(
            "event=ledger_gate module=service status=ok ready={} missing={}",
            report.ready,
            report.missing.len()
        );
        Ok(report)
    }

    /// Evaluates the objective's base case with `verifier`.
    pub fn verify_checklist<C: CommandRunner, P: PathProber>(
        &self,
        verifier: &ChecklistVerifier<C, P>,
    ) -> LedgerResult<ChecklistReport> {
        let doc = self.read()?;
        let base_case: Option<&BaseCase> = doc
            .objective
            .as_ref()
            .and_then(|objective| objective.base_case.as_ref());
        Ok(verifier.verify(base_case))
    }

    /// Copies the ledger into `target` unchanged.
    pub fn export_to<T: LedgerStore>(&self, target: &T) -> LedgerResult<usize> {
        let doc = self.read()?;
        target.save(&doc)?;
        info!(
            "event=ledger_export module=service status=ok atoms={}",
            doc.atoms.len()
        );
        Ok(doc.atoms.len())
    }
}
