//! Atom dependency graph operations.
//!
//! # Responsibility
//! - Insert, decompose and re-status atoms on a loaded ledger document.
//! - Compute the executable frontier and find dependency cycles.
//!
//! # Invariants
//! - IDs are unique across the ledger's whole history, decomposition included.
//! - Insertions only reference existing atoms; cycle detection is an explicit
//!   validation step, not part of every insert.
//! - Decomposition is additive: the parent atom is left untouched.

use crate::error::ErrorKind;
use crate::model::atom::{validate_atom_id, Atom, AtomId, AtomStatus, AtomValidationError};
use crate::model::document::{DecompositionRecord, LedgerDocument};
use chrono::Utc;
use log::info;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from graph mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// ID already exists somewhere in the ledger history.
    DuplicateId(AtomId),
    /// A dependency names an atom that does not exist.
    UnknownDependency { atom_id: AtomId, dependency: AtomId },
    /// Decomposition parent does not exist.
    ParentNotFound(AtomId),
    /// Target atom does not exist.
    AtomNotFound(AtomId),
    /// Child ID and description lists differ in length.
    ChildCountMismatch { children: usize, descriptions: usize },
    /// Identifier or status failed validation.
    Validation(AtomValidationError),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateId(_) => ErrorKind::Duplicate,
            Self::UnknownDependency { .. } | Self::ParentNotFound(_) | Self::AtomNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::ChildCountMismatch { .. } | Self::Validation(_) => ErrorKind::Invalid,
        }
    }
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "Atom ID already exists: {id}"),
            Self::UnknownDependency { atom_id, dependency } => {
                write!(f, "Dependency not found: {dependency} (required by {atom_id})")
            }
            Self::ParentNotFound(id) => write!(f, "Parent atom not found: {id}"),
            Self::AtomNotFound(id) => write!(f, "Atom {id} not found"),
            Self::ChildCountMismatch {
                children,
                descriptions,
            } => write!(
                f,
                "Number of children ({children}) does not match descriptions ({descriptions})"
            ),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AtomValidationError> for GraphError {
    fn from(value: AtomValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Request model for inserting one atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAtom {
    pub id: AtomId,
    pub description: String,
    pub depends_on: Vec<AtomId>,
    pub or_group: Option<String>,
}

/// Request model for splitting one atom into children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    pub parent_id: AtomId,
    pub children: Vec<AtomId>,
    pub descriptions: Vec<String>,
    pub reason: String,
}

/// Mutating view over the atoms of one loaded document.
pub struct AtomGraph<'doc> {
    doc: &'doc mut LedgerDocument,
}

impl<'doc> AtomGraph<'doc> {
    pub fn new(doc: &'doc mut LedgerDocument) -> Self {
        Self { doc }
    }

    /// Appends a pending atom.
    ///
    /// # Errors
    /// - `DuplicateId` when the ID was ever used before.
    /// - `UnknownDependency` when any dependency is not an existing atom.
    pub fn add_atom(&mut self, request: NewAtom) -> Result<&Atom, GraphError> {
        validate_atom_id(&request.id)?;
        if self.doc.known_ids().contains(request.id.as_str()) {
            return Err(GraphError::DuplicateId(request.id));
        }
        for dependency in &request.depends_on {
            if self.doc.atom(dependency).is_none() {
                return Err(GraphError::UnknownDependency {
                    atom_id: request.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        let mut atom =
            Atom::new(request.id, request.description).with_depends_on(request.depends_on);
        atom.or_group = request.or_group;
        atom.validate()?;

        info!(
            "event=atom_add module=graph status=ok atom_id={} deps={}",
            atom.id,
            atom.depends_on.len()
        );
        self.doc.atoms.push(atom);
        Ok(&self.doc.atoms[self.doc.atoms.len() - 1])
    }

    /// Adds child atoms that inherit the parent's dependencies.
    ///
    /// Children copy the parent's `depends_on` by value and record the parent
    /// in `decomposed_from`. A decomposition record is appended to the audit
    /// trail. Returns the inherited dependency list.
    pub fn decompose_atom(&mut self, request: Decomposition) -> Result<Vec<AtomId>, GraphError> {
        let inherited = self
            .doc
            .atom(&request.parent_id)
            .map(|parent| parent.depends_on.clone())
            .ok_or_else(|| GraphError::ParentNotFound(request.parent_id.clone()))?;

        if request.children.len() != request.descriptions.len() {
            return Err(GraphError::ChildCountMismatch {
                children: request.children.len(),
                descriptions: request.descriptions.len(),
            });
        }

        let known = self.doc.known_ids();
        let mut batch = HashSet::new();
        for child in &request.children {
            validate_atom_id(child)?;
            if known.contains(child.as_str()) || !batch.insert(child.as_str()) {
                return Err(GraphError::DuplicateId(child.clone()));
            }
        }

        for (child, description) in request.children.iter().zip(&request.descriptions) {
            let mut atom = Atom::new(child.clone(), description.clone())
                .with_depends_on(inherited.iter().cloned());
            atom.decomposed_from = Some(request.parent_id.clone());
            self.doc.atoms.push(atom);
        }
        self.doc.decompositions.push(DecompositionRecord {
            parent: request.parent_id.clone(),
            children: request.children.clone(),
            reason: request.reason,
            timestamp: Utc::now(),
        });

        info!(
            "event=atom_decompose module=graph status=ok parent={} children={}",
            request.parent_id,
            request.children.len()
        );
        Ok(inherited)
    }

    /// Sets the status of an existing atom. Any transition is allowed.
    pub fn update_status(&mut self, id: &str, status: AtomStatus) -> Result<(), GraphError> {
        let atom = self
            .doc
            .atom_mut(id)
            .ok_or_else(|| GraphError::AtomNotFound(id.to_string()))?;
        let previous = atom.status;
        atom.status = status;
        info!(
            "event=atom_status module=graph status=ok atom_id={} from={} to={}",
            id, previous, status
        );
        Ok(())
    }

    pub fn executable_frontier(&self) -> Vec<&Atom> {
        executable_frontier(self.doc)
    }

    pub fn detect_cycle(&self) -> Option<Vec<AtomId>> {
        detect_cycle(&self.doc.atoms)
    }
}

/// Pending atoms whose dependencies are all satisfied, in document order.
///
/// Dependencies are judged by `LedgerDocument::is_satisfied`.
pub fn executable_frontier(doc: &LedgerDocument) -> Vec<&Atom> {
    doc.atoms
        .iter()
        .filter(|atom| atom.is_pending())
        .filter(|atom| atom.depends_on.iter().all(|dep| doc.is_satisfied(dep)))
        .collect()
}

/// Finds one dependency cycle.
///
/// Returns the path from the first repeated atom through its revisit, e.g.
/// `[A, B, C, A]`, or `None` when the graph is acyclic. Dependencies naming
/// unknown atoms are treated as leaves.
pub fn detect_cycle(atoms: &[Atom]) -> Option<Vec<AtomId>> {
    let index: HashMap<&str, &Atom> = atoms.iter().map(|atom| (atom.id.as_str(), atom)).collect();
    let mut visited = HashSet::new();
    let mut path = Vec::new();

    for atom in atoms {
        if let Some(cycle) = visit(atom.id.as_str(), &index, &mut visited, &mut path) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    id: &'a str,
    index: &HashMap<&'a str, &'a Atom>,
    visited: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<AtomId>> {
    if let Some(start) = path.iter().position(|on_path| *on_path == id) {
        let mut cycle: Vec<AtomId> = path[start..].iter().map(|step| step.to_string()).collect();
        cycle.push(id.to_string());
        return Some(cycle);
    }
    if !visited.insert(id) {
        return None;
    }

    path.push(id);
    if let Some(&atom) = index.get(id) {
        for dependency in &atom.depends_on {
            if let Some(cycle) = visit(dependency.as_str(), index, visited, path) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::{detect_cycle, executable_frontier};
    use crate::model::atom::{Atom, AtomStatus};
    use crate::model::document::LedgerDocument;

    #[test]
    fn diamond_graph_has_no_cycle() {
        let atoms = vec![
            Atom::new("A1", "root"),
            Atom::new("A2", "left").with_depends_on(["A1"]),
            Atom::new("A3", "right").with_depends_on(["A1"]),
            Atom::new("A4", "join").with_depends_on(["A2", "A3"]),
        ];
        assert_eq!(detect_cycle(&atoms), None);
    }

    #[test]
    fn two_node_cycle_is_reported_with_closing_node() {
        let atoms = vec![
            Atom::new("A1", "a").with_depends_on(["A2"]),
            Atom::new("A2", "b").with_depends_on(["A1"]),
        ];
        assert_eq!(
            detect_cycle(&atoms),
            Some(vec!["A1".to_string(), "A2".to_string(), "A1".to_string()])
        );
    }

    #[test]
    fn dangling_dependency_blocks_frontier_but_not_cycle_check() {
        let mut doc = LedgerDocument::default();
        doc.atoms.push(Atom::new("A1", "waits on ghost").with_depends_on(["A0"]));
        assert_eq!(detect_cycle(&doc.atoms), None);
        assert!(executable_frontier(&doc).is_empty());
    }

    #[test]
    fn in_progress_atoms_are_not_in_frontier() {
        let mut doc = LedgerDocument::default();
        let mut busy = Atom::new("A1", "busy");
        busy.status = AtomStatus::InProgress;
        doc.atoms.push(busy);
        assert!(executable_frontier(&doc).is_empty());
    }
}
