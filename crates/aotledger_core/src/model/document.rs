//! Whole-ledger document model.
//!
//! # Responsibility
//! - Hold every persisted section of one ledger as typed records.
//! - Provide read-only lookups used by graph, gate and verifier logic.
//!
//! # Invariants
//! - The document is loaded fresh per operation and discarded after save.
//! - `trail` and `decompositions` only ever grow.

use crate::model::atom::{Atom, AtomId};
use crate::model::binding::Binding;
use crate::model::checklist::BaseCase;
use crate::model::or_group::{OrGroup, TrailEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Loop driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Pending,
    Running,
    Stopped,
    Completed,
}

impl ControlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        }
    }
}

impl Display for ControlStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unsupported control status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidControlStatus(pub String);

impl Display for InvalidControlStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid control status `{}`; expected pending|running|stopped|completed",
            self.0
        )
    }
}

impl Error for InvalidControlStatus {}

impl FromStr for ControlStatus {
    type Err = InvalidControlStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "completed" => Ok(Self::Completed),
            other => Err(InvalidControlStatus(other.to_string())),
        }
    }
}

/// Control section advanced by the external loop driver.
///
/// Counters are optional so that partially written ledgers can be loaded and
/// reported on instead of rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Control {
    #[serde(default)]
    pub status: Option<ControlStatus>,
    #[serde(default)]
    pub iteration: Option<u64>,
    #[serde(default)]
    pub stall_count: Option<u64>,
    #[serde(default)]
    pub stop_requested: bool,
    #[serde(default)]
    pub redirect_requested: bool,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl Control {
    /// Control section as written by a fresh setup step.
    pub fn initial() -> Self {
        Self {
            status: Some(ControlStatus::Pending),
            iteration: Some(0),
            stall_count: Some(0),
            ..Self::default()
        }
    }
}

/// What the loop is trying to achieve and how completion is judged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Objective {
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub background_intent: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub definition_of_done: String,
    #[serde(default)]
    pub base_case: Option<BaseCase>,
}

/// Audit record of one atom decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionRecord {
    pub parent: AtomId,
    pub children: Vec<AtomId>,
    #[serde(default)]
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// One persisted ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Control>,
    #[serde(default)]
    pub atoms: Vec<Atom>,
    #[serde(default)]
    pub or_groups: BTreeMap<String, OrGroup>,
    #[serde(default)]
    pub trail: Vec<TrailEntry>,
    #[serde(default)]
    pub decompositions: Vec<DecompositionRecord>,
    #[serde(default)]
    pub bindings: BTreeMap<AtomId, Binding>,
    /// Free-form notes kept next to the structured sections.
    #[serde(skip)]
    pub body: String,
}

impl LedgerDocument {
    /// Empty ledger with an objective and an initial control section.
    pub fn new(objective: Objective) -> Self {
        Self {
            objective: Some(objective),
            control: Some(Control::initial()),
            ..Self::default()
        }
    }

    /// First atom with `id`, in document order.
    pub fn atom(&self, id: &str) -> Option<&Atom> {
        self.atoms.iter().find(|atom| atom.id == id)
    }

    pub fn atom_mut(&mut self, id: &str) -> Option<&mut Atom> {
        self.atoms.iter_mut().find(|atom| atom.id == id)
    }

    /// Every ID the ledger has ever handed out.
    ///
    /// Includes IDs that only survive in decomposition records.
    pub fn known_ids(&self) -> HashSet<&str> {
        let mut ids: HashSet<&str> = self.atoms.iter().map(|atom| atom.id.as_str()).collect();
        for record in &self.decompositions {
            ids.insert(record.parent.as_str());
            ids.extend(record.children.iter().map(String::as_str));
        }
        ids
    }

    /// Whether `id` counts as satisfied for dependents.
    ///
    /// A binding is accepted as completion evidence even when the atom's
    /// status has not been flipped to `resolved` yet.
    pub fn is_satisfied(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
            || self
                .atoms
                .iter()
                .any(|atom| atom.id == id && atom.is_resolved())
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) if value.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}
