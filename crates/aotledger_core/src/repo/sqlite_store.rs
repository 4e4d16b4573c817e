//! Relational ledger store on SQLite.
//!
//! # Responsibility
//! - Map `LedgerDocument` onto the normalized tables of `db::migrations`.
//! - Keep every SQL statement for ledger data inside this file.
//!
//! # Invariants
//! - A save deletes and rewrites the whole document in one transaction.
//! - Positional columns (`ordinal`, `seq`) reproduce document order on load.
//! - Read paths reject unknown enum text instead of masking it.

use super::{LedgerStore, StoreError, StoreResult};
use crate::db::open_db;
use crate::model::atom::{Atom, AtomId, AtomStatus};
use crate::model::binding::Binding;
use crate::model::checklist::{BaseCase, Check, ChecklistItem, ChecklistNode, PassThreshold};
use crate::model::document::{
    Control, ControlStatus, DecompositionRecord, LedgerDocument, Objective,
};
use crate::model::or_group::{OrGroup, TrailEntry};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use rusqlite::types::{Type, Value, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

const FORM_CHECKLIST: &str = "checklist";
const FORM_SINGLE: &str = "single";
const NODE_LEAF: &str = "leaf";
const NODE_ALL: &str = "all";
const NODE_ANY: &str = "any";
const NODE_UNDEFINED: &str = "undefined";
const ROLE_CHOICE: &str = "choice";
const ROLE_FAILED: &str = "failed";

/// Child-first so foreign keys never block the wipe.
const CLEAR_SQL: &str = "DELETE FROM checklist_nodes;
DELETE FROM binding_artifacts;
DELETE FROM bindings;
DELETE FROM decomposition_children;
DELETE FROM decompositions;
DELETE FROM trail;
DELETE FROM or_group_members;
DELETE FROM or_groups;
DELETE FROM atom_dependencies;
DELETE FROM atoms;
DELETE FROM control;
DELETE FROM objective_deliverables;
DELETE FROM objective;
DELETE FROM ledger_meta;";

#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    path: PathBuf,
}

impl SqliteLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn not_found(&self) -> StoreError {
        StoreError::NotFound(self.path.clone())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> StoreResult<LedgerDocument> {
        if !self.exists() {
            return Err(self.not_found());
        }
        let conn = open_db(&self.path)?;
        let doc = read_document(&conn)?.ok_or_else(|| self.not_found())?;
        info!(
            "event=ledger_load module=store status=ok format=sqlite path={} atoms={}",
            self.path.display(),
            doc.atoms.len()
        );
        Ok(doc)
    }

    fn save(&self, doc: &LedgerDocument) -> StoreResult<()> {
        let started_at = Instant::now();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut conn = open_db(&self.path)?;
        let tx = conn.transaction()?;
        tx.execute_batch(CLEAR_SQL)?;
        write_document(&tx, doc)?;
        tx.commit()?;
        info!(
            "event=ledger_save module=store status=ok format=sqlite path={} atoms={} duration_ms={}",
            self.path.display(),
            doc.atoms.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Reads the ledger stored on `conn`; `None` when nothing was ever saved.
pub fn read_document(conn: &Connection) -> StoreResult<Option<LedgerDocument>> {
    let body = conn
        .query_row("SELECT body FROM ledger_meta WHERE id = 1;", [], |row| {
            row.get::<_, String>(0)
        })
        .optional()?;
    let Some(body) = body else {
        return Ok(None);
    };

    Ok(Some(LedgerDocument {
        objective: read_objective(conn)?,
        control: read_control(conn)?,
        atoms: read_atoms(conn)?,
        or_groups: read_or_groups(conn)?,
        trail: read_trail(conn)?,
        decompositions: read_decompositions(conn)?,
        bindings: read_bindings(conn)?,
        body,
    }))
}

/// Writes `doc` into empty ledger tables.
pub fn write_document(conn: &Connection, doc: &LedgerDocument) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO ledger_meta (id, body) VALUES (1, ?1);",
        params![doc.body.as_str()],
    )?;
    if let Some(objective) = &doc.objective {
        write_objective(conn, objective)?;
    }
    if let Some(control) = &doc.control {
        write_control(conn, control)?;
    }
    write_atoms(conn, &doc.atoms)?;
    write_or_groups(conn, &doc.or_groups)?;

    for (seq, entry) in doc.trail.iter().enumerate() {
        conn.execute(
            "INSERT INTO trail (seq, or_group, selected, reason, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                to_db_index(seq)?,
                entry.or_group.as_str(),
                entry.selected.as_str(),
                entry.reason.as_str(),
                timestamp_to_db(&entry.timestamp),
            ],
        )?;
    }

    for (seq, record) in doc.decompositions.iter().enumerate() {
        let seq = to_db_index(seq)?;
        conn.execute(
            "INSERT INTO decompositions (seq, parent, reason, timestamp)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                seq,
                record.parent.as_str(),
                record.reason.as_str(),
                timestamp_to_db(&record.timestamp),
            ],
        )?;
        for (ordinal, child) in record.children.iter().enumerate() {
            conn.execute(
                "INSERT INTO decomposition_children (decomposition_seq, ordinal, child_id)
                 VALUES (?1, ?2, ?3);",
                params![seq, to_db_index(ordinal)?, child.as_str()],
            )?;
        }
    }

    for (atom_id, binding) in &doc.bindings {
        conn.execute(
            "INSERT INTO bindings (atom_id, summary) VALUES (?1, ?2);",
            params![atom_id.as_str(), binding.summary.as_str()],
        )?;
        for (ordinal, path) in binding.artifacts.iter().enumerate() {
            conn.execute(
                "INSERT INTO binding_artifacts (atom_id, ordinal, path) VALUES (?1, ?2, ?3);",
                params![atom_id.as_str(), to_db_index(ordinal)?, path.as_str()],
            )?;
        }
    }
    Ok(())
}

fn write_objective(conn: &Connection, objective: &Objective) -> StoreResult<()> {
    let form = objective.base_case.as_ref().map(|base_case| match base_case {
        BaseCase::Checklist { .. } => FORM_CHECKLIST,
        BaseCase::Single(_) => FORM_SINGLE,
    });
    conn.execute(
        "INSERT INTO objective (id, goal, background_intent, definition_of_done, base_case_form)
         VALUES (1, ?1, ?2, ?3, ?4);",
        params![
            objective.goal.as_str(),
            objective.background_intent.as_str(),
            objective.definition_of_done.as_str(),
            form,
        ],
    )?;
    for (ordinal, value) in objective.deliverables.iter().enumerate() {
        conn.execute(
            "INSERT INTO objective_deliverables (ordinal, value) VALUES (?1, ?2);",
            params![to_db_index(ordinal)?, value.as_str()],
        )?;
    }

    match &objective.base_case {
        Some(BaseCase::Checklist { checklist }) => write_checklist(conn, None, checklist),
        Some(BaseCase::Single(check)) => {
            write_check_node(conn, None, 0, "base_case", NODE_LEAF, Some(check))?;
            Ok(())
        }
        None => Ok(()),
    }
}

fn write_checklist(
    conn: &Connection,
    parent_id: Option<i64>,
    items: &[ChecklistItem],
) -> StoreResult<()> {
    for (ordinal, item) in items.iter().enumerate() {
        let ordinal = to_db_index(ordinal)?;
        match &item.node {
            ChecklistNode::Leaf(check) => {
                write_check_node(conn, parent_id, ordinal, &item.item, NODE_LEAF, Some(check))?;
            }
            ChecklistNode::All(children) => {
                let id = write_check_node(conn, parent_id, ordinal, &item.item, NODE_ALL, None)?;
                write_checklist(conn, Some(id), children)?;
            }
            ChecklistNode::Any(children) => {
                let id = write_check_node(conn, parent_id, ordinal, &item.item, NODE_ANY, None)?;
                write_checklist(conn, Some(id), children)?;
            }
            ChecklistNode::Undefined => {
                write_check_node(conn, parent_id, ordinal, &item.item, NODE_UNDEFINED, None)?;
            }
        }
    }
    Ok(())
}

fn write_check_node(
    conn: &Connection,
    parent_id: Option<i64>,
    ordinal: i64,
    item: &str,
    node_kind: &str,
    check: Option<&Check>,
) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO checklist_nodes (
            parent_id,
            ordinal,
            item,
            node_kind,
            check_type,
            check_value,
            criteria,
            pass_threshold
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            parent_id,
            ordinal,
            item,
            node_kind,
            check.map(|check| check.check_type.as_str()),
            check.map(|check| check.value.as_str()),
            check.and_then(|check| check.criteria.as_deref()),
            check
                .and_then(|check| check.pass_threshold.as_ref())
                .map(threshold_to_sql),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn write_control(conn: &Connection, control: &Control) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO control (
            id,
            status,
            iteration,
            stall_count,
            stop_requested,
            redirect_requested,
            stop_reason
        ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            control.status.map(ControlStatus::as_str),
            count_to_db(control.iteration)?,
            count_to_db(control.stall_count)?,
            bool_to_int(control.stop_requested),
            bool_to_int(control.redirect_requested),
            control.stop_reason.as_deref(),
        ],
    )?;
    Ok(())
}

fn write_atoms(conn: &Connection, atoms: &[Atom]) -> StoreResult<()> {
    for (ordinal, atom) in atoms.iter().enumerate() {
        let ordinal = to_db_index(ordinal)?;
        conn.execute(
            "INSERT INTO atoms (ordinal, id, description, status, or_group, decomposed_from)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                ordinal,
                atom.id.as_str(),
                atom.description.as_str(),
                atom.status.as_str(),
                atom.or_group.as_deref(),
                atom.decomposed_from.as_deref(),
            ],
        )?;
        for (dep_ordinal, dep) in atom.depends_on.iter().enumerate() {
            conn.execute(
                "INSERT INTO atom_dependencies (atom_ordinal, ordinal, depends_on)
                 VALUES (?1, ?2, ?3);",
                params![ordinal, to_db_index(dep_ordinal)?, dep.as_str()],
            )?;
        }
    }
    Ok(())
}

fn write_or_groups(conn: &Connection, groups: &BTreeMap<String, OrGroup>) -> StoreResult<()> {
    for (name, group) in groups {
        conn.execute(
            "INSERT INTO or_groups (name, selected) VALUES (?1, ?2);",
            params![name.as_str(), group.selected.as_deref()],
        )?;
        let members = group
            .choices
            .iter()
            .enumerate()
            .map(|(ordinal, id)| (ROLE_CHOICE, ordinal, id))
            .chain(
                group
                    .failed
                    .iter()
                    .enumerate()
                    .map(|(ordinal, id)| (ROLE_FAILED, ordinal, id)),
            );
        for (role, ordinal, atom_id) in members {
            conn.execute(
                "INSERT INTO or_group_members (group_name, role, ordinal, atom_id)
                 VALUES (?1, ?2, ?3, ?4);",
                params![name.as_str(), role, to_db_index(ordinal)?, atom_id.as_str()],
            )?;
        }
    }
    Ok(())
}

fn read_objective(conn: &Connection) -> StoreResult<Option<Objective>> {
    let row = conn
        .query_row(
            "SELECT goal, background_intent, definition_of_done, base_case_form
             FROM objective WHERE id = 1;",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((goal, background_intent, definition_of_done, form)) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT value FROM objective_deliverables ORDER BY ordinal;")?;
    let deliverables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let base_case = match form.as_deref() {
        None => None,
        Some(FORM_CHECKLIST) => Some(BaseCase::Checklist {
            checklist: read_checklist(conn)?,
        }),
        Some(FORM_SINGLE) => {
            let mut roots = read_checklist(conn)?;
            match (roots.pop(), roots.is_empty()) {
                (
                    Some(ChecklistItem {
                        node: ChecklistNode::Leaf(check),
                        ..
                    }),
                    true,
                ) => Some(BaseCase::Single(check)),
                _ => {
                    return Err(StoreError::InvalidData(
                        "single base_case must be exactly one leaf check".to_string(),
                    ))
                }
            }
        }
        Some(other) => {
            return Err(StoreError::InvalidData(format!(
                "unknown base_case form: {other}"
            )))
        }
    };

    Ok(Some(Objective {
        goal,
        background_intent,
        deliverables,
        definition_of_done,
        base_case,
    }))
}

struct NodeRow {
    id: i64,
    item: String,
    node_kind: String,
    check: Check,
}

fn threshold_to_sql(threshold: &PassThreshold) -> Value {
    match threshold {
        PassThreshold::Score(score) => Value::Real(*score),
        PassThreshold::Label(label) => Value::Text(label.clone()),
    }
}

/// REAL affinity keeps non-numeric labels as TEXT.
fn read_threshold(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<PassThreshold>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(PassThreshold::Score(value as f64))),
        ValueRef::Real(value) => Ok(Some(PassThreshold::Score(value))),
        ValueRef::Text(bytes) => Ok(Some(PassThreshold::from_label(
            String::from_utf8_lossy(bytes).into_owned(),
        ))),
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "pass_threshold".to_string(),
            Type::Blob,
        )),
    }
}

fn read_checklist(conn: &Connection) -> StoreResult<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_id, item, node_kind, check_type, check_value, criteria, pass_threshold
         FROM checklist_nodes
         ORDER BY parent_id, ordinal;",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<i64>>(1)?,
            NodeRow {
                id: row.get(0)?,
                item: row.get(2)?,
                node_kind: row.get(3)?,
                check: Check {
                    check_type: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    value: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    criteria: row.get(6)?,
                    pass_threshold: read_threshold(row, 7)?,
                },
            },
        ))
    })?;

    let mut by_parent: HashMap<Option<i64>, Vec<NodeRow>> = HashMap::new();
    for row in rows {
        let (parent_id, node) = row?;
        by_parent.entry(parent_id).or_default().push(node);
    }
    build_items(None, &mut by_parent)
}

fn build_items(
    parent_id: Option<i64>,
    by_parent: &mut HashMap<Option<i64>, Vec<NodeRow>>,
) -> StoreResult<Vec<ChecklistItem>> {
    let nodes = by_parent.remove(&parent_id).unwrap_or_default();
    let mut items = Vec::with_capacity(nodes.len());
    for node in nodes {
        let kind = match node.node_kind.as_str() {
            NODE_LEAF => ChecklistNode::Leaf(node.check),
            NODE_ALL => ChecklistNode::All(build_items(Some(node.id), by_parent)?),
            NODE_ANY => ChecklistNode::Any(build_items(Some(node.id), by_parent)?),
            NODE_UNDEFINED => ChecklistNode::Undefined,
            other => {
                return Err(StoreError::InvalidData(format!(
                    "unknown checklist node kind: {other}"
                )))
            }
        };
        items.push(ChecklistItem {
            item: node.item,
            node: kind,
        });
    }
    Ok(items)
}

fn read_control(conn: &Connection) -> StoreResult<Option<Control>> {
    let row = conn
        .query_row(
            "SELECT status, iteration, stall_count, stop_requested, redirect_requested, stop_reason
             FROM control WHERE id = 1;",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )
        .optional()?;
    let Some((status, iteration, stall_count, stop_requested, redirect_requested, stop_reason)) =
        row
    else {
        return Ok(None);
    };

    let status = status
        .as_deref()
        .map(ControlStatus::from_str)
        .transpose()
        .map_err(|err| StoreError::InvalidData(err.to_string()))?;

    Ok(Some(Control {
        status,
        iteration: count_from_db(iteration)?,
        stall_count: count_from_db(stall_count)?,
        stop_requested: stop_requested != 0,
        redirect_requested: redirect_requested != 0,
        stop_reason,
    }))
}

fn read_atoms(conn: &Connection) -> StoreResult<Vec<Atom>> {
    let mut dep_stmt = conn.prepare(
        "SELECT atom_ordinal, depends_on FROM atom_dependencies ORDER BY atom_ordinal, ordinal;",
    )?;
    let mut deps: HashMap<i64, Vec<AtomId>> = HashMap::new();
    for row in dep_stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })? {
        let (ordinal, dep) = row?;
        deps.entry(ordinal).or_default().push(dep);
    }

    let mut stmt = conn.prepare(
        "SELECT ordinal, id, description, status, or_group, decomposed_from
         FROM atoms ORDER BY ordinal;",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut atoms = Vec::new();
    for row in rows {
        let (ordinal, id, description, status, or_group, decomposed_from) = row?;
        let status = AtomStatus::from_str(&status)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;
        atoms.push(Atom {
            id,
            description,
            status,
            depends_on: deps.remove(&ordinal).unwrap_or_default(),
            or_group,
            decomposed_from,
        });
    }
    Ok(atoms)
}

fn read_or_groups(conn: &Connection) -> StoreResult<BTreeMap<String, OrGroup>> {
    let mut groups = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT name, selected FROM or_groups;")?;
    for row in stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })? {
        let (name, selected) = row?;
        groups.insert(
            name,
            OrGroup {
                selected,
                ..OrGroup::default()
            },
        );
    }

    let mut stmt = conn.prepare(
        "SELECT group_name, role, atom_id FROM or_group_members
         ORDER BY group_name, role, ordinal;",
    )?;
    for row in stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })? {
        let (name, role, atom_id) = row?;
        let group = groups.get_mut(&name).ok_or_else(|| {
            StoreError::InvalidData(format!("member row for unknown OR group: {name}"))
        })?;
        match role.as_str() {
            ROLE_CHOICE => group.choices.push(atom_id),
            ROLE_FAILED => group.failed.push(atom_id),
            other => {
                return Err(StoreError::InvalidData(format!(
                    "unknown OR group member role: {other}"
                )))
            }
        }
    }
    Ok(groups)
}

fn read_trail(conn: &Connection) -> StoreResult<Vec<TrailEntry>> {
    let mut stmt = conn.prepare(
        "SELECT or_group, selected, reason, timestamp FROM trail ORDER BY seq;",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut trail = Vec::new();
    for row in rows {
        let (or_group, selected, reason, timestamp) = row?;
        trail.push(TrailEntry {
            or_group,
            selected,
            reason,
            timestamp: timestamp_from_db(&timestamp)?,
        });
    }
    Ok(trail)
}

fn read_decompositions(conn: &Connection) -> StoreResult<Vec<DecompositionRecord>> {
    let mut child_stmt = conn.prepare(
        "SELECT decomposition_seq, child_id FROM decomposition_children
         ORDER BY decomposition_seq, ordinal;",
    )?;
    let mut children: HashMap<i64, Vec<AtomId>> = HashMap::new();
    for row in child_stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })? {
        let (seq, child) = row?;
        children.entry(seq).or_default().push(child);
    }

    let mut stmt = conn.prepare(
        "SELECT seq, parent, reason, timestamp FROM decompositions ORDER BY seq;",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (seq, parent, reason, timestamp) = row?;
        records.push(DecompositionRecord {
            parent,
            children: children.remove(&seq).unwrap_or_default(),
            reason,
            timestamp: timestamp_from_db(&timestamp)?,
        });
    }
    Ok(records)
}

fn read_bindings(conn: &Connection) -> StoreResult<BTreeMap<AtomId, Binding>> {
    let mut bindings = BTreeMap::new();
    let mut stmt = conn.prepare("SELECT atom_id, summary FROM bindings;")?;
    for row in stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })? {
        let (atom_id, summary) = row?;
        bindings.insert(atom_id, Binding::new(summary, Vec::new()));
    }

    let mut stmt = conn.prepare(
        "SELECT atom_id, path FROM binding_artifacts ORDER BY atom_id, ordinal;",
    )?;
    for row in stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })? {
        let (atom_id, path) = row?;
        if let Some(binding) = bindings.get_mut(&atom_id) {
            binding.artifacts.push(path);
        }
    }
    Ok(bindings)
}

fn timestamp_to_db(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn timestamp_from_db(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| StoreError::InvalidData(format!("invalid timestamp {value:?}: {err}")))
}

fn to_db_index(value: usize) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("index overflow: {value}")))
}

fn count_to_db(value: Option<u64>) -> StoreResult<Option<i64>> {
    value
        .map(|count| {
            i64::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("counter overflow: {count}")))
        })
        .transpose()
}

fn count_from_db(value: Option<i64>) -> StoreResult<Option<u64>> {
    value
        .map(|count| {
            u64::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative counter: {count}")))
        })
        .transpose()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
