//! Ledger services.
//!
//! # Responsibility
//! - Graph, OR-group and binding mutations over a loaded document.
//! - Integrity, gate and checklist evaluation.
//! - The load/apply/save facade used by callers.

pub mod atom_graph;
pub mod binding_ledger;
pub mod checklist_verifier;
pub mod integrity;
pub mod ledger_service;
pub mod or_group_service;
