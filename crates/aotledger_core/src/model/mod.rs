//! Ledger record model shared by stores, services and the verifier.
//!
//! # Responsibility
//! - Define the typed shape of one persisted ledger document.
//! - Keep graph/verifier logic independent from any on-disk encoding.
//!
//! # Invariants
//! - Atoms are addressed by caller-chosen string IDs, never by position.
//! - Audit records (`trail`, `decompositions`) are append-only.

pub mod atom;
pub mod binding;
pub mod checklist;
pub mod document;
pub mod or_group;
