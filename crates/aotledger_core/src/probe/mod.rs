//! Leaf-check collaborators.
//!
//! # Responsibility
//! - Run shell commands with a bounded wait.
//! - Probe paths and glob patterns on the local filesystem.
//!
//! Both are traits so the checklist verifier can be driven by fakes in tests.

pub mod command;
pub mod path;
