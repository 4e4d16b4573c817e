//! Completion evidence recorded against an atom.

use serde::{Deserialize, Serialize};

/// Summary and artifacts proving an atom's work is complete.
///
/// One binding exists per atom ID; a later write replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Binding {
    /// Free text, kept verbatim including internal newlines.
    #[serde(default)]
    pub summary: String,
    /// File references in caller order.
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl Binding {
    pub fn new(summary: impl Into<String>, artifacts: Vec<String>) -> Self {
        Self {
            summary: summary.into(),
            artifacts,
        }
    }
}
