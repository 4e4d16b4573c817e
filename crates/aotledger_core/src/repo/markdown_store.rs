//! Markdown ledger file with YAML frontmatter.
//!
//! # Invariants
//! - The structured document lives between the leading `---` fences.
//! - Everything after the closing fence is carried verbatim in
//!   `LedgerDocument::body`.
//! - Saves write a sibling temp file and rename it over the target.

use super::{LedgerStore, StoreError, StoreResult};
use crate::model::document::LedgerDocument;
use log::{error, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

pub const DEFAULT_STATE_FILE: &str = ".claude/aot-loop-state.md";

const FENCE: &str = "---";

#[derive(Debug, Clone)]
pub struct MarkdownLedgerStore {
    path: PathBuf,
}

impl MarkdownLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for MarkdownLedgerStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

impl LedgerStore for MarkdownLedgerStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> StoreResult<LedgerDocument> {
        if !self.exists() {
            return Err(StoreError::NotFound(self.path.clone()));
        }
        let content = fs::read_to_string(&self.path)?;
        let doc = parse_ledger(&content).map_err(|err| {
            error!(
                "event=ledger_load module=store status=error format=markdown path={} error={}",
                self.path.display(),
                err
            );
            err
        })?;
        info!(
            "event=ledger_load module=store status=ok format=markdown path={} atoms={}",
            self.path.display(),
            doc.atoms.len()
        );
        Ok(doc)
    }

    fn save(&self, doc: &LedgerDocument) -> StoreResult<()> {
        let started_at = Instant::now();
        let rendered = render_ledger(doc)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(rendered.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|err| StoreError::Io(err.error))?;

        info!(
            "event=ledger_save module=store status=ok format=markdown path={} atoms={} duration_ms={}",
            self.path.display(),
            doc.atoms.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Splits a ledger file into frontmatter YAML and body.
///
/// Returns `None` when the content does not open with a `---` fence or the
/// fence is never closed.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let after = content.strip_prefix(FENCE)?;
    let rest = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parses a full ledger file.
pub fn parse_ledger(content: &str) -> StoreResult<LedgerDocument> {
    let (yaml, body) = split_frontmatter(content).ok_or_else(|| {
        StoreError::InvalidData("missing YAML frontmatter delimited by '---'".to_string())
    })?;

    let mut doc = if yaml.trim().is_empty() {
        LedgerDocument::default()
    } else {
        serde_yaml::from_str::<LedgerDocument>(yaml)?
    };
    doc.body = body.to_string();
    Ok(doc)
}

/// Renders a ledger file: frontmatter followed by the preserved body.
pub fn render_ledger(doc: &LedgerDocument) -> StoreResult<String> {
    let yaml = serde_yaml::to_string(doc)?;
    let mut out = String::with_capacity(yaml.len() + doc.body.len() + 8);
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(&doc.body);
    Ok(out)
}
