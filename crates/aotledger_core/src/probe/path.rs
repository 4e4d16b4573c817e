//! Filesystem probing for `file` / `not_file` checks.
//!
//! # Invariants
//! - Relative targets resolve against the prober root.
//! - Targets containing glob metacharacters are expanded; `*` stays within
//!   one path component, `**` crosses components.
//! - Only entries below the literal prefix are candidates; the prefix
//!   directory itself never counts as a match.

use globset::{Error as GlobError, GlobBuilder};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const GLOB_METACHARS: &[char] = &['*', '?', '[', '{'];

/// What a probe found at one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProbe {
    Missing,
    File { size: u64 },
    Directory { file_count: usize },
    Glob { match_count: usize },
}

impl PathProbe {
    pub fn exists(&self) -> bool {
        match self {
            Self::Missing => false,
            Self::File { .. } | Self::Directory { .. } => true,
            Self::Glob { match_count } => *match_count > 0,
        }
    }
}

/// Probe failures.
#[derive(Debug)]
pub enum ProbeError {
    InvalidPattern(GlobError),
    Io(std::io::Error),
}

impl Display for ProbeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern(err) => write!(f, "invalid glob pattern: {err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProbeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPattern(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<GlobError> for ProbeError {
    fn from(value: GlobError) -> Self {
        Self::InvalidPattern(value)
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Answers "does anything exist at this path or pattern".
pub trait PathProber {
    fn probe(&self, target: &str) -> Result<PathProbe, ProbeError>;
}

/// Local filesystem prober.
#[derive(Debug, Clone)]
pub struct FsPathProber {
    root: PathBuf,
}

impl FsPathProber {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn probe_literal(&self, target: &str) -> Result<PathProbe, ProbeError> {
        let path = self.root.join(target);
        if !path.exists() {
            return Ok(PathProbe::Missing);
        }
        let metadata = std::fs::metadata(&path)?;
        if metadata.is_dir() {
            let file_count = WalkDir::new(&path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .count();
            return Ok(PathProbe::Directory { file_count });
        }
        Ok(PathProbe::File {
            size: metadata.len(),
        })
    }

    fn probe_glob(&self, pattern: &str) -> Result<PathProbe, ProbeError> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        let absolute = Path::new(pattern).is_absolute();
        let walk_root = self.root.join(literal_prefix(pattern));
        if !walk_root.exists() {
            return Ok(PathProbe::Glob { match_count: 0 });
        }

        let match_count = WalkDir::new(&walk_root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                let candidate = if absolute {
                    Some(entry.path())
                } else {
                    entry.path().strip_prefix(&self.root).ok()
                };
                candidate.is_some_and(|path| matcher.is_match(path))
            })
            .count();
        Ok(PathProbe::Glob { match_count })
    }
}

impl PathProber for FsPathProber {
    fn probe(&self, target: &str) -> Result<PathProbe, ProbeError> {
        let target = target.trim();
        let target = target.strip_prefix("./").unwrap_or(target);
        if is_glob_pattern(target) {
            self.probe_glob(target)
        } else {
            self.probe_literal(target)
        }
    }
}

pub fn is_glob_pattern(target: &str) -> bool {
    target.contains(GLOB_METACHARS)
}

/// Leading path components that contain no glob metacharacters.
fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|component| match component {
            Component::Normal(part) => !part.to_string_lossy().contains(GLOB_METACHARS),
            _ => true,
        })
        .collect()
}

/// Human-readable file size, e.g. `512B`, `1.5KB`, `3.2MB`.
pub fn format_size(size: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if size < KIB {
        format!("{size}B")
    } else if size < MIB {
        format!("{:.1}KB", size as f64 / KIB as f64)
    } else {
        format!("{:.1}MB", size as f64 / MIB as f64)
    }
}
