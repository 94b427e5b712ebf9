//! JSONL pool snapshots: one solvable or repository per line.
//!
//! Lines are tagged by `kind`. Patches carry their full metadata; every
//! other kind shares the [`ItemLine`] shape.

use patchscope_kernel::{Edition, PatchRecord, ResKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::BufRead;
use std::path::Path;

pub const POOL_SNAPSHOT_REF_PREFIX: &str = "pool1_";

/// One parsed snapshot line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PoolLine {
    Repo(RepoLine),
    Patch(PatchLine),
    Package(ItemLine),
    Pattern(ItemLine),
    Product(ItemLine),
    Application(ItemLine),
}

impl PoolLine {
    /// Resource kind of a solvable line; `None` for repositories.
    pub fn res_kind(&self) -> Option<ResKind> {
        match self {
            PoolLine::Repo(_) => None,
            PoolLine::Patch(_) => Some(ResKind::Patch),
            PoolLine::Package(_) => Some(ResKind::Package),
            PoolLine::Pattern(_) => Some(ResKind::Pattern),
            PoolLine::Product(_) => Some(ResKind::Product),
            PoolLine::Application(_) => Some(ResKind::Application),
        }
    }
}

/// A repository declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoLine {
    pub alias: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Lower values win ties between equal versions.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    99
}

/// A patch line: patch metadata plus the alias of its repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchLine {
    #[serde(default)]
    pub repo: String,
    #[serde(flatten)]
    pub record: PatchRecord,
}

/// A package, pattern, product or application line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLine {
    pub name: String,
    pub edition: Edition,
    #[serde(default = "default_arch")]
    pub arch: String,
    /// Repository alias; installed items may leave it empty.
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub installed: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    /// Names of same-kind items this one needs.
    #[serde(default)]
    pub requires: Vec<String>,
}

fn default_arch() -> String {
    "noarch".to_string()
}

/// Read snapshot lines, skipping blanks and `#` comments.
pub fn read_lines(reader: impl BufRead) -> Result<Vec<PoolLine>, SnapshotError> {
    let mut lines = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SnapshotError::Io(line_no + 1, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parsed: PoolLine = serde_json::from_str(trimmed)
            .map_err(|e| SnapshotError::Parse(line_no + 1, e.to_string()))?;
        lines.push(parsed);
    }
    Ok(lines)
}

/// A snapshot file's lines and its content reference.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub lines: Vec<PoolLine>,
    pub snapshot_ref: String,
}

/// Read and validate a snapshot file.
pub fn read_snapshot_from_path(path: impl AsRef<Path>) -> Result<Snapshot, SnapshotError> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).map_err(|e| SnapshotError::Io(0, format!("{}: {e}", path.display())))?;
    validate_snapshot_bytes(path, &bytes)?;
    let lines = read_lines(bytes.as_slice())?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "pool snapshot read");
    Ok(Snapshot {
        lines,
        snapshot_ref: pool_snapshot_ref(&bytes),
    })
}

/// Content reference of a snapshot: `pool1_` plus the SHA-256 of its bytes.
pub fn pool_snapshot_ref(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{POOL_SNAPSHOT_REF_PREFIX}{:x}", hasher.finalize())
}

fn validate_snapshot_bytes(path: &Path, bytes: &[u8]) -> Result<(), SnapshotError> {
    if bytes.contains(&0) {
        return Err(SnapshotError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    if std::str::from_utf8(bytes).is_err() {
        return Err(SnapshotError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        )));
    }
    Ok(())
}

/// Errors from reading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),

    #[error("corrupted snapshot: {0}")]
    Corrupt(String),
}
