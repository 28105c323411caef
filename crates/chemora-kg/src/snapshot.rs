//! Write-once graph snapshots for audit and rollback.
//!
//! Every call to [`SnapshotStore::create_snapshot`] produces a new JSON
//! artifact in the store directory. Artifacts are written to a hidden temp
//! file and linked into place without clobbering, so a snapshot is either
//! fully present under its final name or not visible at all. Nothing here
//! ever deletes or rewrites an existing artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use chemora_common::Graph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SnapshotError};
use crate::loader::load_graph_from_path;

pub const SNAPSHOT_METADATA_KEY: &str = "snapshot";
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

const MAX_LABEL_LEN: usize = 64;
const MAX_SEQUENCE: u32 = 10_000;
const EXTENSION: &str = "json";
/// File-name stem for labels with nothing usable in a file name.
const FALLBACK_SLUG: &str = "snapshot";

/// Provenance recorded inside each artifact under `metadata.snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub label: String,
    pub created_at: DateTime<Utc>,
    /// Content hash of the graph the snapshot was taken from.
    pub source_content_hash: String,
    pub format_version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotHandle {
    pub path: PathBuf,
    #[serde(flatten)]
    pub info: SnapshotInfo,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize `graph` into a new, uniquely named artifact tagged with
    /// `label`. A name collision appends a sequence number; it never
    /// overwrites.
    #[instrument(skip(self, graph), fields(dir = %self.dir.display()))]
    pub fn create_snapshot(&self, graph: &Graph, label: &str) -> Result<SnapshotHandle> {
        let slug = sanitize_label(label)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| SnapshotError::io(&self.dir, e))?;

        let info = SnapshotInfo {
            label: label.trim().to_string(),
            created_at: Utc::now(),
            source_content_hash: graph.content_hash().to_string(),
            format_version: SNAPSHOT_FORMAT_VERSION,
        };
        let tagged = graph.with_metadata_entry(SNAPSHOT_METADATA_KEY, serde_json::to_value(&info)?)?;
        let body = serde_json::to_vec_pretty(&tagged)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".snapshot-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| SnapshotError::io(&self.dir, e))?;
        tmp.write_all(&body).map_err(|e| SnapshotError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| SnapshotError::io(tmp.path(), e))?;

        let stamp = info.created_at.format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let mut sequence = 0u32;
        loop {
            let path = self.dir.join(artifact_name(&slug, &stamp, sequence));
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    info!(path = %path.display(), label = %info.label, "Snapshot written");
                    return Ok(SnapshotHandle { path, info });
                }
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Snapshot name taken, trying next sequence");
                    tmp = e.file;
                    sequence += 1;
                    if sequence > MAX_SEQUENCE {
                        return Err(SnapshotError::Exhausted(info.label));
                    }
                }
                Err(e) => return Err(SnapshotError::io(path, e.error)),
            }
        }
    }

    /// Every artifact in the store, oldest first. Files that are not
    /// readable snapshots are skipped with a warning.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotHandle>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SnapshotError::io(&self.dir, e)),
        };

        let mut handles = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| SnapshotError::io(&self.dir, e))?.path();
            if !is_artifact(&path) {
                continue;
            }
            match read_info(&path) {
                Ok(info) => handles.push(SnapshotHandle { path, info }),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable snapshot: {e}"),
            }
        }
        handles.sort_by(|a, b| {
            a.info
                .created_at
                .cmp(&b.info.created_at)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(handles)
    }

    /// Read a snapshot back as a graph, through the regular loader format.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<Graph> {
        Ok(load_graph_from_path(path)?)
    }
}

/// File-name stem for `label`. Only a blank label is rejected; the label
/// itself is kept verbatim in the artifact's metadata.
fn sanitize_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(SnapshotError::InvalidLabel(label.to_string()));
    }
    let slug: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_LABEL_LEN)
        .collect();
    if slug.trim_matches(|c| c == '_' || c == '-').is_empty() {
        return Ok(FALLBACK_SLUG.to_string());
    }
    Ok(slug)
}

fn artifact_name(slug: &str, stamp: &str, sequence: u32) -> String {
    if sequence == 0 {
        format!("{slug}-{stamp}.{EXTENSION}")
    } else {
        format!("{slug}-{stamp}-{sequence}.{EXTENSION}")
    }
}

fn is_artifact(path: &Path) -> bool {
    let visible = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('.'));
    visible && path.extension().and_then(|e| e.to_str()) == Some(EXTENSION)
}

fn read_info(path: &Path) -> Result<SnapshotInfo> {
    let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::io(path, e))?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    let info = document
        .get("metadata")
        .and_then(|m| m.get(SNAPSHOT_METADATA_KEY))
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(info)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_sanitized() {
        assert_eq!(sanitize_label(" before merge/v2 ").unwrap(), "before_merge_v2");
        assert!(matches!(sanitize_label("  "), Err(SnapshotError::InvalidLabel(_))));
        assert_eq!(sanitize_label("///").unwrap(), "snapshot");
        assert_eq!(sanitize_label("基准").unwrap(), "snapshot");
        assert_eq!(sanitize_label("Δ-check").unwrap(), "_-check");
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(artifact_name("a", "20240101T000000.000Z", 0), "a-20240101T000000.000Z.json");
        assert_eq!(artifact_name("a", "20240101T000000.000Z", 3), "a-20240101T000000.000Z-3.json");
        assert!(!is_artifact(Path::new("/tmp/.snapshot-x.tmp")));
        assert!(is_artifact(Path::new("/tmp/a-1.json")));
    }
}
