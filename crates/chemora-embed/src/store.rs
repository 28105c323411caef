//! Durable index storage keyed by graph content hash.
//!
//! One JSON file per graph hash. Writes go through a temp file in the same
//! directory and are renamed into place, so readers see either the old or
//! the new index; concurrent builders for the same hash converge with the
//! last rename winning.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::embedder::Embedder;
use crate::index::EmbeddingIndex;
use crate::Result;

#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, graph_hash: &str) -> PathBuf {
        self.dir.join(format!("{graph_hash}.json"))
    }

    /// The stored index for `graph_hash`, if one exists and was built by
    /// `embedder`. A stale or foreign index is reported as absent so the
    /// caller rebuilds.
    pub fn load(&self, graph_hash: &str, embedder: &dyn Embedder) -> Result<Option<EmbeddingIndex>> {
        let path = self.path_for(graph_hash);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let index: EmbeddingIndex = match serde_json::from_str(&data) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %path.display(), "Ignoring unreadable embedding index: {e}");
                return Ok(None);
            }
        };

        if index.embedder_id != embedder.id() {
            warn!(
                "Embedding function changed from '{}' to '{}'. Index will be rebuilt.",
                index.embedder_id,
                embedder.id()
            );
            return Ok(None);
        }
        if !index.is_current(graph_hash, embedder) {
            debug!(path = %path.display(), "Stored index is stale");
            return Ok(None);
        }

        info!(path = %path.display(), entries = index.len(), "Loaded embedding index from disk");
        Ok(Some(index))
    }

    pub fn save(&self, index: &EmbeddingIndex) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&index.graph_hash);

        let mut tmp = tempfile::Builder::new()
            .prefix(".index-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, index)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)?;

        debug!(path = %path.display(), entries = index.len(), "Saved embedding index");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;
    use chemora_test_utils::{fixture_graph, scratch_dir};

    #[test]
    fn test_missing_index_is_none() {
        let dir = scratch_dir();
        let store = IndexStore::new(dir.path().join("never-created"));
        let embedder = HashingEmbedder::new(16).unwrap();
        assert!(store.load("abc", &embedder).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_index_is_ignored() {
        let dir = scratch_dir();
        let store = IndexStore::new(dir.path());
        std::fs::write(store.path_for("abc"), "{ truncated").unwrap();
        let embedder = HashingEmbedder::new(16).unwrap();
        assert!(store.load("abc", &embedder).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch_dir();
        let store = IndexStore::new(dir.path());
        let graph = fixture_graph();
        let embedder = HashingEmbedder::new(32).unwrap();
        let index = EmbeddingIndex::build(&graph, &embedder, &["Methods".to_string()]);

        let path = store.save(&index).unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        // Saving again for the same hash replaces the file.
        store.save(&index).unwrap();

        let loaded = store.load(graph.content_hash(), &embedder).unwrap().unwrap();
        assert_eq!(loaded.graph_hash, index.graph_hash);
        assert_eq!(loaded.embedder_id, index.embedder_id);
        assert_eq!(loaded.len(), index.len());
        for (a, b) in loaded.entries.iter().zip(&index.entries) {
            assert_eq!(a.entity_id, b.entity_id);
            assert!(a.vector.iter().zip(&b.vector).all(|(x, y)| (x - y).abs() < 1e-6));
        }
    }
}
