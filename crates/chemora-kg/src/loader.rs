//! Graph loading.
//! The graph's storage of record is an external collaborator; this module
//! only needs "read every entity section plus metadata as one document".

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chemora_common::error::{GraphLoadError, Result};
use chemora_common::Graph;
use serde_json::Value;
use tracing::{debug, info, instrument};

/// A durable store that can hand back the whole graph document at once.
pub trait GraphSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Read the raw document: entity sections plus `metadata`.
    fn read(&self) -> Result<Value>;
}

/// A graph persisted as a single JSON file. Snapshot artifacts use the same
/// format, so this also reads snapshots back.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Value> {
        if !self.path.exists() {
            return Err(GraphLoadError::SourceMissing(self.path.clone()));
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| GraphLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A source holding an already-parsed document, for tests and for callers
/// that assemble the graph themselves.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    document: Value,
}

impl InMemorySource {
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

impl GraphSource for InMemorySource {
    fn describe(&self) -> String {
        "in-memory".to_string()
    }

    fn read(&self) -> Result<Value> {
        Ok(self.document.clone())
    }
}

/// Loads the graph once and hands out shared handles to it.
///
/// The cache is never invalidated on its own: callers that need a fresh
/// view call [`GraphLoader::reload`].
pub struct GraphLoader {
    source: Arc<dyn GraphSource>,
    cached: RwLock<Option<Arc<Graph>>>,
}

impl GraphLoader {
    pub fn new(source: impl GraphSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            cached: RwLock::new(None),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileSource::new(path))
    }

    /// Return the cached graph, loading it on first use.
    pub fn load_graph(&self) -> Result<Arc<Graph>> {
        if let Some(graph) = self.cached() {
            return Ok(graph);
        }
        self.reload()
    }

    /// Re-read the source and replace the cached graph. On failure the
    /// previous graph stays cached.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub fn reload(&self) -> Result<Arc<Graph>> {
        let document = self.source.read()?;
        let graph = Arc::new(Graph::from_value(document)?);
        info!(
            sections = graph.section_names().count(),
            entities = graph.entity_count(),
            hash = %graph.content_hash(),
            "Graph loaded"
        );
        let mut slot = self.cached.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(graph.clone());
        Ok(graph)
    }

    pub fn cached(&self) -> Option<Arc<Graph>> {
        self.cached.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn invalidate(&self) {
        debug!("Dropping cached graph");
        *self.cached.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// One-shot load without caching.
pub fn load_graph_from_path(path: impl AsRef<Path>) -> Result<Graph> {
    let document = JsonFileSource::new(path.as_ref()).read()?;
    Graph::from_value(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemora_test_utils::{fixture_graph_value, scratch_dir, write_graph};
    use serde_json::json;

    #[test]
    fn test_missing_file_is_source_missing() {
        let dir = scratch_dir();
        let loader = GraphLoader::from_path(dir.path().join("absent.json"));
        assert!(matches!(loader.load_graph(), Err(GraphLoadError::SourceMissing(_))));
    }

    #[test]
    fn test_corrupt_file_is_malformed() {
        let dir = scratch_dir();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_graph_from_path(&path), Err(GraphLoadError::Malformed(_))));
    }

    #[test]
    fn test_load_is_cached_until_reload() {
        let dir = scratch_dir();
        let path = write_graph(dir.path(), "graph.json", &fixture_graph_value()).unwrap();
        let loader = GraphLoader::from_path(&path);

        let first = loader.load_graph().unwrap();
        let second = loader.load_graph().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Changing the file alone does not refresh the cache.
        let mut changed = fixture_graph_value();
        changed["metadata"]["version"] = json!("2025.1");
        write_graph(dir.path(), "graph.json", &changed).unwrap();
        assert_eq!(loader.load_graph().unwrap().content_hash(), first.content_hash());

        let fresh = loader.reload().unwrap();
        assert_ne!(fresh.content_hash(), first.content_hash());
    }

    #[test]
    fn test_invalidate_forces_fresh_load() {
        let loader_src = InMemorySource::new(fixture_graph_value());
        let loader = GraphLoader::new(loader_src);
        let graph = loader.load_graph().unwrap();
        assert!(loader.cached().is_some());
        loader.invalidate();
        assert!(loader.cached().is_none());
        let again = loader.load_graph().unwrap();
        assert_eq!(graph.content_hash(), again.content_hash());
    }
}
