//! Configuration for the embedding service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for semantic search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Semantic search on or off. When off, only lexical search answers.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Embedding dimension (default: 384)
    #[serde(default = "default_dim")]
    pub dim: usize,

    /// Graph sections whose records are embedded (default: Methods)
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<String>,

    /// Directory holding persisted indexes, one file per graph hash
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Write built indexes to `index_dir` and reuse them (default: true)
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// Maximum number of cached query embeddings; 0 disables the cache
    #[serde(default = "default_query_cache_size")]
    pub query_cache_size: usize,
}

fn default_enabled() -> bool { true }
fn default_dim() -> usize { 384 }
fn default_entity_types() -> Vec<String> { vec!["Methods".to_string()] }
fn default_index_dir() -> PathBuf { PathBuf::from("./data/embeddings") }
fn default_persist() -> bool { true }
fn default_query_cache_size() -> usize { 1_024 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            dim: default_dim(),
            entity_types: default_entity_types(),
            index_dir: default_index_dir(),
            persist: default_persist(),
            query_cache_size: default_query_cache_size(),
        }
    }
}

impl EmbeddingConfig {
    /// In-memory only: nothing is read from or written to disk.
    pub fn ephemeral() -> Self {
        Self {
            persist: false,
            ..Default::default()
        }
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = dir.into();
        self
    }

    pub fn with_entity_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entity_types = types.into_iter().map(Into::into).collect();
        self
    }
}
