//! Configuration loading for Chemora.
//! Reads chemora.toml from the current directory or the path in the
//! CHEMORA_CONFIG env var. YAML and JSON files are accepted by extension.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chemora_embed::EmbeddingConfig;
use chemora_ingestion::CategoryWeights;
use chemora_ranker::WeightVector;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(test)]
mod tests;

pub const CONFIG_ENV: &str = "CHEMORA_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "chemora.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_path")]
    pub path: PathBuf,
}

fn default_graph_path() -> PathBuf { PathBuf::from("./data/expert_graph.json") }

impl Default for GraphConfig {
    fn default() -> Self {
        Self { path: default_graph_path() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_dir")]
    pub dir: PathBuf,
}

fn default_snapshot_dir() -> PathBuf { PathBuf::from("./data/snapshots") }

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { dir: default_snapshot_dir() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "WeightVector::composite")]
    pub composite: WeightVector,
    #[serde(default = "WeightVector::efficiency")]
    pub efficiency: WeightVector,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            composite: WeightVector::composite(),
            efficiency: WeightVector::efficiency(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default)]
    pub category_weights: CategoryWeights,
    /// Pin the recency reference year; unset means the current year.
    #[serde(default)]
    pub reference_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_max_methods")]
    pub max_methods: usize,
    #[serde(default = "default_max_concepts")]
    pub max_concepts: usize,
    /// Semantic hits scoring below this cosine similarity are dropped.
    #[serde(default = "default_min_semantic_similarity")]
    pub min_semantic_similarity: f64,
}

fn default_max_methods()  -> usize { 8 }
fn default_max_concepts() -> usize { 10 }
fn default_min_semantic_similarity() -> f64 { 0.1 }

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_methods: default_max_methods(),
            max_concepts: default_max_concepts(),
            min_semantic_similarity: default_min_semantic_similarity(),
        }
    }
}

impl Config {
    /// Load from CHEMORA_CONFIG, else ./chemora.toml. A missing file is not
    /// an error: defaults are used and a warning is logged.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if !Path::new(&path).exists() {
            warn!("Config file not found: {path}. Using defaults.");
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    /// Parse a config file, picking the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let mut config: Config = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        config.normalise();

        info!(path = %path.display(), graph = %config.graph.path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Renormalise ranking weights that do not sum to 1.
    fn normalise(&mut self) {
        for (name, weights) in [
            ("composite", &mut self.ranking.composite),
            ("efficiency", &mut self.ranking.efficiency),
        ] {
            if !weights.validate() {
                warn!(policy = name, "Ranking weights do not sum to 1, renormalising");
                weights.normalise();
            }
        }
    }
}
