use std::path::Path;
use std::sync::Arc;

use chemora_common::{Graph, MethodRecord, MethodSearcher, SearchHit};
use chemora_embed::{EmbeddingIndex, EmbeddingSearcher, HashingEmbedder};
use chemora_ingestion::{Citation, DocumentMeta, ExtractedFact, QualityScorer, ScoreBreakdown};
use chemora_kg::{analyze, GapReport, GraphLoader, GraphSource, JsonFileSource, SnapshotHandle, SnapshotStore};
use chemora_ranker::{
    filter_methods, suggest, EfficiencyRankedMethod, LexicalSearcher, MethodFilter, RankedMethod, Ranker,
};
use tracing::info;

use crate::config::Config;
use crate::context::{ContextBuilder, ContextBundle};
use crate::error::Result;

/// Facade over the expert layer.
///
/// Only operations that need the graph can fail, and only because the graph
/// could not be loaded. Snapshot writes and explicit index builds surface
/// their own storage errors.
pub struct ExpertLayer {
    config: Config,
    loader: GraphLoader,
    scorer: QualityScorer,
    ranker: Ranker,
    semantic: Arc<EmbeddingSearcher>,
    context: ContextBuilder,
    snapshots: SnapshotStore,
}

impl ExpertLayer {
    /// Read the graph from `config.graph.path`.
    pub fn new(config: Config) -> Result<Self> {
        let source = JsonFileSource::new(&config.graph.path);
        Self::with_source(config, source)
    }

    pub fn with_source(config: Config, source: impl GraphSource + 'static) -> Result<Self> {
        let mut scorer = QualityScorer::new(config.quality.category_weights.clone());
        if let Some(year) = config.quality.reference_year {
            scorer = scorer.with_reference_year(year);
        }

        let embedder = Arc::new(HashingEmbedder::new(config.embedding.dim)?);
        let semantic = Arc::new(EmbeddingSearcher::new(embedder, config.embedding.clone()));
        let context = ContextBuilder::new(
            Arc::new(LexicalSearcher),
            Some(semantic.clone() as Arc<dyn MethodSearcher>),
            config.context.clone(),
        );

        info!(
            semantic = semantic.is_available(),
            snapshots = %config.snapshots.dir.display(),
            "Expert layer ready"
        );
        Ok(Self {
            loader: GraphLoader::new(source),
            scorer,
            ranker: Ranker::from_weights(config.ranking.composite.clone(), config.ranking.efficiency.clone()),
            semantic,
            context,
            snapshots: SnapshotStore::new(&config.snapshots.dir),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The cached graph, loaded on first use.
    pub fn load_graph(&self) -> Result<Arc<Graph>> {
        Ok(self.loader.load_graph()?)
    }

    pub fn reload_graph(&self) -> Result<Arc<Graph>> {
        Ok(self.loader.reload()?)
    }

    pub fn score(
        &self,
        meta: &DocumentMeta,
        raw_text: &str,
        facts: &[ExtractedFact],
        citations: &[Citation],
    ) -> ScoreBreakdown {
        self.scorer.score(meta, raw_text, facts, citations)
    }

    pub fn analyze(&self) -> Result<GapReport> {
        let graph = self.load_graph()?;
        Ok(analyze(&graph))
    }

    pub fn rank_methods(&self, limit: usize, filter: Option<&MethodFilter>) -> Result<Vec<RankedMethod>> {
        let graph = self.load_graph()?;
        Ok(self.ranker.rank_methods(&graph, limit, filter))
    }

    pub fn filter_methods(&self, filter: &MethodFilter) -> Result<Vec<MethodRecord>> {
        let graph = self.load_graph()?;
        Ok(filter_methods(&graph, filter).into_iter().cloned().collect())
    }

    pub fn suggest(&self, text: &str, limit: usize) -> Result<Vec<String>> {
        let graph = self.load_graph()?;
        Ok(suggest(&graph, text, limit))
    }

    pub fn ranked_methods(&self, limit: usize) -> Result<Vec<EfficiencyRankedMethod>> {
        let graph = self.load_graph()?;
        Ok(self.ranker.ranked_methods(&graph, limit))
    }

    pub fn build_context(&self, query: &str) -> Result<ContextBundle> {
        let graph = self.load_graph()?;
        Ok(self.context.build_context(&graph, query))
    }

    pub fn build_embeddings(&self, persist: bool) -> Result<Arc<EmbeddingIndex>> {
        let graph = self.load_graph()?;
        Ok(self.semantic.build_embeddings(&graph, persist)?)
    }

    /// Empty when semantic search is disabled in the configuration.
    pub fn search_methods(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let graph = self.load_graph()?;
        Ok(self.semantic.search(&graph, query, top_k))
    }

    pub fn create_snapshot(&self, label: &str) -> Result<SnapshotHandle> {
        let graph = self.load_graph()?;
        Ok(self.snapshots.create_snapshot(&graph, label)?)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotHandle>> {
        Ok(self.snapshots.list_snapshots()?)
    }

    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<Graph> {
        Ok(self.snapshots.load_snapshot(path)?)
    }
}
