//! Semantic method search over a lazily built, cached embedding index.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};

use chemora_common::{sort_hits, Graph, HitSource, MethodSearcher, SearchHit, SECTION_METHODS};
use lru::LruCache;
use tracing::{debug, instrument, warn};

use crate::embedder::Embedder;
use crate::index::EmbeddingIndex;
use crate::store::IndexStore;
use crate::{EmbeddingConfig, Result};

/// Embedding-backed searcher.
///
/// Holds at most one index in memory. The index is rebuilt (or reloaded
/// from the store) whenever the graph's content hash or the embedder's
/// identity no longer matches it.
pub struct EmbeddingSearcher {
    embedder: Arc<dyn Embedder>,
    config: EmbeddingConfig,
    store: IndexStore,
    index: RwLock<Option<Arc<EmbeddingIndex>>>,
    query_cache: Option<Mutex<LruCache<String, Arc<Vec<f32>>>>>,
}

impl EmbeddingSearcher {
    pub fn new(embedder: Arc<dyn Embedder>, config: EmbeddingConfig) -> Self {
        let query_cache = NonZeroUsize::new(config.query_cache_size).map(|n| Mutex::new(LruCache::new(n)));
        Self {
            embedder,
            store: IndexStore::new(&config.index_dir),
            config,
            index: RwLock::new(None),
            query_cache,
        }
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// The index currently held in memory, if any.
    pub fn cached_index(&self) -> Option<Arc<EmbeddingIndex>> {
        self.index.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Return an index for `graph`, building it if needed.
    ///
    /// With `persist`, a stored index for the same graph hash and embedder
    /// is reused instead of rebuilding, and a fresh build is written back.
    /// Without it, nothing touches disk. A failed write is returned as an
    /// error, but the built index stays cached for searching.
    #[instrument(skip(self, graph), fields(graph = %graph.content_hash()))]
    pub fn build_embeddings(&self, graph: &Graph, persist: bool) -> Result<Arc<EmbeddingIndex>> {
        let (index, stored) = self.current_index(graph, persist);
        stored?;
        Ok(index)
    }

    /// The index for `graph` plus the outcome of writing it to the store.
    /// Storage never prevents an index from being built and cached.
    fn current_index(&self, graph: &Graph, persist: bool) -> (Arc<EmbeddingIndex>, Result<()>) {
        let embedder = self.embedder.as_ref();
        if let Some(index) = self.cached_index() {
            if index.is_current(graph.content_hash(), embedder) {
                debug!("Embedding index already current");
                return (index, Ok(()));
            }
        }

        let stored = if persist {
            self.store.load(graph.content_hash(), embedder).unwrap_or_else(|e| {
                warn!(dir = %self.store.dir().display(), "Cannot read stored index, rebuilding: {e}");
                None
            })
        } else {
            None
        };
        if let Some(stored) = stored {
            let index = Arc::new(stored);
            self.cache(index.clone());
            return (index, Ok(()));
        }

        let index = Arc::new(EmbeddingIndex::build(graph, embedder, &self.config.entity_types));
        self.cache(index.clone());
        let saved = if persist {
            self.store.save(&index).map(|_| ())
        } else {
            Ok(())
        };
        (index, saved)
    }

    fn cache(&self, index: Arc<EmbeddingIndex>) {
        *self.index.write().unwrap_or_else(|e| e.into_inner()) = Some(index);
    }

    fn embed_query(&self, query: &str) -> Result<Arc<Vec<f32>>> {
        if let Some(cache) = &self.query_cache {
            let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = cache.get(query) {
                return Ok(hit.clone());
            }
        }

        let vector = Arc::new(self.embedder.embed(query)?);

        if let Some(cache) = &self.query_cache {
            let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.put(query.to_string(), vector.clone());
        }
        Ok(vector)
    }

    fn try_search(&self, graph: &Graph, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let (index, saved) = self.current_index(graph, self.config.persist);
        if let Err(e) = saved {
            warn!(dir = %self.store.dir().display(), "Embedding index not persisted: {e}");
        }
        index.ensure_embedder(self.embedder.as_ref())?;
        let vector = self.embed_query(query)?;

        let mut hits: Vec<SearchHit> = index
            .nearest(&vector, top_k, Some(SECTION_METHODS))?
            .into_iter()
            .filter_map(|(entry, similarity)| {
                graph.method(&entry.entity_id).map(|record| SearchHit {
                    record: record.clone(),
                    similarity,
                    source: HitSource::Semantic,
                })
            })
            .collect();
        sort_hits(&mut hits);
        Ok(hits)
    }

    /// Up to `top_k` methods by descending cosine similarity to `query`.
    ///
    /// Never fails: an empty corpus, an unembeddable query or a storage
    /// error all yield an empty result.
    pub fn search_methods(&self, graph: &Graph, query: &str, top_k: usize) -> Vec<SearchHit> {
        if top_k == 0 || graph.method_count() == 0 || query.trim().is_empty() {
            return Vec::new();
        }
        match self.try_search(graph, query, top_k) {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query, "Semantic search unavailable: {e}");
                Vec::new()
            }
        }
    }
}

impl MethodSearcher for EmbeddingSearcher {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn is_available(&self) -> bool {
        self.config.enabled && self.embedder.dim() > 0
    }

    fn search(&self, graph: &Graph, query: &str, top_k: usize) -> Vec<SearchHit> {
        if !self.is_available() {
            return Vec::new();
        }
        self.search_methods(graph, query, top_k)
    }
}
