//! The seam shared by the lexical and the embedding-based method searchers.

use serde::{Deserialize, Serialize};

use crate::entities::MethodRecord;
use crate::graph::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    Lexical,
    Semantic,
}

/// One method matched by a searcher. `similarity` is in [-1, 1] for
/// semantic hits and [0, 1] for lexical ones.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub record: MethodRecord,
    pub similarity: f64,
    pub source: HitSource,
}

impl SearchHit {
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// A capability-checked method search path.
///
/// `is_available` reports whether the searcher can answer at all (e.g. no
/// embedder configured); an unavailable searcher is skipped by callers
/// rather than treated as an empty answer.
pub trait MethodSearcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }

    /// Best matches first; at most `top_k` hits. Never fails: a searcher
    /// that cannot answer returns an empty vector.
    fn search(&self, graph: &Graph, query: &str, top_k: usize) -> Vec<SearchHit>;
}

/// Order hits by descending similarity, ties broken by id ascending.
pub fn sort_hits(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
}
