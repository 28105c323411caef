//! In-memory embedding index over graph records.

use chemora_common::{EntityRecord, Graph};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use crate::embedder::Embedder;
use crate::similarity::cosine_similarity;
use crate::{EmbedError, Result};

pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub entity_id: String,
    pub entity_type: String,
    pub name: String,
    pub vector: Vec<f32>,
    /// SHA-256 of the text the vector was computed from.
    pub text_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingIndex {
    pub format_version: u32,
    /// Content hash of the graph the index was built from.
    pub graph_hash: String,
    pub embedder_id: String,
    pub dim: usize,
    pub entries: Vec<IndexEntry>,
}

impl EmbeddingIndex {
    /// Embed every record in `entity_types` sections of `graph`.
    ///
    /// Records with no embeddable text are left out of the index.
    #[instrument(skip_all, fields(graph = %graph.content_hash(), embedder = %embedder.id()))]
    pub fn build(graph: &Graph, embedder: &dyn Embedder, entity_types: &[String]) -> Self {
        let records: Vec<(&str, &EntityRecord)> = entity_types
            .iter()
            .filter_map(|t| graph.section(t).map(|records| (t.as_str(), records)))
            .flat_map(|(t, records)| records.iter().map(move |r| (t, r)))
            .collect();

        let entries: Vec<IndexEntry> = records
            .par_iter()
            .filter_map(|(entity_type, record)| {
                let text = record.salient_text();
                match embedder.embed(&text) {
                    Ok(vector) => Some(IndexEntry {
                        entity_id: record.id().to_string(),
                        entity_type: entity_type.to_string(),
                        name: record.display_name().to_string(),
                        vector,
                        text_hash: hex::encode(Sha256::digest(text.as_bytes())),
                    }),
                    Err(e) => {
                        debug!(id = record.id(), "Record not embedded: {e}");
                        None
                    }
                }
            })
            .collect();

        info!(records = records.len(), embedded = entries.len(), "Embedding index built");
        Self {
            format_version: INDEX_FORMAT_VERSION,
            graph_hash: graph.content_hash().to_string(),
            embedder_id: embedder.id(),
            dim: embedder.dim(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when this index answers for `graph_hash` under `embedder`.
    pub fn is_current(&self, graph_hash: &str, embedder: &dyn Embedder) -> bool {
        self.format_version == INDEX_FORMAT_VERSION
            && self.graph_hash == graph_hash
            && self.embedder_id == embedder.id()
            && self.dim == embedder.dim()
    }

    /// Reject an embedder other than the one the index was built with.
    pub fn ensure_embedder(&self, embedder: &dyn Embedder) -> Result<()> {
        if self.embedder_id != embedder.id() {
            return Err(EmbedError::EmbedderMismatch {
                expected: embedder.id(),
                found: self.embedder_id.clone(),
            });
        }
        if self.dim != embedder.dim() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dim,
                actual: embedder.dim(),
            });
        }
        Ok(())
    }

    /// The `top_k` entries closest to `query`, optionally limited to one
    /// entity type. Descending similarity, ties broken by entity id.
    pub fn nearest(
        &self,
        query: &[f32],
        top_k: usize,
        entity_type: Option<&str>,
    ) -> Result<Vec<(&IndexEntry, f64)>> {
        if query.len() != self.dim {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let mut scored: Vec<(&IndexEntry, f64)> = self
            .entries
            .iter()
            .filter(|e| entity_type.map_or(true, |t| e.entity_type == t))
            .map(|e| (e, cosine_similarity(query, &e.vector)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.entity_id.cmp(&b.0.entity_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;
    use chemora_test_utils::{empty_graph, fixture_graph};

    fn methods() -> Vec<String> {
        vec!["Methods".to_string()]
    }

    #[test]
    fn test_builds_one_entry_per_method() {
        let graph = fixture_graph();
        let embedder = HashingEmbedder::new(64).unwrap();
        let index = EmbeddingIndex::build(&graph, &embedder, &methods());
        assert_eq!(index.len(), graph.method_count());
        assert_eq!(index.graph_hash, graph.content_hash());
        assert!(index.entries.iter().all(|e| e.vector.len() == 64 && e.entity_type == "Methods"));
        assert!(index.is_current(graph.content_hash(), &embedder));
    }

    #[test]
    fn test_broader_entity_types() {
        let graph = fixture_graph();
        let embedder = HashingEmbedder::new(64).unwrap();
        let types = vec!["Methods".to_string(), "Concepts".to_string(), "Absent".to_string()];
        let index = EmbeddingIndex::build(&graph, &embedder, &types);
        assert_eq!(index.len(), 10);
        let query = embedder.embed("electron correlation").unwrap();
        let concepts = index.nearest(&query, 10, Some("Concepts")).unwrap();
        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[0].0.entity_id, "c_corr");
    }

    #[test]
    fn test_nearest_rejects_foreign_vectors() {
        let graph = fixture_graph();
        let index = EmbeddingIndex::build(&graph, &HashingEmbedder::new(64).unwrap(), &methods());
        assert!(matches!(
            index.nearest(&[0.0; 32], 3, None),
            Err(EmbedError::DimensionMismatch { expected: 64, actual: 32 })
        ));
        let other = HashingEmbedder::new(32).unwrap();
        assert!(!index.is_current(graph.content_hash(), &other));
        assert!(matches!(index.ensure_embedder(&other), Err(EmbedError::EmbedderMismatch { .. })));
    }

    #[test]
    fn test_empty_graph_gives_empty_index() {
        let index = EmbeddingIndex::build(&empty_graph(), &HashingEmbedder::new(8).unwrap(), &methods());
        assert!(index.is_empty());
        assert!(index.nearest(&[0.0; 8], 5, None).unwrap().is_empty());
    }
}
