//! Context assembly for a natural-language query.
//!
//! Runs the lexical and semantic searchers side by side, merges their hits,
//! and attaches the graph's concepts that the query or the returned methods
//! mention.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};
use chemora_common::{ConceptRecord, Graph, HitSource, MethodRecord, MethodSearcher, SearchHit};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::ContextConfig;

pub const CONTEXT_SOURCE: &str = "expert-layer";

#[derive(Debug, Clone, Serialize)]
pub struct ContextMethod {
    #[serde(flatten)]
    pub record: MethodRecord,
    pub similarity: f64,
    pub matched_by: HitSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextConcept {
    #[serde(flatten)]
    pub record: ConceptRecord,
    /// Where the concept was found: `"query"`, `"method:<id>"` for a name
    /// appearing in a returned method, or `"related:<id>"` when the concept
    /// lists a returned method.
    pub matched_in: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextMetadata {
    pub source: String,
    pub graph_hash: String,
    pub searchers: Vec<String>,
    pub semantic_available: bool,
    pub lexical_hits: usize,
    pub semantic_hits: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    pub query: String,
    pub methods: Vec<ContextMethod>,
    pub concepts: Vec<ContextConcept>,
    pub metadata: ContextMetadata,
}

pub struct ContextBuilder {
    lexical: Arc<dyn MethodSearcher>,
    semantic: Option<Arc<dyn MethodSearcher>>,
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new(
        lexical: Arc<dyn MethodSearcher>,
        semantic: Option<Arc<dyn MethodSearcher>>,
        config: ContextConfig,
    ) -> Self {
        Self { lexical, semantic, config }
    }

    fn semantic_searcher(&self) -> Option<&dyn MethodSearcher> {
        self.semantic.as_deref().filter(|s| s.is_available())
    }

    /// Always returns a complete bundle; a query matching nothing yields
    /// empty `methods` and `concepts`.
    #[instrument(skip(self, graph), fields(graph = %graph.content_hash()))]
    pub fn build_context(&self, graph: &Graph, query: &str) -> ContextBundle {
        let top_k = self.config.max_methods;
        let semantic = self.semantic_searcher();

        let (lexical_hits, semantic_hits) = rayon::join(
            || self.lexical.search(graph, query, top_k),
            || match semantic {
                Some(s) => s.search(graph, query, top_k),
                None => Vec::new(),
            },
        );
        let semantic_hits: Vec<SearchHit> = semantic_hits
            .into_iter()
            .filter(|h| h.similarity >= self.config.min_semantic_similarity)
            .collect();

        let mut searchers = vec![self.lexical.name().to_string()];
        searchers.extend(semantic.map(|s| s.name().to_string()));

        let metadata = ContextMetadata {
            source: CONTEXT_SOURCE.to_string(),
            graph_hash: graph.content_hash().to_string(),
            searchers,
            semantic_available: semantic.is_some(),
            lexical_hits: lexical_hits.len(),
            semantic_hits: semantic_hits.len(),
            generated_at: Utc::now(),
        };

        let methods = merge_hits(semantic_hits, lexical_hits, top_k);
        let concepts = match_concepts(graph, query, &methods, self.config.max_concepts);
        debug!(methods = methods.len(), concepts = concepts.len(), "Context assembled");

        ContextBundle {
            query: query.to_string(),
            methods,
            concepts,
            metadata,
        }
    }
}

/// Semantic hits first, then lexical hits for methods not already present.
/// A method found by both keeps its semantic hit.
fn merge_hits(semantic: Vec<SearchHit>, lexical: Vec<SearchHit>, limit: usize) -> Vec<ContextMethod> {
    let mut seen = HashSet::new();
    semantic
        .into_iter()
        .chain(lexical)
        .filter(|hit| seen.insert(hit.record.id.clone()))
        .take(limit)
        .map(|hit| ContextMethod {
            record: hit.record,
            similarity: hit.similarity,
            matched_by: hit.source,
        })
        .collect()
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Concepts named in the query or in the returned methods, plus concepts
/// that list a returned method. Query matches come first, then graph order.
fn match_concepts(graph: &Graph, query: &str, methods: &[ContextMethod], limit: usize) -> Vec<ContextConcept> {
    let concepts: Vec<&ConceptRecord> = graph.concepts().collect();
    if concepts.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut origins: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    // Unicode-lowercased on both sides.
    let named: Vec<(usize, String)> = concepts
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let name = c.name.as_deref()?.trim();
            (!name.is_empty()).then(|| (i, name.to_lowercase()))
        })
        .collect();
    let matcher = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(named.iter().map(|(_, n)| n.as_str()));

    match matcher {
        Ok(matcher) => {
            let mut haystacks = vec![("query".to_string(), query.to_lowercase())];
            for m in methods {
                let text = [m.record.display_name(), m.record.description.as_deref().unwrap_or("")].join(" ");
                haystacks.push((format!("method:{}", m.record.id), text.to_lowercase()));
            }
            for (origin, text) in &haystacks {
                for found in matcher.find_iter(text.as_str()) {
                    if !is_word_boundary(text, found.start(), found.end()) {
                        continue;
                    }
                    let concept = named[found.pattern().as_usize()].0;
                    let entry = origins.entry(concept).or_default();
                    if !entry.contains(origin) {
                        entry.push(origin.clone());
                    }
                }
            }
        }
        Err(e) => warn!("Concept matcher unavailable: {e}"),
    }

    for (i, concept) in concepts.iter().enumerate() {
        for m in methods {
            if concept.related_methods.iter().any(|id| *id == m.record.id) {
                origins.entry(i).or_default().push(format!("related:{}", m.record.id));
            }
        }
    }

    let mut matched: Vec<(usize, Vec<String>)> = origins.into_iter().collect();
    matched.sort_by_key(|(i, from)| (!from.iter().any(|o| o == "query"), *i));
    matched
        .into_iter()
        .take(limit)
        .map(|(i, matched_in)| ContextConcept {
            record: concepts[i].clone(),
            matched_in,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemora_ranker::LexicalSearcher;
    use chemora_test_utils::{empty_graph, fixture_graph};

    fn lexical_only() -> ContextBuilder {
        ContextBuilder::new(Arc::new(LexicalSearcher), None, ContextConfig::default())
    }

    #[test]
    fn test_empty_query_is_well_formed() {
        let bundle = lexical_only().build_context(&fixture_graph(), "");
        assert_eq!(bundle.metadata.source, "expert-layer");
        assert!(bundle.methods.is_empty());
        assert!(bundle.concepts.is_empty());
        assert!(!bundle.metadata.semantic_available);

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["methods"].is_array());
        assert!(json["concepts"].is_array());
    }

    #[test]
    fn test_concepts_from_query_and_methods() {
        let bundle = lexical_only().build_context(&fixture_graph(), "Which method handles Electron Correlation?");
        let ids: Vec<_> = bundle.concepts.iter().map(|c| c.record.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"c_corr"));
        assert!(bundle.concepts[0].matched_in.contains(&"query".to_string()));
    }

    #[test]
    fn test_non_ascii_concept_names_match_any_case() {
        let graph = Graph::from_value(serde_json::json!({
            "Methods": [{"id": "mp2", "name": "MP2"}],
            "Concepts": [{"id": "c_mp", "name": "Møller–Plesset perturbation theory"}],
            "metadata": {"expert_layer": {"added_entity_types": ["Concepts"]}}
        }))
        .unwrap();
        let bundle = lexical_only().build_context(&graph, "when is MØLLER–PLESSET PERTURBATION THEORY enough?");
        let ids: Vec<_> = bundle.concepts.iter().map(|c| c.record.id.as_str()).collect();
        assert_eq!(ids, vec!["c_mp"]);
        assert_eq!(bundle.concepts[0].matched_in, vec!["query".to_string()]);
    }

    #[test]
    fn test_concept_names_need_word_boundaries() {
        assert!(is_word_boundary("a dispersion b", 2, 12));
        assert!(!is_word_boundary("antidispersion", 4, 14));
    }

    #[test]
    fn test_merge_prefers_semantic() {
        let graph = fixture_graph();
        let hit = |id: &str, similarity, source| SearchHit {
            record: graph.method(id).unwrap().clone(),
            similarity,
            source,
        };
        let merged = merge_hits(
            vec![hit("mp2", 0.4, HitSource::Semantic)],
            vec![hit("hf", 0.9, HitSource::Lexical), hit("mp2", 0.8, HitSource::Lexical)],
            10,
        );
        let ids: Vec<_> = merged.iter().map(|m| m.record.id.as_str()).collect();
        assert_eq!(ids, vec!["mp2", "hf"]);
        assert_eq!(merged[0].matched_by, HitSource::Semantic);
        assert_eq!(merge_hits(Vec::new(), Vec::new(), 3).len(), 0);
    }

    #[test]
    fn test_graph_without_concepts() {
        let bundle = lexical_only().build_context(&empty_graph(), "dispersion");
        assert!(bundle.methods.is_empty());
        assert!(bundle.concepts.is_empty());
    }
}
