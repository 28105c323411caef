//! Keyword-overlap matching over method names and descriptions.
//!
//! Works on the graph alone, so it answers even when no embedding index has
//! been built.

use std::collections::HashSet;

use chemora_common::{sort_hits, tokenize, Graph, HitSource, MethodRecord, MethodSearcher, SearchHit};

const PHRASE_SCORE: u32 = 3;
const NAME_TOKEN_SCORE: u32 = 2;
const TEXT_TOKEN_SCORE: u32 = 1;

/// Raw overlap score of one method against a lowercased query and its tokens.
fn overlap(method: &MethodRecord, query: &str, tokens: &[String]) -> u32 {
    let name = method.display_name().to_lowercase();
    let mut raw = 0;
    if !name.is_empty() && query.contains(&name) {
        raw += PHRASE_SCORE;
    }
    if name.contains(query) {
        raw += PHRASE_SCORE;
    }

    let name_tokens: HashSet<String> = tokenize(&name).into_iter().collect();
    let mut text = String::new();
    for part in method
        .description
        .iter()
        .chain(method.category.iter())
        .chain(method.typical_use_cases.iter())
    {
        text.push_str(part);
        text.push(' ');
    }
    let text_tokens: HashSet<String> = tokenize(&text).into_iter().collect();

    for token in tokens {
        if name_tokens.contains(token) {
            raw += NAME_TOKEN_SCORE;
        } else if text_tokens.contains(token) {
            raw += TEXT_TOKEN_SCORE;
        }
    }
    raw
}

/// Every method with a non-zero overlap, as `(method, similarity)` with
/// similarity in (0, 1], best first, ties broken by id.
pub fn lexical_scores<'g>(graph: &'g Graph, text: &str) -> Vec<(&'g MethodRecord, f64)> {
    let query = text.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut tokens = tokenize(&query);
    tokens.retain(|t| seen.insert(t.clone()));
    let ceiling = f64::from(2 * PHRASE_SCORE + NAME_TOKEN_SCORE * tokens.len() as u32);

    let mut scored: Vec<(&MethodRecord, u32)> = graph
        .methods()
        .map(|m| (m, overlap(m, &query, &tokens)))
        .filter(|(_, raw)| *raw > 0)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
    scored
        .into_iter()
        .map(|(m, raw)| (m, (f64::from(raw) / ceiling).min(1.0)))
        .collect()
}

/// Candidate method ids for free text, best first.
pub fn suggest(graph: &Graph, text: &str, limit: usize) -> Vec<String> {
    lexical_scores(graph, text)
        .into_iter()
        .take(limit)
        .map(|(m, _)| m.id.clone())
        .collect()
}

/// The lexical search path behind the shared searcher interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSearcher;

impl MethodSearcher for LexicalSearcher {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn search(&self, graph: &Graph, query: &str, top_k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = lexical_scores(graph, query)
            .into_iter()
            .take(top_k)
            .map(|(record, similarity)| SearchHit {
                record: record.clone(),
                similarity,
                source: HitSource::Lexical,
            })
            .collect();
        sort_hits(&mut hits);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemora_test_utils::{empty_graph, fixture_graph};

    #[test]
    fn test_name_match_wins() {
        let graph = fixture_graph();
        let ids = suggest(&graph, "What is the best method for CCSD(T) thermochemistry?", 3);
        assert_eq!(ids[0], "ccsd_t");
        assert!(ids.contains(&"dlpno_ccsd_t".to_string()));
    }

    #[test]
    fn test_description_keywords() {
        let graph = fixture_graph();
        let ids = suggest(&graph, "geometry optimization of organic molecules", 5);
        assert_eq!(ids.first().map(String::as_str), Some("b3lyp"));
    }

    #[test]
    fn test_no_match_and_blank_query() {
        let graph = fixture_graph();
        assert!(suggest(&graph, "zeolite catalysis", 5).is_empty());
        assert!(suggest(&graph, "   ", 5).is_empty());
        assert!(suggest(&empty_graph(), "ccsd", 5).is_empty());
    }

    #[test]
    fn test_searcher_bounds() {
        let graph = fixture_graph();
        let hits = LexicalSearcher.search(&graph, "coupled cluster correlation", 2);
        assert!(hits.len() <= 2);
        assert!(!hits.is_empty());
        for hit in &hits {
            assert!(hit.similarity > 0.0 && hit.similarity <= 1.0);
            assert_eq!(hit.source, HitSource::Lexical);
        }
    }
}
