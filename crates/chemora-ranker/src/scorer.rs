//! Policy-parameterised method ranking.
//!
//! S(m) = Σ(w_i × n_i) over the normalised features of method m.
//!
//! The composite view weights accuracy first; the efficiency view weights
//! the cost/accuracy trade-off. Both share the same machinery and differ only
//! in the policy, so neither ordering is privileged.

use std::cmp::Ordering;

use chemora_common::{Graph, MethodRecord};
use serde::Serialize;
use tracing::debug;

use crate::normalise::MethodFeatures;
use crate::query::MethodFilter;
use crate::weights::WeightVector;

/// A scoring rule over normalised method features.
pub trait RankingPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn score(&self, features: &MethodFeatures) -> f64;
}

fn weighted_sum(weights: &WeightVector, features: &MethodFeatures) -> f64 {
    features
        .as_array()
        .iter()
        .zip(weights.as_array().iter())
        .map(|(n, w)| n * w)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct CompositePolicy {
    weights: WeightVector,
}

impl CompositePolicy {
    pub fn new(weights: WeightVector) -> Self {
        Self { weights: weights.normalised() }
    }
}

impl Default for CompositePolicy {
    fn default() -> Self {
        Self::new(WeightVector::composite())
    }
}

impl RankingPolicy for CompositePolicy {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn score(&self, features: &MethodFeatures) -> f64 {
        weighted_sum(&self.weights, features)
    }
}

/// Emphasises cheap methods that still deliver useful accuracy.
#[derive(Debug, Clone)]
pub struct EfficiencyPolicy {
    weights: WeightVector,
}

impl EfficiencyPolicy {
    pub fn new(weights: WeightVector) -> Self {
        Self { weights: weights.normalised() }
    }
}

impl Default for EfficiencyPolicy {
    fn default() -> Self {
        Self::new(WeightVector::efficiency())
    }
}

impl RankingPolicy for EfficiencyPolicy {
    fn name(&self) -> &'static str {
        "efficiency"
    }

    fn score(&self, features: &MethodFeatures) -> f64 {
        weighted_sum(&self.weights, features)
    }
}

/// A method with its composite ranking score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMethod {
    #[serde(flatten)]
    pub record: MethodRecord,
    pub composite_score: f64,
    pub features: MethodFeatures,
}

/// A method with its efficiency score, the "reasoning" view of the ranking.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyRankedMethod {
    #[serde(flatten)]
    pub record: MethodRecord,
    pub efficiency_score: f64,
    pub accuracy_score: f64,
    pub cost_score: f64,
}

/// Descending by score, ties broken by id ascending.
fn by_score_then_id(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// Score every method passing `filter` under `policy`, best first.
pub fn rank_by<'g>(
    graph: &'g Graph,
    policy: &dyn RankingPolicy,
    filter: Option<&MethodFilter>,
    limit: usize,
) -> Vec<(&'g MethodRecord, f64, MethodFeatures)> {
    let mut scored: Vec<_> = graph
        .methods()
        .filter(|m| filter.map_or(true, |f| f.matches(m)))
        .map(|m| {
            let features = MethodFeatures::of(m);
            (m, policy.score(&features), features)
        })
        .collect();
    scored.sort_by(|a, b| by_score_then_id((a.1, &a.0.id), (b.1, &b.0.id)));
    scored.truncate(limit);
    debug!(policy = policy.name(), returned = scored.len(), "Ranked methods");
    scored
}

/// Holds the two ranking policies and answers ranking queries over a graph.
pub struct Ranker {
    composite: Box<dyn RankingPolicy>,
    efficiency: Box<dyn RankingPolicy>,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(CompositePolicy::default(), EfficiencyPolicy::default())
    }
}

impl Ranker {
    pub fn new(composite: impl RankingPolicy + 'static, efficiency: impl RankingPolicy + 'static) -> Self {
        Self {
            composite: Box::new(composite),
            efficiency: Box::new(efficiency),
        }
    }

    pub fn from_weights(composite: WeightVector, efficiency: WeightVector) -> Self {
        Self::new(CompositePolicy::new(composite), EfficiencyPolicy::new(efficiency))
    }

    /// At most `limit` methods by descending `composite_score`.
    pub fn rank_methods(&self, graph: &Graph, limit: usize, filter: Option<&MethodFilter>) -> Vec<RankedMethod> {
        rank_by(graph, self.composite.as_ref(), filter, limit)
            .into_iter()
            .map(|(record, composite_score, features)| RankedMethod {
                record: record.clone(),
                composite_score,
                features,
            })
            .collect()
    }

    /// At most `limit` methods by descending `efficiency_score`.
    pub fn ranked_methods(&self, graph: &Graph, limit: usize) -> Vec<EfficiencyRankedMethod> {
        rank_by(graph, self.efficiency.as_ref(), None, limit)
            .into_iter()
            .map(|(record, efficiency_score, features)| EfficiencyRankedMethod {
                record: record.clone(),
                efficiency_score,
                accuracy_score: features.accuracy,
                cost_score: features.cost,
            })
            .collect()
    }

    /// Composite score of a single method, for callers ordering their own hits.
    pub fn composite_score(&self, method: &MethodRecord) -> f64 {
        self.composite.score(&MethodFeatures::of(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemora_test_utils::{empty_graph, fixture_graph, graph_with_methods};
    use serde_json::json;

    #[test]
    fn test_rank_limit_and_order() {
        let graph = fixture_graph();
        let ranked = Ranker::default().rank_methods(&graph, 3, None);
        assert_eq!(ranked.len(), 3);
        for pair in ranked.windows(2) {
            assert!(pair[0].composite_score >= pair[1].composite_score);
        }
        assert_eq!(ranked[0].record.id, "ccsd_t");
    }

    #[test]
    fn test_ties_broken_by_id() {
        let graph = graph_with_methods(vec![
            json!({"id": "zeta", "name": "Z", "accuracy_level": "high"}),
            json!({"id": "alpha", "name": "A", "accuracy_level": "high"}),
            json!({"id": "mid", "name": "M", "accuracy_level": "high"}),
        ]);
        let ids: Vec<_> = Ranker::default()
            .rank_methods(&graph, 10, None)
            .into_iter()
            .map(|r| r.record.id)
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_efficiency_view_is_self_consistent() {
        let graph = fixture_graph();
        let view = Ranker::default().ranked_methods(&graph, 10);
        assert_eq!(view.len(), graph.method_count());
        for pair in view.windows(2) {
            assert!(pair[0].efficiency_score >= pair[1].efficiency_score);
        }
        // Efficiency prefers cheap-and-good over the gold standard.
        let pos = |id: &str| view.iter().position(|m| m.record.id == id).unwrap();
        assert!(pos("b3lyp") < pos("ccsd_t"));
    }

    #[test]
    fn test_scores_serialize_under_their_names() {
        let graph = fixture_graph();
        let ranker = Ranker::default();
        let composite = serde_json::to_value(&ranker.rank_methods(&graph, 1, None)[0]).unwrap();
        assert!(composite["composite_score"].is_f64());
        assert!(composite["id"].is_string());
        let efficiency = serde_json::to_value(&ranker.ranked_methods(&graph, 1)[0]).unwrap();
        assert!(efficiency["efficiency_score"].is_f64());
    }

    #[test]
    fn test_empty_graph_ranks_nothing() {
        assert!(Ranker::default().rank_methods(&empty_graph(), 5, None).is_empty());
        assert!(Ranker::default().ranked_methods(&empty_graph(), 5).is_empty());
    }
}
