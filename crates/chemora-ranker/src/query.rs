//! Predicate filtering over method records, applied before any ranking.

use chemora_common::{Graph, MethodRecord};
use serde::{Deserialize, Serialize};

use crate::normalise::accuracy_norm;

/// Criteria a method must satisfy. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodFilter {
    /// Minimum normalised accuracy in [0, 1].
    pub min_accuracy: Option<f64>,
    /// Methods whose scaling exponent is unknown never pass this bound.
    pub max_scaling_exponent: Option<f64>,
    /// Case-insensitive substring of one of the method's use cases.
    pub use_case: Option<String>,
    /// Case-insensitive exact category.
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl MethodFilter {
    pub fn min_accuracy(value: f64) -> Self {
        Self {
            min_accuracy: Some(value),
            ..Default::default()
        }
    }

    pub fn matches(&self, method: &MethodRecord) -> bool {
        if let Some(min) = self.min_accuracy {
            if accuracy_norm(method.accuracy_level.as_ref()) < min {
                return false;
            }
        }
        if let Some(max) = self.max_scaling_exponent {
            match method.scaling_exponent() {
                Some(exp) if exp <= max => {}
                _ => return false,
            }
        }
        if let Some(wanted) = self.use_case.as_deref() {
            let wanted = wanted.to_lowercase();
            if !method
                .typical_use_cases
                .iter()
                .any(|u| u.to_lowercase().contains(&wanted))
            {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref() {
            if !method
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category.trim()))
            {
                return false;
            }
        }
        true
    }
}

/// Every method matching `filter`, in graph order, cut at `filter.limit`
/// when one is given.
pub fn filter_methods<'g>(graph: &'g Graph, filter: &MethodFilter) -> Vec<&'g MethodRecord> {
    graph
        .methods()
        .filter(|m| filter.matches(m))
        .take(filter.limit.unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemora_test_utils::{empty_graph, fixture_graph};

    fn ids(methods: Vec<&MethodRecord>) -> Vec<&str> {
        methods.into_iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let graph = fixture_graph();
        assert_eq!(filter_methods(&graph, &MethodFilter::min_accuracy(0.0)).len(), 7);
        assert!(filter_methods(&empty_graph(), &MethodFilter::min_accuracy(0.0)).is_empty());
    }

    #[test]
    fn test_min_accuracy() {
        let graph = fixture_graph();
        let high = filter_methods(&graph, &MethodFilter::min_accuracy(0.8));
        assert_eq!(ids(high), vec!["ccsd_t", "dlpno_ccsd_t"]);
    }

    #[test]
    fn test_scaling_bound_excludes_unknown() {
        let graph = fixture_graph();
        let filter = MethodFilter {
            max_scaling_exponent: Some(4.0),
            ..Default::default()
        };
        // casscf is "exponential", so it is excluded along with mp2 and ccsd_t.
        assert_eq!(ids(filter_methods(&graph, &filter)), vec!["hf", "b3lyp", "dlpno_ccsd_t", "pm7"]);
    }

    #[test]
    fn test_use_case_category_and_limit() {
        let graph = fixture_graph();
        let filter = MethodFilter {
            use_case: Some("Thermochemistry".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_methods(&graph, &filter)), vec!["ccsd_t", "dlpno_ccsd_t"]);

        let filter = MethodFilter {
            category: Some("Coupled Cluster".into()),
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(ids(filter_methods(&graph, &filter)), vec!["ccsd_t"]);
    }
}
