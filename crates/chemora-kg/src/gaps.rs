//! Gap analysis: a read-only audit of the loaded graph against the
//! recommended schema. Absence is the finding, never an error.

use std::collections::BTreeMap;

use chemora_common::{EntityRecord, Graph, PARAMETER_SECTIONS};
use serde::{Deserialize, Serialize};

/// Sections a complete expert layer is expected to carry.
pub const RECOMMENDED_SECTIONS: &[&str] = &["BenchmarkSets", "ThermochemicalData", "ExcitedStateMethods"];

/// Top-level metadata keys a well-documented graph carries.
pub const RECOMMENDED_METADATA: &[&str] = &["version", "last_updated", "sources"];

/// Upper bound on the number of record names listed per finding.
pub const MAX_LISTED: usize = 25;

const UNNAMED: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub missing_sections: Vec<String>,
    /// Names of basis-set/parameter records with neither `accuracy_level`
    /// nor `effects_on_accuracy`, at most [`MAX_LISTED`].
    pub basis_sets_missing_accuracy_metadata: Vec<String>,
    /// Full count before truncation.
    pub basis_sets_missing_accuracy_total: usize,
    pub methods_missing_accuracy_level: Vec<String>,
    pub missing_metadata: Vec<String>,
    pub section_counts: BTreeMap<String, usize>,
    pub added_entity_types: Vec<String>,
}

impl GapReport {
    pub fn is_complete(&self) -> bool {
        self.missing_sections.is_empty()
            && self.basis_sets_missing_accuracy_total == 0
            && self.methods_missing_accuracy_level.is_empty()
            && self.missing_metadata.is_empty()
    }
}

pub fn analyze(graph: &Graph) -> GapReport {
    let missing_sections = RECOMMENDED_SECTIONS
        .iter()
        .filter(|s| !graph.has_section(s))
        .map(|s| s.to_string())
        .collect();

    let lacking: Vec<String> = PARAMETER_SECTIONS
        .iter()
        .filter_map(|s| graph.section(s))
        .flatten()
        .filter_map(EntityRecord::as_parameter)
        .filter(|p| !p.has_accuracy_metadata())
        .map(|p| display_or_unknown(p.name.as_deref()))
        .collect();
    let basis_sets_missing_accuracy_total = lacking.len();

    let methods_missing_accuracy_level = graph
        .methods()
        .filter(|m| m.accuracy_level.is_none())
        .map(|m| display_or_unknown(m.name.as_deref()))
        .take(MAX_LISTED)
        .collect();

    let metadata = graph.metadata();
    let missing_metadata = RECOMMENDED_METADATA
        .iter()
        .filter(|k| metadata.extra.get(**k).map_or(true, |v| v.is_null()))
        .map(|k| k.to_string())
        .collect();

    let section_counts = graph
        .sections()
        .map(|(name, records)| (name.to_string(), records.len()))
        .collect();

    GapReport {
        missing_sections,
        basis_sets_missing_accuracy_metadata: lacking.into_iter().take(MAX_LISTED).collect(),
        basis_sets_missing_accuracy_total,
        methods_missing_accuracy_level,
        missing_metadata,
        section_counts,
        added_entity_types: metadata.expert_layer.added_entity_types.clone(),
    }
}

fn display_or_unknown(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => UNNAMED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemora_test_utils::fixture_graph;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_fixture_findings() {
        let report = analyze(&fixture_graph());
        assert_eq!(
            report.missing_sections,
            vec!["BenchmarkSets", "ThermochemicalData", "ExcitedStateMethods"]
        );
        assert_eq!(report.basis_sets_missing_accuracy_metadata, vec!["STO-3G", "unknown"]);
        assert_eq!(report.missing_metadata, vec!["last_updated"]);
        assert_eq!(report.section_counts["Methods"], 7);
        assert!(report.methods_missing_accuracy_level.is_empty());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_listing_truncated_to_limit() {
        let basis: Vec<_> = (0..40).map(|i| json!({"id": format!("b{i}"), "name": format!("B{i}")})).collect();
        let graph = Graph::from_value(json!({
            "Methods": [],
            "BasisSets": basis,
            "ExcitedStateMethods": [],
            "metadata": {"expert_layer": {"added_entity_types": []}}
        }))
        .unwrap();
        let report = analyze(&graph);
        assert_eq!(report.basis_sets_missing_accuracy_metadata.len(), MAX_LISTED);
        assert_eq!(report.basis_sets_missing_accuracy_total, 40);
        assert!(!report.missing_sections.contains(&"ExcitedStateMethods".to_string()));
    }

    #[test]
    fn test_sparse_graph_does_not_fail() {
        let graph = Graph::from_value(json!({
            "Methods": [{"id": "m", "name": "  "}],
            "metadata": {"expert_layer": {"added_entity_types": []}}
        }))
        .unwrap();
        let report = analyze(&graph);
        assert_eq!(report.methods_missing_accuracy_level, vec!["unknown"]);
        assert!(report.basis_sets_missing_accuracy_metadata.is_empty());
        assert_eq!(report.missing_metadata.len(), RECOMMENDED_METADATA.len());
    }
}
