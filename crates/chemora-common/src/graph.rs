//! The in-memory expert knowledge graph.
//!
//! A `Graph` is a mapping from entity-type name (`"Methods"`, `"BasisSets"`,
//! ...) to the ordered records of that type, plus a `metadata` block. It is
//! validated on construction and never mutated afterwards; derived copies
//! (e.g. a snapshot tagged with extra metadata) are new graphs with their own
//! content hash.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::entities::{ConceptRecord, EntityRecord, MethodRecord, RecordKind, SECTION_CONCEPTS, SECTION_METHODS};
use crate::error::{GraphLoadError, Result};

pub const METADATA_KEY: &str = "metadata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertLayerMeta {
    /// Entity types added on top of the base schema.
    pub added_entity_types: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub expert_layer: ExpertLayerMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Graph {
    sections: BTreeMap<String, Vec<EntityRecord>>,
    metadata: GraphMetadata,
    /// id -> (section, position)
    index: HashMap<String, (String, usize)>,
    content_hash: String,
}

impl Graph {
    /// Build a graph from already-typed sections. Fails if `Methods` is
    /// absent or an id occurs twice.
    pub fn new(sections: BTreeMap<String, Vec<EntityRecord>>, metadata: GraphMetadata) -> Result<Self> {
        if !sections.contains_key(SECTION_METHODS) {
            return Err(GraphLoadError::MissingSection(SECTION_METHODS.to_string()));
        }

        let mut index = HashMap::new();
        for (section, records) in &sections {
            for (pos, record) in records.iter().enumerate() {
                if index
                    .insert(record.id().to_string(), (section.clone(), pos))
                    .is_some()
                {
                    return Err(GraphLoadError::DuplicateId(record.id().to_string()));
                }
            }
        }

        let mut graph = Self {
            sections,
            metadata,
            index,
            content_hash: String::new(),
        };
        graph.content_hash = hash_canonical(&graph)?;
        Ok(graph)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Parse the persisted document shape: every top-level key except
    /// `metadata` is an entity section holding an array of records.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(GraphLoadError::Malformed(
                "top-level graph document must be an object".to_string(),
            ));
        };

        let metadata = parse_metadata(root.remove(METADATA_KEY))?;

        let mut sections = BTreeMap::new();
        for (section, raw) in root {
            let Value::Array(items) = raw else {
                return Err(GraphLoadError::Malformed(format!(
                    "section {section} must be an array of records"
                )));
            };
            let kind = RecordKind::for_section(&section);
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let record = EntityRecord::from_value(kind, item).map_err(|e| {
                    GraphLoadError::InvalidRecord {
                        section: section.clone(),
                        index,
                        reason: e.to_string(),
                    }
                })?;
                records.push(record);
            }
            sections.insert(section, records);
        }

        Self::new(sections, metadata)
    }

    /// Copy of this graph with one extra top-level metadata entry.
    pub fn with_metadata_entry(&self, key: &str, value: Value) -> Result<Self> {
        let mut metadata = self.metadata.clone();
        metadata.extra.insert(key.to_string(), value);
        Self::new(self.sections.clone(), metadata)
    }

    /// SHA-256 (hex) over the canonical JSON form.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&[EntityRecord]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &[EntityRecord])> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodRecord> {
        self.section(SECTION_METHODS)
            .unwrap_or_default()
            .iter()
            .filter_map(EntityRecord::as_method)
    }

    pub fn method_count(&self) -> usize {
        self.section(SECTION_METHODS).map_or(0, <[EntityRecord]>::len)
    }

    pub fn concepts(&self) -> impl Iterator<Item = &ConceptRecord> {
        self.section(SECTION_CONCEPTS)
            .unwrap_or_default()
            .iter()
            .filter_map(EntityRecord::as_concept)
    }

    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        let (section, pos) = self.index.get(id)?;
        self.sections.get(section).and_then(|r| r.get(*pos))
    }

    pub fn section_of(&self, id: &str) -> Option<&str> {
        self.index.get(id).map(|(s, _)| s.as_str())
    }

    pub fn method(&self, id: &str) -> Option<&MethodRecord> {
        self.get(id).and_then(EntityRecord::as_method)
    }

    pub fn entity_count(&self) -> usize {
        self.index.len()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 1))?;
        for (section, records) in &self.sections {
            map.serialize_entry(section, records)?;
        }
        map.serialize_entry(METADATA_KEY, &self.metadata)?;
        map.end()
    }
}

fn parse_metadata(raw: Option<Value>) -> Result<GraphMetadata> {
    let has_added_types = raw
        .as_ref()
        .and_then(|m| m.get("expert_layer"))
        .and_then(|e| e.get("added_entity_types"))
        .is_some_and(Value::is_array);
    if !has_added_types {
        return Err(GraphLoadError::MissingExpertLayer);
    }
    raw.map(serde_json::from_value)
        .transpose()?
        .ok_or(GraphLoadError::MissingExpertLayer)
}

fn hash_canonical(graph: &Graph) -> Result<String> {
    let bytes = serde_json::to_vec(graph)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "Methods": [{"id": "m1", "name": "DFT", "category": "methods"}],
            "metadata": {"expert_layer": {"added_entity_types": ["Methods"]}}
        })
    }

    #[test]
    fn test_minimal_graph_loads() {
        let g = Graph::from_value(minimal()).unwrap();
        assert_eq!(g.method_count(), 1);
        assert_eq!(g.method("m1").unwrap().display_name(), "DFT");
        assert_eq!(g.metadata().expert_layer.added_entity_types, vec!["Methods"]);
        assert_eq!(g.content_hash().len(), 64);
    }

    #[test]
    fn test_missing_methods_rejected() {
        let mut v = minimal();
        v.as_object_mut().unwrap().remove("Methods");
        assert!(matches!(
            Graph::from_value(v),
            Err(GraphLoadError::MissingSection(s)) if s == "Methods"
        ));
    }

    #[test]
    fn test_missing_expert_layer_rejected() {
        let v = json!({"Methods": [], "metadata": {"expert_layer": {}}});
        assert!(matches!(Graph::from_value(v), Err(GraphLoadError::MissingExpertLayer)));
        let v = json!({"Methods": []});
        assert!(matches!(Graph::from_value(v), Err(GraphLoadError::MissingExpertLayer)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let v = json!({
            "Methods": [{"id": "x", "name": "A"}],
            "Concepts": [{"id": "x", "name": "B"}],
            "metadata": {"expert_layer": {"added_entity_types": []}}
        });
        assert!(matches!(Graph::from_value(v), Err(GraphLoadError::DuplicateId(id)) if id == "x"));
    }

    #[test]
    fn test_record_without_id_is_invalid() {
        let v = json!({
            "Methods": [{"name": "nameless"}],
            "metadata": {"expert_layer": {"added_entity_types": []}}
        });
        assert!(matches!(
            Graph::from_value(v),
            Err(GraphLoadError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_hash_ignores_key_order_and_tracks_content() {
        let a = Graph::from_json_str(
            r#"{"metadata":{"expert_layer":{"added_entity_types":[]}},"Methods":[{"name":"DFT","id":"m1"}]}"#,
        )
        .unwrap();
        let b = Graph::from_json_str(
            r#"{"Methods":[{"id":"m1","name":"DFT"}],"metadata":{"expert_layer":{"added_entity_types":[]}}}"#,
        )
        .unwrap();
        assert_eq!(a.content_hash(), b.content_hash());

        let c = a.with_metadata_entry("version", json!("2")).unwrap();
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_serialized_graph_reloads() {
        let g = Graph::from_value(minimal()).unwrap();
        let again = Graph::from_json_str(&g.to_json_pretty().unwrap()).unwrap();
        assert_eq!(g.content_hash(), again.content_hash());
    }
}
