/// Core entity types mirroring the expert knowledge graph sections.
/// Each graph section maps onto one record shape; unknown fields are kept
/// in `extra` so a graph written back out (snapshots) loses nothing.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const SECTION_METHODS: &str = "Methods";
pub const SECTION_BASIS_SETS: &str = "BasisSets";
pub const SECTION_PARAMETERS: &str = "Parameters";
pub const SECTION_CONCEPTS: &str = "Concepts";

/// Sections whose records carry accuracy annotations for a parameter choice.
pub const PARAMETER_SECTIONS: &[&str] = &[SECTION_BASIS_SETS, SECTION_PARAMETERS];

lazy_static! {
    static ref SCALING_RE: Regex =
        Regex::new(r"(?i)N\s*\^\s*\{?\s*(\d+(?:\.\d+)?)").expect("static regex");
}

// ---------------------------------------------------------------------------
// Accuracy annotation
// ---------------------------------------------------------------------------

/// An accuracy annotation as found in the graph: either a number on the
/// 0–5 ordinal scale or a label such as `"high"` or `"benchmark"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Annotation {
    Numeric(f64),
    Label(String),
}

impl Annotation {
    /// Ordinal accuracy in [0, 5]. Unknown labels yield `None`.
    pub fn ordinal(&self) -> Option<f64> {
        match self {
            Annotation::Numeric(v) if v.is_finite() => Some(v.clamp(0.0, 5.0)),
            Annotation::Numeric(_) => None,
            Annotation::Label(label) => label_ordinal(label),
        }
    }

    pub fn as_label(&self) -> String {
        match self {
            Annotation::Numeric(v) => format!("{v}"),
            Annotation::Label(l) => l.clone(),
        }
    }
}

fn label_ordinal(label: &str) -> Option<f64> {
    let key = label.trim().to_lowercase().replace(['-', ' '], "_");
    let ordinal = match key.as_str() {
        "very_low" => 0.5,
        "low" | "qualitative" => 1.0,
        "low_medium" | "moderate_low" => 1.5,
        "medium" | "moderate" | "intermediate" => 2.0,
        "medium_high" | "moderate_high" | "good" => 2.5,
        "high" => 3.0,
        "high_very_high" => 3.5,
        "very_high" | "chemical_accuracy" => 4.0,
        "benchmark" | "exact" | "gold_standard" | "reference" => 5.0,
        other => {
            return other
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 5.0))
        }
    };
    Some(ordinal)
}

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64)
        }),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_level: Option<Annotation>,
    /// Formal scaling or a coarse label, e.g. `"O(N^4)"` or `"high"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_runtime: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub typical_use_cases: Vec<String>,
    /// Software packages implementing the method.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub software: Vec<String>,
    /// Citation count; floats are rounded, unreadable values dropped.
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub citations: Option<u64>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MethodRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Polynomial scaling exponent parsed from `scaling` or `complexity`
    /// (`"O(N^7)"`, `"N^3"`), or from well-known words.
    pub fn scaling_exponent(&self) -> Option<f64> {
        [self.scaling.as_deref(), self.complexity.as_deref()]
            .into_iter()
            .flatten()
            .find_map(parse_scaling_exponent)
    }
}

pub fn parse_scaling_exponent(text: &str) -> Option<f64> {
    if let Some(caps) = SCALING_RE.captures(text) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }
    let lower = text.to_lowercase();
    if lower.contains("linear") {
        Some(1.0)
    } else if lower.contains("quadratic") {
        Some(2.0)
    } else if lower.contains("cubic") {
        Some(3.0)
    } else if lower.contains("exponential") || lower.contains("factorial") {
        Some(12.0)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Basis sets / parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_level: Option<Annotation>,
    /// Usually prose, sometimes a per-property map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects_on_accuracy: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterRecord {
    pub fn has_accuracy_metadata(&self) -> bool {
        self.accuracy_level.is_some() || self.effects_text().is_some()
    }

    /// `effects_on_accuracy` as text, `None` when absent or blank.
    pub fn effects_text(&self) -> Option<String> {
        match self.effects_on_accuracy.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Array(a) if a.is_empty() => None,
            Value::Object(o) if o.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Concepts and everything else
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub related_methods: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which record shape a section's entries are parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Method,
    Parameter,
    Concept,
    Generic,
}

impl RecordKind {
    pub fn for_section(section: &str) -> Self {
        match section {
            SECTION_METHODS => RecordKind::Method,
            SECTION_CONCEPTS => RecordKind::Concept,
            s if PARAMETER_SECTIONS.contains(&s) => RecordKind::Parameter,
            _ => RecordKind::Generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityRecord {
    Method(MethodRecord),
    Parameter(ParameterRecord),
    Concept(ConceptRecord),
    Generic(GenericRecord),
}

impl EntityRecord {
    /// Parse a raw JSON record according to the section it lives in.
    pub fn from_value(kind: RecordKind, value: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            RecordKind::Method => EntityRecord::Method(serde_json::from_value(value)?),
            RecordKind::Parameter => EntityRecord::Parameter(serde_json::from_value(value)?),
            RecordKind::Concept => EntityRecord::Concept(serde_json::from_value(value)?),
            RecordKind::Generic => EntityRecord::Generic(serde_json::from_value(value)?),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            EntityRecord::Method(r) => &r.id,
            EntityRecord::Parameter(r) => &r.id,
            EntityRecord::Concept(r) => &r.id,
            EntityRecord::Generic(r) => &r.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            EntityRecord::Method(r) => r.name.as_deref(),
            EntityRecord::Parameter(r) => r.name.as_deref(),
            EntityRecord::Concept(r) => r.name.as_deref(),
            EntityRecord::Generic(r) => r.name.as_deref(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name().unwrap_or_else(|| self.id())
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            EntityRecord::Method(r) => r.description.as_deref(),
            EntityRecord::Parameter(r) => r.description.as_deref(),
            EntityRecord::Concept(r) => r.description.as_deref(),
            EntityRecord::Generic(r) => r.description.as_deref(),
        }
    }

    pub fn as_method(&self) -> Option<&MethodRecord> {
        match self {
            EntityRecord::Method(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&ParameterRecord> {
        match self {
            EntityRecord::Parameter(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_concept(&self) -> Option<&ConceptRecord> {
        match self {
            EntityRecord::Concept(r) => Some(r),
            _ => None,
        }
    }

    /// The salient text fields concatenated into one document; this is what
    /// gets embedded and lexically matched.
    pub fn salient_text(&self) -> String {
        let mut parts: Vec<String> = vec![self.display_name().to_string()];
        if let Some(d) = self.description() {
            parts.push(d.to_string());
        }
        match self {
            EntityRecord::Method(m) => {
                parts.extend(m.category.clone());
                parts.extend(m.accuracy_level.as_ref().map(|a| format!("accuracy {}", a.as_label())));
                parts.extend(m.complexity.clone());
                parts.extend(m.typical_use_cases.iter().cloned());
                parts.extend(m.strengths.iter().cloned());
            }
            EntityRecord::Parameter(p) => {
                parts.extend(p.effects_text());
            }
            EntityRecord::Concept(_) | EntityRecord::Generic(_) => {}
        }
        parts.join(". ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_ordinals() {
        assert_eq!(Annotation::Label("High".into()).ordinal(), Some(3.0));
        assert_eq!(Annotation::Label("very high".into()).ordinal(), Some(4.0));
        assert_eq!(Annotation::Label("gold-standard".into()).ordinal(), Some(5.0));
        assert_eq!(Annotation::Numeric(9.0).ordinal(), Some(5.0));
        assert_eq!(Annotation::Label("sometimes".into()).ordinal(), None);
        assert_eq!(Annotation::Label("NaN".into()).ordinal(), None);
        assert_eq!(Annotation::Label("inf".into()).ordinal(), None);
        assert_eq!(Annotation::Label("4.5".into()).ordinal(), Some(4.5));
    }

    #[test]
    fn test_scaling_exponent_parsing() {
        assert_eq!(parse_scaling_exponent("O(N^7)"), Some(7.0));
        assert_eq!(parse_scaling_exponent("formally N ^ 3"), Some(3.0));
        assert_eq!(parse_scaling_exponent("linear scaling"), Some(1.0));
        assert_eq!(parse_scaling_exponent("moderate"), None);
    }

    #[test]
    fn test_method_keeps_unknown_fields() {
        let v = json!({
            "id": "ccsd_t",
            "name": "CCSD(T)",
            "typical_use_cases": "thermochemistry",
            "family": "coupled cluster"
        });
        let rec = EntityRecord::from_value(RecordKind::Method, v).unwrap();
        let m = rec.as_method().unwrap();
        assert_eq!(m.typical_use_cases, vec!["thermochemistry".to_string()]);
        assert_eq!(m.extra.get("family"), Some(&json!("coupled cluster")));

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["family"], json!("coupled cluster"));
    }

    #[test]
    fn test_parameter_accuracy_metadata() {
        let p: ParameterRecord =
            serde_json::from_value(json!({"id": "sto3g", "effects_on_accuracy": "  "})).unwrap();
        assert!(!p.has_accuracy_metadata());
        let p: ParameterRecord =
            serde_json::from_value(json!({"id": "ccpvtz", "accuracy_level": "high"})).unwrap();
        assert!(p.has_accuracy_metadata());
        let p: ParameterRecord = serde_json::from_value(
            json!({"id": "augccpvdz", "effects_on_accuracy": {"energies": "good"}}),
        )
        .unwrap();
        assert!(p.has_accuracy_metadata());
        assert!(EntityRecord::Parameter(p).salient_text().contains("energies"));
    }

    #[test]
    fn test_citation_counts_are_lenient() {
        let count = |v: Value| {
            let m: MethodRecord = serde_json::from_value(json!({"id": "m", "citations": v})).unwrap();
            m.citations
        };
        assert_eq!(count(json!(120)), Some(120));
        assert_eq!(count(json!(120.4)), Some(120));
        assert_eq!(count(json!("1,500")), Some(1500));
        assert_eq!(count(json!(-3)), None);
        assert_eq!(count(json!("many")), None);
        assert_eq!(count(json!(null)), None);
    }

    #[test]
    fn test_section_kinds() {
        assert_eq!(RecordKind::for_section("Methods"), RecordKind::Method);
        assert_eq!(RecordKind::for_section("BasisSets"), RecordKind::Parameter);
        assert_eq!(RecordKind::for_section("Concepts"), RecordKind::Concept);
        assert_eq!(RecordKind::for_section("UseCases"), RecordKind::Generic);
    }
}
