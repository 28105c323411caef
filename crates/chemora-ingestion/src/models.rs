//! Data models handed over by the document ingestion pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// Source category of an ingested document; drives the base quality weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Government,
    Standards,
    Journals,
    Textbooks,
    Preprints,
    Other,
}

impl DocumentCategory {
    /// Parse a free-form category string. Unknown or blank values are `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "government" => DocumentCategory::Government,
            "standards" => DocumentCategory::Standards,
            "journals" => DocumentCategory::Journals,
            "textbooks" => DocumentCategory::Textbooks,
            "preprints" => DocumentCategory::Preprints,
            _ => DocumentCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Government => "government",
            DocumentCategory::Standards  => "standards",
            DocumentCategory::Journals   => "journals",
            DocumentCategory::Textbooks  => "textbooks",
            DocumentCategory::Preprints  => "preprints",
            DocumentCategory::Other      => "other",
        }
    }
}

/// Document metadata as supplied by a harvester.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Publication year; non-integer or out-of-range values become `None`.
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl DocumentMeta {
    pub fn category(&self) -> DocumentCategory {
        self.category
            .as_deref()
            .map(DocumentCategory::parse)
            .unwrap_or(DocumentCategory::Other)
    }

    pub fn valid_year(&self) -> Option<i32> {
        self.year.filter(|y| is_valid_year(*y))
    }
}

fn is_valid_year(year: i32) -> bool {
    (1..=9999).contains(&year)
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
    .filter(|y| is_valid_year(*y)))
}

/// A fact extracted from a document (subject–predicate–object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}
