//! Composite quality score for ingested documents.
//!
//! total = base(category) + recency_bonus + fact_density + citation_bonus − length_penalty
//!
//! The score is derived at ingestion time and never stored as graph state.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::models::{Citation, DocumentCategory, DocumentMeta, ExtractedFact};

/// Years over which the recency bonus decays to zero.
pub const RECENCY_WINDOW: i64 = 20;
pub const CITATION_BONUS_PER_CITATION: i64 = 2;
pub const CITATION_BONUS_CAP: i64 = 20;
/// Raw text longer than this many characters takes the flat length penalty.
pub const LENGTH_PENALTY_THRESHOLD: usize = 20_000;
pub const LENGTH_PENALTY: i64 = 10;

/// Base weight per source category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    #[serde(default = "default_government")]
    pub government: i64,
    #[serde(default = "default_standards")]
    pub standards: i64,
    #[serde(default = "default_journals")]
    pub journals: i64,
    #[serde(default = "default_textbooks")]
    pub textbooks: i64,
    #[serde(default = "default_preprints")]
    pub preprints: i64,
    #[serde(default = "default_other")]
    pub other: i64,
}

fn default_government() -> i64 { 50 }
fn default_standards()  -> i64 { 45 }
fn default_journals()   -> i64 { 35 }
fn default_textbooks()  -> i64 { 30 }
fn default_preprints()  -> i64 { 15 }
fn default_other()      -> i64 { 10 }

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            government: default_government(),
            standards:  default_standards(),
            journals:   default_journals(),
            textbooks:  default_textbooks(),
            preprints:  default_preprints(),
            other:      default_other(),
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: DocumentCategory) -> i64 {
        match category {
            DocumentCategory::Government => self.government,
            DocumentCategory::Standards  => self.standards,
            DocumentCategory::Journals   => self.journals,
            DocumentCategory::Textbooks  => self.textbooks,
            DocumentCategory::Preprints  => self.preprints,
            DocumentCategory::Other      => self.other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total_score: i64,
    pub category: DocumentCategory,
    pub base: i64,
    pub recency_bonus: i64,
    pub fact_density: i64,
    pub citation_bonus: i64,
    pub length_penalty: i64,
}

/// Scores documents against a fixed weight table and reference year.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: CategoryWeights,
    /// Year the recency bonus is measured from; `None` means "now".
    reference_year: Option<i32>,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(CategoryWeights::default())
    }
}

impl QualityScorer {
    pub fn new(weights: CategoryWeights) -> Self {
        Self { weights, reference_year: None }
    }

    /// Pin the reference year, making scores independent of the clock.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    pub fn score(
        &self,
        meta: &DocumentMeta,
        raw_text: &str,
        facts: &[ExtractedFact],
        citations: &[Citation],
    ) -> ScoreBreakdown {
        let current_year = self
            .reference_year
            .unwrap_or_else(|| chrono::Utc::now().year());

        let category = meta.category();
        let base = self.weights.weight(category);

        let recency_bonus = meta
            .valid_year()
            .map(|year| (RECENCY_WINDOW - (i64::from(current_year) - i64::from(year))).clamp(0, RECENCY_WINDOW))
            .unwrap_or(0);

        let fact_density = facts.len() as i64;

        let citation_bonus =
            (CITATION_BONUS_PER_CITATION * citations.len() as i64).min(CITATION_BONUS_CAP);

        let length_penalty = if raw_text.chars().count() > LENGTH_PENALTY_THRESHOLD {
            LENGTH_PENALTY
        } else {
            0
        };

        ScoreBreakdown {
            total_score: base + recency_bonus + fact_density + citation_bonus - length_penalty,
            category,
            base,
            recency_bonus,
            fact_density,
            citation_bonus,
            length_penalty,
        }
    }
}

/// Score with the default weight table, measured from the current year.
pub fn score(
    meta: &DocumentMeta,
    raw_text: &str,
    facts: &[ExtractedFact],
    citations: &[Citation],
) -> ScoreBreakdown {
    QualityScorer::default().score(meta, raw_text, facts, citations)
}
