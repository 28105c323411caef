//! chemora-ingestion - Ingestion-side document model and quality scoring.
//! Harvesters live outside this workspace; they hand us
//! `(metadata, raw_text, facts, citations)` tuples.

pub mod models;
pub mod quality;

pub use models::{Citation, DocumentCategory, DocumentMeta, ExtractedFact};
pub use quality::{score, CategoryWeights, QualityScorer, ScoreBreakdown};
