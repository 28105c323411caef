//! chemora-common - Shared data model, errors, and traits used across all Chemora crates.

pub mod entities;
pub mod error;
pub mod graph;
pub mod search;
pub mod text;

// Re-export commonly used types
pub use entities::{
    Annotation, ConceptRecord, EntityRecord, GenericRecord, MethodRecord, ParameterRecord,
    RecordKind, PARAMETER_SECTIONS, SECTION_BASIS_SETS, SECTION_CONCEPTS, SECTION_METHODS,
    SECTION_PARAMETERS,
};
pub use error::GraphLoadError;
pub use graph::{ExpertLayerMeta, Graph, GraphMetadata};
pub use search::{sort_hits, HitSource, MethodSearcher, SearchHit};
pub use text::tokenize;
