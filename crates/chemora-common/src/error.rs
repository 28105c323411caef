use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce an in-memory graph. Fatal to every operation that
/// needs the graph; never replaced with an empty graph.
#[derive(Debug, Error)]
pub enum GraphLoadError {
    #[error("Graph source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed graph document: {0}")]
    Malformed(String),

    #[error("Graph is missing mandatory section: {0}")]
    MissingSection(String),

    #[error("Graph metadata is missing expert_layer.added_entity_types")]
    MissingExpertLayer,

    #[error("Invalid record {index} in section {section}: {reason}")]
    InvalidRecord {
        section: String,
        index: usize,
        reason: String,
    },

    #[error("Duplicate entity id: {0}")]
    DuplicateId(String),
}

impl From<serde_json::Error> for GraphLoadError {
    fn from(err: serde_json::Error) -> Self {
        GraphLoadError::Malformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphLoadError>;
