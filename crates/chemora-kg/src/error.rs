//! Snapshot store error types.

use std::path::PathBuf;

use chemora_common::GraphLoadError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapshotError>;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot label: {0:?}")]
    InvalidLabel(String),

    #[error("Snapshot name space exhausted for label {0:?}")]
    Exhausted(String),

    #[error("Snapshot is not a loadable graph: {0}")]
    Graph(#[from] GraphLoadError),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }
}
