//! Errors surfaced by the expert layer facade.
//!
//! Only the edge operations fail: loading the graph, writing snapshots and
//! explicitly building an embedding index. Analytical queries return
//! possibly-empty results instead.

use chemora_common::GraphLoadError;
use chemora_embed::EmbedError;
use chemora_kg::SnapshotError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChemoraError>;

#[derive(Error, Debug)]
pub enum ChemoraError {
    #[error("Graph load failed: {0}")]
    Load(#[from] GraphLoadError),

    #[error("Snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Embedding index failed: {0}")]
    Embedding(#[from] EmbedError),
}
