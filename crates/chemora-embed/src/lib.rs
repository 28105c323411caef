//! Chemora embedding service
//!
//! Dense embeddings for graph records and nearest-neighbour search over them.
//!
//! # Features
//! - Deterministic feature-hashing embedder, no model download
//! - L2-normalized vectors scored by cosine similarity
//! - Indexes keyed by graph content hash, persisted as JSON and reused while
//!   the graph is unchanged
//! - Embedder identity recorded in every index; a mismatch forces a rebuild
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use chemora_embed::{EmbeddingConfig, EmbeddingSearcher, HashingEmbedder};
//!
//! # fn demo(graph: &chemora_common::Graph) -> chemora_embed::Result<()> {
//! let config = EmbeddingConfig::default();
//! let embedder = Arc::new(HashingEmbedder::new(config.dim)?);
//! let searcher = EmbeddingSearcher::new(embedder, config);
//!
//! for hit in searcher.search_methods(graph, "gold standard thermochemistry", 5) {
//!     println!("{} {:.3}", hit.id(), hit.similarity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedder;
pub mod error;
pub mod index;
pub mod searcher;
pub mod similarity;
pub mod store;

pub use config::EmbeddingConfig;
pub use embedder::{Embedder, HashingEmbedder};
pub use error::{EmbedError, Result};
pub use index::{EmbeddingIndex, IndexEntry};
pub use searcher::EmbeddingSearcher;
pub use similarity::{cosine_similarity, l2_normalize};
pub use store::IndexStore;
