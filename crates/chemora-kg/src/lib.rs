//! chemora-kg - Loading, auditing, and snapshotting the expert knowledge graph.

pub mod error;
pub mod gaps;
pub mod loader;
pub mod snapshot;

pub use error::SnapshotError;
pub use gaps::{analyze, GapReport};
pub use loader::{load_graph_from_path, GraphLoader, GraphSource, InMemorySource, JsonFileSource};
pub use snapshot::{SnapshotHandle, SnapshotInfo, SnapshotStore};
