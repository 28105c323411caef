//! Persisted indexes across searcher instances and embedding functions.

use std::sync::Arc;

use chemora_embed::{EmbeddingConfig, EmbeddingSearcher, HashingEmbedder, IndexStore};
use chemora_test_utils::{fixture_graph, scratch_dir};

fn searcher(dir: &std::path::Path, dim: usize) -> EmbeddingSearcher {
    let config = EmbeddingConfig::default().with_dim(dim).with_index_dir(dir);
    EmbeddingSearcher::new(Arc::new(HashingEmbedder::new(dim).unwrap()), config)
}

#[test]
fn test_changed_embedder_forces_rebuild() {
    let dir = scratch_dir();
    let graph = fixture_graph();

    let small = searcher(dir.path(), 64).build_embeddings(&graph, true).unwrap();
    assert_eq!(small.dim, 64);

    // Same graph hash, different embedding function: the stored index must
    // not be served.
    let large = searcher(dir.path(), 128).build_embeddings(&graph, true).unwrap();
    assert_eq!(large.dim, 128);
    assert_ne!(large.embedder_id, small.embedder_id);

    let stored = std::fs::read_to_string(IndexStore::new(dir.path()).path_for(graph.content_hash())).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored["embedder_id"], large.embedder_id.as_str());
}

#[test]
fn test_concurrent_builders_converge() {
    let dir = scratch_dir();
    let graph = Arc::new(fixture_graph());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dir = dir.path().to_path_buf();
            let graph = graph.clone();
            std::thread::spawn(move || {
                let index = searcher(&dir, 96).build_embeddings(&graph, true).unwrap();
                (index.len(), index.graph_hash.clone())
            })
        })
        .collect();

    for handle in handles {
        let (len, hash) = handle.join().unwrap();
        assert_eq!(len, graph.method_count());
        assert_eq!(hash, graph.content_hash());
    }

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_ephemeral_build_writes_nothing() {
    let dir = scratch_dir();
    let graph = fixture_graph();
    searcher(dir.path(), 32).build_embeddings(&graph, false).unwrap();
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}
