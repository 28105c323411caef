use super::*;
use std::io::Write;

fn write_config(suffix: &str, body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.context.max_methods, 8);
    assert_eq!(config.embedding.entity_types, vec!["Methods"]);
    assert!(config.ranking.composite.validate());
    assert!(config.ranking.efficiency.validate());
    assert_eq!(config.quality.category_weights.journals, 35);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let file = write_config(
        ".toml",
        r#"
[graph]
path = "/srv/chemora/graph.json"

[embedding]
dim = 128
persist = false
"#,
    );
    let config = Config::from_path(file.path()).unwrap();
    assert_eq!(config.graph.path, PathBuf::from("/srv/chemora/graph.json"));
    assert_eq!(config.embedding.dim, 128);
    assert!(!config.embedding.persist);
    assert_eq!(config.embedding.query_cache_size, 1_024);
    assert_eq!(config.snapshots, SnapshotConfig::default());
}

#[test]
fn test_yaml_and_json_by_extension() {
    let yaml = write_config(".yaml", "context:\n  max_methods: 3\nquality:\n  category_weights:\n    journals: 40\n");
    let config = Config::from_path(yaml.path()).unwrap();
    assert_eq!(config.context.max_methods, 3);
    assert_eq!(config.context.max_concepts, 10);
    assert_eq!(config.quality.category_weights.journals, 40);
    assert_eq!(config.quality.category_weights.government, 50);

    let json = write_config(".json", r#"{"snapshots": {"dir": "/tmp/snaps"}}"#);
    let config = Config::from_path(json.path()).unwrap();
    assert_eq!(config.snapshots.dir, PathBuf::from("/tmp/snaps"));
}

#[test]
fn test_ranking_weights_renormalised() {
    let file = write_config(
        ".toml",
        r#"
[ranking.composite]
accuracy = 2.0
cost = 2.0
"#,
    );
    let config = Config::from_path(file.path()).unwrap();
    assert!(config.ranking.composite.validate());
    assert!((config.ranking.composite.accuracy - 0.5).abs() < 1e-9);
    assert_eq!(config.ranking.efficiency, WeightVector::efficiency());
}

#[test]
fn test_malformed_file_is_an_error() {
    let file = write_config(".toml", "[graph\npath = ");
    assert!(Config::from_path(file.path()).is_err());
}
