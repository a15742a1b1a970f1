use hybrid::{format_hits, format_normalized, format_reports, resolve_config, ConfigOverrides, Engine};
use hybrid_core::evaluation::{evaluate, GoldenDataset};
use hybrid_core::fusion::FusionMethod;
use hybrid_core::persist::{save_index, IndexPaths};
use hybrid_core::{Document, InvertedIndex, SearchConfig, TextNormalizer};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn build_tiny_index(dir: &Path) {
    let docs = vec![
        Document { id: 1, title: "The Revenant".into(), description: "A frontiersman is mauled by a bear.".into() },
        Document { id: 2, title: "Paddington".into(), description: "A polite bear arrives in London.".into() },
        Document { id: 3, title: "Heat".into(), description: "A detective hunts a crew of thieves.".into() },
        Document { id: 4, title: "Ted".into(), description: "A teddy bear comes to life in Boston.".into() },
    ];
    let index = InvertedIndex::build(docs, TextNormalizer::default()).unwrap();
    save_index(&IndexPaths::new(dir), &index).unwrap();
}

fn write_semantic(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("semantic.json");
    fs::write(
        &path,
        r#"{"bear": [{"id": 2, "score": 0.88}, {"id": 3, "score": 0.41}, {"id": 4, "score": 0.30}]}"#,
    )
    .unwrap();
    path
}

fn open_engine(dir: &Path, config: SearchConfig) -> Engine {
    build_tiny_index(&dir.join("cache"));
    let semantic = write_semantic(dir);
    Engine::open(&dir.join("cache"), None, Some(&semantic), config).unwrap()
}

#[test]
fn rrf_search_returns_intersection_ranked() {
    let dir = tempdir().unwrap();
    let engine = open_engine(dir.path(), SearchConfig::default());
    let hits = engine.searcher().unwrap().rrf_search("bear", 60.0, 5).unwrap();
    let ids: Vec<u32> = hits.iter().map(|h| h.id).collect();
    // lexical {1, 2, 4}, semantic {2, 3, 4}
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], 2);
    assert!(ids.contains(&4));
    let text = format_hits(&hits, FusionMethod::Rrf);
    assert!(text.starts_with("1. (2) Paddington"));
    assert!(text.contains("RRF Score"));
}

#[test]
fn weighted_search_returns_union() {
    let dir = tempdir().unwrap();
    let engine = open_engine(dir.path(), SearchConfig::default());
    let hits = engine.searcher().unwrap().weighted_search("bear", 0.5, 10).unwrap();
    let mut ids: Vec<u32> = hits.iter().map(|h| h.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(hits[0].id, 2);
    let text = format_hits(&hits, FusionMethod::Weighted);
    assert!(text.contains("Hybrid Score"));
    assert!(text.contains("BM25 -"));
}

#[test]
fn missing_index_mentions_build() {
    let dir = tempdir().unwrap();
    let err = Engine::open(&dir.path().join("nope"), None, None, SearchConfig::default()).err().unwrap();
    assert!(err.to_string().contains("indexer build"));
}

#[test]
fn evaluation_scores_golden_cases() {
    let dir = tempdir().unwrap();
    let engine = open_engine(dir.path(), SearchConfig::default());
    let dataset: GoldenDataset = serde_json::from_str(
        r#"{"test_cases": [{"query": "bear", "relevant_docs": ["Paddington", "The Revenant"]}]}"#,
    )
    .unwrap();
    let reports = evaluate(&engine.searcher().unwrap(), &dataset, FusionMethod::Rrf, 5).unwrap();
    assert_eq!(reports.len(), 1);
    // retrieved: Paddington, Ted
    assert!((reports[0].precision - 0.5).abs() < 1e-12);
    assert!((reports[0].recall - 0.5).abs() < 1e-12);
    let text = format_reports(&reports, 5);
    assert!(text.contains("Precision@5: 0.5000"));

    // weighted retrieves the union: Paddington, Ted, The Revenant, Heat
    let weighted = evaluate(&engine.searcher().unwrap(), &dataset, FusionMethod::Weighted, 5).unwrap();
    assert_eq!(weighted[0].retrieved.len(), 4);
    assert!((weighted[0].recall - 1.0).abs() < 1e-12);
}

#[test]
fn flags_override_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"alpha": 0.2, "rrf_k": 10}"#).unwrap();
    let overrides = ConfigOverrides { alpha: Some(0.9), ..Default::default() };
    let config = resolve_config(Some(&path), &overrides).unwrap();
    assert_eq!(config.alpha, 0.9);
    assert_eq!(config.rrf_k, 10.0);
    let bad = ConfigOverrides { alpha: Some(2.0), ..Default::default() };
    assert!(resolve_config(None, &bad).is_err());
}

#[test]
fn normalize_output_lists_scores() {
    let text = format_normalized(&[2.0, 4.0, 3.0]);
    assert_eq!(text, "* 1: 0.0000\n* 2: 1.0000\n* 3: 0.5000\n");
    assert_eq!(format_normalized(&[]), "");
}
