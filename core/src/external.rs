//! Seams for collaborators that live outside the lexical core: vector
//! similarity search, LLM query enhancement and reranking.

use crate::error::{ExternalError, IndexError, Result};
use crate::hybrid::HybridHit;
use crate::index::DocId;
use crate::search::by_score_then_id;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Ranked `(doc_id, similarity)` pairs for a free-text query, best first.
pub trait VectorSearch {
    fn search_vectors(&self, query: &str, limit: usize) -> std::result::Result<Vec<(DocId, f64)>, ExternalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnhanceMethod {
    #[default]
    None,
    Spell,
    Rewrite,
}

pub trait QueryEnhancer {
    /// Only called for methods other than [`EnhanceMethod::None`].
    fn enhance(&self, query: &str, method: EnhanceMethod) -> std::result::Result<String, ExternalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RerankMethod {
    #[default]
    None,
    Individual,
    Batch,
    CrossEncoder,
}

pub trait Reranker {
    /// Reorder `candidates` (already fused) and keep at most `limit`.
    fn rerank(
        &self,
        query: &str,
        candidates: Vec<HybridHit>,
        method: RerankMethod,
        limit: usize,
    ) -> std::result::Result<Vec<HybridHit>, ExternalError>;
}

macro_rules! closed_enum_display {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$variant => f.write_str($name),)+
                }
            }
        }
    };
}

closed_enum_display!(EnhanceMethod { None => "none", Spell => "spell", Rewrite => "rewrite" });
closed_enum_display!(RerankMethod {
    None => "none",
    Individual => "individual",
    Batch => "batch",
    CrossEncoder => "cross_encoder",
});

#[derive(Debug, Deserialize)]
struct RankedEntry {
    id: DocId,
    score: f64,
}

/// Semantic rankings computed ahead of time, keyed by query text.
///
/// Stands in for a live embedding model: the file maps each query to its
/// ranked `[{"id", "score"}]` list. Unknown queries yield no candidates.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedVectorSearch {
    rankings: HashMap<String, Vec<(DocId, f64)>>,
}

impl PrecomputedVectorSearch {
    pub fn new(rankings: HashMap<String, Vec<(DocId, f64)>>) -> Self {
        let rankings = rankings
            .into_iter()
            .map(|(q, mut hits)| {
                hits.sort_by(by_score_then_id);
                (q.trim().to_lowercase(), hits)
            })
            .collect();
        Self { rankings }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let raw: HashMap<String, Vec<RankedEntry>> =
            serde_json::from_reader(reader).map_err(|e| IndexError::malformed(path.display().to_string(), e))?;
        Ok(Self::new(
            raw.into_iter().map(|(q, hits)| (q, hits.into_iter().map(|h| (h.id, h.score)).collect())).collect(),
        ))
    }
}

impl VectorSearch for PrecomputedVectorSearch {
    fn search_vectors(&self, query: &str, limit: usize) -> std::result::Result<Vec<(DocId, f64)>, ExternalError> {
        let mut hits = self.rankings.get(&query.trim().to_lowercase()).cloned().unwrap_or_default();
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Turns text into a dense vector. Implemented by an embedding model.
pub trait Embedder {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ExternalError>;
}

/// How chunk-level similarities collapse into one score per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkAggregation {
    /// One embedding per document; no aggregation.
    #[default]
    Document,
    /// Best-matching chunk represents the document.
    MaxChunk,
}

#[derive(Debug, Clone)]
struct StoredEmbedding {
    doc_id: DocId,
    vector: Vec<f32>,
}

/// Cosine similarity search over stored embeddings, with chunk aggregation
/// as a pluggable strategy rather than a separate search type.
pub struct EmbeddingSearch<E> {
    embedder: E,
    entries: Vec<StoredEmbedding>,
    aggregation: ChunkAggregation,
    dimension: Option<usize>,
}

impl<E: Embedder> EmbeddingSearch<E> {
    pub fn new(embedder: E, aggregation: ChunkAggregation) -> Self {
        Self { embedder, entries: Vec::new(), aggregation, dimension: None }
    }

    /// Store one vector for `doc_id`. With [`ChunkAggregation::MaxChunk`] a
    /// document may be added several times, once per chunk.
    pub fn add(&mut self, doc_id: DocId, vector: Vec<f32>) -> std::result::Result<(), ExternalError> {
        self.check_dimension(vector.len())?;
        if self.aggregation == ChunkAggregation::Document {
            self.entries.retain(|e| e.doc_id != doc_id);
        }
        self.dimension = Some(vector.len());
        self.entries.push(StoredEmbedding { doc_id, vector });
        Ok(())
    }

    /// Embed `text` and store it for `doc_id`.
    pub fn add_text(&mut self, doc_id: DocId, text: &str) -> std::result::Result<(), ExternalError> {
        let vector = self.embedder.embed(text)?;
        self.add(doc_id, vector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_dimension(&self, actual: usize) -> std::result::Result<(), ExternalError> {
        match self.dimension {
            Some(expected) if expected != actual => Err(ExternalError::DimensionMismatch { expected, actual }),
            _ => Ok(()),
        }
    }
}

impl<E: Embedder> VectorSearch for EmbeddingSearch<E> {
    fn search_vectors(&self, query: &str, limit: usize) -> std::result::Result<Vec<(DocId, f64)>, ExternalError> {
        let q = self.embedder.embed(query)?;
        self.check_dimension(q.len())?;
        let mut best: HashMap<DocId, f64> = HashMap::new();
        for entry in &self.entries {
            let sim = cosine_similarity(&q, &entry.vector);
            best.entry(entry.doc_id).and_modify(|s| *s = s.max(sim)).or_insert(sim);
        }
        let mut ranked: Vec<(DocId, f64)> = best.into_iter().collect();
        ranked.sort_by(by_score_then_id);
        ranked.truncate(limit);
        Ok(ranked)
    }
}

/// Zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bag-of-letters embedding: counts of 'a', 'b', 'c'.
    struct LetterEmbedder;

    impl Embedder for LetterEmbedder {
        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ExternalError> {
            Ok(['a', 'b', 'c'].iter().map(|c| text.matches(*c).count() as f32).collect())
        }
    }

    #[test]
    fn methods_display_as_snake_case() {
        assert_eq!(EnhanceMethod::Spell.to_string(), "spell");
        assert_eq!(RerankMethod::CrossEncoder.to_string(), "cross_encoder");
        assert_eq!(EnhanceMethod::default(), EnhanceMethod::None);
    }

    #[test]
    fn precomputed_lookup_is_case_insensitive_and_truncated() {
        let mut map = HashMap::new();
        map.insert("Bear Movie".to_string(), vec![(3, 0.2), (1, 0.9), (2, 0.5)]);
        let vs = PrecomputedVectorSearch::new(map);
        assert_eq!(vs.search_vectors("bear movie", 2).unwrap(), vec![(1, 0.9), (2, 0.5)]);
        assert!(vs.search_vectors("other", 5).unwrap().is_empty());
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn max_chunk_aggregation_keeps_best_chunk() {
        let mut search = EmbeddingSearch::new(LetterEmbedder, ChunkAggregation::MaxChunk);
        search.add_text(1, "ccc").unwrap();
        search.add_text(1, "aaa").unwrap();
        search.add_text(2, "bbb").unwrap();
        let hits = search.search_vectors("a", 10).unwrap();
        assert_eq!(hits[0].0, 1);
        assert!((hits[0].1 - 1.0).abs() < 1e-12);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn document_aggregation_replaces_previous_vector() {
        let mut search = EmbeddingSearch::new(LetterEmbedder, ChunkAggregation::Document);
        search.add_text(1, "aaa").unwrap();
        search.add_text(1, "ccc").unwrap();
        assert_eq!(search.len(), 1);
        let hits = search.search_vectors("a", 10).unwrap();
        assert_eq!(hits, vec![(1, 0.0)]);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let mut search = EmbeddingSearch::new(LetterEmbedder, ChunkAggregation::Document);
        search.add(1, vec![1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(search.add(2, vec![1.0]), Err(ExternalError::DimensionMismatch { expected: 3, actual: 1 })));
    }
}
