//! Fusion of a lexical and a semantic ranked list.
//!
//! Two strategies with deliberately different candidate policies:
//! - **Weighted**: min-max normalize each side, blend with `alpha` over the
//!   *union* of ids. A side that did not return a document contributes 0.
//! - **RRF**: sum `1 / (k + rank)` per side over the *intersection* of ids.
//!   A document returned by only one side is dropped.

use crate::index::DocId;
use crate::search::by_score_then_id;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Where a fused document stood in one of the input lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceScore {
    /// 1-based position in the source list.
    pub rank: usize,
    pub score: f64,
    /// Min-max normalized score; only set by weighted fusion.
    pub normalized: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedHit {
    pub doc_id: DocId,
    pub score: f64,
    pub lexical: Option<SourceScore>,
    pub semantic: Option<SourceScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMethod {
    Weighted,
    Rrf,
}

impl FromStr for FusionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weighted" => Ok(FusionMethod::Weighted),
            "rrf" => Ok(FusionMethod::Rrf),
            other => Err(format!("unknown fusion method {other:?}, expected weighted or rrf")),
        }
    }
}

impl fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionMethod::Weighted => f.write_str("weighted"),
            FusionMethod::Rrf => f.write_str("rrf"),
        }
    }
}

/// Min-max scale to [0, 1]. A uniform set maps to all `1.0`.
pub fn normalize(scores: &[f64]) -> Vec<f64> {
    let Some((min, max)) = min_max(scores) else {
        return Vec::new();
    };
    if min == max {
        return vec![1.0; scores.len()];
    }
    let range = max - min;
    scores.iter().map(|s| (s - min) / range).collect()
}

fn min_max(scores: &[f64]) -> Option<(f64, f64)> {
    let first = *scores.first()?;
    Some(scores.iter().fold((first, first), |(lo, hi), &s| (lo.min(s), hi.max(s))))
}

fn sources(ranked: &[(DocId, f64)], normalized: Option<&[f64]>) -> HashMap<DocId, SourceScore> {
    let mut out = HashMap::with_capacity(ranked.len());
    for (i, &(doc_id, score)) in ranked.iter().enumerate() {
        // First occurrence wins if a source repeats an id.
        out.entry(doc_id).or_insert(SourceScore {
            rank: i + 1,
            score,
            normalized: normalized.map(|n| n[i]),
        });
    }
    out
}

fn finish(mut hits: Vec<FusedHit>, limit: usize) -> Vec<FusedHit> {
    hits.sort_by(|a, b| by_score_then_id(&(a.doc_id, a.score), &(b.doc_id, b.score)));
    hits.truncate(limit);
    hits
}

/// `alpha * lexical + (1 - alpha) * semantic` over the union of both lists.
pub fn weighted_fuse(
    lexical: &[(DocId, f64)],
    semantic: &[(DocId, f64)],
    alpha: f64,
    limit: usize,
) -> Vec<FusedHit> {
    let lex_norm = normalize(&lexical.iter().map(|h| h.1).collect::<Vec<_>>());
    let sem_norm = normalize(&semantic.iter().map(|h| h.1).collect::<Vec<_>>());
    let lex = sources(lexical, Some(lex_norm.as_slice()));
    let sem = sources(semantic, Some(sem_norm.as_slice()));

    let mut ids: Vec<DocId> = lex.keys().chain(sem.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    let hits = ids
        .into_iter()
        .map(|doc_id| {
            let lexical = lex.get(&doc_id).copied();
            let semantic = sem.get(&doc_id).copied();
            let l = lexical.and_then(|s| s.normalized).unwrap_or(0.0);
            let s = semantic.and_then(|s| s.normalized).unwrap_or(0.0);
            FusedHit { doc_id, score: alpha * l + (1.0 - alpha) * s, lexical, semantic }
        })
        .collect();
    finish(hits, limit)
}

/// Reciprocal Rank Fusion over documents present in *both* lists.
///
/// Inputs must already be sorted best-first; ranks are positions, scores are
/// only carried for display.
pub fn rrf_fuse(lexical: &[(DocId, f64)], semantic: &[(DocId, f64)], k: f64, limit: usize) -> Vec<FusedHit> {
    let lex = sources(lexical, None);
    let sem = sources(semantic, None);

    let hits = lex
        .iter()
        .filter_map(|(doc_id, l)| {
            let s = sem.get(doc_id)?;
            let score = rrf_contribution(k, l.rank) + rrf_contribution(k, s.rank);
            Some(FusedHit { doc_id: *doc_id, score, lexical: Some(*l), semantic: Some(*s) })
        })
        .collect();
    finish(hits, limit)
}

pub fn rrf_contribution(k: f64, rank: usize) -> f64 {
    1.0 / (k + rank as f64)
}
