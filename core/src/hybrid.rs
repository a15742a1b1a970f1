//! Hybrid retrieval: lexical BM25 plus an external semantic ranking, fused.

use crate::config::{validate_alpha, validate_rrf_k, SearchConfig};
use crate::error::Result;
use crate::external::{EnhanceMethod, QueryEnhancer, RerankMethod, Reranker, VectorSearch};
use crate::fusion::{rrf_fuse, weighted_fuse, FusedHit, FusionMethod, SourceScore};
use crate::index::{DocId, InvertedIndex};
use serde::Serialize;

/// One fused result joined with its document record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridHit {
    pub id: DocId,
    pub title: String,
    pub description: String,
    /// Weighted blend or RRF sum, depending on the fusion used.
    pub score: f64,
    pub bm25: Option<SourceScore>,
    pub semantic: Option<SourceScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f64>,
}

pub struct HybridSearcher<'a> {
    index: &'a InvertedIndex,
    vectors: &'a dyn VectorSearch,
    config: SearchConfig,
    enhancer: Option<(&'a dyn QueryEnhancer, EnhanceMethod)>,
    reranker: Option<(&'a dyn Reranker, RerankMethod)>,
}

impl<'a> HybridSearcher<'a> {
    pub fn new(index: &'a InvertedIndex, vectors: &'a dyn VectorSearch, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { index, vectors, config, enhancer: None, reranker: None })
    }

    pub fn with_enhancer(mut self, enhancer: &'a dyn QueryEnhancer, method: EnhanceMethod) -> Self {
        self.enhancer = Some((enhancer, method));
        self
    }

    pub fn with_reranker(mut self, reranker: &'a dyn Reranker, method: RerankMethod) -> Self {
        self.reranker = Some((reranker, method));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn search(&self, query: &str, method: FusionMethod, limit: usize) -> Result<Vec<HybridHit>> {
        match method {
            FusionMethod::Weighted => self.weighted_search(query, self.config.alpha, limit),
            FusionMethod::Rrf => self.rrf_search(query, self.config.rrf_k, limit),
        }
    }

    pub fn weighted_search(&self, query: &str, alpha: f64, limit: usize) -> Result<Vec<HybridHit>> {
        validate_alpha(alpha)?;
        let query = self.enhance(query);
        let (lexical, semantic) = self.candidates(&query, limit)?;
        let fused = weighted_fuse(&lexical, &semantic, alpha, limit);
        tracing::debug!(query = %query, alpha, lexical = lexical.len(), semantic = semantic.len(), fused = fused.len(), "weighted search");
        Ok(self.rerank(&query, self.join(fused), limit))
    }

    pub fn rrf_search(&self, query: &str, k: f64, limit: usize) -> Result<Vec<HybridHit>> {
        validate_rrf_k(k)?;
        let query = self.enhance(query);
        let (lexical, semantic) = self.candidates(&query, limit)?;
        let fused = rrf_fuse(&lexical, &semantic, k, limit);
        tracing::debug!(query = %query, k, lexical = lexical.len(), semantic = semantic.len(), fused = fused.len(), "rrf search");
        Ok(self.rerank(&query, self.join(fused), limit))
    }

    /// Both sources, each asked for `limit * oversample` candidates.
    fn candidates(&self, query: &str, limit: usize) -> Result<(Vec<(DocId, f64)>, Vec<(DocId, f64)>)> {
        let wanted = self.config.candidate_limit(limit);
        let lexical = self.index.bm25_search(query, wanted, self.config.bm25)?;
        let semantic = match self.vectors.search_vectors(query, wanted) {
            Ok(hits) => self.usable_semantic(hits),
            Err(e) => {
                tracing::warn!(error = %e, "semantic search failed, fusing lexical results only");
                Vec::new()
            }
        };
        Ok((lexical, semantic))
    }

    /// Drops ids the index does not know and non-finite scores, so neither
    /// takes a result slot nor skews min-max normalization.
    fn usable_semantic(&self, hits: Vec<(DocId, f64)>) -> Vec<(DocId, f64)> {
        let total = hits.len();
        let kept: Vec<(DocId, f64)> = hits
            .into_iter()
            .filter(|&(doc_id, score)| score.is_finite() && self.index.doc(doc_id).is_some())
            .collect();
        if kept.len() < total {
            tracing::warn!(dropped = total - kept.len(), "semantic results with unknown ids or non-finite scores skipped");
        }
        kept
    }

    fn enhance(&self, query: &str) -> String {
        match self.enhancer {
            Some((enhancer, method)) if method != EnhanceMethod::None => match enhancer.enhance(query, method) {
                Ok(enhanced) => {
                    let enhanced = enhanced.trim().to_string();
                    tracing::debug!(original = query, enhanced = %enhanced, %method, "enhanced query");
                    enhanced
                }
                Err(e) => {
                    tracing::warn!(error = %e, %method, "query enhancement failed, using original query");
                    query.to_string()
                }
            },
            _ => query.to_string(),
        }
    }

    fn rerank(&self, query: &str, hits: Vec<HybridHit>, limit: usize) -> Vec<HybridHit> {
        match self.reranker {
            Some((reranker, method)) if method != RerankMethod::None => {
                match reranker.rerank(query, hits.clone(), method, limit) {
                    Ok(reranked) => reranked,
                    Err(e) => {
                        tracing::warn!(error = %e, %method, "rerank failed, keeping fused order");
                        hits
                    }
                }
            }
            _ => hits,
        }
    }

    fn join(&self, fused: Vec<FusedHit>) -> Vec<HybridHit> {
        fused
            .into_iter()
            .filter_map(|hit| {
                let doc = self.index.doc(hit.doc_id);
                if doc.is_none() {
                    tracing::warn!(doc_id = hit.doc_id, "fused id not in document map, skipping");
                }
                let doc = doc?;
                Some(HybridHit {
                    id: doc.id,
                    title: doc.title.clone(),
                    description: doc.description.clone(),
                    score: hit.score,
                    bm25: hit.lexical,
                    semantic: hit.semantic,
                    rerank_score: None,
                })
            })
            .collect()
    }
}
