use crate::config::Bm25Params;
use crate::error::{IndexError, Result};
use crate::index::{DocId, InvertedIndex};
use crate::scorer::{bm25_idf_raw, bm25_tf_raw};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Descending by score, ascending by id on ties.
pub(crate) fn by_score_then_id(a: &(DocId, f64), b: &(DocId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

impl InvertedIndex {
    /// BM25 ranking of `query` over the whole index.
    ///
    /// Only documents sharing at least one stemmed token with the query get an
    /// entry. Unknown query tokens contribute nothing.
    pub fn bm25_search(&self, query: &str, limit: usize, params: Bm25Params) -> Result<Vec<(DocId, f64)>> {
        let mut seen = HashSet::new();
        let tokens: Vec<String> = self
            .normalizer
            .clean(query)
            .into_iter()
            .filter(|t| self.postings_for(t).is_some() && seen.insert(t.clone()))
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let avg_doc_len = self.avg_doc_length()?;
        let num_docs = self.num_docs();
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for token in &tokens {
            let Some(ids) = self.postings_for(token) else { continue };
            let idf = bm25_idf_raw(num_docs, self.df_for_key(token));
            for &doc_id in ids {
                let tf = self.tf_for_key(doc_id, token)?;
                let doc_len = self.doc_length(doc_id).ok_or(IndexError::UnknownDocument(doc_id))?;
                *scores.entry(doc_id).or_insert(0.0) += bm25_tf_raw(tf, doc_len, avg_doc_len, params) * idf;
            }
        }

        let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
        ranked.sort_by(by_score_then_id);
        ranked.truncate(limit);
        tracing::debug!(query, tokens = tokens.len(), hits = ranked.len(), "bm25 search");
        Ok(ranked)
    }
}
