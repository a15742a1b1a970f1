//! TF, IDF and BM25 scoring against an [`InvertedIndex`].
//!
//! Every term-level operation accepts a single raw term, stems it, and fails
//! with `InvalidTerm` if the text holds more than one token.

use crate::config::Bm25Params;
use crate::error::{IndexError, Result};
use crate::index::{DocId, InvertedIndex};

/// `ln((N + 1) / (df + 1))`
pub fn smoothed_idf(num_docs: usize, df: usize) -> f64 {
    ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).ln()
}

/// `ln((N - df + 0.5) / (df + 0.5) + 1)`. Tends to zero as df approaches N;
/// callers summing contributions must not assume a positive lower bound.
pub fn bm25_idf_raw(num_docs: usize, df: usize) -> f64 {
    let n = num_docs as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Saturating term frequency with length normalization.
pub fn bm25_tf_raw(tf: u32, doc_len: usize, avg_doc_len: f64, params: Bm25Params) -> f64 {
    let tf = tf as f64;
    let Bm25Params { k1, b } = params;
    let length_norm = (1.0 - b) + b * (doc_len as f64 / avg_doc_len);
    (tf * (k1 + 1.0)) / (tf + k1 * length_norm)
}

impl InvertedIndex {
    /// Mean pre-stopword token count across all documents.
    pub fn avg_doc_length(&self) -> Result<f64> {
        if self.doc_lengths.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }
        let total: usize = self.doc_lengths.values().sum();
        if total == 0 {
            return Err(IndexError::EmptyCorpus);
        }
        Ok(total as f64 / self.doc_lengths.len() as f64)
    }

    pub(crate) fn tf_for_key(&self, doc_id: DocId, key: &str) -> Result<u32> {
        let counts = self.term_frequencies.get(&doc_id).ok_or(IndexError::UnknownDocument(doc_id))?;
        Ok(counts.get(key).copied().unwrap_or(0))
    }

    pub(crate) fn df_for_key(&self, key: &str) -> usize {
        self.postings_for(key).map_or(0, |ids| ids.len())
    }

    fn doc_len_checked(&self, doc_id: DocId) -> Result<usize> {
        self.doc_lengths.get(&doc_id).copied().ok_or(IndexError::UnknownDocument(doc_id))
    }

    pub fn tf(&self, doc_id: DocId, term: &str) -> Result<u32> {
        match self.normalizer.term_key(term)? {
            Some(key) => self.tf_for_key(doc_id, &key),
            None => self.tf_for_key(doc_id, ""),
        }
    }

    fn df(&self, term: &str) -> Result<usize> {
        Ok(self.get_documents(term)?.len())
    }

    pub fn idf(&self, term: &str) -> Result<f64> {
        Ok(smoothed_idf(self.num_docs(), self.df(term)?))
    }

    pub fn tfidf(&self, doc_id: DocId, term: &str) -> Result<f64> {
        Ok(self.tf(doc_id, term)? as f64 * self.idf(term)?)
    }

    pub fn bm25_idf(&self, term: &str) -> Result<f64> {
        Ok(bm25_idf_raw(self.num_docs(), self.df(term)?))
    }

    pub fn bm25_tf(&self, doc_id: DocId, term: &str, params: Bm25Params) -> Result<f64> {
        let avg = self.avg_doc_length()?;
        let doc_len = self.doc_len_checked(doc_id)?;
        Ok(bm25_tf_raw(self.tf(doc_id, term)?, doc_len, avg, params))
    }

    pub fn bm25(&self, doc_id: DocId, term: &str, params: Bm25Params) -> Result<f64> {
        Ok(self.bm25_tf(doc_id, term, params)? * self.bm25_idf(term)?)
    }
}
