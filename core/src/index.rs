use crate::error::{IndexError, Result};
use crate::tokenizer::{tokenize_only, TextNormalizer};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

pub type DocId = u32;

pub type Postings = HashMap<String, BTreeSet<DocId>>;
pub type TermFrequencies = HashMap<DocId, HashMap<String, u32>>;
pub type DocLengths = HashMap<DocId, usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
}

impl Document {
    /// Text that gets indexed: title and description joined by a space.
    pub fn indexed_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[derive(Deserialize)]
struct CorpusFile {
    movies: Vec<Document>,
}

/// Read a corpus in the `{"movies": [{"id", "title", "description"}]}` layout.
/// Unknown fields on each record are ignored.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let corpus: CorpusFile =
        serde_json::from_reader(reader).map_err(|e| IndexError::malformed(path.display().to_string(), e))?;
    Ok(corpus.movies)
}

/// Postings, term frequencies, document lengths and the document map.
///
/// Immutable once built or loaded; share it behind [`SharedIndex`] when a
/// live rebuild has to be swapped in.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    pub(crate) postings: Postings,
    pub(crate) docs: HashMap<DocId, Document>,
    pub(crate) term_frequencies: TermFrequencies,
    /// Token count before stopword removal, used for BM25 length normalization.
    pub(crate) doc_lengths: DocLengths,
    pub(crate) normalizer: TextNormalizer,
}

impl InvertedIndex {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer, ..Self::default() }
    }

    /// Build all four tables from `documents`. Fails without a partial index
    /// when two documents share an id.
    pub fn build<I>(documents: I, normalizer: TextNormalizer) -> Result<Self>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut index = Self::new(normalizer);
        for doc in documents {
            if index.docs.contains_key(&doc.id) {
                return Err(IndexError::malformed("corpus", format!("duplicate document id {}", doc.id)));
            }
            index.add_document(doc);
        }
        tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "built inverted index");
        Ok(index)
    }

    fn add_document(&mut self, doc: Document) {
        let raw = tokenize_only(&doc.indexed_text());
        self.doc_lengths.insert(doc.id, raw.len());
        let tokens = self.normalizer.finish(raw);
        let counts = self.term_frequencies.entry(doc.id).or_default();
        for token in tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
            self.postings.entry(token).or_default().insert(doc.id);
        }
        self.docs.insert(doc.id, doc);
    }

    pub(crate) fn from_tables(
        postings: Postings,
        docs: HashMap<DocId, Document>,
        term_frequencies: TermFrequencies,
        doc_lengths: DocLengths,
        normalizer: TextNormalizer,
    ) -> Self {
        Self { postings, docs, term_frequencies, doc_lengths, normalizer }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn doc(&self, doc_id: DocId) -> Option<&Document> {
        self.docs.get(&doc_id)
    }

    pub fn doc_length(&self, doc_id: DocId) -> Option<usize> {
        self.doc_lengths.get(&doc_id).copied()
    }

    pub(crate) fn postings_for(&self, key: &str) -> Option<&BTreeSet<DocId>> {
        self.postings.get(key)
    }

    /// Sorted ids of documents containing `term` once stemmed; empty for
    /// unknown terms. Errors only when `term` is more than one token.
    pub fn get_documents(&self, term: &str) -> Result<Vec<DocId>> {
        let Some(key) = self.normalizer.term_key(term)? else {
            return Ok(Vec::new());
        };
        Ok(self.postings_for(&key).map(|set| set.iter().copied().collect()).unwrap_or_default())
    }

    /// Boolean keyword match: documents sharing any token with the query,
    /// collected in query-token order until `limit`, returned by id.
    pub fn keyword_search(&self, query: &str, limit: usize) -> Vec<&Document> {
        let mut seen: HashSet<DocId> = HashSet::new();
        'tokens: for token in self.normalizer.clean(query) {
            let Some(ids) = self.postings_for(&token) else { continue };
            for id in ids {
                if seen.len() >= limit {
                    break 'tokens;
                }
                seen.insert(*id);
            }
        }
        let mut ids: Vec<DocId> = seen.into_iter().collect();
        ids.sort_unstable();
        ids.iter().filter_map(|id| self.docs.get(id)).collect()
    }
}

/// A single index shared by many readers. Rebuilds construct a new index and
/// swap the pointer; readers holding a snapshot keep the old one alive.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<InvertedIndex>>>,
}

impl SharedIndex {
    pub fn new(index: InvertedIndex) -> Self {
        Self { inner: Arc::new(RwLock::new(Arc::new(index))) }
    }

    pub fn snapshot(&self) -> Arc<InvertedIndex> {
        Arc::clone(&self.inner.read())
    }

    /// Swap in a fully built index, returning the previous one.
    pub fn replace(&self, index: InvertedIndex) -> Arc<InvertedIndex> {
        let next = Arc::new(index);
        std::mem::replace(&mut *self.inner.write(), next)
    }
}
