//! Error types for the retrieval core.

use crate::DocId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while building, loading or scoring against an index.
///
/// Unknown query terms are never errors: they resolve to empty postings and
/// zero contributions.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A term-level operation received text that tokenizes to several terms.
    #[error("expected a single term, got {tokens} tokens in {term:?}")]
    InvalidTerm { term: String, tokens: usize },
    /// The snapshot (or one of its artifacts) does not exist yet.
    #[error("index not built: missing artifact {artifact}")]
    NotBuilt { artifact: String },
    /// Average document length requested on an index with no tokens.
    #[error("corpus is empty, average document length is undefined")]
    EmptyCorpus,
    #[error("document {0} is not in the index")]
    UnknownDocument(DocId),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// An artifact exists but could not be decoded.
    #[error("malformed {artifact}: {reason}")]
    Malformed { artifact: String, reason: String },
    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

impl IndexError {
    pub(crate) fn malformed(artifact: impl Into<String>, reason: impl ToString) -> Self {
        IndexError::Malformed { artifact: artifact.into(), reason: reason.to_string() }
    }

    /// True when the caller should run a build before retrying.
    pub fn is_not_built(&self) -> bool {
        matches!(self, IndexError::NotBuilt { .. })
    }
}

/// Failures reported by external collaborators (embedding search, query
/// enhancement, reranking).
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },
    #[error("{service} returned an unusable response: {reason}")]
    BadResponse { service: &'static str, reason: String },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
