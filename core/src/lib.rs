//! Hybrid lexical/semantic retrieval over a fixed document corpus.
//!
//! The lexical side is an inverted index scored with BM25; the semantic side
//! is supplied through [`external::VectorSearch`]. [`fusion`] merges the two.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod external;
pub mod fusion;
pub mod hybrid;
pub mod index;
pub mod persist;
pub mod scorer;
pub mod search;
pub mod tokenizer;

pub use config::{Bm25Params, SearchConfig};
pub use error::{ExternalError, IndexError, Result};
pub use index::{load_corpus, DocId, Document, InvertedIndex, SharedIndex};
pub use tokenizer::{StopWords, TextNormalizer};
