use crate::error::{IndexError, Result};
use crate::index::{DocId, DocLengths, Document, InvertedIndex, Postings, TermFrequencies};
use crate::tokenizer::TextNormalizer;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn postings(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn docmap(&self) -> PathBuf { self.root.join("docmap.bin") }
    pub fn term_frequencies(&self) -> PathBuf { self.root.join("term_frequencies.bin") }
    pub fn doc_lengths(&self) -> PathBuf { self.root.join("doc_lengths.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// True when all four tables are present.
    pub fn is_built(&self) -> bool {
        [self.postings(), self.docmap(), self.term_frequencies(), self.doc_lengths()]
            .iter()
            .all(|p| p.is_file())
    }
}

// Write to a sibling temp file then rename so readers never see a torn artifact.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|e| IndexError::malformed(artifact_name(path), e))?;
    write_atomic(path, &bytes)
}

fn open_artifact(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IndexError::NotBuilt { artifact: artifact_name(path) },
        _ => IndexError::Io(e),
    })
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = open_artifact(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    bincode::deserialize(&buf).map_err(|e| IndexError::malformed(artifact_name(path), e))
}

fn artifact_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

pub fn save_postings(paths: &IndexPaths, postings: &Postings) -> Result<()> {
    save_bin(&paths.postings(), postings)
}

pub fn load_postings(paths: &IndexPaths) -> Result<Postings> {
    load_bin(&paths.postings())
}

pub fn save_docmap(paths: &IndexPaths, docs: &HashMap<DocId, Document>) -> Result<()> {
    save_bin(&paths.docmap(), docs)
}

pub fn load_docmap(paths: &IndexPaths) -> Result<HashMap<DocId, Document>> {
    load_bin(&paths.docmap())
}

pub fn save_term_frequencies(paths: &IndexPaths, tf: &TermFrequencies) -> Result<()> {
    save_bin(&paths.term_frequencies(), tf)
}

pub fn load_term_frequencies(paths: &IndexPaths) -> Result<TermFrequencies> {
    load_bin(&paths.term_frequencies())
}

pub fn save_doc_lengths(paths: &IndexPaths, lengths: &DocLengths) -> Result<()> {
    save_bin(&paths.doc_lengths(), lengths)
}

pub fn load_doc_lengths(paths: &IndexPaths) -> Result<DocLengths> {
    load_bin(&paths.doc_lengths())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta).map_err(|e| IndexError::malformed("meta.json", e))?;
    write_atomic(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = open_artifact(&paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    serde_json::from_str(&buf).map_err(|e| IndexError::malformed("meta.json", e))
}

/// Persist all four tables plus `meta.json`.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    save_postings(paths, &index.postings)?;
    save_docmap(paths, &index.docs)?;
    save_term_frequencies(paths, &index.term_frequencies)?;
    save_doc_lengths(paths, &index.doc_lengths)?;
    let meta = MetaFile {
        num_docs: index.num_docs(),
        num_terms: index.num_terms(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "saved index snapshot");
    Ok(())
}

/// Rebuild an index from its four tables. Any missing table is `NotBuilt`.
pub fn load_index(paths: &IndexPaths, normalizer: TextNormalizer) -> Result<InvertedIndex> {
    let postings = load_postings(paths)?;
    let docs = load_docmap(paths)?;
    let term_frequencies = load_term_frequencies(paths)?;
    let doc_lengths = load_doc_lengths(paths)?;
    if let Some(id) = postings.values().flatten().find(|id| !docs.contains_key(*id)) {
        return Err(IndexError::malformed("index.bin", format!("posting for unknown document {id}")));
    }
    if let Some(id) = docs.keys().find(|id| !term_frequencies.contains_key(*id)) {
        return Err(IndexError::malformed("term_frequencies.bin", format!("no entry for document {id}")));
    }
    if let Some(id) = docs.keys().find(|id| !doc_lengths.contains_key(*id)) {
        return Err(IndexError::malformed("doc_lengths.bin", format!("no entry for document {id}")));
    }
    tracing::info!(root = %paths.root.display(), num_docs = docs.len(), num_terms = postings.len(), "loaded index snapshot");
    Ok(InvertedIndex::from_tables(postings, docs, term_frequencies, doc_lengths, normalizer))
}
