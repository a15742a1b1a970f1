use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hybrid_core::config::{BM25_B, BM25_K1, DEFAULT_LIMIT};
use hybrid_core::persist::{load_index, load_meta, save_index, IndexPaths};
use hybrid_core::{load_corpus, Bm25Params, DocId, InvertedIndex, StopWords, TextNormalizer};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the BM25 keyword index", long_about = None)]
struct Cli {
    /// Index snapshot directory
    #[arg(long, global = true, env = "HYBRID_INDEX_DIR", default_value = "./cache")]
    index: PathBuf,
    /// Stopword file, one word per line (built-in English list when absent)
    #[arg(long, global = true, env = "HYBRID_STOPWORDS")]
    stopwords: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the inverted index from a movies JSON corpus
    Build {
        #[arg(long, env = "HYBRID_CORPUS", default_value = "data/movies.json")]
        corpus: PathBuf,
    },
    /// Boolean keyword match, first documents sharing any query term
    Search {
        query: String,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Occurrences of a term in a document
    Tf { doc_id: DocId, term: String },
    /// Smoothed inverse document frequency of a term
    Idf { term: String },
    /// TF times IDF for a term in a document
    Tfidf { doc_id: DocId, term: String },
    /// Saturated BM25 term frequency
    Bm25tf {
        doc_id: DocId,
        term: String,
        #[arg(long, default_value_t = BM25_K1)]
        k1: f64,
        #[arg(long, default_value_t = BM25_B)]
        b: f64,
    },
    /// BM25 inverse document frequency of a term
    Bm25idf { term: String },
    /// Rank documents for a query with BM25
    Bm25search {
        query: String,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = BM25_K1)]
        k1: f64,
        #[arg(long, default_value_t = BM25_B)]
        b: f64,
    },
    /// Print snapshot metadata
    Info,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let normalizer = TextNormalizer::new(load_stopwords(cli.stopwords.as_deref())?);
    let paths = IndexPaths::new(&cli.index);

    match cli.command {
        Commands::Build { corpus } => build_index(&corpus, &paths, normalizer),
        Commands::Search { query, limit } => {
            let index = open_index(&paths, normalizer)?;
            println!("Searching for: {query}");
            for (i, doc) in index.keyword_search(&query, limit).iter().enumerate() {
                println!("{}. {}", i + 1, doc.title);
            }
            Ok(())
        }
        Commands::Tf { doc_id, term } => {
            let tf = open_index(&paths, normalizer)?.tf(doc_id, &term)?;
            println!("TF score of '{term}' in '{doc_id}': {tf}");
            Ok(())
        }
        Commands::Idf { term } => {
            let idf = open_index(&paths, normalizer)?.idf(&term)?;
            println!("IDF score of '{term}': {idf:.2}");
            Ok(())
        }
        Commands::Tfidf { doc_id, term } => {
            let tfidf = open_index(&paths, normalizer)?.tfidf(doc_id, &term)?;
            println!("TF-IDF score of '{term}' in document '{doc_id}': {tfidf:.2}");
            Ok(())
        }
        Commands::Bm25tf { doc_id, term, k1, b } => {
            let params = checked_params(k1, b)?;
            let score = open_index(&paths, normalizer)?.bm25_tf(doc_id, &term, params)?;
            println!("BM25 TF score of '{term}' in document '{doc_id}': {score:.2}");
            Ok(())
        }
        Commands::Bm25idf { term } => {
            let score = open_index(&paths, normalizer)?.bm25_idf(&term)?;
            println!("BM25 IDF score of '{term}': {score:.2}");
            Ok(())
        }
        Commands::Bm25search { query, limit, k1, b } => {
            let params = checked_params(k1, b)?;
            let index = open_index(&paths, normalizer)?;
            for (i, (doc_id, score)) in index.bm25_search(&query, limit, params)?.into_iter().enumerate() {
                let title = index.doc(doc_id).map(|d| d.title.as_str()).unwrap_or("<unknown>");
                println!("{}. ({doc_id}) {title} - Score: {score:.2}", i + 1);
            }
            Ok(())
        }
        Commands::Info => {
            let meta = load_meta(&paths).with_context(|| format!("reading metadata in {}", paths.root.display()))?;
            println!("documents: {}", meta.num_docs);
            println!("terms:     {}", meta.num_terms);
            println!("built at:  {}", meta.created_at);
            println!("version:   {}", meta.version);
            Ok(())
        }
    }
}

fn load_stopwords(path: Option<&Path>) -> Result<StopWords> {
    match path {
        Some(p) => StopWords::from_file(p).with_context(|| format!("reading stopwords from {}", p.display())),
        None => Ok(StopWords::english()),
    }
}

fn checked_params(k1: f64, b: f64) -> Result<Bm25Params> {
    let params = Bm25Params { k1, b };
    params.validate()?;
    Ok(params)
}

fn build_index(corpus: &Path, paths: &IndexPaths, normalizer: TextNormalizer) -> Result<()> {
    let documents = load_corpus(corpus).with_context(|| format!("loading corpus {}", corpus.display()))?;
    tracing::info!(num_docs = documents.len(), corpus = %corpus.display(), "ingested documents");
    let index = InvertedIndex::build(documents, normalizer)?;
    save_index(paths, &index)?;
    println!("Built index of {} documents, {} terms in {}", index.num_docs(), index.num_terms(), paths.root.display());
    Ok(())
}

fn open_index(paths: &IndexPaths, normalizer: TextNormalizer) -> Result<InvertedIndex> {
    load_index(paths, normalizer).map_err(|e| {
        if e.is_not_built() {
            anyhow::anyhow!("{e}; run `indexer build` first")
        } else {
            anyhow::Error::new(e).context(format!("loading index from {}", paths.root.display()))
        }
    })
}
