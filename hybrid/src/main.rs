use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hybrid::{format_hits, format_normalized, format_reports, resolve_config, ConfigOverrides, Engine};
use hybrid_core::evaluation::{evaluate, GoldenDataset};
use hybrid_core::fusion::FusionMethod;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "hybrid")]
#[command(about = "Hybrid BM25 + semantic search with weighted or RRF fusion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Index snapshot directory written by `indexer build`
    #[arg(long, env = "HYBRID_INDEX_DIR", default_value = "./cache")]
    index: PathBuf,
    /// Stopword file used when the index was built
    #[arg(long, env = "HYBRID_STOPWORDS")]
    stopwords: Option<PathBuf>,
    /// JSON map of query -> [{"id", "score"}] semantic rankings
    #[arg(long, env = "HYBRID_SEMANTIC_RESULTS")]
    semantic_results: Option<PathBuf>,
    /// JSON search config; flags below override it
    #[arg(long, env = "HYBRID_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "HYBRID_LIMIT")]
    limit: Option<usize>,
    /// Candidate multiplier applied to --limit before fusion
    #[arg(long, env = "HYBRID_OVERSAMPLE")]
    oversample: Option<usize>,
    #[arg(long, env = "HYBRID_BM25_K1")]
    k1: Option<f64>,
    #[arg(long, env = "HYBRID_BM25_B")]
    b: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Min-max normalize a list of scores
    Normalize {
        #[arg(required = true, allow_negative_numbers = true)]
        scores: Vec<f64>,
    },
    /// Blend normalized BM25 and semantic scores with alpha
    WeightedSearch {
        query: String,
        #[arg(long, env = "HYBRID_ALPHA")]
        alpha: Option<f64>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Reciprocal Rank Fusion over documents found by both sources
    RrfSearch {
        query: String,
        #[arg(short, long, env = "HYBRID_RRF_K")]
        k: Option<f64>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Precision and recall over a golden dataset
    Evaluate {
        #[arg(long, default_value = "data/golden_dataset.json")]
        golden: PathBuf,
        /// Fusion used for retrieval: weighted or rrf
        #[arg(long, env = "HYBRID_METHOD", default_value = "rrf")]
        method: FusionMethod,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

fn open(engine: &EngineArgs, alpha: Option<f64>, rrf_k: Option<f64>) -> Result<Engine> {
    let overrides = ConfigOverrides {
        alpha,
        rrf_k,
        limit: engine.limit,
        oversample: engine.oversample,
        k1: engine.k1,
        b: engine.b,
    };
    let config = resolve_config(engine.config.as_deref(), &overrides)?;
    Engine::open(&engine.index, engine.stopwords.as_deref(), engine.semantic_results.as_deref(), config)
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { scores } => {
            print!("{}", format_normalized(&scores));
        }
        Commands::WeightedSearch { query, alpha, engine } => {
            let engine = open(&engine, alpha, None)?;
            let searcher = engine.searcher()?;
            let hits = searcher.weighted_search(&query, engine.config.alpha, engine.config.limit)?;
            print!("{}", format_hits(&hits, FusionMethod::Weighted));
        }
        Commands::RrfSearch { query, k, engine } => {
            let engine = open(&engine, None, k)?;
            let searcher = engine.searcher()?;
            let hits = searcher.rrf_search(&query, engine.config.rrf_k, engine.config.limit)?;
            print!("{}", format_hits(&hits, FusionMethod::Rrf));
        }
        Commands::Evaluate { golden, method, engine } => {
            let engine = open(&engine, None, None)?;
            let dataset = GoldenDataset::from_file(&golden)?;
            let limit = engine.config.limit;
            let reports = evaluate(&engine.searcher()?, &dataset, method, limit)?;
            print!("{}", format_reports(&reports, limit));
        }
    }
    Ok(())
}
