use anyhow::{Context, Result};
use hybrid_core::evaluation::QueryReport;
use hybrid_core::external::PrecomputedVectorSearch;
use hybrid_core::fusion::FusionMethod;
use hybrid_core::hybrid::{HybridHit, HybridSearcher};
use hybrid_core::persist::{load_index, IndexPaths};
use hybrid_core::{InvertedIndex, SearchConfig, StopWords, TextNormalizer};
use std::fmt::Write;
use std::path::Path;

/// Command line overrides; `None` keeps the value from the config file or default.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub alpha: Option<f64>,
    pub rrf_k: Option<f64>,
    pub limit: Option<usize>,
    pub oversample: Option<usize>,
    pub k1: Option<f64>,
    pub b: Option<f64>,
}

pub fn resolve_config(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<SearchConfig> {
    let mut config = match file {
        Some(p) => SearchConfig::from_file(p).with_context(|| format!("reading config {}", p.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(v) = overrides.alpha { config.alpha = v; }
    if let Some(v) = overrides.rrf_k { config.rrf_k = v; }
    if let Some(v) = overrides.limit { config.limit = v; }
    if let Some(v) = overrides.oversample { config.oversample = v; }
    if let Some(v) = overrides.k1 { config.bm25.k1 = v; }
    if let Some(v) = overrides.b { config.bm25.b = v; }
    config.validate()?;
    Ok(config)
}

/// Loaded lexical index plus the semantic rankings it is fused with.
pub struct Engine {
    pub index: InvertedIndex,
    pub vectors: PrecomputedVectorSearch,
    pub config: SearchConfig,
}

impl Engine {
    pub fn open(index_dir: &Path, stopwords: Option<&Path>, semantic: Option<&Path>, config: SearchConfig) -> Result<Self> {
        let stopwords = match stopwords {
            Some(p) => StopWords::from_file(p).with_context(|| format!("reading stopwords {}", p.display()))?,
            None => StopWords::english(),
        };
        let paths = IndexPaths::new(index_dir);
        let index = load_index(&paths, TextNormalizer::new(stopwords)).map_err(|e| {
            if e.is_not_built() {
                anyhow::anyhow!("{e}; run `indexer build --index {}` first", index_dir.display())
            } else {
                anyhow::Error::new(e)
            }
        })?;
        let vectors = match semantic {
            Some(p) => PrecomputedVectorSearch::from_file(p).with_context(|| format!("reading semantic results {}", p.display()))?,
            None => {
                tracing::warn!("no semantic results supplied, semantic side will be empty");
                PrecomputedVectorSearch::default()
            }
        };
        Ok(Self { index, vectors, config })
    }

    pub fn searcher(&self) -> Result<HybridSearcher<'_>> {
        Ok(HybridSearcher::new(&self.index, &self.vectors, self.config.clone())?)
    }
}

pub fn format_normalized(scores: &[f64]) -> String {
    let mut out = String::new();
    for (i, s) in hybrid_core::fusion::normalize(scores).iter().enumerate() {
        let _ = writeln!(out, "* {}: {s:.4}", i + 1);
    }
    out
}

fn source_column(label: &str, source: Option<hybrid_core::fusion::SourceScore>) -> String {
    match source {
        Some(s) => match s.normalized {
            Some(n) => format!("{label} #{} {:.4} (norm {n:.4})", s.rank, s.score),
            None => format!("{label} #{} {:.4}", s.rank, s.score),
        },
        None => format!("{label} -"),
    }
}

pub fn format_hits(hits: &[HybridHit], method: FusionMethod) -> String {
    let label = match method {
        FusionMethod::Weighted => "Hybrid Score",
        FusionMethod::Rrf => "RRF Score",
    };
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(out, "{}. ({}) {}", i + 1, hit.id, hit.title);
        let _ = writeln!(out, "   {label}: {:.4}", hit.score);
        if let Some(r) = hit.rerank_score {
            let _ = writeln!(out, "   Rerank Score: {r:.3}");
        }
        let _ = writeln!(out, "   {}, {}", source_column("BM25", hit.bm25), source_column("Semantic", hit.semantic));
        let preview: String = hit.description.chars().take(100).collect();
        let _ = writeln!(out, "   {preview}");
    }
    out
}

pub fn format_reports(reports: &[QueryReport], limit: usize) -> String {
    let mut out = String::new();
    for r in reports {
        let _ = writeln!(out, "- Query: {}", r.query);
        let _ = writeln!(out, "    - Precision@{limit}: {:.4}", r.precision);
        let _ = writeln!(out, "    - Recall@{limit}: {:.4}", r.recall);
        let _ = writeln!(out, "    - Retrieved: {}", r.retrieved.join(", "));
        let _ = writeln!(out, "    - Relevant: {}", r.relevant_retrieved.join(", "));
    }
    if !reports.is_empty() {
        let n = reports.len() as f64;
        let mean_p = reports.iter().map(|r| r.precision).sum::<f64>() / n;
        let mean_r = reports.iter().map(|r| r.recall).sum::<f64>() / n;
        let _ = writeln!(out, "Mean Precision@{limit}: {mean_p:.4}, Mean Recall@{limit}: {mean_r:.4}");
    }
    out
}
