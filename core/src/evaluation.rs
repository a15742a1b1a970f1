//! Precision/recall against a golden dataset of queries and relevant titles.

use crate::error::{IndexError, Result};
use crate::fusion::FusionMethod;
use crate::hybrid::HybridSearcher;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct GoldenCase {
    pub query: String,
    pub relevant_docs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoldenDataset {
    pub test_cases: Vec<GoldenCase>,
}

impl GoldenDataset {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| IndexError::malformed(path.display().to_string(), e))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub precision: f64,
    pub recall: f64,
    pub retrieved: Vec<String>,
    pub relevant_retrieved: Vec<String>,
}

/// Share of retrieved titles that are relevant; 0 when nothing was retrieved.
pub fn precision_at_k(retrieved: &[String], relevant: &HashSet<&str>) -> f64 {
    if retrieved.is_empty() {
        return 0.0;
    }
    let hits = retrieved.iter().filter(|t| relevant.contains(t.as_str())).count();
    hits as f64 / retrieved.len() as f64
}

/// Share of relevant titles that were retrieved; 0 when nothing is relevant.
pub fn recall_at_k(retrieved: &[String], relevant: &HashSet<&str>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let found: HashSet<&str> = retrieved.iter().map(String::as_str).filter(|t| relevant.contains(t)).collect();
    found.len() as f64 / relevant.len() as f64
}

/// Run RRF search for every case and score the top `limit` titles.
pub fn evaluate(
    searcher: &HybridSearcher<'_>,
    dataset: &GoldenDataset,
    method: FusionMethod,
    limit: usize,
) -> Result<Vec<QueryReport>> {
    dataset
        .test_cases
        .iter()
        .map(|case| -> Result<QueryReport> {
            let retrieved: Vec<String> =
                searcher.search(&case.query, method, limit)?.into_iter().map(|h| h.title).collect();
            let relevant: HashSet<&str> = case.relevant_docs.iter().map(String::as_str).collect();
            let relevant_retrieved = retrieved.iter().filter(|t| relevant.contains(t.as_str())).cloned().collect();
            let report = QueryReport {
                query: case.query.clone(),
                precision: precision_at_k(&retrieved, &relevant),
                recall: recall_at_k(&retrieved, &relevant),
                retrieved,
                relevant_retrieved,
            };
            tracing::debug!(query = %report.query, precision = report.precision, recall = report.recall, "evaluated query");
            Ok(report)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn precision_and_recall() {
        let relevant: HashSet<&str> = ["Paddington", "Paddington 2", "The Revenant"].into_iter().collect();
        let retrieved = titles(&["Paddington", "Heat", "Paddington 2", "Ted"]);
        assert!((precision_at_k(&retrieved, &relevant) - 0.5).abs() < 1e-12);
        assert!((recall_at_k(&retrieved, &relevant) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_sides_score_zero() {
        let relevant: HashSet<&str> = ["Heat"].into_iter().collect();
        assert_eq!(precision_at_k(&[], &relevant), 0.0);
        assert_eq!(recall_at_k(&titles(&["Heat"]), &HashSet::new()), 0.0);
    }

    #[test]
    fn dataset_parses_golden_layout() {
        let raw = r#"{"test_cases": [{"query": "bear movie", "relevant_docs": ["Paddington"]}]}"#;
        let ds: GoldenDataset = serde_json::from_str(raw).unwrap();
        assert_eq!(ds.test_cases.len(), 1);
        assert_eq!(ds.test_cases[0].relevant_docs, vec!["Paddington"]);
    }
}
