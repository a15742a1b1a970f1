//! Tunable defaults for scoring and fusion.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const BM25_K1: f64 = 1.5;
pub const BM25_B: f64 = 0.75;
pub const DEFAULT_ALPHA: f64 = 0.5;
pub const DEFAULT_RRF_K: f64 = 60.0;
pub const DEFAULT_LIMIT: usize = 5;
/// Candidate multiplier applied to `limit` before fusion. Tuned, not derived.
pub const DEFAULT_OVERSAMPLE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: BM25_K1, b: BM25_B }
    }
}

impl Bm25Params {
    pub fn validate(&self) -> Result<()> {
        if !(self.k1.is_finite() && self.k1 >= 0.0) {
            return Err(IndexError::InvalidParameter { name: "k1", value: self.k1.to_string() });
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(IndexError::InvalidParameter { name: "b", value: self.b.to_string() });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub bm25: Bm25Params,
    pub alpha: f64,
    pub rrf_k: f64,
    pub limit: usize,
    pub oversample: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            alpha: DEFAULT_ALPHA,
            rrf_k: DEFAULT_RRF_K,
            limit: DEFAULT_LIMIT,
            oversample: DEFAULT_OVERSAMPLE,
        }
    }
}

impl SearchConfig {
    /// Read a JSON config; missing fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config: SearchConfig =
            serde_json::from_str(&raw).map_err(|e| IndexError::malformed(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bm25.validate()?;
        validate_alpha(self.alpha)?;
        validate_rrf_k(self.rrf_k)?;
        if self.limit == 0 {
            return Err(IndexError::InvalidParameter { name: "limit", value: "0".into() });
        }
        if self.oversample == 0 {
            return Err(IndexError::InvalidParameter { name: "oversample", value: "0".into() });
        }
        Ok(())
    }

    /// Number of candidates requested from each source before fusion.
    pub fn candidate_limit(&self, limit: usize) -> usize {
        limit.saturating_mul(self.oversample)
    }
}

pub fn validate_alpha(alpha: f64) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(IndexError::InvalidParameter { name: "alpha", value: alpha.to_string() })
    }
}

pub fn validate_rrf_k(k: f64) -> Result<()> {
    if k.is_finite() && k >= 0.0 {
        Ok(())
    } else {
        Err(IndexError::InvalidParameter { name: "rrf_k", value: k.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tunables() {
        let c = SearchConfig::default();
        assert_eq!(c.bm25.k1, 1.5);
        assert_eq!(c.bm25.b, 0.75);
        assert_eq!(c.alpha, 0.5);
        assert_eq!(c.rrf_k, 60.0);
        assert_eq!(c.limit, 5);
        assert_eq!(c.candidate_limit(5), 2500);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let c = SearchConfig { alpha: 1.5, ..SearchConfig::default() };
        assert!(matches!(c.validate(), Err(IndexError::InvalidParameter { name: "alpha", .. })));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"alpha": 0.3, "limit": 10}"#).unwrap();
        let c = SearchConfig::from_file(&path).unwrap();
        assert_eq!(c.alpha, 0.3);
        assert_eq!(c.limit, 10);
        assert_eq!(c.rrf_k, DEFAULT_RRF_K);
        assert_eq!(c.bm25, Bm25Params::default());
    }
}
