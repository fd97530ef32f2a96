use serde::{Deserialize, Serialize};

use super::VectorizerError;

/// Tokenization and vocabulary parameters shared by both vectorizers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerParams {
    /// Smallest n-gram length.
    pub ngram_min: usize,
    /// Largest n-gram length (inclusive).
    pub ngram_max: usize,
    /// Minimum number of training documents a term must appear in.
    pub min_df: usize,
    /// Keep only the most frequent terms. Bounds the dense matrix the
    /// classifiers train on.
    pub max_features: Option<usize>,
    pub lowercase: bool,
}

impl VectorizerParams {
    pub fn validate(&self) -> Result<(), VectorizerError> {
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            return Err(VectorizerError::InvalidParams(format!(
                "invalid ngram range ({}, {})",
                self.ngram_min, self.ngram_max
            )));
        }
        if self.min_df == 0 {
            return Err(VectorizerError::InvalidParams(
                "min_df must be >= 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(VectorizerError::InvalidParams(
                "max_features must be >= 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        (self.ngram_min, self.ngram_max)
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_min: 1,
            ngram_max: 1,
            min_df: 1,
            max_features: Some(5_000),
            lowercase: true,
        }
    }
}
