//! Text vectorizers turning sentences into sparse feature rows.
//!
//! Both vectorizers learn a vocabulary once from training text and never
//! extend it afterwards; terms unseen at fit time are dropped on transform.

mod count_vectorizer;
mod params;
mod tfidf_vectorizer;
mod tokenizer;

use std::fmt;

use serde::{Deserialize, Serialize};
use sprs::CsMat;
use thiserror::Error;

pub use count_vectorizer::CountVectorizer;
pub use params::VectorizerParams;
pub use tfidf_vectorizer::TfidfVectorizer;
pub use tokenizer::tokenize;

#[derive(Debug, Error)]
pub enum VectorizerError {
    #[error("invalid vectorizer parameters: {0}")]
    InvalidParams(String),
    #[error("empty vocabulary; training text contains no terms that pass the filters")]
    EmptyVocabulary,
}

/// Feature-extraction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorizerKind {
    Tfidf,
    Count,
}

impl VectorizerKind {
    pub const ALL: [VectorizerKind; 2] = [VectorizerKind::Tfidf, VectorizerKind::Count];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tfidf => "tfidf",
            Self::Count => "count",
        }
    }

    pub fn fit<T: AsRef<str>>(
        &self,
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<FittedVectorizer, VectorizerError> {
        match self {
            Self::Tfidf => TfidfVectorizer::fit(texts, params).map(FittedVectorizer::Tfidf),
            Self::Count => CountVectorizer::fit(texts, params).map(FittedVectorizer::Count),
        }
    }
}

impl fmt::Display for VectorizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One vectorizer entry of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerConfig {
    pub name: String,
    pub kind: VectorizerKind,
    pub params: VectorizerParams,
}

impl VectorizerConfig {
    pub fn new(kind: VectorizerKind, params: VectorizerParams) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            params,
        }
    }

    pub fn fit<T: AsRef<str>>(&self, texts: &[T]) -> Result<FittedVectorizer, VectorizerError> {
        self.kind.fit(texts, self.params.clone())
    }
}

#[derive(Debug, Clone)]
pub enum FittedVectorizer {
    Tfidf(TfidfVectorizer),
    Count(CountVectorizer),
}

impl FittedVectorizer {
    pub fn transform<T: AsRef<str>>(&self, texts: &[T]) -> CsMat<f64> {
        match self {
            Self::Tfidf(vectorizer) => vectorizer.transform(texts),
            Self::Count(vectorizer) => vectorizer.transform(texts),
        }
    }

    pub fn num_features(&self) -> usize {
        match self {
            Self::Tfidf(vectorizer) => vectorizer.num_features(),
            Self::Count(vectorizer) => vectorizer.num_features(),
        }
    }

    pub fn vocabulary(&self) -> Vec<&str> {
        match self {
            Self::Tfidf(vectorizer) => vectorizer.vocabulary(),
            Self::Count(vectorizer) => vectorizer.vocabulary(),
        }
    }
}
