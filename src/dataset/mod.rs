//! Labeled sentence datasets and split loading.

pub mod loader;

use std::{fmt, sync::Arc};

use sprs::CsMat;
use thiserror::Error;

pub use loader::{DatasetLoadError, load_split};

/// Sentiment labels accepted in a split.
pub const LABELS: [usize; 2] = [0, 1];

/// Which half of the labeled data a [`Dataset`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Training,
    Development,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Development => write!(f, "development"),
        }
    }
}

/// A single sentence with its sentiment label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub text: String,
    pub label: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("{texts} texts but {labels} labels")]
    LengthMismatch { texts: usize, labels: usize },
    #[error("feature matrix has {rows} rows for {texts} texts")]
    FeatureRowsMismatch { rows: usize, texts: usize },
    #[error("no feature matrix attached")]
    NoFeatures,
}

/// Ordered texts and labels of one split, optionally with a feature matrix.
///
/// Texts, labels and feature rows always have the same length. The value is
/// immutable; attaching features produces a new dataset that shares the
/// texts and labels of the old one.
#[derive(Debug, Clone)]
pub struct Dataset {
    texts: Arc<[String]>,
    labels: Arc<[usize]>,
    features: Option<CsMat<f64>>,
}

impl Dataset {
    pub fn new(texts: Vec<String>, labels: Vec<usize>) -> Result<Self, DatasetError> {
        if texts.len() != labels.len() {
            return Err(DatasetError::LengthMismatch {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        Ok(Self {
            texts: texts.into(),
            labels: labels.into(),
            features: None,
        })
    }

    pub fn from_examples(examples: Vec<LabeledExample>) -> Self {
        let (texts, labels): (Vec<String>, Vec<usize>) = examples
            .into_iter()
            .map(|example| (example.text, example.label))
            .unzip();
        Self {
            texts: texts.into(),
            labels: labels.into(),
            features: None,
        }
    }

    /// Attach a feature matrix with one row per text.
    pub fn with_features(self, features: CsMat<f64>) -> Result<Self, DatasetError> {
        if features.rows() != self.texts.len() {
            return Err(DatasetError::FeatureRowsMismatch {
                rows: features.rows(),
                texts: self.texts.len(),
            });
        }
        Ok(Self {
            features: Some(features),
            ..self
        })
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn features(&self) -> Option<&CsMat<f64>> {
        self.features.as_ref()
    }

    /// The attached matrix, or [`DatasetError::NoFeatures`].
    pub fn require_features(&self) -> Result<&CsMat<f64>, DatasetError> {
        self.features.as_ref().ok_or(DatasetError::NoFeatures)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Number of examples per label in [`LABELS`] order.
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &label in self.labels.iter() {
            if let Some(slot) = counts.get_mut(label) {
                *slot += 1;
            }
        }
        counts
    }

    pub fn examples(&self) -> impl Iterator<Item = LabeledExample> + '_ {
        self.texts
            .iter()
            .zip(self.labels.iter())
            .map(|(text, &label)| LabeledExample {
                text: text.clone(),
                label,
            })
    }
}
