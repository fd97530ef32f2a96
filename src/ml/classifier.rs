//! The four off-the-shelf classifiers, their parameter sets and fitted models.
//!
//! Training is delegated to the linfa backends; this module only translates a
//! [`ParamSet`] into the matching linfa hyperparameters and maps labels in and
//! out of each backend's target type.

use std::fmt;

use linfa::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_bayes::MultinomialNb;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use linfa_svm::Svm;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use sprs::CsMat;
use thiserror::Error;
use tracing::debug;

use crate::dataset::LABELS;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("parameter grid for {classifier} is empty")]
    EmptyGrid { classifier: String },
    #[error("invalid parameters for {classifier}: {reason}")]
    InvalidParams { classifier: String, reason: String },
    #[error("parameter set ({params}) does not belong to {classifier}")]
    KindMismatch { classifier: String, params: String },
    #[error("{rows} feature rows but {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },
    #[error("label {0} is not 0 or 1")]
    InvalidLabel(usize),
    #[error("failed to fit {classifier} ({params}): {message}")]
    Fit {
        classifier: &'static str,
        params: String,
        message: String,
    },
}

/// Learning algorithm behind a classifier configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    LogisticRegression,
    NaiveBayes,
    LinearSvm,
    DecisionTree,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 4] = [
        ClassifierKind::LogisticRegression,
        ClassifierKind::NaiveBayes,
        ClassifierKind::LinearSvm,
        ClassifierKind::DecisionTree,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::NaiveBayes => "naive_bayes",
            Self::LinearSvm => "linear_svm",
            Self::DecisionTree => "decision_tree",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One candidate point of a hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ParamSet {
    LogisticRegression {
        /// Inverse regularization strength; the backend penalty is `1 / c`.
        c: f64,
        max_iterations: u64,
    },
    NaiveBayes {
        alpha: f64,
    },
    LinearSvm {
        c: f64,
    },
    DecisionTree {
        /// `None` grows the tree until leaves are pure.
        max_depth: Option<usize>,
        min_weight_split: f32,
    },
}

impl ParamSet {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            Self::LogisticRegression { .. } => ClassifierKind::LogisticRegression,
            Self::NaiveBayes { .. } => ClassifierKind::NaiveBayes,
            Self::LinearSvm { .. } => ClassifierKind::LinearSvm,
            Self::DecisionTree { .. } => ClassifierKind::DecisionTree,
        }
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        let invalid = |reason: &str| ClassifierError::InvalidParams {
            classifier: self.kind().name().to_string(),
            reason: reason.to_string(),
        };
        match *self {
            Self::LogisticRegression { c, max_iterations } => {
                if !(c.is_finite() && c > 0.0) {
                    return Err(invalid("C must be a positive number"));
                }
                if max_iterations == 0 {
                    return Err(invalid("max_iterations must be >= 1"));
                }
            }
            Self::NaiveBayes { alpha } => {
                if !(alpha.is_finite() && alpha > 0.0) {
                    return Err(invalid("alpha must be a positive number"));
                }
            }
            Self::LinearSvm { c } => {
                if !(c.is_finite() && c > 0.0) {
                    return Err(invalid("C must be a positive number"));
                }
            }
            Self::DecisionTree {
                max_depth,
                min_weight_split,
            } => {
                if max_depth == Some(0) {
                    return Err(invalid("max_depth must be >= 1 when set"));
                }
                if !(min_weight_split.is_finite() && min_weight_split >= 1.0) {
                    return Err(invalid("min_weight_split must be >= 1"));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogisticRegression { c, max_iterations } => {
                write!(f, "C={c}, max_iterations={max_iterations}")
            }
            Self::NaiveBayes { alpha } => write!(f, "alpha={alpha}"),
            Self::LinearSvm { c } => write!(f, "C={c}"),
            Self::DecisionTree {
                max_depth,
                min_weight_split,
            } => match max_depth {
                Some(depth) => write!(f, "max_depth={depth}, min_weight_split={min_weight_split}"),
                None => write!(f, "max_depth=None, min_weight_split={min_weight_split}"),
            },
        }
    }
}

/// A named classifier plus its explicit, non-empty candidate grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub name: String,
    pub kind: ClassifierKind,
    pub grid: Vec<ParamSet>,
}

impl ClassifierConfig {
    pub fn new(kind: ClassifierKind, grid: Vec<ParamSet>) -> Result<Self, ClassifierError> {
        let config = Self {
            name: kind.name().to_string(),
            kind,
            grid,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.grid.is_empty() {
            return Err(ClassifierError::EmptyGrid {
                classifier: self.name.clone(),
            });
        }
        for params in &self.grid {
            if params.kind() != self.kind {
                return Err(ClassifierError::KindMismatch {
                    classifier: self.name.clone(),
                    params: params.to_string(),
                });
            }
            params.validate()?;
        }
        Ok(())
    }
}

/// A trained model from one of the backends.
pub enum FittedClassifier {
    LogisticRegression(FittedLogisticRegression<f64, usize>),
    NaiveBayes(MultinomialNb<f64, usize>),
    LinearSvm(Svm<f64, bool>),
    DecisionTree(DecisionTree<f64, usize>),
}

impl fmt::Debug for FittedClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::LogisticRegression(_) => ClassifierKind::LogisticRegression,
            Self::NaiveBayes(_) => ClassifierKind::NaiveBayes,
            Self::LinearSvm(_) => ClassifierKind::LinearSvm,
            Self::DecisionTree(_) => ClassifierKind::DecisionTree,
        };
        f.debug_tuple("FittedClassifier").field(&kind).finish()
    }
}

impl FittedClassifier {
    /// Predict a 0/1 label for each row of `records`.
    pub fn predict(&self, records: &Array2<f64>) -> Array1<usize> {
        match self {
            Self::LogisticRegression(model) => model.predict(records),
            Self::NaiveBayes(model) => model.predict(records),
            Self::LinearSvm(model) => {
                let predicted: Array1<bool> = model.predict(records);
                predicted.mapv(usize::from)
            }
            Self::DecisionTree(model) => model.predict(records),
        }
    }
}

/// Fit the classifier described by `params` on dense features and 0/1 labels.
pub fn fit(
    params: &ParamSet,
    records: &Array2<f64>,
    labels: &Array1<usize>,
) -> Result<FittedClassifier, ClassifierError> {
    if records.nrows() != labels.len() {
        return Err(ClassifierError::ShapeMismatch {
            rows: records.nrows(),
            labels: labels.len(),
        });
    }
    if let Some(&label) = labels.iter().find(|&&label| !LABELS.contains(&label)) {
        return Err(ClassifierError::InvalidLabel(label));
    }
    params.validate()?;
    debug!(
        classifier = params.kind().name(),
        params = %params,
        rows = records.nrows(),
        features = records.ncols(),
        "Fitting classifier"
    );

    let classifier = params.kind().name();
    let fit_error = |message: String| ClassifierError::Fit {
        classifier,
        params: params.to_string(),
        message,
    };
    let dataset = DatasetBase::new(records.view(), labels.view());

    let fitted = match *params {
        ParamSet::LogisticRegression { c, max_iterations } => {
            let model = LogisticRegression::default()
                .alpha(1.0 / c)
                .max_iterations(max_iterations)
                .fit(&dataset)
                .map_err(|err| fit_error(err.to_string()))?;
            FittedClassifier::LogisticRegression(model)
        }
        ParamSet::NaiveBayes { alpha } => {
            let model = MultinomialNb::<f64, usize>::params()
                .alpha(alpha)
                .fit(&dataset)
                .map_err(|err| fit_error(err.to_string()))?;
            FittedClassifier::NaiveBayes(model)
        }
        ParamSet::LinearSvm { c } => {
            let targets = labels.mapv(|label| label == 1);
            let dataset = DatasetBase::new(records.view(), targets.view());
            let model = Svm::<f64, bool>::params()
                .pos_neg_weights(c, c)
                .linear_kernel()
                .fit(&dataset)
                .map_err(|err| fit_error(err.to_string()))?;
            FittedClassifier::LinearSvm(model)
        }
        ParamSet::DecisionTree {
            max_depth,
            min_weight_split,
        } => {
            let model = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(max_depth)
                .min_weight_split(min_weight_split)
                .fit(&dataset)
                .map_err(|err| fit_error(err.to_string()))?;
            FittedClassifier::DecisionTree(model)
        }
    };
    Ok(fitted)
}

/// Expand a CSR matrix into the dense layout the backends train on.
pub fn densify(matrix: &CsMat<f64>) -> Array2<f64> {
    let mut dense = Array2::zeros((matrix.rows(), matrix.cols()));
    if matrix.is_csr() {
        for (row_idx, row) in matrix.outer_iterator().enumerate() {
            for (col_idx, &value) in row.iter() {
                dense[[row_idx, col_idx]] = value;
            }
        }
    } else {
        for (col_idx, col) in matrix.outer_iterator().enumerate() {
            for (row_idx, &value) in col.iter() {
                dense[[row_idx, col_idx]] = value;
            }
        }
    }
    dense
}
