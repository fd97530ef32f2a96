//! Cross-validated grid search over a classifier's candidate parameter sets.

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::classifier::{self, ClassifierConfig, ClassifierError, ParamSet};
use super::folds::{Fold, stratified_k_fold};
use super::metrics::{ConfusionMatrix, MetricsError, accuracy};
use crate::dataset::LABELS;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("cross-validation needs at least 2 folds, got {0}")]
    InvalidFolds(usize),
    #[error("label {label} has {count} training examples, fewer than the {folds} folds requested")]
    TooFewMembers {
        label: usize,
        count: usize,
        folds: usize,
    },
    #[error("label {0} is not 0 or 1")]
    UnknownLabel(usize),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Mean cross-validated accuracy of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub params: ParamSet,
    pub mean_accuracy: f64,
    pub fold_accuracies: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: ParamSet,
    /// Mean CV accuracy of `best`; `None` when the grid had a single
    /// candidate and no cross-validation ran.
    pub best_score: Option<f64>,
    pub scores: Vec<CandidateScore>,
}

/// Exhaustive search scored by stratified k-fold accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSearch {
    pub folds: usize,
    pub shuffle_seed: Option<u64>,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self {
            folds: 5,
            shuffle_seed: None,
        }
    }
}

impl GridSearch {
    pub fn new(folds: usize, shuffle_seed: Option<u64>) -> Self {
        Self {
            folds,
            shuffle_seed,
        }
    }

    /// Pick the candidate with the highest mean fold accuracy. The first
    /// candidate in grid order wins ties.
    pub fn run(
        &self,
        config: &ClassifierConfig,
        records: &Array2<f64>,
        labels: &Array1<usize>,
    ) -> Result<SearchOutcome, SearchError> {
        config.validate()?;
        if let [only] = config.grid.as_slice() {
            debug!(
                classifier = %config.name,
                params = %only,
                "Single candidate grid, skipping cross-validation"
            );
            return Ok(SearchOutcome {
                best: only.clone(),
                best_score: None,
                scores: Vec::new(),
            });
        }

        let label_slice = labels.to_vec();
        let folds = stratified_k_fold(&label_slice, self.folds, self.shuffle_seed)?;
        let mut scores = Vec::with_capacity(config.grid.len());
        for params in &config.grid {
            let fold_accuracies = folds
                .iter()
                .map(|fold| score_fold(params, fold, records, labels))
                .collect::<Result<Vec<_>, _>>()?;
            let mean_accuracy = fold_accuracies.iter().sum::<f64>() / fold_accuracies.len() as f64;
            debug!(
                classifier = %config.name,
                params = %params,
                mean_accuracy,
                "Scored candidate"
            );
            scores.push(CandidateScore {
                params: params.clone(),
                mean_accuracy,
                fold_accuracies,
            });
        }

        let mut best_idx = 0usize;
        for (idx, score) in scores.iter().enumerate().skip(1) {
            if score.mean_accuracy > scores[best_idx].mean_accuracy {
                best_idx = idx;
            }
        }
        let best = &scores[best_idx];
        info!(
            classifier = %config.name,
            params = %best.params,
            mean_accuracy = best.mean_accuracy,
            folds = self.folds,
            "Grid search selected parameters"
        );
        Ok(SearchOutcome {
            best: best.params.clone(),
            best_score: Some(best.mean_accuracy),
            scores,
        })
    }
}

fn score_fold(
    params: &ParamSet,
    fold: &Fold,
    records: &Array2<f64>,
    labels: &Array1<usize>,
) -> Result<f64, SearchError> {
    let train_records = records.select(Axis(0), &fold.train);
    let train_labels = labels.select(Axis(0), &fold.train);
    let test_records = records.select(Axis(0), &fold.test);
    let test_labels = labels.select(Axis(0), &fold.test);

    let model = classifier::fit(params, &train_records, &train_labels)?;
    let predicted = model.predict(&test_records);
    let cm = ConfusionMatrix::from_predictions(
        LABELS.len(),
        &test_labels.to_vec(),
        &predicted.to_vec(),
    )?;
    Ok(accuracy(&cm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::ClassifierKind;

    fn separable(n_per_class: usize) -> (Array2<f64>, Array1<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            let jitter = (i % 3) as f64;
            rows.extend_from_slice(&[4.0 + jitter, 1.0]);
            labels.push(1);
            rows.extend_from_slice(&[1.0, 4.0 + jitter]);
            labels.push(0);
        }
        let records = Array2::from_shape_vec((labels.len(), 2), rows).unwrap();
        (records, Array1::from(labels))
    }

    #[test]
    fn single_candidate_skips_cross_validation() {
        let config = ClassifierConfig::new(
            ClassifierKind::NaiveBayes,
            vec![ParamSet::NaiveBayes { alpha: 1.0 }],
        )
        .unwrap();
        // Two examples cannot be split into five stratified folds.
        let (records, labels) = separable(1);
        let outcome = GridSearch::default().run(&config, &records, &labels).unwrap();
        assert_eq!(outcome.best, ParamSet::NaiveBayes { alpha: 1.0 });
        assert_eq!(outcome.best_score, None);
        assert!(outcome.scores.is_empty());
    }

    #[test]
    fn ties_go_to_the_first_candidate() {
        let grid = vec![
            ParamSet::NaiveBayes { alpha: 0.1 },
            ParamSet::NaiveBayes { alpha: 0.5 },
            ParamSet::NaiveBayes { alpha: 1.0 },
        ];
        let config = ClassifierConfig::new(ClassifierKind::NaiveBayes, grid).unwrap();
        let (records, labels) = separable(10);
        let outcome = GridSearch::default().run(&config, &records, &labels).unwrap();
        assert_eq!(outcome.scores.len(), 3);
        assert!(outcome.scores.iter().all(|s| s.mean_accuracy == 1.0));
        assert_eq!(outcome.best, ParamSet::NaiveBayes { alpha: 0.1 });
        assert_eq!(outcome.best_score, Some(1.0));
    }

    #[test]
    fn scores_are_fractions() {
        let grid = vec![
            ParamSet::DecisionTree {
                max_depth: Some(1),
                min_weight_split: 2.0,
            },
            ParamSet::DecisionTree {
                max_depth: None,
                min_weight_split: 2.0,
            },
        ];
        let config = ClassifierConfig::new(ClassifierKind::DecisionTree, grid).unwrap();
        let (records, labels) = separable(6);
        let outcome = GridSearch::new(3, Some(42))
            .run(&config, &records, &labels)
            .unwrap();
        for score in &outcome.scores {
            assert_eq!(score.fold_accuracies.len(), 3);
            assert!((0.0..=1.0).contains(&score.mean_accuracy));
        }
    }

    #[test]
    fn too_few_examples_for_the_folds_is_an_error() {
        let grid = vec![
            ParamSet::LinearSvm { c: 0.1 },
            ParamSet::LinearSvm { c: 1.0 },
        ];
        let config = ClassifierConfig::new(ClassifierKind::LinearSvm, grid).unwrap();
        let (records, labels) = separable(2);
        let err = GridSearch::default()
            .run(&config, &records, &labels)
            .unwrap_err();
        assert!(matches!(err, SearchError::TooFewMembers { folds: 5, .. }));
    }
}
