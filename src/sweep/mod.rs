//! Evaluation sweep over every vectorizer and classifier combination.
//!
//! For each vectorizer the training text is vectorized once; every classifier
//! then gets a cross-validated grid search on those features, a refit with the
//! winning parameters and a scored prediction over the development split.
//! Errors abort the sweep.

pub mod report;
pub mod results;

use std::borrow::Cow;

use ndarray::{Array1, Array2, Axis};
use thiserror::Error;
use tracing::{info, warn};

use crate::dataset::{Dataset, DatasetError, LABELS};
use crate::features::{VectorizerConfig, VectorizerError};
use crate::ml::classifier::{self, ClassifierConfig, ClassifierError, ClassifierKind, densify};
use crate::ml::folds::stratified_sample;
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix, MetricsError, accuracy};
use crate::ml::search::{GridSearch, SearchError};

pub use results::{ResultRecord, ResultsError, ResultsTable};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("training split is empty")]
    EmptyTraining,
    #[error("development split is empty")]
    EmptyDevelopment,
    #[error("no vectorizers enabled")]
    NoVectorizers,
    #[error("no classifiers enabled")]
    NoClassifiers,
    #[error("vectorizer {vectorizer} failed: {source}")]
    Vectorizer {
        vectorizer: String,
        source: VectorizerError,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("grid search for {vectorizer} + {classifier} failed: {source}")]
    Search {
        vectorizer: String,
        classifier: String,
        source: SearchError,
    },
    #[error("refit of {vectorizer} + {classifier} failed: {source}")]
    Classifier {
        vectorizer: String,
        classifier: String,
        source: ClassifierError,
    },
    #[error(transparent)]
    Results(#[from] ResultsError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(
        "{vectorizer} features need {needed_mib} MiB dense ({rows} rows x {cols} terms), \
         over the {limit_mib} MiB limit; lower vectorizers.params.max_features or raise \
         limits.max_dense_mib"
    )]
    DenseTooLarge {
        vectorizer: String,
        rows: usize,
        cols: usize,
        needed_mib: u64,
        limit_mib: u64,
    },
    #[error(
        "linear_svm kernel over {rows} rows needs {needed_mib} MiB, over the {limit_mib} MiB \
         limit; lower classifiers.linear_svm.max_train_rows"
    )]
    KernelTooLarge {
        rows: usize,
        needed_mib: u64,
        limit_mib: u64,
    },
}

/// Memory ceilings checked before anything large is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepLimits {
    /// Largest dense matrix the sweep may build, in bytes. Covers one
    /// vectorizer's train + dev features and the linear SVM kernel.
    pub max_dense_bytes: u64,
    /// Linear SVM trains on a stratified sample of at most this many rows.
    pub svm_max_train_rows: Option<usize>,
}

impl Default for SweepLimits {
    fn default() -> Self {
        Self {
            max_dense_bytes: 4 * 1024 * 1024 * 1024,
            svm_max_train_rows: Some(10_000),
        }
    }
}

impl SweepLimits {
    fn check_features(
        &self,
        vectorizer: &str,
        rows: usize,
        cols: usize,
    ) -> Result<(), SweepError> {
        let bytes = dense_bytes(rows, cols);
        if bytes > self.max_dense_bytes {
            return Err(SweepError::DenseTooLarge {
                vectorizer: vectorizer.to_string(),
                rows,
                cols,
                needed_mib: mib(bytes),
                limit_mib: mib(self.max_dense_bytes),
            });
        }
        Ok(())
    }

    /// Rows the given classifier trains on out of `available`.
    fn training_rows(&self, kind: ClassifierKind, available: usize) -> Result<usize, SweepError> {
        if kind != ClassifierKind::LinearSvm {
            return Ok(available);
        }
        let rows = self
            .svm_max_train_rows
            .map_or(available, |cap| cap.min(available));
        let bytes = dense_bytes(rows, rows);
        if bytes > self.max_dense_bytes {
            return Err(SweepError::KernelTooLarge {
                rows,
                needed_mib: mib(bytes),
                limit_mib: mib(self.max_dense_bytes),
            });
        }
        Ok(rows)
    }
}

fn mib(bytes: u64) -> u64 {
    bytes.div_ceil(1024 * 1024)
}

fn dense_bytes(rows: usize, cols: usize) -> u64 {
    (rows as u64)
        .saturating_mul(cols as u64)
        .saturating_mul(std::mem::size_of::<f64>() as u64)
}

/// The enumerated configurations a sweep runs, in iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub vectorizers: Vec<VectorizerConfig>,
    pub classifiers: Vec<ClassifierConfig>,
    pub search: GridSearch,
    pub limits: SweepLimits,
}

/// Run every combination and collect one record per pair.
pub fn run_sweep(
    plan: &SweepPlan,
    train: &Dataset,
    dev: &Dataset,
) -> Result<ResultsTable, SweepError> {
    run_sweep_with_progress(plan, train, dev, &mut |_| {})
}

/// Like [`run_sweep`], calling `on_record` as soon as each record is stored.
pub fn run_sweep_with_progress(
    plan: &SweepPlan,
    train: &Dataset,
    dev: &Dataset,
    on_record: &mut dyn FnMut(&ResultRecord),
) -> Result<ResultsTable, SweepError> {
    if train.is_empty() {
        return Err(SweepError::EmptyTraining);
    }
    if dev.is_empty() {
        return Err(SweepError::EmptyDevelopment);
    }
    if plan.vectorizers.is_empty() {
        return Err(SweepError::NoVectorizers);
    }
    if plan.classifiers.is_empty() {
        return Err(SweepError::NoClassifiers);
    }
    info!(
        vectorizers = plan.vectorizers.len(),
        classifiers = plan.classifiers.len(),
        train = train.len(),
        dev = dev.len(),
        folds = plan.search.folds,
        "Starting sweep"
    );

    let mut table = ResultsTable::new();
    for vectorizer_config in &plan.vectorizers {
        let vectorizer_error = |source| SweepError::Vectorizer {
            vectorizer: vectorizer_config.name.clone(),
            source,
        };
        let vectorizer = vectorizer_config
            .fit(train.texts())
            .map_err(vectorizer_error)?;
        plan.limits.check_features(
            &vectorizer_config.name,
            train.len() + dev.len(),
            vectorizer.num_features(),
        )?;
        let train = train.clone().with_features(vectorizer.transform(train.texts()))?;
        let dev = dev.clone().with_features(vectorizer.transform(dev.texts()))?;
        let train_records = densify(train.require_features()?);
        let dev_records = densify(dev.require_features()?);
        let train_labels = Array1::from(train.labels().to_vec());
        info!(
            vectorizer = %vectorizer_config.name,
            features = vectorizer.num_features(),
            "Vectorized splits"
        );

        for classifier_config in &plan.classifiers {
            let rows = plan
                .limits
                .training_rows(classifier_config.kind, train_labels.len())?;
            let (records, labels) = training_subset(&train_records, &train_labels, rows);
            if rows < train_labels.len() {
                warn!(
                    classifier = %classifier_config.name,
                    rows,
                    available = train_labels.len(),
                    "Training on a stratified sample"
                );
            }
            let outcome = plan
                .search
                .run(classifier_config, &records, &labels)
                .map_err(|source| SweepError::Search {
                    vectorizer: vectorizer_config.name.clone(),
                    classifier: classifier_config.name.clone(),
                    source,
                })?;
            let model = classifier::fit(&outcome.best, &records, &labels).map_err(|source| {
                SweepError::Classifier {
                    vectorizer: vectorizer_config.name.clone(),
                    classifier: classifier_config.name.clone(),
                    source,
                }
            })?;
            let predicted = model.predict(&dev_records);
            let confusion = ConfusionMatrix::from_predictions(
                LABELS.len(),
                dev.labels(),
                &predicted.to_vec(),
            )?;
            let record = ResultRecord {
                vectorizer: vectorizer_config.name.clone(),
                classifier: classifier_config.name.clone(),
                accuracy: accuracy(&confusion),
                best_params: outcome.best,
                cv_score: outcome.best_score,
                report: ClassificationReport::from_confusion(&confusion),
                confusion,
            };
            info!(
                vectorizer = %record.vectorizer,
                classifier = %record.classifier,
                accuracy = record.accuracy,
                params = %record.best_params,
                "Scored combination"
            );
            table.push(record)?;
            if let Some(record) = table.records().last() {
                on_record(record);
            }
        }
    }
    Ok(table)
}

fn training_subset<'a>(
    records: &'a Array2<f64>,
    labels: &'a Array1<usize>,
    rows: usize,
) -> (Cow<'a, Array2<f64>>, Cow<'a, Array1<usize>>) {
    if rows >= labels.len() {
        return (Cow::Borrowed(records), Cow::Borrowed(labels));
    }
    let picked = stratified_sample(&labels.to_vec(), rows);
    (
        Cow::Owned(records.select(Axis(0), &picked)),
        Cow::Owned(labels.select(Axis(0), &picked)),
    )
}
