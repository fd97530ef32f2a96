//! Append-only table of per-combination results.

use serde::Serialize;
use thiserror::Error;

use crate::ml::classifier::ParamSet;
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResultsError {
    #[error("results already contain {vectorizer} + {classifier}")]
    Duplicate {
        vectorizer: String,
        classifier: String,
    },
}

/// Outcome of evaluating one vectorizer and classifier pair on the
/// development split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub vectorizer: String,
    pub classifier: String,
    pub accuracy: f64,
    pub best_params: ParamSet,
    /// Mean cross-validated accuracy of `best_params`, absent when the grid
    /// had a single candidate.
    pub cv_score: Option<f64>,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
}

/// Records in insertion order. A record cannot be changed or replaced once
/// pushed.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    records: Vec<ResultRecord>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    vectorizer: &'a str,
    model: &'a str,
    accuracy: f64,
    best_params: &'a ParamSet,
    cv_score: Option<f64>,
    confusion_matrix: Vec<Vec<u64>>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) -> Result<(), ResultsError> {
        if self.get(&record.vectorizer, &record.classifier).is_some() {
            return Err(ResultsError::Duplicate {
                vectorizer: record.vectorizer,
                classifier: record.classifier,
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, vectorizer: &str, classifier: &str) -> Option<&ResultRecord> {
        self.records
            .iter()
            .find(|record| record.vectorizer == vectorizer && record.classifier == classifier)
    }

    /// Vectorizer names in order of first appearance.
    pub fn vectorizer_names(&self) -> Vec<&str> {
        unique_in_order(self.records.iter().map(|record| record.vectorizer.as_str()))
    }

    /// Classifier names in order of first appearance.
    pub fn classifier_names(&self) -> Vec<&str> {
        unique_in_order(self.records.iter().map(|record| record.classifier.as_str()))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let rows = self
            .records
            .iter()
            .map(|record| JsonRow {
                vectorizer: &record.vectorizer,
                model: &record.classifier,
                accuracy: record.accuracy,
                best_params: &record.best_params,
                cv_score: record.cv_score,
                confusion_matrix: (0..record.confusion.n_classes)
                    .map(|truth| {
                        (0..record.confusion.n_classes)
                            .map(|predicted| record.confusion.get(truth, predicted))
                            .collect()
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();
        serde_json::to_string_pretty(&rows)
    }
}

fn unique_in_order<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(vectorizer: &str, classifier: &str, accuracy: f64) -> ResultRecord {
        let confusion =
            ConfusionMatrix::from_predictions(2, &[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap();
        ResultRecord {
            vectorizer: vectorizer.to_string(),
            classifier: classifier.to_string(),
            accuracy,
            best_params: ParamSet::NaiveBayes { alpha: 0.5 },
            cv_score: Some(0.7),
            report: ClassificationReport::from_confusion(&confusion),
            confusion,
        }
    }

    #[test]
    fn rejects_duplicate_pairs() {
        let mut table = ResultsTable::new();
        table.push(record("tfidf", "naive_bayes", 0.8)).unwrap();
        let err = table.push(record("tfidf", "naive_bayes", 0.9)).unwrap_err();
        assert_eq!(
            err,
            ResultsError::Duplicate {
                vectorizer: "tfidf".into(),
                classifier: "naive_bayes".into()
            }
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].accuracy, 0.8);
    }

    #[test]
    fn names_keep_insertion_order() {
        let mut table = ResultsTable::new();
        for vectorizer in ["tfidf", "count"] {
            for classifier in ["linear_svm", "naive_bayes"] {
                table.push(record(vectorizer, classifier, 0.5)).unwrap();
            }
        }
        assert_eq!(table.vectorizer_names(), vec!["tfidf", "count"]);
        assert_eq!(table.classifier_names(), vec!["linear_svm", "naive_bayes"]);
        assert!(table.get("count", "linear_svm").is_some());
    }

    #[test]
    fn json_rows_carry_model_and_accuracy() {
        let mut table = ResultsTable::new();
        table.push(record("count", "naive_bayes", 0.75)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["model"], "naive_bayes");
        assert_eq!(value[0]["accuracy"], 0.75);
        assert_eq!(value[0]["best_params"]["model"], "naive_bayes");
        assert_eq!(value[0]["confusion_matrix"][1][0], 1);
    }
}
