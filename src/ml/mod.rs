//! Classifier backends, cross-validated hyperparameter search and metrics.
//!
//! Model training itself is delegated to linfa; these modules pick parameters,
//! split folds and score predictions.

pub mod classifier;
pub mod folds;
pub mod metrics;
pub mod search;
