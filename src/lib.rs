//! Library exports for the sweep binary, benchmarks and tests.
/// Application directory resolution.
pub mod app_dirs;
/// TOML settings and sweep plan construction.
pub mod config;
/// Labeled splits and TSV loading.
pub mod dataset;
/// Text vectorizers.
pub mod features;
/// Tracing subscriber setup.
pub mod logging;
/// Classifiers, grid search and metrics.
pub mod ml;
/// The evaluation sweep and its report.
pub mod sweep;
