//! TOML settings for a sweep.
//!
//! Resolution order: an explicit `--config` path, then
//! `<config dir>/.senteval/config.toml` when it exists, then built-in
//! defaults. Every field has a default so partial files are fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::app_dirs::{AppDirError, AppDirs};
use crate::features::{VectorizerConfig, VectorizerError, VectorizerKind, VectorizerParams};
use crate::ml::classifier::{ClassifierConfig, ClassifierError, ClassifierKind, ParamSet};
use crate::ml::search::GridSearch;
use crate::sweep::{SweepLimits, SweepPlan};

pub use crate::app_dirs::CONFIG_FILE_NAME;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Dirs(#[from] AppDirError),
    #[error("Invalid settings: {0}")]
    Invalid(String),
    #[error(transparent)]
    Vectorizer(#[from] VectorizerError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Everything a sweep run can be configured with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub vectorizers: VectorizerSettings,
    pub classifiers: ClassifierSettings,
    pub limits: LimitSettings,
}

/// Where the splits live and how their columns are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Training split; `--train` takes precedence.
    pub train_path: Option<PathBuf>,
    /// Development split; `--dev` takes precedence.
    pub dev_path: Option<PathBuf>,
    /// Without headers, the text is column 0 and the label column 1.
    pub has_headers: bool,
    pub text_column: String,
    pub label_column: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            train_path: None,
            dev_path: None,
            has_headers: true,
            text_column: "sentence".to_string(),
            label_column: "label".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Cross-validation folds per grid search.
    pub folds: usize,
    /// Shuffle class members before dealing them into folds.
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            folds: 5,
            shuffle: false,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Largest dense matrix a sweep may allocate: one vectorizer's train +
    /// dev features, or the linear SVM kernel.
    pub max_dense_mib: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_dense_mib: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerSettings {
    /// Vectorizers to run, in sweep order.
    pub enabled: Vec<VectorizerKind>,
    pub params: VectorizerParams,
}

impl Default for VectorizerSettings {
    fn default() -> Self {
        Self {
            enabled: VectorizerKind::ALL.to_vec(),
            params: VectorizerParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub logistic_regression: LogisticRegressionGrid,
    pub naive_bayes: NaiveBayesGrid,
    pub linear_svm: LinearSvmGrid,
    pub decision_tree: DecisionTreeGrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionGrid {
    pub enabled: bool,
    pub c: Vec<f64>,
    /// Iteration cap; reaching it still yields a usable model.
    pub max_iterations: u64,
}

impl Default for LogisticRegressionGrid {
    fn default() -> Self {
        Self {
            enabled: true,
            c: vec![0.1, 1.0, 10.0],
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveBayesGrid {
    pub enabled: bool,
    pub alpha: Vec<f64>,
}

impl Default for NaiveBayesGrid {
    fn default() -> Self {
        Self {
            enabled: true,
            alpha: vec![0.1, 0.5, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearSvmGrid {
    pub enabled: bool,
    pub c: Vec<f64>,
    /// Train on a stratified sample of at most this many rows; `0` keeps all.
    /// The kernel grows with the square of this.
    pub max_train_rows: usize,
}

impl Default for LinearSvmGrid {
    fn default() -> Self {
        Self {
            enabled: true,
            c: vec![0.1, 1.0, 10.0],
            max_train_rows: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeGrid {
    pub enabled: bool,
    /// `0` means unbounded depth.
    pub max_depth: Vec<usize>,
    pub min_weight_split: Vec<f32>,
}

impl Default for DecisionTreeGrid {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: vec![0, 20],
            min_weight_split: vec![2.0, 10.0],
        }
    }
}

impl ClassifierSettings {
    /// Enabled classifiers in fixed order, each with its expanded grid.
    pub fn configs(&self) -> Result<Vec<ClassifierConfig>, ClassifierError> {
        let mut configs = Vec::new();
        if self.logistic_regression.enabled {
            let grid = &self.logistic_regression;
            let params = grid
                .c
                .iter()
                .map(|&c| ParamSet::LogisticRegression {
                    c,
                    max_iterations: grid.max_iterations,
                })
                .collect();
            configs.push(ClassifierConfig::new(
                ClassifierKind::LogisticRegression,
                params,
            )?);
        }
        if self.naive_bayes.enabled {
            let params = self
                .naive_bayes
                .alpha
                .iter()
                .map(|&alpha| ParamSet::NaiveBayes { alpha })
                .collect();
            configs.push(ClassifierConfig::new(ClassifierKind::NaiveBayes, params)?);
        }
        if self.linear_svm.enabled {
            let params = self
                .linear_svm
                .c
                .iter()
                .map(|&c| ParamSet::LinearSvm { c })
                .collect();
            configs.push(ClassifierConfig::new(ClassifierKind::LinearSvm, params)?);
        }
        if self.decision_tree.enabled {
            let grid = &self.decision_tree;
            let mut params = Vec::with_capacity(grid.max_depth.len() * grid.min_weight_split.len());
            for &depth in &grid.max_depth {
                for &min_weight_split in &grid.min_weight_split {
                    params.push(ParamSet::DecisionTree {
                        max_depth: (depth > 0).then_some(depth),
                        min_weight_split,
                    });
                }
            }
            configs.push(ClassifierConfig::new(ClassifierKind::DecisionTree, params)?);
        }
        Ok(configs)
    }
}

impl Settings {
    /// Build the sweep configuration, validating every section.
    pub fn sweep_plan(&self) -> Result<SweepPlan, ConfigError> {
        if self.search.folds < 2 {
            return Err(ConfigError::Invalid(format!(
                "search.folds must be >= 2, got {}",
                self.search.folds
            )));
        }
        if self.limits.max_dense_mib == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_dense_mib must be >= 1".to_string(),
            ));
        }
        self.vectorizers.params.validate()?;
        let mut vectorizers: Vec<VectorizerConfig> = Vec::new();
        for &kind in &self.vectorizers.enabled {
            if vectorizers.iter().any(|config| config.kind == kind) {
                return Err(ConfigError::Invalid(format!(
                    "vectorizer {kind} listed more than once"
                )));
            }
            vectorizers.push(VectorizerConfig::new(
                kind,
                self.vectorizers.params.clone(),
            ));
        }
        let classifiers = self.classifiers.configs()?;
        let search = GridSearch::new(
            self.search.folds,
            self.search.shuffle.then_some(self.search.seed),
        );
        let svm_rows = self.classifiers.linear_svm.max_train_rows;
        let limits = SweepLimits {
            max_dense_bytes: self.limits.max_dense_mib.saturating_mul(1024 * 1024),
            svm_max_train_rows: (svm_rows > 0).then_some(svm_rows),
        };
        debug!(
            vectorizers = vectorizers.len(),
            classifiers = classifiers.len(),
            "Built sweep plan"
        );
        Ok(SweepPlan {
            vectorizers,
            classifiers,
            search,
            limits,
        })
    }
}

/// Resolve the default configuration file path without creating anything.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(AppDirs::resolve()?.config_file())
}

/// Load settings from an explicit path, which must exist.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Loaded config");
    Ok(settings)
}

/// Load the default config file, returning defaults if it is missing.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    resolve(None)
}

/// The settings file a run reads: `--config` when given, else the default
/// file if it exists. `None` means built-in defaults.
pub fn source_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }
    let path = config_path()?;
    if path.is_file() {
        Ok(Some(path))
    } else {
        debug!(path = %path.display(), "No config file, using defaults");
        Ok(None)
    }
}

/// Load whatever [`source_file`] picks.
pub fn resolve(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    match source_file(explicit)? {
        Some(path) => load_from(&path),
        None => Ok(Settings::default()),
    }
}
