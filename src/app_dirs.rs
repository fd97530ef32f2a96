//! Where senteval keeps its own files: `<base>/.senteval/config.toml` and
//! `<base>/.senteval/logs/`.
//!
//! The base is the OS config directory unless `SENTEVAL_CONFIG_HOME` names
//! another one.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Mutex,
};

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".senteval";
pub const CONFIG_HOME_ENV: &str = "SENTEVAL_CONFIG_HOME";
pub const CONFIG_FILE_NAME: &str = "config.toml";
const LOGS_DIR_NAME: &str = "logs";

static BASE_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory available; set {CONFIG_HOME_ENV}")]
    NoBaseDir,
    #[error("Unable to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How the base directory was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSource {
    Override,
    Env,
    Platform,
}

impl fmt::Display for BaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Override => f.write_str("override"),
            Self::Env => f.write_str(CONFIG_HOME_ENV),
            Self::Platform => f.write_str("platform config dir"),
        }
    }
}

/// The resolved `.senteval` directory. Resolving never touches the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
    source: BaseSource,
}

impl AppDirs {
    pub fn resolve() -> Result<Self, AppDirError> {
        let (base, source) = base_dir().ok_or(AppDirError::NoBaseDir)?;
        Ok(Self {
            root: base.join(APP_DIR_NAME),
            source,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> BaseSource {
        self.source
    }

    /// Default settings file; it may not exist.
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Per-run log directory, created on demand.
    pub fn create_logs_dir(&self) -> Result<PathBuf, AppDirError> {
        let path = self.root.join(LOGS_DIR_NAME);
        std::fs::create_dir_all(&path).map_err(|source| AppDirError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn base_dir() -> Option<(PathBuf, BaseSource)> {
    let overridden = BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|slot| slot.clone());
    if let Some(path) = overridden {
        return Some((path, BaseSource::Override));
    }
    match std::env::var_os(CONFIG_HOME_ENV) {
        Some(path) if !path.is_empty() => Some((PathBuf::from(path), BaseSource::Env)),
        _ => BaseDirs::new().map(|dirs| (dirs.config_dir().to_path_buf(), BaseSource::Platform)),
    }
}

/// Points [`AppDirs::resolve`] at a temporary base for one test at a time.
#[cfg(test)]
pub(crate) struct OverrideGuard {
    _serial: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
static OVERRIDE_SERIAL: Mutex<()> = Mutex::new(());

#[cfg(test)]
impl OverrideGuard {
    pub(crate) fn set(path: PathBuf) -> Self {
        let serial = OVERRIDE_SERIAL
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        *BASE_OVERRIDE.lock().unwrap_or_else(|err| err.into_inner()) = Some(path);
        Self { _serial: serial }
    }
}

#[cfg(test)]
impl Drop for OverrideGuard {
    fn drop(&mut self) {
        *BASE_OVERRIDE.lock().unwrap_or_else(|err| err.into_inner()) = None;
    }
}
