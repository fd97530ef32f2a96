//! Per-run tracing setup.
//!
//! Events go to stderr (stdout carries the report) and to
//! `<app dir>/logs/<utc timestamp>_<train stem>.log`. The file opens with a
//! header naming the splits and the settings file, so a log can be matched to
//! its run without reading it. Only the newest [`KEEP_LOGS`] files are kept.

use std::{
    fs,
    path::{Path, PathBuf},
};

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use tracing::{info, level_filters::LevelFilter};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{AppDirError, AppDirs, BaseSource};

pub const KEEP_LOGS: usize = 10;

const STAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error(transparent)]
    Dirs(#[from] AppDirError),
    #[error("Log file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to format log timestamp: {0}")]
    Stamp(#[from] time::error::Format),
    #[error("A global tracing subscriber is already installed")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// What a sweep run reads, recorded at the top of its log file.
#[derive(Debug, Clone, Copy)]
pub struct RunHeader<'a> {
    pub train: &'a Path,
    pub dev: &'a Path,
    /// `None` when built-in defaults are in use.
    pub config: Option<&'a Path>,
}

/// An open run log. Dropping it flushes buffered events to the file.
#[must_use = "dropping the run log stops file logging"]
pub struct RunLog {
    pub path: PathBuf,
    _flush: WorkerGuard,
}

/// Install the global subscriber and open this run's log file.
pub fn init(run: &RunHeader<'_>) -> Result<RunLog, LoggingError> {
    let dirs = AppDirs::resolve()?;
    let logs = dirs.create_logs_dir()?;
    let name = log_file_name(OffsetDateTime::now_utc(), run.train)?;
    let path = logs.join(&name);
    fs::write(&path, header(run, dirs.source())).map_err(|source| LoggingError::Io {
        path: path.clone(),
        source,
    })?;
    prune_logs(&logs, &name, KEEP_LOGS)?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&logs, &name));
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let stderr_layer = fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(file_writer);
    tracing::subscriber::set_global_default(
        Registry::default()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer),
    )?;

    info!(log = %path.display(), "Run log opened");
    Ok(RunLog {
        path,
        _flush: guard,
    })
}

/// `<timestamp>_<stem>.log`; names sort in creation order.
fn log_file_name(now: OffsetDateTime, train: &Path) -> Result<String, LoggingError> {
    let stamp = now.format(STAMP_FORMAT)?;
    let stem = train
        .file_stem()
        .map(|stem| {
            stem.to_string_lossy()
                .chars()
                .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
                .collect::<String>()
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "run".to_string());
    Ok(format!("{stamp}_{stem}.log"))
}

fn header(run: &RunHeader<'_>, base: BaseSource) -> String {
    let config = run
        .config
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());
    format!(
        "# senteval {}\n# train:  {}\n# dev:    {}\n# config: {}\n# app dir from {base}\n",
        env!("CARGO_PKG_VERSION"),
        run.train.display(),
        run.dev.display(),
        config,
    )
}

/// Delete the oldest `.log` files so at most `keep` remain. `current` is
/// never removed.
fn prune_logs(dir: &Path, current: &str, keep: usize) -> Result<(), LoggingError> {
    let read_error = |source| LoggingError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = fs::read_dir(dir)
        .map_err(read_error)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".log") && name != current)
        .collect::<Vec<_>>();
    names.sort_unstable_by(|a, b| b.cmp(a));
    for name in names.into_iter().skip(keep.saturating_sub(1)) {
        let path = dir.join(&name);
        fs::remove_file(&path).map_err(|source| LoggingError::Io { path, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_name_carries_utc_stamp_and_train_stem() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let name = log_file_name(at, Path::new("/data/SST-2/train.tsv")).unwrap();
        assert_eq!(name, "20231114T221320Z_train.log");
        let odd = log_file_name(at, Path::new("my split.v2.tsv")).unwrap();
        assert_eq!(odd, "20231114T221320Z_my_split_v2.log");
    }

    #[test]
    fn header_names_splits_and_config() {
        let run = RunHeader {
            train: Path::new("train.tsv"),
            dev: Path::new("dev.tsv"),
            config: None,
        };
        let text = header(&run, BaseSource::Env);
        assert!(text.contains("# train:  train.tsv\n"));
        assert!(text.contains("# dev:    dev.tsv\n"));
        assert!(text.contains("# config: built-in defaults\n"));
        assert!(text.contains("SENTEVAL_CONFIG_HOME"));
    }

    #[test]
    fn prune_keeps_newest_names_and_current_file() {
        let dir = tempdir().unwrap();
        for day in 10..22 {
            fs::write(dir.path().join(format!("202401{day}T000000Z_train.log")), "").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let current = "20240101T000000Z_train.log";
        fs::write(dir.path().join(current), "").unwrap();

        prune_logs(dir.path(), current, 10).unwrap();

        let mut left = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".log"))
            .collect::<Vec<_>>();
        left.sort();
        assert_eq!(left.len(), 10);
        assert_eq!(left[0], current);
        assert_eq!(left[1], "20240113T000000Z_train.log");
        assert!(dir.path().join("notes.txt").exists());
    }
}
