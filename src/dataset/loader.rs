//! Tab-separated split loader.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::DataSettings;

use super::{Dataset, LABELS, LabeledExample, Split};

#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("Failed to open {path}: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },
    #[error("{path} has no column named {column:?}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path}:{line}: missing {field} field")]
    MissingField {
        path: PathBuf,
        line: u64,
        field: &'static str,
    },
    #[error("{path}:{line}: invalid label {value:?} (expected 0 or 1)")]
    InvalidLabel {
        path: PathBuf,
        line: u64,
        value: String,
    },
}

/// Load one split from a TSV file.
///
/// With headers, the text and label columns are looked up by name; without,
/// columns 0 and 1 are used. Quote characters are kept as part of the text.
pub fn load_split(
    path: &Path,
    split: Split,
    settings: &DataSettings,
) -> Result<Dataset, DatasetLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(settings.has_headers)
        .quoting(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| DatasetLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let (text_idx, label_idx) = if settings.has_headers {
        let headers = reader.headers().map_err(|source| DatasetLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        (
            column_index(headers, &settings.text_column, path)?,
            column_index(headers, &settings.label_column, path)?,
        )
    } else {
        (0, 1)
    };
    debug!(
        path = %path.display(),
        text_idx,
        label_idx,
        "Resolved split columns"
    );

    let mut examples = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DatasetLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(row_idx as u64 + 1);
        let text = record
            .get(text_idx)
            .ok_or_else(|| DatasetLoadError::MissingField {
                path: path.to_path_buf(),
                line,
                field: "text",
            })?;
        let raw_label = record
            .get(label_idx)
            .ok_or_else(|| DatasetLoadError::MissingField {
                path: path.to_path_buf(),
                line,
                field: "label",
            })?;
        let label = parse_label(raw_label).ok_or_else(|| DatasetLoadError::InvalidLabel {
            path: path.to_path_buf(),
            line,
            value: raw_label.to_string(),
        })?;
        examples.push(LabeledExample {
            text: text.to_string(),
            label,
        });
    }

    let dataset = Dataset::from_examples(examples);
    let [negative, positive] = dataset.class_counts();
    info!(
        split = %split,
        path = %path.display(),
        examples = dataset.len(),
        negative,
        positive,
        "Loaded split"
    );
    Ok(dataset)
}

fn column_index(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, DatasetLoadError> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| DatasetLoadError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn parse_label(raw: &str) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|label| LABELS.contains(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_tsv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_named_columns_in_any_order() {
        let file = write_tsv("label\tsentence\n1\ta \"quoted\" gem\n0\tdull , flat\n");
        let dataset = load_split(file.path(), Split::Training, &DataSettings::default()).unwrap();
        assert_eq!(dataset.texts(), &["a \"quoted\" gem", "dull , flat"]);
        assert_eq!(dataset.labels(), &[1, 0]);
    }

    #[test]
    fn headerless_files_use_first_two_columns() {
        let file = write_tsv("great fun\t1\nawful\t0\n");
        let settings = DataSettings {
            has_headers: false,
            ..DataSettings::default()
        };
        let dataset = load_split(file.path(), Split::Development, &settings).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.class_counts(), [1, 1]);
    }

    #[test]
    fn missing_column_names_the_column() {
        let file = write_tsv("text\tlabel\nhello\t1\n");
        let err = load_split(file.path(), Split::Training, &DataSettings::default()).unwrap_err();
        match err {
            DatasetLoadError::MissingColumn { column, .. } => assert_eq!(column, "sentence"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_labels_outside_binary_range() {
        let file = write_tsv("sentence\tlabel\nok\t1\nmeh\t2\n");
        let err = load_split(file.path(), Split::Training, &DataSettings::default()).unwrap_err();
        match err {
            DatasetLoadError::InvalidLabel { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_rows_report_missing_field() {
        let file = write_tsv("sentence\tlabel\nonly text\n");
        let err = load_split(file.path(), Split::Training, &DataSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetLoadError::MissingField { field: "label", .. }
        ));
    }

    #[test]
    fn missing_file_fails_fast_with_path() {
        let path = Path::new("/nonexistent/senteval/train.tsv");
        let err = load_split(path, Split::Training, &DataSettings::default()).unwrap_err();
        assert!(matches!(err, DatasetLoadError::Open { .. }));
        assert!(err.to_string().contains("train.tsv"));
    }
}
