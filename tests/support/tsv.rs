use std::path::{Path, PathBuf};

use senteval::dataset::Dataset;

const POSITIVE: [&str; 6] = [
    "great",
    "wonderful",
    "moving",
    "brilliant",
    "charming",
    "delightful",
];
const NEGATIVE: [&str; 6] = ["awful", "boring", "tedious", "clumsy", "dreary", "bland"];
const NEUTRAL: [&str; 6] = ["film", "plot", "acting", "story", "script", "cast"];

/// Four training sentences, two per class.
pub const TOY_TRAIN: [(&str, usize); 4] = [
    ("wonderful great film", 1),
    ("great wonderful acting", 1),
    ("awful boring film", 0),
    ("boring awful plot", 0),
];

/// The second label disagrees with the obvious prediction.
pub const TOY_DEV: [(&str, usize); 2] = [("great wonderful story", 1), ("boring awful story", 1)];

pub fn dataset(rows: &[(&str, usize)]) -> Dataset {
    Dataset::new(
        rows.iter().map(|(text, _)| text.to_string()).collect(),
        rows.iter().map(|(_, label)| *label).collect(),
    )
    .unwrap()
}

/// `per_class` templated sentences for each label, interleaved.
pub fn synthetic_rows(per_class: usize, offset: usize) -> Vec<(String, usize)> {
    let mut rows = Vec::with_capacity(per_class * 2);
    for i in offset..offset + per_class {
        rows.push((
            format!(
                "{} {} and {}",
                POSITIVE[i % 6],
                NEUTRAL[(i * 5) % 6],
                POSITIVE[(i + 1) % 6]
            ),
            1,
        ));
        rows.push((
            format!(
                "{} {} and {}",
                NEGATIVE[i % 6],
                NEUTRAL[(i * 5 + 1) % 6],
                NEGATIVE[(i + 2) % 6]
            ),
            0,
        ));
    }
    rows
}

pub fn synthetic_dataset(per_class: usize, offset: usize) -> Dataset {
    let rows = synthetic_rows(per_class, offset);
    let borrowed = rows
        .iter()
        .map(|(text, label)| (text.as_str(), *label))
        .collect::<Vec<_>>();
    dataset(&borrowed)
}

/// Write rows under a `sentence`/`label` header.
pub fn write_tsv<S: AsRef<str>>(dir: &Path, name: &str, rows: &[(S, usize)]) -> PathBuf {
    let mut contents = String::from("sentence\tlabel\n");
    for (text, label) in rows {
        contents.push_str(text.as_ref());
        contents.push('\t');
        contents.push_str(&label.to_string());
        contents.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
