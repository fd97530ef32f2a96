//! Console renderings of sweep results.
//!
//! Every function returns a `String` so the binary decides where it goes and
//! tests can inspect the layout.

use std::fmt::Write as _;

use super::results::{ResultRecord, ResultsTable};

/// Shading from lowest to highest accuracy in the table.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

const BAR_WIDTH: usize = 40;

/// Accuracy line, selected parameters and classification report for one
/// combination.
pub fn combination_report(record: &ResultRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {} + {} ==",
        record.vectorizer, record.classifier
    );
    let _ = writeln!(out, "accuracy: {:.4}", record.accuracy);
    match record.cv_score {
        Some(score) => {
            let _ = writeln!(
                out,
                "best params: {} (mean CV accuracy {:.4})",
                record.best_params, score
            );
        }
        None => {
            let _ = writeln!(out, "params: {} (single candidate)", record.best_params);
        }
    }
    let _ = writeln!(out);
    let _ = write!(out, "{}", record.report);
    out
}

/// Vectorizer / Model / Accuracy table in insertion order.
pub fn results_table(table: &ResultsTable) -> String {
    let vec_width = column_width("Vectorizer", table.vectorizer_names());
    let model_width = column_width("Model", table.classifier_names());
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<vec_width$}  {:<model_width$}  {:>8}",
        "Vectorizer", "Model", "Accuracy"
    );
    let _ = writeln!(
        out,
        "{}  {}  {}",
        "-".repeat(vec_width),
        "-".repeat(model_width),
        "-".repeat(8)
    );
    for record in table.records() {
        let _ = writeln!(
            out,
            "{:<vec_width$}  {:<model_width$}  {:>8.4}",
            record.vectorizer, record.classifier, record.accuracy
        );
    }
    out
}

/// Accuracy grid with vectorizers as rows and models as columns. Each cell is
/// shaded relative to the lowest and highest accuracy in the table.
pub fn accuracy_heatmap(table: &ResultsTable) -> String {
    let vectorizers = table.vectorizer_names();
    let models = table.classifier_names();
    let row_width = column_width("", vectorizers.clone());
    let cell_width = models.iter().map(|m| m.len()).max().unwrap_or(0).max(8);
    let (low, high) = table
        .records()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
            (lo.min(r.accuracy), hi.max(r.accuracy))
        });

    let mut out = String::new();
    let _ = write!(out, "{:<row_width$}", "");
    for model in &models {
        let _ = write!(out, "  {:^cell_width$}", model);
    }
    let _ = writeln!(out);
    for vectorizer in &vectorizers {
        let _ = write!(out, "{:<row_width$}", vectorizer);
        for model in &models {
            let cell = match table.get(vectorizer, model) {
                Some(record) => {
                    let shade = shade_for(record.accuracy, low, high);
                    let glyphs = shade.to_string().repeat(2);
                    format!("{glyphs} {:.3}", record.accuracy)
                }
                None => "-".to_string(),
            };
            let _ = write!(out, "  {:^cell_width$}", cell);
        }
        let _ = writeln!(out);
    }
    out
}

/// Horizontal bars grouped by model, one bar per vectorizer.
pub fn grouped_bar_chart(table: &ResultsTable) -> String {
    let vectorizers = table.vectorizer_names();
    let label_width = column_width("", vectorizers.clone());
    let mut out = String::new();
    for model in table.classifier_names() {
        let _ = writeln!(out, "{model}");
        for vectorizer in &vectorizers {
            let Some(record) = table.get(vectorizer, model) else {
                continue;
            };
            let filled = (record.accuracy.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
            let _ = writeln!(
                out,
                "  {:<label_width$} |{}{}| {:.4}",
                vectorizer,
                "█".repeat(filled),
                " ".repeat(BAR_WIDTH - filled),
                record.accuracy
            );
        }
    }
    out
}

/// Confusion matrices laid out as a grid: one row of blocks per vectorizer,
/// one block per model.
pub fn confusion_grid(table: &ResultsTable) -> String {
    let mut out = String::new();
    for vectorizer in table.vectorizer_names() {
        let blocks = table
            .classifier_names()
            .into_iter()
            .filter_map(|model| table.get(vectorizer, model))
            .map(confusion_block)
            .collect::<Vec<_>>();
        let width = blocks
            .iter()
            .flat_map(|block| block.iter().map(|line| line.chars().count()))
            .max()
            .unwrap_or(0);
        let height = blocks.iter().map(Vec::len).max().unwrap_or(0);
        for line_idx in 0..height {
            let line = blocks
                .iter()
                .map(|block| {
                    let text = block.get(line_idx).map(String::as_str).unwrap_or("");
                    let pad = width.saturating_sub(text.chars().count());
                    format!("{text}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("    ");
            let _ = writeln!(out, "{}", line.trim_end());
        }
        let _ = writeln!(out);
    }
    out
}

fn confusion_block(record: &ResultRecord) -> Vec<String> {
    let cm = &record.confusion;
    let mut lines = vec![
        format!("{} / {}", record.vectorizer, record.classifier),
        format!(
            "{:>9}{}",
            "true\\pred",
            (0..cm.n_classes)
                .map(|p| format!("{p:>7}"))
                .collect::<String>()
        ),
    ];
    for truth in 0..cm.n_classes {
        lines.push(format!(
            "{truth:>9}{}",
            (0..cm.n_classes)
                .map(|p| format!("{:>7}", cm.get(truth, p)))
                .collect::<String>()
        ));
    }
    lines
}

fn shade_for(accuracy: f64, low: f64, high: f64) -> char {
    let span = high - low;
    let level = if span <= f64::EPSILON {
        SHADES.len() - 1
    } else {
        (((accuracy - low) / span) * (SHADES.len() - 1) as f64).round() as usize
    };
    SHADES[level.min(SHADES.len() - 1)]
}

fn column_width(header: &str, names: Vec<&str>) -> usize {
    names
        .iter()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::results::tests::record;

    fn table() -> ResultsTable {
        let mut table = ResultsTable::new();
        table.push(record("tfidf", "naive_bayes", 0.9)).unwrap();
        table.push(record("tfidf", "linear_svm", 0.7)).unwrap();
        table.push(record("count", "naive_bayes", 0.8)).unwrap();
        table.push(record("count", "linear_svm", 0.5)).unwrap();
        table
    }

    #[test]
    fn table_lists_rows_in_insertion_order() {
        let text = results_table(&table());
        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("Vectorizer"));
        assert!(lines[2].contains("tfidf") && lines[2].contains("naive_bayes"));
        assert!(lines[5].contains("count") && lines[5].ends_with("0.5000"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn heatmap_shades_extremes() {
        let text = accuracy_heatmap(&table());
        assert!(text.contains("██ 0.900"));
        assert!(text.contains("   0.500"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn bar_length_tracks_accuracy() {
        let text = grouped_bar_chart(&table());
        let bar = text
            .lines()
            .find(|line| line.contains("0.5000"))
            .unwrap();
        assert_eq!(bar.matches('█').count(), BAR_WIDTH / 2);
        assert!(text.starts_with("naive_bayes\n"));
    }

    #[test]
    fn confusion_grid_places_models_side_by_side() {
        let text = confusion_grid(&table());
        let first = text.lines().next().unwrap();
        assert!(first.contains("tfidf / naive_bayes"));
        assert!(first.contains("tfidf / linear_svm"));
    }

    #[test]
    fn single_candidate_report_says_so() {
        let mut rec = record("count", "naive_bayes", 0.5);
        rec.cv_score = None;
        let text = combination_report(&rec);
        assert!(text.contains("single candidate"));
        assert!(text.contains("accuracy: 0.5000"));
    }
}
