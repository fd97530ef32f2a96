//! Command-line entry point: run the vectorizer x classifier sweep and print
//! the comparison report.

use std::path::PathBuf;

use senteval::config;
use senteval::dataset::{Split, load_split};
use senteval::logging::{self, RunHeader};
use senteval::sweep::{report, run_sweep_with_progress};
use tracing::info;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CliOptions {
    train_path: Option<PathBuf>,
    dev_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    folds: Option<usize>,
    report_json: Option<PathBuf>,
    no_charts: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Run(CliOptions),
}

fn run() -> Result<(), String> {
    let options = match parse_args(std::env::args().skip(1).collect())? {
        Command::Help => {
            println!("{}", help_text());
            return Ok(());
        }
        Command::Run(options) => options,
    };
    let config_file =
        config::source_file(options.config_path.as_deref()).map_err(|err| err.to_string())?;
    let mut settings = match &config_file {
        Some(path) => config::load_from(path),
        None => Ok(config::Settings::default()),
    }
    .map_err(|err| err.to_string())?;
    if let Some(folds) = options.folds {
        settings.search.folds = folds;
    }
    let train_path = options
        .train_path
        .or_else(|| settings.data.train_path.clone())
        .ok_or_else(|| format!("--train is required\n\n{}", help_text()))?;
    let dev_path = options
        .dev_path
        .or_else(|| settings.data.dev_path.clone())
        .ok_or_else(|| format!("--dev is required\n\n{}", help_text()))?;
    let run = RunHeader {
        train: &train_path,
        dev: &dev_path,
        config: config_file.as_deref(),
    };
    let _log = logging::init(&run)
        .inspect_err(|err| eprintln!("Logging disabled: {err}"))
        .ok();
    let plan = settings.sweep_plan().map_err(|err| err.to_string())?;

    let train = load_split(&train_path, Split::Training, &settings.data)
        .map_err(|err| err.to_string())?;
    let dev =
        load_split(&dev_path, Split::Development, &settings.data).map_err(|err| err.to_string())?;

    let table = run_sweep_with_progress(&plan, &train, &dev, &mut |record| {
        println!("{}", report::combination_report(record));
    })
    .map_err(|err| err.to_string())?;

    println!("Results");
    println!("{}", report::results_table(&table));
    if !options.no_charts {
        println!("Accuracy by vectorizer and model");
        println!("{}", report::accuracy_heatmap(&table));
        println!("Accuracy by model");
        println!("{}", report::grouped_bar_chart(&table));
        println!("Confusion matrices (rows=true, cols=pred)");
        print!("{}", report::confusion_grid(&table));
    }

    if let Some(path) = options.report_json {
        let json = table.to_json().map_err(|err| err.to_string())?;
        std::fs::write(&path, json)
            .map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
        info!(path = %path.display(), rows = table.len(), "Wrote JSON results");
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Command, String> {
    let mut options = CliOptions::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--train" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--train requires a value".to_string())?;
                options.train_path = Some(PathBuf::from(value));
            }
            "--dev" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--dev requires a value".to_string())?;
                options.dev_path = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--folds" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--folds requires a value".to_string())?;
                let folds = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --folds value: {value}"))?;
                options.folds = Some(folds);
            }
            "--report-json" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--report-json requires a value".to_string())?;
                options.report_json = Some(PathBuf::from(value));
            }
            "--no-charts" => options.no_charts = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Command::Run(options))
}

fn help_text() -> String {
    [
        "senteval",
        "",
        "Compare text vectorizers and classifiers on a sentiment dataset.",
        "",
        "Usage:",
        "  senteval --train <train.tsv> --dev <dev.tsv> [options]",
        "",
        "Options:",
        "  --config <path>       Settings file (default: <config dir>/.senteval/config.toml).",
        "  --folds <n>           Cross-validation folds (default: 5).",
        "  --report-json <path>  Also write the results table as JSON.",
        "  --no-charts           Skip the heatmap, bar chart and confusion grid.",
        "  -h, --help            Show this help.",
    ]
    .join("\n")
}
