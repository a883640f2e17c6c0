//! Retention engine CLI
//!
//! Offline steps (`preprocess`, `train`, `fit`), one-off scoring (`predict`),
//! dataset inspection (`info`) and the HTTP server (`serve`).

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{DataLoader, DatasetSummary};
use crate::inference::ChurnService;
use crate::pipeline::{PipelineConfig, TrainingOutcome, TrainingPipeline};
use crate::training::ClassificationReport;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "retention")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bank customer churn prediction: training pipeline and inference server")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show shape, schema coverage and class balance of a dataset
    Info {
        /// Input CSV (defaults to DATA_PATH or data/churn_data.csv)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Split the data, fit the transformer and persist the processed split
    Preprocess {
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Directory for the artifact pair
        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        /// Directory for the processed split
        #[arg(long)]
        processed_dir: Option<PathBuf>,

        /// Held-out fraction
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Random seed for the split
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Train the classifier on a persisted split and save it
    Train {
        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        #[arg(long)]
        processed_dir: Option<PathBuf>,

        /// Number of trees
        #[arg(short = 'n', long, default_value = "100")]
        n_estimators: usize,

        /// Seed of the first tree
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Preprocess and train in one step, saving the artifact pair
    Fit {
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        #[arg(long, default_value = "0.2")]
        test_size: f64,

        #[arg(short = 'n', long, default_value = "100")]
        n_estimators: usize,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Score JSON records with the saved artifact pair
    Predict {
        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        /// File holding one JSON record or an array of records
        #[arg(short, long, conflicts_with = "record")]
        input: Option<PathBuf>,

        /// Inline JSON record
        #[arg(short, long)]
        record: Option<String>,
    },

    /// Start the prediction server
    Serve {
        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        models_dir: Option<PathBuf>,

        /// Allowed CORS origin
        #[arg(long)]
        cors_origin: Option<String>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_info(data: Option<PathBuf>) -> anyhow::Result<()> {
    let data_path = data.unwrap_or(PipelineConfig::default().data_path);
    section("Data Info");

    let df = DataLoader::new().load_csv(&data_path)?;
    let summary = DatasetSummary::from_dataframe(&df);

    kv("File", &data_path.display().to_string());
    kv("Rows", &summary.n_rows.to_string());
    kv("Columns", &summary.n_cols.to_string());
    kv("Identifiers", &join_or_none(&summary.identifiers));
    if summary.missing.is_empty() {
        kv("Schema", &ok("all 10 columns present").to_string());
    } else {
        kv("Missing", &summary.missing.join(", ").red().to_string());
    }
    match summary.class_counts {
        Some((stayed, exited)) => {
            let rate = exited as f64 / (stayed + exited).max(1) as f64;
            kv("Exited", &format!("{} of {} ({:.1}%)", exited, stayed + exited, rate * 100.0));
        }
        None => kv("Exited", &"label column unusable".yellow().to_string()),
    }

    section("Head");
    println!("{}", df.head(Some(5)));
    Ok(())
}

pub fn cmd_preprocess(
    data: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    processed_dir: Option<PathBuf>,
    test_size: f64,
    seed: u64,
) -> anyhow::Result<()> {
    let mut config = PipelineConfig::default();
    config.training = config.training.with_test_size(test_size).with_random_seed(seed);
    let config = override_paths(config, data, models_dir, processed_dir);
    section("Preprocess");

    step_run(&format!("Fitting transformer on {}", config.data_path.display()));
    let start = Instant::now();
    let summary = TrainingPipeline::new(config.clone()).run_preprocess()?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    kv("Run", &summary.run_id);
    kv("Train rows", &summary.n_train.to_string());
    kv("Test rows", &summary.n_test.to_string());
    kv("Features", &summary.n_features.to_string());
    kv("Transformer", &config.models_dir.display().to_string());
    kv("Split", &config.processed_dir.display().to_string());
    println!();
    Ok(())
}

pub fn cmd_train(
    models_dir: Option<PathBuf>,
    processed_dir: Option<PathBuf>,
    n_estimators: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let mut config = PipelineConfig::default();
    config.training = config.training.with_n_estimators(n_estimators).with_random_seed(seed);
    let config = override_paths(config, None, models_dir, processed_dir);
    section("Train");

    step_run(&format!("Training {} trees", n_estimators));
    let outcome = TrainingPipeline::new(config.clone()).run_train()?;
    step_done(&format!("{:.2}s", outcome.training_time_secs));

    print_outcome(&outcome, &config.models_dir);
    Ok(())
}

pub fn cmd_fit(
    data: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    test_size: f64,
    n_estimators: usize,
    seed: u64,
) -> anyhow::Result<()> {
    let mut config = PipelineConfig::default();
    config.training = config
        .training
        .with_test_size(test_size)
        .with_n_estimators(n_estimators)
        .with_random_seed(seed);
    let config = override_paths(config, data, models_dir, None);
    section("Fit");

    step_run(&format!("Training on {}", config.data_path.display()));
    let outcome = TrainingPipeline::new(config.clone()).run_fit()?;
    step_done(&format!("{:.2}s", outcome.training_time_secs));

    print_outcome(&outcome, &config.models_dir);
    Ok(())
}

pub fn cmd_predict(
    models_dir: Option<PathBuf>,
    input: Option<PathBuf>,
    record: Option<String>,
) -> anyhow::Result<()> {
    let models_dir = models_dir.unwrap_or(PipelineConfig::default().models_dir);
    let raw: Value = match (input, record) {
        (Some(path), _) => serde_json::from_str(&std::fs::read_to_string(&path)?)?,
        (None, Some(text)) => serde_json::from_str(&text)?,
        (None, None) => serde_json::from_reader(std::io::stdin().lock())?,
    };

    let service = ChurnService::load(&models_dir)?;
    let records = match raw {
        Value::Array(items) => items,
        other => vec![other],
    };

    for (i, result) in service.predict_batch(&records).into_iter().enumerate() {
        match result {
            Ok(prediction) => {
                let label = if prediction.is_churn() {
                    prediction.prediction.red().bold()
                } else {
                    prediction.prediction.green().bold()
                };
                println!("  {:>4}  {:<10} {}", dim(&i.to_string()), label, format!("{:.2}", prediction.probability).white());
            }
            Err(e) => {
                println!("  {:>4}  {:<10} {}", dim(&i.to_string()), e.kind().yellow(), e);
            }
        }
    }
    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    models_dir: Option<PathBuf>,
    cors_origin: Option<String>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = models_dir {
        config = config.with_models_dir(dir);
    }
    if let Some(origin) = cors_origin {
        config = config.with_cors_origin(origin);
    }

    section("Serve");
    kv("Predict", &format!("http://{}:{}/predict", config.host, config.port));
    kv("Batch", &format!("http://{}:{}/predict/batch", config.host, config.port));
    kv("Health", &format!("http://{}:{}/health", config.host, config.port));
    println!("  {}", dim("ctrl+c to stop"));
    println!();

    run_server(config).await
}

// ─── Report printing ───────────────────────────────────────────────────────────

fn print_outcome(outcome: &TrainingOutcome, models_dir: &Path) {
    println!();
    kv("Run", &outcome.artifacts.run_id);
    kv("Train rows", &outcome.n_train.to_string());
    kv("Test rows", &outcome.n_test.to_string());
    kv("Accuracy", &format!("{:.4}", outcome.report.accuracy));
    kv("Saved to", &models_dir.display().to_string());

    print_report(&outcome.report);

    section("Top features");
    for (name, importance) in outcome.ranked_importances().into_iter().take(5) {
        println!("  {:<32} {}", name, format!("{:.4}", importance).white());
    }
    println!();
}

fn print_report(report: &ClassificationReport) {
    section("Classification report");
    for line in report.to_string().lines() {
        println!("  {}", line);
    }

    section("Confusion matrix");
    println!("  {:>14} {:>8} {:>8}", "", muted("pred 0"), muted("pred 1"));
    for (t, row) in report.confusion.iter().enumerate() {
        println!("  {:>14} {:>8} {:>8}", muted(&format!("true {}", t)), row[0], row[1]);
    }
}

fn override_paths(
    mut config: PipelineConfig,
    data: Option<PathBuf>,
    models_dir: Option<PathBuf>,
    processed_dir: Option<PathBuf>,
) -> PipelineConfig {
    if let Some(path) = data {
        config = config.with_data_path(path);
    }
    if let Some(dir) = models_dir {
        config = config.with_models_dir(dir);
    }
    if let Some(dir) = processed_dir {
        config = config.with_processed_dir(dir);
    }
    config
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
