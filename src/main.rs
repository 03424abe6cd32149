use std::fs;
use std::io::{stderr, stdout, BufWriter};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use transaction_pipeline::config::AppConfig;
use transaction_pipeline::engine::{BatchEngine, BatchOutcome};
use transaction_pipeline::ingest;
use transaction_pipeline::storage::{ResultStorage, Storage};

/// Cleans, validates and enriches raw transaction CSV files.
#[derive(Debug, Parser)]
#[command(name = "transaction-pipeline", version)]
struct Cli {
    /// Raw transaction CSV files; each file is processed as its own batch.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// CSV with a customer_id column; transactions for other customers are dropped.
    #[arg(long)]
    customers: Option<PathBuf>,

    /// TOML file overriding the pipeline rules and quality thresholds.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Writes <dataset>.csv and <dataset>_report.json here instead of stdout.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// One of error, warn, info, debug, trace.
    #[arg(long, default_value = "error")]
    log_level: String,

    /// Exit with an error when any quality gate fails.
    #[arg(long)]
    strict: bool
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    if cli.output_dir.is_none() && cli.inputs.len() > 1 {
        bail!("--output-dir is required when more than one input is given");
    }

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default()
    };

    let storage = Arc::new(ResultStorage::new());
    let mut engine = BatchEngine::new(storage.clone(), config);

    if let Some(path) = &cli.customers {
        engine = engine.with_customers(ingest::read_customers_file(path)?);
    }

    let timer = Instant::now();
    engine.run(&cli.inputs).await?;
    let duration = timer.elapsed();

    info!("Processed {} batch(es) in: {duration:?}", cli.inputs.len());

    let mut failed = false;

    for path in &cli.inputs {
        let dataset = ingest::dataset_name(path);

        let Some(outcome) = storage.load(&dataset) else {
            continue;
        };

        match &outcome {
            BatchOutcome::Failed { error } => {
                eprintln!("Batch [{dataset}] failed: {error}");
                failed = true;
                continue;
            }
            BatchOutcome::Completed { .. } if !outcome.gate_passed() => {
                warn!("Quality gate failed for [{dataset}]");
                failed |= cli.strict;
            }
            BatchOutcome::Completed { .. } => {}
        }

        match &cli.output_dir {
            Some(directory) => write_results_to_directory(directory, &dataset, &outcome)?,
            None => write_results_to_stdout(&outcome)?
        }
    }

    if failed {
        error!("One or more batches did not complete cleanly");
        exit(1);
    }

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout may carry the clean CSV, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_results_to_stdout(outcome: &BatchOutcome) -> Result<()> {
    if let BatchOutcome::Completed { records, .. } = outcome {
        ingest::write_transactions(BufWriter::new(stdout().lock()), records)?;
    }

    if let Some(summary) = outcome.summary() {
        ingest::write_json(stderr().lock(), &summary)?;
    }

    Ok(())
}

fn write_results_to_directory(directory: &Path, dataset: &str, outcome: &BatchOutcome) -> Result<()> {
    fs::create_dir_all(directory)?;

    if let BatchOutcome::Completed { records, .. } = outcome {
        ingest::write_transactions_file(&directory.join(format!("{dataset}.csv")), records)?;
    }

    if let Some(summary) = outcome.summary() {
        ingest::write_json_file(&directory.join(format!("{dataset}_report.json")), &summary)?;
    }

    Ok(())
}
