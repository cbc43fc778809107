//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - resolves the per-run ingestion configuration
//! - runs the pipeline under the run lock and registry and prints reports

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, FeaturesArgs, HistoryArgs, IngestArgs};
use crate::domain::{FlightFeatures, IngestionConfig, IngestionResult, SplitConfig};
use crate::error::{AppError, exit_code};

pub mod pipeline;
pub mod registry;

use pipeline::DataIngestionPipeline;
use registry::{RunLock, RunRegistry};

/// Sub-directory of the artifact root holding ingestion runs.
pub const INGESTION_DIR_NAME: &str = "data_ingestion";

/// Run history file inside the artifact root.
pub const HISTORY_FILE_NAME: &str = "ingestion_history.json";

/// Entry point for the `fare` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Ingest(args) => handle_ingest(args),
        Command::History(args) => handle_history(args),
        Command::Features(args) => handle_features(args),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_fare=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_ingest(args: IngestArgs) -> Result<(), AppError> {
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
    let config = ingestion_config_from_args(&args, &timestamp);

    let result = ingest(config.clone(), &args.artifact_dir)?;
    println!("{}", crate::report::format_ingestion_summary(&result, &config));
    Ok(())
}

/// Run one ingestion under the artifact-root lock and record it in the run
/// history.
///
/// The history is a side record: failing to write it is logged and the
/// pipeline's own outcome is still returned.
pub fn ingest(config: IngestionConfig, artifact_dir: &Path) -> Result<IngestionResult, AppError> {
    let _lock = RunLock::acquire(artifact_dir)?;
    let history_path = artifact_dir.join(HISTORY_FILE_NAME);

    let registry = RunRegistry::load(&history_path)?;
    let ticket = registry.begin()?;
    registry.mark_interrupted();
    save_history(&registry, &history_path);
    tracing::info!(run = ticket.id(), source = %config.source_url, "starting data ingestion");

    let mut pipeline = DataIngestionPipeline::new(config);
    let outcome = pipeline.run_observed(|stage| ticket.record_stage(stage));
    ticket.finish(&outcome);
    save_history(&registry, &history_path);

    outcome.map_err(AppError::from)
}

fn save_history(registry: &RunRegistry, path: &Path) {
    if let Err(e) = registry.save(path) {
        tracing::warn!(path = %path.display(), "run history not saved: {e}");
    }
}

fn handle_history(args: HistoryArgs) -> Result<(), AppError> {
    let registry = RunRegistry::load(&args.artifact_dir.join(HISTORY_FILE_NAME))?;
    if !RunLock::is_held(&args.artifact_dir) {
        registry.mark_interrupted();
    }
    print!("{}", crate::report::format_history(&registry.history()));
    Ok(())
}

fn handle_features(args: FeaturesArgs) -> Result<(), AppError> {
    if let Some(model_dir) = &args.model_dir {
        let model = crate::models::latest_model_path(model_dir)?;
        eprintln!("model: {}", model.display());
    }

    let features = features_from_args(&args);
    crate::io::write_features_csv(std::io::stdout().lock(), &features)
        .map_err(|e| AppError::new(exit_code::IO, format!("Failed to write features: {e}")))
}

/// Resolve the per-run directory layout under `args.artifact_dir`.
///
/// ```text
/// <artifact_dir>/data_ingestion/<timestamp>/
///     tgz_data/                 downloaded archive
///     raw_data/                 extracted dataset (cleared every run)
///     ingested_data/train/      train set
///     ingested_data/test/       test set
/// ```
pub fn ingestion_config_from_args(args: &IngestArgs, timestamp: &str) -> IngestionConfig {
    let run_dir = run_dir(&args.artifact_dir, timestamp);
    IngestionConfig {
        source_url: args.source_url.clone(),
        download_dir: run_dir.join("tgz_data"),
        archive_file_name: args.archive_name.clone(),
        raw_data_dir: run_dir.join("raw_data"),
        dataset_file: args.dataset_file.clone(),
        train_dir: run_dir.join("ingested_data").join("train"),
        test_dir: run_dir.join("ingested_data").join("test"),
        split: SplitConfig {
            test_fraction: args.test_fraction,
            seed: args.seed,
        },
    }
}

fn run_dir(artifact_dir: &Path, timestamp: &str) -> PathBuf {
    artifact_dir.join(INGESTION_DIR_NAME).join(timestamp)
}

pub fn features_from_args(args: &FeaturesArgs) -> FlightFeatures {
    FlightFeatures {
        airline: args.airline.clone(),
        source: args.source.clone(),
        destination: args.destination.clone(),
        total_stops: args.total_stops,
        journey_date: args.journey_date,
        journey_month: args.journey_month,
        dep_hour: args.dep_hour,
        dep_min: args.dep_min,
        arrival_hour: args.arrival_hour,
        arrival_min: args.arrival_min,
        duration_hours: args.duration_hours,
        duration_mins: args.duration_mins,
    }
}
