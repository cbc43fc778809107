//! Command-line parsing for the flight fare data tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code. Options that deployments usually set once can also come from
//! the environment (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_ARCHIVE_FILE_NAME, DEFAULT_SPLIT_SEED, DEFAULT_TEST_FRACTION};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fare", version, about = "Flight fare dataset ingestion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download, parse and split the flight dataset into train/test CSV files.
    Ingest(IngestArgs),
    /// Show previous ingestion runs.
    History(HistoryArgs),
    /// Print a prediction-input row (and the latest saved model, if asked).
    Features(FeaturesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// Archive URL (`http(s)://`) or local archive path.
    #[arg(long, env = "FARE_DATASET_URL")]
    pub source_url: String,

    /// Root directory for ingestion artifacts; each run gets a timestamped sub-directory.
    #[arg(long, env = "FARE_ARTIFACT_DIR", default_value = "flight/artifact")]
    pub artifact_dir: PathBuf,

    /// File name of the downloaded archive.
    #[arg(long, default_value = DEFAULT_ARCHIVE_FILE_NAME)]
    pub archive_name: String,

    /// Archive entry holding the dataset (required when the archive has several files).
    #[arg(long)]
    pub dataset_file: Option<String>,

    /// Fraction of records routed to the test set.
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    pub test_fraction: f64,

    /// Seed for the stratified shuffle.
    #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Root directory for ingestion artifacts.
    #[arg(long, env = "FARE_ARTIFACT_DIR", default_value = "flight/artifact")]
    pub artifact_dir: PathBuf,
}

/// One flight's model features, as entered on the prediction form.
#[derive(Debug, Args, Clone)]
pub struct FeaturesArgs {
    #[arg(long)]
    pub airline: String,
    #[arg(long)]
    pub source: String,
    #[arg(long)]
    pub destination: String,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub total_stops: u8,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    pub journey_date: u32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub journey_month: u32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
    pub dep_hour: u32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=59))]
    pub dep_min: u32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
    pub arrival_hour: u32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=59))]
    pub arrival_min: u32,
    #[arg(long)]
    pub duration_hours: u32,
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=59))]
    pub duration_mins: u32,

    /// Directory of numbered model sub-directories; prints the latest model path.
    #[arg(long, env = "FARE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,
}
