//! Shared domain types.
//!
//! Record types carry serde attributes with the exact CSV column names used by
//! the scraped dataset and by the files handed to the training/serving side,
//! so they can be read and written with `csv` directly.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default fraction of records routed to the test set.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Default seed for the stratified shuffle.
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Default file name of the downloaded archive.
pub const DEFAULT_ARCHIVE_FILE_NAME: &str = "flight.zip";

/// One ticket listing as scraped (all fields still free text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub airline: String,
    pub date_of_journey: String,
    pub source: String,
    pub destination: String,
    pub route: String,
    pub dep_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub total_stops: String,
    pub additional_info: String,
    pub price: i64,
}

/// Numeric, model-ready projection of a `RawRecord`.
///
/// Field order matches the column order of the ingested train/test files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    #[serde(rename = "Airline")]
    pub airline: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "Total_Stops")]
    pub total_stops: u8,
    #[serde(rename = "Price")]
    pub price: i64,
    #[serde(rename = "journey_Date")]
    pub journey_date: u32,
    #[serde(rename = "journey_Month")]
    pub journey_month: u32,
    #[serde(rename = "Dep_hour")]
    pub dep_hour: u32,
    #[serde(rename = "Dep_min")]
    pub dep_min: u32,
    #[serde(rename = "Arrival_hour")]
    pub arrival_hour: u32,
    #[serde(rename = "Arrival_min")]
    pub arrival_min: u32,
    #[serde(rename = "Duration_hours")]
    pub duration_hours: u32,
    #[serde(rename = "Duration_mins")]
    pub duration_mins: u32,
}

/// The 12 feature fields the price model is trained on (everything but `Price`).
///
/// This is the single-row table handed to the model-serving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightFeatures {
    #[serde(rename = "Airline")]
    pub airline: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Destination")]
    pub destination: String,
    #[serde(rename = "Total_Stops")]
    pub total_stops: u8,
    #[serde(rename = "journey_Date")]
    pub journey_date: u32,
    #[serde(rename = "journey_Month")]
    pub journey_month: u32,
    #[serde(rename = "Dep_hour")]
    pub dep_hour: u32,
    #[serde(rename = "Dep_min")]
    pub dep_min: u32,
    #[serde(rename = "Arrival_hour")]
    pub arrival_hour: u32,
    #[serde(rename = "Arrival_min")]
    pub arrival_min: u32,
    #[serde(rename = "Duration_hours")]
    pub duration_hours: u32,
    #[serde(rename = "Duration_mins")]
    pub duration_mins: u32,
}

impl From<&ParsedRecord> for FlightFeatures {
    fn from(record: &ParsedRecord) -> Self {
        Self {
            airline: record.airline.clone(),
            source: record.source.clone(),
            destination: record.destination.clone(),
            total_stops: record.total_stops,
            journey_date: record.journey_date,
            journey_month: record.journey_month,
            dep_hour: record.dep_hour,
            dep_min: record.dep_min,
            arrival_hour: record.arrival_hour,
            arrival_min: record.arrival_min,
            duration_hours: record.duration_hours,
            duration_mins: record.duration_mins,
        }
    }
}

/// Price-based category used only to balance the train/test split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceStratum {
    S1,
    S2,
    S3,
    S4,
    S5,
}

impl PriceStratum {
    pub const ALL: [PriceStratum; 5] = [
        PriceStratum::S1,
        PriceStratum::S2,
        PriceStratum::S3,
        PriceStratum::S4,
        PriceStratum::S5,
    ];

    /// Ordinal label in `1..=5`.
    pub fn label(self) -> u8 {
        match self {
            PriceStratum::S1 => 1,
            PriceStratum::S2 => 2,
            PriceStratum::S3 => 3,
            PriceStratum::S4 => 4,
            PriceStratum::S5 => 5,
        }
    }

    pub fn index(self) -> usize {
        self.label() as usize - 1
    }
}

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Downloading,
    Extracting,
    Parsing,
    Binning,
    Splitting,
    Persisting,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Downloading => "downloading",
            Stage::Extracting => "extracting",
            Stage::Parsing => "parsing",
            Stage::Binning => "binning",
            Stage::Splitting => "splitting",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Stratified split settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitConfig {
    /// Fraction of the stratifiable records routed to the test set, in `(0, 1)`.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

/// Fully-resolved ingestion configuration.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// `http(s)://` URL, or a local path to an archive.
    pub source_url: String,
    /// Directory the archive is downloaded into.
    pub download_dir: PathBuf,
    /// File name of the downloaded archive inside `download_dir`.
    pub archive_file_name: String,
    /// Directory the dataset file is extracted into. Cleared on every run.
    pub raw_data_dir: PathBuf,
    /// Archive entry holding the dataset; required when the archive has
    /// more than one file.
    pub dataset_file: Option<String>,
    pub train_dir: PathBuf,
    pub test_dir: PathBuf,
    pub split: SplitConfig,
}

/// Outcome of one successful ingestion run.
#[derive(Debug, Clone)]
pub struct IngestionResult {
    pub train_records: Vec<ParsedRecord>,
    pub test_records: Vec<ParsedRecord>,
    pub train_file_path: PathBuf,
    pub test_file_path: PathBuf,
    pub succeeded: bool,
    pub message: String,
}
