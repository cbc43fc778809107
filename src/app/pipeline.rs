//! Data ingestion pipeline.
//!
//! One run walks the stages strictly in order:
//! download -> extract -> parse -> bin -> split -> persist
//!
//! Every stage blocks until done. The first failure stops the run, moves the
//! pipeline to `Stage::Failed` and is returned annotated with the stage it
//! happened in; nothing is persisted for a failed run.
//!
//! Two runs must not share `raw_data_dir` or the output directories at the
//! same time (extraction clears `raw_data_dir`). Callers serialize runs
//! through `RunRegistry`.

use std::path::Path;

use crate::data::{extract_dataset, fetch_archive};
use crate::domain::{IngestionConfig, IngestionResult, ParsedRecord, PriceStratum, Stage};
use crate::error::{IngestError, PipelineError};
use crate::features::{bin_price, parse_record};
use crate::io::{persist_split, read_raw_dataset};
use crate::split::stratified_split;

pub struct DataIngestionPipeline {
    config: IngestionConfig,
    stage: Stage,
}

impl DataIngestionPipeline {
    pub fn new(config: IngestionConfig) -> Self {
        Self {
            config,
            stage: Stage::Idle,
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Current (or, after `run`, final) stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Execute the full pipeline.
    pub fn run(&mut self) -> Result<IngestionResult, PipelineError> {
        self.run_observed(|_| {})
    }

    /// Execute the full pipeline, reporting every stage transition to `observer`.
    pub fn run_observed(&mut self, mut observer: impl FnMut(Stage)) -> Result<IngestionResult, PipelineError> {
        self.stage = Stage::Idle;
        match self.execute(&mut observer) {
            Ok(result) => {
                self.advance(Stage::Done, &mut observer);
                tracing::info!(message = %result.message, "data ingestion finished");
                Ok(result)
            }
            Err(err) => {
                self.advance(Stage::Failed, &mut observer);
                tracing::error!("{err}");
                Err(err)
            }
        }
    }

    fn execute(&mut self, observer: &mut dyn FnMut(Stage)) -> Result<IngestionResult, PipelineError> {
        // 1) Fetch the archive.
        self.advance(Stage::Downloading, observer);
        let archive = fetch_archive(
            &self.config.source_url,
            &self.config.download_dir,
            &self.config.archive_file_name,
        )
        .map_err(|e| PipelineError::new(Stage::Downloading, e))?;

        // 2) Extract the dataset file.
        self.advance(Stage::Extracting, observer);
        let dataset_path = extract_dataset(
            &archive,
            &self.config.raw_data_dir,
            self.config.dataset_file.as_deref(),
        )
        .map_err(|e| PipelineError::new(Stage::Extracting, e))?;

        // 3) Read, null-drop and parse every row.
        self.advance(Stage::Parsing, observer);
        let records = parse_dataset(&dataset_path).map_err(|e| PipelineError::new(Stage::Parsing, e))?;

        // 4) Assign price strata.
        self.advance(Stage::Binning, observer);
        let strata: Vec<PriceStratum> = records.iter().map(|r| bin_price(r.price)).collect();
        log_strata(&strata);

        // 5) Stratified split.
        self.advance(Stage::Splitting, observer);
        let (train, test) = stratified_split(&records, &strata, &self.config.split)
            .map_err(|e| PipelineError::new(Stage::Splitting, e))?;

        // 6) Persist both sets under the dataset's file name.
        self.advance(Stage::Persisting, observer);
        let file_name = dataset_path.file_name().ok_or_else(|| {
            PipelineError::new(
                Stage::Persisting,
                IngestError::Persist(format!("'{}' has no file name", dataset_path.display())),
            )
        })?;
        let train_file_path = self.config.train_dir.join(file_name);
        let test_file_path = self.config.test_dir.join(file_name);
        persist_split(&train_file_path, &train, &test_file_path, &test)
            .map_err(|e| PipelineError::new(Stage::Persisting, e))?;
        tracing::info!(
            train = %train_file_path.display(),
            test = %test_file_path.display(),
            "exported train and test sets"
        );

        let message = format!(
            "Data ingestion completed successfully: {} train / {} test records.",
            train.len(),
            test.len()
        );
        Ok(IngestionResult {
            train_records: train,
            test_records: test,
            train_file_path,
            test_file_path,
            succeeded: true,
            message,
        })
    }

    fn advance(&mut self, stage: Stage, observer: &mut dyn FnMut(Stage)) {
        tracing::debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
        observer(stage);
    }
}

/// Read the raw dataset and parse every complete row; the first bad row fails.
fn parse_dataset(path: &Path) -> Result<Vec<ParsedRecord>, IngestError> {
    tracing::info!(path = %path.display(), "reading raw dataset");
    let dataset = read_raw_dataset(path)?;

    let records = dataset
        .rows
        .iter()
        .map(|row| parse_record(&row.record).map_err(|e| e.at_line(row.line)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        rows_read = dataset.rows_read,
        rows_dropped = dataset.rows_dropped,
        rows_parsed = records.len(),
        "raw dataset parsed"
    );
    Ok(records)
}

fn log_strata(strata: &[PriceStratum]) {
    let mut counts = [0usize; 5];
    for s in strata {
        counts[s.index()] += 1;
    }
    tracing::info!(?counts, "price strata");
}
