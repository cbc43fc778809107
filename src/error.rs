//! Error types.
//!
//! - `IngestError`: what went wrong inside one ingestion stage
//! - `PipelineError`: an `IngestError` annotated with the stage it failed in
//! - `AppError`: what the `fare` binary reports (message + process exit code)

use thiserror::Error;

use crate::app::registry::RunInProgress;
use crate::domain::Stage;

/// A stage-local ingestion failure.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The source archive could not be fetched.
    #[error("download failed: {0}")]
    Download(String),

    /// The archive could not be opened or its dataset entry extracted.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// A field of a raw record could not be parsed.
    #[error("line {line}: malformed `{field}` value '{value}': {reason}")]
    MalformedRecord {
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A categorical field holds a literal outside the known mapping.
    #[error("line {line}: unknown `{field}` category '{value}'")]
    UnknownCategory {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// The dataset header lacks a required column.
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    /// No rows survived the null-drop filter.
    #[error("no complete rows in '{0}'")]
    EmptyDataset(String),

    /// The dataset cannot be split under the requested configuration.
    #[error("split failed: {0}")]
    Split(String),

    /// Output files could not be written.
    #[error("persisting failed: {0}")]
    Persist(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Attach the CSV line number to a record-level error.
    ///
    /// Record parsing does not know where the row came from; the reader does.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            IngestError::MalformedRecord {
                field,
                value,
                reason,
                ..
            } => IngestError::MalformedRecord {
                line,
                field,
                value,
                reason,
            },
            IngestError::UnknownCategory { field, value, .. } => {
                IngestError::UnknownCategory { line, field, value }
            }
            other => other,
        }
    }

    pub(crate) fn malformed(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        IngestError::MalformedRecord {
            line: 0,
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// An ingestion failure annotated with the pipeline stage it happened in.
#[derive(Error, Debug)]
#[error("ingestion failed while {stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: IngestError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: IngestError) -> Self {
        Self { stage, source }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

/// Process exit codes reported by the `fare` binary.
pub mod exit_code {
    /// Bad arguments, configuration, run history or model directory.
    pub const USAGE: u8 = 2;
    /// No complete rows in the dataset.
    pub const EMPTY_DATA: u8 = 3;
    /// Download, extraction or file-system failure.
    pub const IO: u8 = 4;
    /// Malformed rows, missing columns or an unsplittable dataset.
    pub const DATA: u8 = 5;
    /// Another ingestion run holds the lock.
    pub const IN_PROGRESS: u8 = 6;
}

impl IngestError {
    fn exit_code(&self) -> u8 {
        match self {
            IngestError::EmptyDataset(_) => exit_code::EMPTY_DATA,
            IngestError::MalformedRecord { .. }
            | IngestError::UnknownCategory { .. }
            | IngestError::MissingColumn(_)
            | IngestError::Split(_)
            | IngestError::Csv(_) => exit_code::DATA,
            IngestError::Download(_)
            | IngestError::Extraction(_)
            | IngestError::Persist(_)
            | IngestError::Io(_) => exit_code::IO,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.source.exit_code(), err.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl From<RunInProgress> for AppError {
    fn from(err: RunInProgress) -> Self {
        AppError::new(exit_code::IN_PROGRESS, format!("Training is already in progress ({err})."))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
