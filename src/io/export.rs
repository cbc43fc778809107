//! Write ingested datasets and prediction inputs to CSV.
//!
//! Files carry a header row with the model column names and no index column,
//! which is what the training and serving side read back.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{FlightFeatures, ParsedRecord};
use crate::error::IngestError;

/// Write parsed records to a CSV file.
pub fn write_records_csv(path: &Path, records: &[ParsedRecord]) -> Result<(), IngestError> {
    let file = File::create(path)
        .map_err(|e| IngestError::Persist(format!("failed to create '{}': {e}", path.display())))?;
    write_rows(file, records)
}

/// Write a single prediction-input row (header + one line).
pub fn write_features_csv<W: Write>(writer: W, features: &FlightFeatures) -> Result<(), IngestError> {
    write_rows(writer, std::slice::from_ref(features))
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), IngestError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Persist the train and test sets, both or neither.
///
/// Each set is staged next to its destination and only renamed into place
/// once both were written; staged files are removed on failure.
pub fn persist_split(
    train_path: &Path,
    train: &[ParsedRecord],
    test_path: &Path,
    test: &[ParsedRecord],
) -> Result<(), IngestError> {
    let staged_train = staging_path(train_path);
    let staged_test = staging_path(test_path);

    let written = create_parent(train_path)
        .and_then(|()| create_parent(test_path))
        .and_then(|()| write_records_csv(&staged_train, train))
        .and_then(|()| write_records_csv(&staged_test, test));
    if let Err(e) = written {
        discard(&staged_train);
        discard(&staged_test);
        return Err(e);
    }

    if let Err(e) = fs::rename(&staged_train, train_path) {
        discard(&staged_train);
        discard(&staged_test);
        return Err(IngestError::Persist(format!(
            "failed to move train set into '{}': {e}",
            train_path.display()
        )));
    }
    if let Err(e) = fs::rename(&staged_test, test_path) {
        discard(train_path);
        discard(&staged_test);
        return Err(IngestError::Persist(format!(
            "failed to move test set into '{}': {e}",
            test_path.display()
        )));
    }

    Ok(())
}

fn create_parent(path: &Path) -> Result<(), IngestError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir)
        .map_err(|e| IngestError::Persist(format!("failed to create '{}': {e}", dir.display())))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "failed to remove staged file: {e}");
        }
    }
}
