//! Dataset extraction from the downloaded zip archive.
//!
//! Only the dataset entry is extracted: the one named in the configuration,
//! or the archive's single file. An archive holding several files and no
//! configured name is rejected rather than guessed at.
//!
//! Extraction is destructive: `raw_data_dir` is removed and recreated first.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::IngestError;

/// Extract the dataset entry of `archive_path` into a fresh `raw_data_dir`.
///
/// Returns the path of the extracted file, which keeps the entry's base name.
pub fn extract_dataset(
    archive_path: &Path,
    raw_data_dir: &Path,
    dataset_file: Option<&str>,
) -> Result<PathBuf, IngestError> {
    let file = File::open(archive_path).map_err(|e| {
        IngestError::Extraction(format!("failed to open '{}': {e}", archive_path.display()))
    })?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| IngestError::Extraction(format!("'{}' is not a zip archive: {e}", archive_path.display())))?;

    let entries = file_entries(&mut archive)?;
    let (index, name) = select_entry(&entries, dataset_file)?;

    reset_dir(raw_data_dir)?;

    let mut entry = archive
        .by_index(index)
        .map_err(|e| IngestError::Extraction(format!("failed to read entry '{name}': {e}")))?;
    let base_name = entry
        .enclosed_name()
        .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        .ok_or_else(|| IngestError::Extraction(format!("entry '{name}' has an unsafe path")))?;

    let target = raw_data_dir.join(base_name);
    let mut out = File::create(&target)
        .map_err(|e| IngestError::Extraction(format!("failed to create '{}': {e}", target.display())))?;
    std::io::copy(&mut entry, &mut out)
        .map_err(|e| IngestError::Extraction(format!("failed to extract '{name}': {e}")))?;

    tracing::info!(entry = %name, target = %target.display(), "dataset extracted");
    Ok(target)
}

/// `(index, name)` of every regular file in the archive, skipping macOS
/// resource-fork entries.
fn file_entries(archive: &mut ZipArchive<File>) -> Result<Vec<(usize, String)>, IngestError> {
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| IngestError::Extraction(format!("failed to read entry {i}: {e}")))?;
        if entry.is_dir() || entry.name().starts_with("__MACOSX/") {
            continue;
        }
        entries.push((i, entry.name().to_string()));
    }
    Ok(entries)
}

fn select_entry<'a>(
    entries: &'a [(usize, String)],
    dataset_file: Option<&str>,
) -> Result<(usize, &'a str), IngestError> {
    if let Some(wanted) = dataset_file {
        return entries
            .iter()
            .find(|(_, name)| {
                name == wanted || Path::new(name).file_name().is_some_and(|n| n == wanted)
            })
            .map(|(i, name)| (*i, name.as_str()))
            .ok_or_else(|| IngestError::Extraction(format!("archive has no entry named '{wanted}'")));
    }

    match entries {
        [(i, name)] => Ok((*i, name.as_str())),
        [] => Err(IngestError::Extraction("archive contains no files".to_string())),
        _ => {
            let names: Vec<&str> = entries.iter().map(|(_, n)| n.as_str()).collect();
            Err(IngestError::Extraction(format!(
                "archive holds {} files ({}); name the dataset entry explicitly",
                names.len(),
                names.join(", ")
            )))
        }
    }
}

fn reset_dir(dir: &Path) -> Result<(), IngestError> {
    if dir.exists() {
        tracing::warn!(dir = %dir.display(), "clearing existing raw data directory");
        fs::remove_dir_all(dir)
            .map_err(|e| IngestError::Extraction(format!("failed to clear '{}': {e}", dir.display())))?;
    }
    fs::create_dir_all(dir)
        .map_err(|e| IngestError::Extraction(format!("failed to create '{}': {e}", dir.display())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in files {
            zip.start_file(*name, zip::write::FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_single_entry_into_cleared_dir() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("flight.zip");
        write_zip(&archive, &[("data/flight.csv", "a,b\n1,2\n")]);

        let raw = dir.path().join("raw");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("stale.csv"), "old").unwrap();

        let path = extract_dataset(&archive, &raw, None).unwrap();
        assert_eq!(path, raw.join("flight.csv"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
        assert!(!raw.join("stale.csv").exists());
    }

    #[test]
    fn several_files_need_an_explicit_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("flight.zip");
        write_zip(&archive, &[("train.csv", "x"), ("test.csv", "y")]);
        let raw = dir.path().join("raw");

        let err = extract_dataset(&archive, &raw, None).unwrap_err();
        assert!(matches!(err, IngestError::Extraction(_)));

        let path = extract_dataset(&archive, &raw, Some("test.csv")).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "y");
    }

    #[test]
    fn non_zip_input_is_an_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("flight.zip");
        fs::write(&archive, "not a zip").unwrap();
        let err = extract_dataset(&archive, &dir.path().join("raw"), None).unwrap_err();
        assert!(matches!(err, IngestError::Extraction(_)));
    }
}
