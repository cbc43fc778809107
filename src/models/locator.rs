//! Locate the latest saved model.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, exit_code};

/// Path of the model file inside the highest-numbered sub-directory of `model_dir`.
///
/// Sub-directories whose names are not integers are ignored. The model file is
/// the first regular file by name.
pub fn latest_model_path(model_dir: &Path) -> Result<PathBuf, AppError> {
    let entries = fs::read_dir(model_dir).map_err(|e| {
        AppError::new(exit_code::USAGE, format!("Failed to read model dir '{}': {e}", model_dir.display()))
    })?;

    let mut latest: Option<(u64, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| AppError::new(exit_code::USAGE, format!("Failed to read model dir entry: {e}")))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(version) = entry.file_name().to_str().and_then(|n| n.parse::<u64>().ok()) else {
            continue;
        };
        if latest.as_ref().is_none_or(|(v, _)| version > *v) {
            latest = Some((version, path));
        }
    }

    let (version, dir) = latest.ok_or_else(|| {
        AppError::new(exit_code::USAGE, format!("No numbered model directories in '{}'.", model_dir.display()))
    })?;

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)
        .map_err(|e| AppError::new(exit_code::USAGE, format!("Failed to read '{}': {e}", dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .next()
        .ok_or_else(|| AppError::new(exit_code::USAGE, format!("Model directory {version} is empty.")))
}
