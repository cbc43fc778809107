//! Fetch the source archive.
//!
//! `http://` and `https://` sources are downloaded with a blocking reqwest
//! client; anything else is a local archive path (optionally `file://`) and is
//! copied. There is no retry: a failed fetch fails the run.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::error::IngestError;

/// Fetch `source` into `download_dir/file_name` and return the archive path.
pub fn fetch_archive(source: &str, download_dir: &Path, file_name: &str) -> Result<PathBuf, IngestError> {
    fs::create_dir_all(download_dir).map_err(|e| {
        IngestError::Download(format!("failed to create '{}': {e}", download_dir.display()))
    })?;
    let target = download_dir.join(file_name);

    if is_remote(source) {
        tracing::info!(url = source, target = %target.display(), "downloading archive");
        download(source, &target)?;
    } else {
        let local = Path::new(source.strip_prefix("file://").unwrap_or(source));
        tracing::info!(source = %local.display(), target = %target.display(), "copying local archive");
        fs::copy(local, &target).map_err(|e| {
            IngestError::Download(format!("failed to copy '{}': {e}", local.display()))
        })?;
    }

    Ok(target)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn download(url: &str, target: &Path) -> Result<(), IngestError> {
    let resp = Client::new()
        .get(url)
        .send()
        .map_err(|e| IngestError::Download(format!("request to '{url}' failed: {e}")))?;

    if !resp.status().is_success() {
        return Err(IngestError::Download(format!(
            "request to '{url}' failed with status {}",
            resp.status()
        )));
    }

    let bytes = resp
        .bytes()
        .map_err(|e| IngestError::Download(format!("failed to read response body: {e}")))?;
    fs::write(target, &bytes)
        .map_err(|e| IngestError::Download(format!("failed to write '{}': {e}", target.display())))?;

    tracing::info!(bytes = bytes.len(), "archive downloaded");
    Ok(())
}
