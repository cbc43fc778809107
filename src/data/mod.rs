//! Dataset acquisition: archive download and extraction.

pub mod archive;
pub mod download;

pub use archive::extract_dataset;
pub use download::fetch_archive;
