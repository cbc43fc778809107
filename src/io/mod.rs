//! Input/output helpers.
//!
//! - raw dataset CSV ingest + null-drop (`ingest`)
//! - train/test and prediction-input CSV writers (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
