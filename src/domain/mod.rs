//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and parsed ticket records (`RawRecord`, `ParsedRecord`)
//! - the prediction-input row (`FlightFeatures`)
//! - pipeline configuration, state and outputs (`IngestionConfig`, `Stage`, `IngestionResult`)

pub mod types;

pub use types::*;
