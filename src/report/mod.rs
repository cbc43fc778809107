//! Reporting utilities: run summaries and history tables.

pub mod format;

pub use format::*;
