//! Saved model artifacts.
//!
//! Training writes each model into its own numbered sub-directory of the
//! model directory; the serving side always loads the newest one.

pub mod locator;

pub use locator::*;
