//! `flight-fare` library crate.
//!
//! The binary (`fare`) is a thin wrapper around this library so that:
//!
//! - the ingestion pipeline is testable without spawning processes
//! - a web front-end can drive the same pipeline through `app::registry`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod report;
pub mod split;
