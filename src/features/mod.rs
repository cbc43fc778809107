//! Feature engineering: raw record parsing and price binning.

pub mod binning;
pub mod record;

pub use binning::*;
pub use record::*;
