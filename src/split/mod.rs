//! Train/test splitting.

pub mod stratified;

pub use stratified::*;
