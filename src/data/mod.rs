//! Observation data loading and smoothing.
//!
//! - CSV ingest + daily reindexing (`observations`)
//! - centered moving-average smoothing (`smooth`)

pub mod observations;
pub mod smooth;

pub use observations::*;
pub use smooth::*;
