//! Domain types used throughout the calibration pipeline.
//!
//! This module defines:
//!
//! - the calibration period table and parameter-space bounds
//! - sampled parameter points and per-trial results
//! - the persisted best-result record

pub mod periods;
pub mod types;

pub use periods::*;
pub use types::*;
