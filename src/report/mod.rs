//! Reporting utilities: run summaries and trial analysis.

pub mod format;

pub use format::*;
