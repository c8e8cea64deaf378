//! Run-artifact persistence.
//!
//! - trial history + smoothed-table CSV exports (`export`)
//! - best-result JSON read/write (`results`)
//!
//! Every run writes uniquely named artifacts (`{label}_{period}_{stamp}`);
//! no run overwrites another's output.

use chrono::Local;

pub mod export;
pub mod results;

pub use export::*;
pub use results::*;

/// Timestamp component for artifact filenames.
pub fn run_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}
