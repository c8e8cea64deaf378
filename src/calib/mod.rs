//! Calibration loop.
//!
//! Responsibilities:
//!
//! - score simulated vs. observed series (`misfit`)
//! - propose candidate parameter points (`sampler`)
//! - run the sequential trial loop and track the best result (`driver`)

pub mod driver;
pub mod misfit;
pub mod sampler;

pub use driver::*;
pub use misfit::*;
pub use sampler::*;
