//! Command-line parsing for the period calibration driver.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the calibration/scoring code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "calib", version, about = "Epidemic period calibration driver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calibrate one period against the observation table and persist the
    /// best parameters + trial history.
    Calibrate(CalibrateArgs),
    /// Write the smoothed observation table as CSV (undefined edge days dropped).
    Smooth(SmoothArgs),
    /// List the available calibration periods.
    Periods,
}

/// Options for a calibration run.
#[derive(Debug, Parser, Clone)]
pub struct CalibrateArgs {
    /// Observation CSV with `date`, `cases`, `deaths` columns.
    #[arg(long, default_value = "data/baguio_raw.csv")]
    pub data: PathBuf,

    /// Period name (see `calib periods`).
    #[arg(short = 'p', long, default_value = "merged_1")]
    pub period: String,

    /// Trial budget.
    #[arg(short = 'n', long = "trials", default_value_t = 100)]
    pub n_trials: usize,

    /// Sampler seed (fixed seed + deterministic simulator reproduces a run).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Uniform startup trials before the model-based sampler takes over.
    #[arg(long, default_value_t = 5)]
    pub n_startup_trials: usize,

    /// Candidates evaluated per model-based suggestion.
    #[arg(long, default_value_t = 12)]
    pub n_ei_candidates: usize,

    /// Lower bound for beta.
    #[arg(long, default_value_t = 0.005)]
    pub beta_min: f64,

    /// Upper bound for beta.
    #[arg(long, default_value_t = 0.007)]
    pub beta_max: f64,

    /// Lower bound for rel_death_prob.
    #[arg(long, default_value_t = 0.5)]
    pub rdp_min: f64,

    /// Upper bound for rel_death_prob.
    #[arg(long, default_value_t = 0.6)]
    pub rdp_max: f64,

    /// Directory for run artifacts.
    #[arg(long, default_value = "period_calibration_independent")]
    pub out_dir: PathBuf,

    /// Simulated agent population size.
    #[arg(long, default_value_t = 10_000.0)]
    pub pop_size: f64,

    /// Initially infected agents.
    #[arg(long, default_value_t = 1.0)]
    pub pop_infected: f64,

    /// Scale factor from agents to the real population.
    #[arg(long, default_value_t = 37.0)]
    pub pop_scale: f64,
}

/// Options for the smoothed-table export.
#[derive(Debug, Parser)]
pub struct SmoothArgs {
    /// Observation CSV with `date`, `cases`, `deaths` columns.
    #[arg(long, default_value = "data/baguio_raw.csv")]
    pub data: PathBuf,

    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "data/baguio_smoothed.csv")]
    pub out: PathBuf,
}
