//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads and smooths the observation table
//! - runs the calibration loop
//! - prints summaries
//! - persists run artifacts

use clap::Parser;

use crate::cli::{CalibrateArgs, Command, SmoothArgs};
use crate::domain::{Bounds, CalibConfig, INTERVENTION_PERIODS, ParamSpace};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `calib` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Calibrate(args) => handle_calibrate(args),
        Command::Smooth(args) => handle_smooth(args),
        Command::Periods => handle_periods(),
    }
}

fn handle_calibrate(args: CalibrateArgs) -> Result<(), AppError> {
    let config = calib_config_from_args(&args)?;
    let run = pipeline::run_calibration_pipeline(&config)?;

    println!(
        "{}",
        crate::report::format_run_header(&config, &run.observations)
    );
    println!("{}", crate::report::format_run_summary(&run.run));
    println!("Saved best parameters to {}", run.best_path.display());
    println!("Saved trial history to {}", run.trials_path.display());

    Ok(())
}

fn handle_smooth(args: SmoothArgs) -> Result<(), AppError> {
    let observations = crate::data::load_observations(&args.data)?;
    crate::io::write_smoothed_csv(&args.out, &observations)?;
    println!("Smoothed data saved at: {}", args.out.display());
    Ok(())
}

fn handle_periods() -> Result<(), AppError> {
    println!("Available periods:");
    for p in INTERVENTION_PERIODS {
        println!("  {:<9} {} to {} ({} days)", p.name, p.start, p.end, p.len_days());
    }
    Ok(())
}

pub fn calib_config_from_args(args: &CalibrateArgs) -> Result<CalibConfig, AppError> {
    let space = ParamSpace {
        beta: Bounds::new(args.beta_min, args.beta_max)?,
        rel_death_prob: Bounds::new(args.rdp_min, args.rdp_max)?,
    };

    let config = CalibConfig {
        data_path: args.data.clone(),
        period: args.period.clone(),
        n_trials: args.n_trials,
        seed: args.seed,
        n_startup_trials: args.n_startup_trials,
        n_ei_candidates: args.n_ei_candidates,
        space,
        output_dir: args.out_dir.clone(),
        pop_size: args.pop_size,
        pop_infected: args.pop_infected,
        pop_scale: args.pop_scale,
    };
    config.validate()?;
    Ok(config)
}
