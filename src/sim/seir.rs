//! Deterministic daily-step SEIR reference simulator.
//!
//! This is the in-crate stand-in for the external agent-based simulator: a
//! four-compartment model stepped one day at a time, with mortality applied
//! to the infectious compartment. It exists so calibration runs end-to-end
//! without the external collaborator and so tests have a cheap, reproducible
//! simulator behind the `Simulator` trait.
//!
//! Per-day state is collected in a plain accumulator (`DailyLedger`) that is
//! appended to once per simulated day and read-only afterwards.

use crate::sim::{SimError, SimOutput, SimParams, Simulator};

/// Mean incubation period (days); 1/sigma.
const INCUBATION_DAYS: f64 = 4.5;
/// Mean infectious period (days); 1/gamma.
const INFECTIOUS_DAYS: f64 = 8.0;
/// Mean contacts per agent per day. `beta` is per-contact, so the daily
/// force of infection scales with this.
const CONTACTS_PER_DAY: f64 = 20.0;
/// Baseline infection fatality ratio, scaled by `rel_death_prob`.
const BASE_IFR: f64 = 0.01;

/// Per-day compartment snapshot plus the day's flows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRecord {
    pub day: usize,
    pub susceptible: f64,
    pub exposed: f64,
    pub infectious: f64,
    pub recovered: f64,
    pub dead: f64,
    pub new_infections: f64,
    pub new_deaths: f64,
}

/// Append-only per-day history of one simulation run.
#[derive(Debug, Clone, Default)]
pub struct DailyLedger {
    days: Vec<DayRecord>,
}

impl DailyLedger {
    fn push(&mut self, record: DayRecord) {
        self.days.push(record);
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }
}

/// Deterministic SEIR simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeirSimulator;

impl SeirSimulator {
    /// Run the model and return the full per-day ledger.
    pub fn run_ledger(&self, params: &SimParams) -> Result<DailyLedger, SimError> {
        if params.end_day < params.start_day {
            return Err(SimError(format!(
                "end_day {} before start_day {}",
                params.end_day, params.start_day
            )));
        }
        if !(params.pop_size.is_finite() && params.pop_size > 0.0) {
            return Err(SimError("pop_size must be finite and > 0".to_string()));
        }
        if !(params.beta.is_finite() && params.beta >= 0.0) {
            return Err(SimError(format!("invalid beta {}", params.beta)));
        }
        if !(params.rel_death_prob.is_finite() && params.rel_death_prob >= 0.0) {
            return Err(SimError(format!(
                "invalid rel_death_prob {}",
                params.rel_death_prob
            )));
        }

        let n_days = (params.end_day - params.start_day).num_days() as usize + 1;
        let n = params.pop_size;

        let sigma = 1.0 / INCUBATION_DAYS;
        let gamma = 1.0 / INFECTIOUS_DAYS;
        let ifr = (BASE_IFR * params.rel_death_prob).clamp(0.0, 1.0);

        let mut s = (n - params.pop_infected).max(0.0);
        let mut e = 0.0_f64;
        let mut i = params.pop_infected.min(n);
        let mut r = 0.0_f64;
        let mut d = 0.0_f64;

        let mut ledger = DailyLedger::default();

        for day in 0..n_days {
            // Daily flows, forward-Euler with dt = 1 day. Each flow is capped
            // by its source compartment so the counts stay non-negative.
            let force = params.beta * CONTACTS_PER_DAY * i / n;
            let new_exposed = (force * s).min(s);
            let new_infectious = (sigma * e).min(e);
            let leaving_i = (gamma * i).min(i);
            let new_deaths = leaving_i * ifr;
            let new_recovered = leaving_i - new_deaths;

            s -= new_exposed;
            e += new_exposed - new_infectious;
            i += new_infectious - leaving_i;
            r += new_recovered;
            d += new_deaths;

            ledger.push(DayRecord {
                day,
                susceptible: s,
                exposed: e,
                infectious: i,
                recovered: r,
                dead: d,
                new_infections: new_infectious * params.pop_scale,
                new_deaths: new_deaths * params.pop_scale,
            });
        }

        Ok(ledger)
    }
}

impl Simulator for SeirSimulator {
    fn run(&self, params: &SimParams) -> Result<SimOutput, SimError> {
        let ledger = self.run_ledger(params)?;
        let days = ledger.days();
        Ok(SimOutput {
            start: params.start_day,
            new_infections: days.iter().map(|r| r.new_infections).collect(),
            new_deaths: days.iter().map(|r| r.new_deaths).collect(),
        })
    }
}
