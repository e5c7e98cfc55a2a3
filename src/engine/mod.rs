// src/engine/mod.rs

//! Simulation engine.
//!
//! This module ties together:
//! - the arrival source feeding job-start tokens to entry-task replicas
//! - the controller that starts every node actor, watches terminal
//!   completions and halts the graph
//! - the aggregated report computed once the run is over

use std::time::Duration;

use crate::errors::{FlowsimError, Result};

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOptions {
    /// Job arrivals per second.
    pub arrival_rate: f64,
    /// Terminal completions to wait for.
    pub jobs: u64,
    /// Raw arrivals generated per requested job. Jobs only complete once every
    /// branch of the graph has delivered, so generating exactly `jobs`
    /// arrivals can leave a sink one token short; this is the tunable
    /// safety margin against that.
    pub arrival_margin: f64,
    /// Period of the controller's completion check.
    pub poll_interval: Duration,
    /// Concurrent fan-outs per node.
    pub dispatch_workers: usize,
    /// Give up with [`FlowsimError::Stalled`] after this much (simulated)
    /// time.
    pub deadline: Option<Duration>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            arrival_rate: 10.0,
            jobs: 10,
            arrival_margin: 2.0,
            poll_interval: Duration::from_millis(10),
            dispatch_workers: 4,
            deadline: None,
        }
    }
}

impl SimulationOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.arrival_rate.is_finite() && self.arrival_rate > 0.0) {
            return Err(FlowsimError::ConfigError(format!(
                "arrival rate must be > 0 (got {})",
                self.arrival_rate
            )));
        }
        if self.jobs == 0 {
            return Err(FlowsimError::ConfigError(
                "job count must be >= 1 (got 0)".to_string(),
            ));
        }
        if !(self.arrival_margin.is_finite() && self.arrival_margin >= 1.0) {
            return Err(FlowsimError::ConfigError(format!(
                "arrival margin must be >= 1.0 (got {})",
                self.arrival_margin
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(FlowsimError::ConfigError(
                "poll interval must be non-zero".to_string(),
            ));
        }
        if self.dispatch_workers == 0 {
            return Err(FlowsimError::ConfigError(
                "dispatch workers must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of job-start tokens the arrival source emits.
    pub fn raw_arrivals(&self) -> u64 {
        let inflated = (self.jobs as f64 * self.arrival_margin).ceil() as u64;
        inflated.max(self.jobs)
    }
}

pub mod arrival;
pub mod controller;
pub mod report;

pub use arrival::ArrivalSource;
pub use controller::SimulationController;
pub use report::{NodeReport, ServiceTime, SimulationReport};
