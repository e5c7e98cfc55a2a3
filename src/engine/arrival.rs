// src/engine/arrival.rs

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{FlowsimError, Result};
use crate::node::ReplicaGroup;
use crate::types::INPUT_TASK;

/// Generates job-start tokens at a fixed period.
///
/// Each job is delivered to one replica of every entry task, chosen
/// round-robin on the job's sequence number.
#[derive(Debug)]
pub struct ArrivalSource {
    period: Duration,
    destinations: Vec<ReplicaGroup>,
    arrival_times: Mutex<Vec<Instant>>,
}

impl ArrivalSource {
    /// `rate` is in jobs per second and must be positive.
    pub fn new(rate: f64) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(FlowsimError::ConfigError(format!(
                "arrival rate must be > 0 (got {rate})"
            )));
        }
        let period = Duration::try_from_secs_f64(1.0 / rate).map_err(|e| {
            FlowsimError::ConfigError(format!("invalid arrival period for rate {rate}: {e}"))
        })?;

        Ok(Self {
            period,
            destinations: Vec::new(),
            arrival_times: Mutex::new(Vec::new()),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Register the replicas of one entry task.
    pub fn add_destinations(&mut self, group: ReplicaGroup) {
        self.destinations.push(group);
    }

    pub fn destinations(&self) -> &[ReplicaGroup] {
        &self.destinations
    }

    /// Emit `count` jobs, one every period. Returns the number of jobs
    /// emitted.
    pub async fn generate(&self, count: u64) -> Result<u64> {
        if self.destinations.is_empty() {
            warn!("arrival source has no destinations; no jobs generated");
            return Ok(0);
        }

        info!(count, period = ?self.period, "arrival source started");

        for seq in 0..count {
            for group in &self.destinations {
                let Some(replica) = group.pick(seq) else {
                    continue;
                };
                replica.gate.notify_arrival(INPUT_TASK)?;
                debug!(job = seq, task = group.task(), node = replica.node, "job arrived");
            }
            self.lock_times().push(Instant::now());
            tokio::time::sleep(self.period).await;
        }

        info!(count, "arrival source finished");
        Ok(count)
    }

    /// Arrival timestamps recorded so far, in job order.
    pub fn arrival_times(&self) -> Vec<Instant> {
        self.lock_times().clone()
    }

    fn lock_times(&self) -> MutexGuard<'_, Vec<Instant>> {
        self.arrival_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
