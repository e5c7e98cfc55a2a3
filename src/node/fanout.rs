// src/node/fanout.rs

//! Replica selection and communication-delay ordering.
//!
//! A firing notifies one replica of every dependent task. The outbound link
//! is modelled as a single shared channel: destinations are reached in
//! ascending order of raw delay, and each wait only covers the part of the
//! delay not already spent on earlier destinations.

use std::sync::Arc;
use std::time::Duration;

use crate::errors::{FlowsimError, Result};
use crate::node::gate::InputGate;
use crate::types::{NodeId, TaskName};

/// One node instance executing a task, addressed through its input gate.
#[derive(Debug, Clone)]
pub struct Replica {
    pub node: NodeId,
    pub gate: Arc<InputGate>,
}

/// All replicas assigned to one task.
#[derive(Debug, Clone)]
pub struct ReplicaGroup {
    task: TaskName,
    replicas: Vec<Replica>,
}

impl ReplicaGroup {
    pub fn new(task: impl Into<TaskName>, replicas: Vec<Replica>) -> Self {
        Self {
            task: task.into(),
            replicas,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.replicas.iter().map(|r| r.node).collect()
    }

    /// Replica serving the `seq`-th (0-based) token sent to this task.
    pub fn pick(&self, seq: u64) -> Option<&Replica> {
        self.replicas.get(round_robin(seq, self.replicas.len()))
    }
}

/// A dependent task of a node, with the data volume sent per firing.
#[derive(Debug, Clone)]
pub struct FanoutGroup {
    pub replicas: ReplicaGroup,
    pub comm_req: f64,
}

/// Round-robin partitioning: index of the replica for sequence number `seq`.
pub fn round_robin(seq: u64, replicas: usize) -> usize {
    if replicas == 0 {
        return 0;
    }
    (seq % replicas as u64) as usize
}

/// Communication delay of `comm_req` data units from `from` to `to`, given
/// the bandwidth row of `from`.
pub fn comm_delay(from: NodeId, to: NodeId, comm_req: f64, bandwidth: &[f64]) -> Result<Duration> {
    let bw = bandwidth.get(to).copied().ok_or_else(|| {
        FlowsimError::ConfigError(format!("node {from} has no bandwidth entry for node {to}"))
    })?;

    if bw <= 0.0 || bw.is_nan() {
        return Err(FlowsimError::ZeroBandwidth { from, to });
    }

    Duration::try_from_secs_f64(comm_req / bw).map_err(|e| {
        FlowsimError::ConfigError(format!("invalid communication delay {from} -> {to}: {e}"))
    })
}

/// Order destinations by raw delay and turn the delays into successive
/// waits. The first wait is the full smallest delay; ties keep their input
/// order.
///
/// Delays of 50, 20 and 80 ms are visited in the order 20, 50, 80 with
/// waits of 20, 30 and 30 ms.
pub fn stagger<T>(mut legs: Vec<(T, Duration)>) -> Vec<(T, Duration)> {
    legs.sort_by_key(|(_, delay)| *delay);

    let mut elapsed = Duration::ZERO;
    legs.into_iter()
        .map(|(target, delay)| {
            let wait = delay.saturating_sub(elapsed);
            elapsed = delay;
            (target, wait)
        })
        .collect()
}
