// src/config/profile.rs

//! The four static inputs consumed by the graph builder.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::ConfigFile;
use crate::engine::SimulationOptions;
use crate::types::{NodeId, TaskName};

/// Static system description: task mapping, execution profile, bandwidth
/// matrix and communication requirements.
///
/// Every map is ordered, so a profile built in any insertion order yields
/// the same graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemProfile {
    /// task -> node replicas executing it.
    pub mapping: BTreeMap<TaskName, Vec<NodeId>>,
    /// node -> (task -> execution time in seconds).
    pub exec: BTreeMap<NodeId, BTreeMap<TaskName, f64>>,
    /// `bandwidth[from][to]`, in data units per second.
    pub bandwidth: Vec<Vec<f64>>,
    /// task -> (dependent task -> data units sent per firing).
    pub comm: BTreeMap<TaskName, BTreeMap<TaskName, f64>>,
}

impl SystemProfile {
    /// Node count implied by the bandwidth matrix.
    pub fn node_capacity(&self) -> usize {
        self.bandwidth.len()
    }
}

impl ConfigFile {
    /// Split the validated file into the builder's inputs.
    pub fn profile(&self) -> SystemProfile {
        let mapping = self
            .tasks()
            .iter()
            .map(|(name, task)| (name.clone(), task.nodes.clone()))
            .collect();

        let comm = self
            .tasks()
            .iter()
            .filter(|(_, task)| !task.next.is_empty())
            .map(|(name, task)| (name.clone(), task.next.clone()))
            .collect();

        let exec = self
            .nodes()
            .iter()
            .map(|node| (node.id, node.exec.clone()))
            .collect();

        SystemProfile {
            mapping,
            exec,
            bandwidth: self.network().bandwidth.clone(),
            comm,
        }
    }

    /// Simulation parameters from `[simulation]`.
    pub fn options(&self) -> SimulationOptions {
        let sim = self.simulation();
        SimulationOptions {
            arrival_rate: sim.arrival_rate,
            jobs: sim.jobs,
            arrival_margin: sim.arrival_margin,
            poll_interval: Duration::from_millis(sim.poll_interval_ms),
            dispatch_workers: sim.dispatch_workers,
            deadline: sim.timeout_secs.and_then(|s| Duration::try_from_secs_f64(s).ok()),
        }
    }
}
