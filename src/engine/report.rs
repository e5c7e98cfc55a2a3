// src/engine/report.rs

//! Aggregate statistics of a finished run.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::errors::{FlowsimError, Result};
use crate::graph::NodeGraph;
use crate::types::{NodeId, TaskName};

/// Approximate mean service time of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTime {
    /// Longest busy time among the task's replicas divided by their summed
    /// firings.
    Mean(Duration),
    /// None of the task's replicas completed a firing.
    Unobserved,
}

impl ServiceTime {
    /// Service time from `(busy, completed)` of every replica of a task.
    pub fn from_replicas(replicas: &[(Duration, u64)]) -> Self {
        let total: u64 = replicas.iter().map(|&(_, completed)| completed).sum();
        if total == 0 {
            return ServiceTime::Unobserved;
        }
        let max_busy = replicas
            .iter()
            .map(|&(busy, _)| busy)
            .max()
            .unwrap_or_default();
        ServiceTime::Mean(mean_of(max_busy, total))
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            ServiceTime::Mean(d) => Some(*d),
            ServiceTime::Unobserved => None,
        }
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceTime::Mean(d) => write!(f, "{:.6} s", d.as_secs_f64()),
            ServiceTime::Unobserved => write!(f, "n/a (no completed firings)"),
        }
    }
}

/// Per-node summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub node: NodeId,
    pub task: TaskName,
    pub completed: u64,
    pub busy: Duration,
    pub terminal: bool,
}

/// Result of a simulation: mean end-to-end latency and per-task service
/// times.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub mean_latency: Duration,
    /// Firings recorded by terminal nodes.
    pub completed_jobs: u64,
    pub service_times: BTreeMap<TaskName, ServiceTime>,
    pub nodes: Vec<NodeReport>,
}

impl SimulationReport {
    /// Aggregate the statistics of a halted graph.
    pub fn compute(graph: &NodeGraph, arrival_times: &[Instant]) -> Result<Self> {
        let nodes: Vec<NodeReport> = graph
            .nodes()
            .map(|n| {
                let stats = n.stats();
                NodeReport {
                    node: n.id(),
                    task: n.task().to_string(),
                    completed: stats.completed,
                    busy: stats.busy,
                    terminal: n.is_terminal(),
                }
            })
            .collect();

        let mut service_times = BTreeMap::new();
        for task in graph.tasks() {
            let replicas: Vec<(Duration, u64)> = nodes
                .iter()
                .filter(|n| n.task == task)
                .map(|n| (n.busy, n.completed))
                .collect();
            let time = ServiceTime::from_replicas(&replicas);
            if time == ServiceTime::Unobserved {
                warn!(task, "no completed firings; service time unobserved");
            }
            service_times.insert(task.to_string(), time);
        }

        let mut completions: Vec<Instant> = graph
            .terminal_nodes()
            .flat_map(|n| n.stats().finish_times)
            .collect();
        completions.sort();

        Ok(Self {
            mean_latency: mean_latency(arrival_times, &completions)?,
            completed_jobs: completions.len() as u64,
            service_times,
            nodes,
        })
    }
}

/// Mean of `completion - arrival` over positionally paired timestamps.
/// A completion earlier than its paired arrival contributes zero.
pub fn mean_latency(arrivals: &[Instant], completions: &[Instant]) -> Result<Duration> {
    let pairs = arrivals.len().min(completions.len());
    if pairs == 0 {
        return Err(FlowsimError::Degenerate(format!(
            "cannot average latency over {} arrivals and {} completions",
            arrivals.len(),
            completions.len()
        )));
    }

    // With several sinks the merged k-th completion can precede the k-th
    // arrival; such pairs count as zero latency.
    let mut inverted = 0usize;
    let total: Duration = arrivals
        .iter()
        .zip(completions)
        .map(|(start, end)| {
            if end < start {
                inverted += 1;
            }
            end.saturating_duration_since(*start)
        })
        .sum();

    if inverted > 0 {
        warn!(
            inverted,
            pairs, "completions earlier than their paired arrival were counted as zero latency"
        );
    }

    Ok(mean_of(total, pairs as u64))
}

fn mean_of(total: Duration, count: u64) -> Duration {
    let nanos = total.as_nanos() / u128::from(count);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Average latency of the schedule: {:.6} s ({} jobs)",
            self.mean_latency.as_secs_f64(),
            self.completed_jobs
        )?;
        writeln!(f, "Average execution time of the tasks:")?;
        for (task, time) in &self.service_times {
            writeln!(f, "  {task}: {time}")?;
        }
        writeln!(f, "Nodes:")?;
        for n in &self.nodes {
            writeln!(
                f,
                "  node {} [{}]{}: {} firings, busy {:.6} s",
                n.node,
                n.task,
                if n.terminal { " (terminal)" } else { "" },
                n.completed,
                n.busy.as_secs_f64()
            )?;
        }
        Ok(())
    }
}
