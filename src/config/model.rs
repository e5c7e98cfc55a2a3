// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::NodeId;

/// Top-level profile as read from a TOML file.
///
/// ```toml
/// [simulation]
/// arrival_rate = 10.0
/// jobs = 10
///
/// [network]
/// bandwidth = [[1, 2], [3, 4]]
///
/// [task.A]
/// nodes = [0]
/// next = { B = 0.05 }
///
/// [task.B]
/// nodes = [1]
///
/// [[node]]
/// id = 0
/// exec = { A = 0.02, B = 0.03 }
/// ```
///
/// Only `[task.<name>]`, `[[node]]` and `[network]` carry the topology; the
/// `[simulation]` section has defaults for everything.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub network: NetworkSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Per-node execution profiles from `[[node]]`.
    #[serde(default)]
    pub node: Vec<NodeConfig>,
}

/// Validated profile. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    simulation: SimulationSection,
    network: NetworkSection,
    task: BTreeMap<String, TaskConfig>,
    node: Vec<NodeConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            simulation: raw.simulation,
            network: raw.network,
            task: raw.task,
            node: raw.node,
        }
    }

    pub fn simulation(&self) -> &SimulationSection {
        &self.simulation
    }

    pub fn network(&self) -> &NetworkSection {
        &self.network
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn nodes(&self) -> &[NodeConfig] {
        &self.node
    }
}

/// `[simulation]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSection {
    /// Job arrival rate in jobs per second.
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,

    /// Number of completed jobs (terminal firings) to wait for.
    #[serde(default = "default_jobs")]
    pub jobs: u64,

    /// Raw arrivals generated per requested job. Values above 1.0 keep
    /// terminal nodes from starving for the last few upstream tokens.
    #[serde(default = "default_arrival_margin")]
    pub arrival_margin: f64,

    /// How often the controller checks terminal completion counts.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Concurrent fan-out workers per node.
    #[serde(default = "default_dispatch_workers")]
    pub dispatch_workers: usize,

    /// Abort with a stall error if the jobs have not completed by then.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

fn default_arrival_rate() -> f64 {
    10.0
}

fn default_jobs() -> u64 {
    10
}

fn default_arrival_margin() -> f64 {
    2.0
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_dispatch_workers() -> usize {
    4
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            arrival_rate: default_arrival_rate(),
            jobs: default_jobs(),
            arrival_margin: default_arrival_margin(),
            poll_interval_ms: default_poll_interval_ms(),
            dispatch_workers: default_dispatch_workers(),
            timeout_secs: None,
        }
    }
}

/// `[network]` section: the node x node bandwidth matrix.
///
/// Row `i` holds the bandwidth from node `i` to every other node. The matrix
/// must be square but need not be symmetric.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NetworkSection {
    #[serde(default)]
    pub bandwidth: Vec<Vec<f64>>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Node replicas executing this task.
    pub nodes: Vec<NodeId>,

    /// Dependent tasks and the data volume sent to each of them.
    #[serde(default)]
    pub next: BTreeMap<String, f64>,
}

/// `[[node]]` entry: execution time of each task on this node, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: NodeId,

    #[serde(default)]
    pub exec: BTreeMap<String, f64>,
}
