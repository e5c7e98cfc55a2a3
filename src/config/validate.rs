// src/config/validate.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FlowsimError, Result};
use crate::types::NodeId;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = FlowsimError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every static check on a raw profile.
///
/// Dependents that name an unknown task are left to the graph builder,
/// which reports them as [`FlowsimError::UnresolvedNode`].
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_simulation(cfg)?;
    validate_assignments(cfg)?;
    validate_bandwidth(cfg)?;
    validate_exec_profile(cfg)?;
    validate_comm(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> FlowsimError {
    FlowsimError::ConfigError(msg.into())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "profile must contain at least one [task.<name>] section",
        ));
    }
    Ok(())
}

fn validate_simulation(cfg: &RawConfigFile) -> Result<()> {
    let sim = &cfg.simulation;

    if !(sim.arrival_rate.is_finite() && sim.arrival_rate > 0.0) {
        return Err(config_error(format!(
            "[simulation].arrival_rate must be > 0 (got {})",
            sim.arrival_rate
        )));
    }
    if sim.jobs == 0 {
        return Err(config_error("[simulation].jobs must be >= 1 (got 0)"));
    }
    if !(sim.arrival_margin.is_finite() && sim.arrival_margin >= 1.0) {
        return Err(config_error(format!(
            "[simulation].arrival_margin must be >= 1.0 (got {})",
            sim.arrival_margin
        )));
    }
    if sim.poll_interval_ms == 0 {
        return Err(config_error("[simulation].poll_interval_ms must be >= 1 (got 0)"));
    }
    if sim.dispatch_workers == 0 {
        return Err(config_error("[simulation].dispatch_workers must be >= 1 (got 0)"));
    }
    if let Some(t) = sim.timeout_secs {
        if !(t.is_finite() && t > 0.0) {
            return Err(config_error(format!(
                "[simulation].timeout_secs must be > 0 (got {t})"
            )));
        }
    }
    Ok(())
}

fn validate_assignments(cfg: &RawConfigFile) -> Result<()> {
    let mut owner: BTreeMap<NodeId, &str> = BTreeMap::new();

    for (name, task) in cfg.task.iter() {
        if task.nodes.is_empty() {
            return Err(config_error(format!(
                "task '{name}' must be assigned to at least one node"
            )));
        }
        for &node in task.nodes.iter() {
            if let Some(first) = owner.insert(node, name.as_str()) {
                return Err(FlowsimError::DuplicateNode {
                    node,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_bandwidth(cfg: &RawConfigFile) -> Result<()> {
    let matrix = &cfg.network.bandwidth;
    let size = matrix.len();

    for (row_idx, row) in matrix.iter().enumerate() {
        if row.len() != size {
            return Err(config_error(format!(
                "[network].bandwidth must be square: row {row_idx} has {} entries, expected {size}",
                row.len()
            )));
        }
        if let Some(bad) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(config_error(format!(
                "[network].bandwidth row {row_idx} contains invalid value {bad}"
            )));
        }
    }

    for (name, task) in cfg.task.iter() {
        if let Some(node) = task.nodes.iter().find(|&&n| n >= size) {
            return Err(config_error(format!(
                "task '{name}' is assigned to node {node}, but [network].bandwidth only covers {size} nodes"
            )));
        }
    }
    Ok(())
}

fn validate_exec_profile(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = BTreeSet::new();
    for node in cfg.node.iter() {
        if !seen.insert(node.id) {
            return Err(config_error(format!(
                "[[node]] id {} is declared more than once",
                node.id
            )));
        }
        for (task, secs) in node.exec.iter() {
            if !(secs.is_finite() && *secs >= 0.0) {
                return Err(config_error(format!(
                    "node {} has invalid exec time {secs} for task '{task}'",
                    node.id
                )));
            }
        }
    }

    for (name, task) in cfg.task.iter() {
        for &id in task.nodes.iter() {
            let has_time = cfg
                .node
                .iter()
                .find(|n| n.id == id)
                .is_some_and(|n| n.exec.contains_key(name));
            if !has_time {
                return Err(config_error(format!(
                    "node {id} runs task '{name}' but has no exec time for it"
                )));
            }
        }
    }
    Ok(())
}

fn validate_comm(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for (next, volume) in task.next.iter() {
            if !(volume.is_finite() && *volume >= 0.0) {
                return Err(config_error(format!(
                    "task '{name}' sends invalid volume {volume} to '{next}'"
                )));
            }
            if next == name {
                return Err(config_error(format!(
                    "task '{name}' cannot list itself in `next`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction follows data flow: A -> B for `[task.A] next = { B = .. }`.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for next in task.next.keys() {
            graph.add_edge(name.as_str(), next.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(FlowsimError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
