// src/graph/builder.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::SystemProfile;
use crate::errors::{FlowsimError, Result};
use crate::graph::topology::NodeGraph;
use crate::node::{FanoutGroup, InputGate, NodeActor, Replica, ReplicaGroup};
use crate::types::{INPUT_TASK, NodeId, TaskName};

/// Builds the actor graph from a static system profile.
///
/// Construction happens in three passes:
/// 1. parent sets per task (tasks without predecessors get `Input`);
/// 2. one input gate per (node, task) assignment;
/// 3. one actor per assignment, with a fan-out group per dependent task
///    listing every replica of that task.
///
/// Gates are created before any actor so that fan-out groups can point at
/// downstream gates regardless of the order tasks are visited in.
pub struct GraphBuilder<'a> {
    profile: &'a SystemProfile,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(profile: &'a SystemProfile) -> Self {
        Self { profile }
    }

    /// Convenience for `GraphBuilder::new(profile).build_graph()`.
    pub fn build(profile: &SystemProfile) -> Result<NodeGraph> {
        GraphBuilder::new(profile).build_graph()
    }

    pub fn build_graph(&self) -> Result<NodeGraph> {
        let parents = self.parent_sets()?;
        let assignments = self.assignments()?;
        let gates = self.gates(&assignments, &parents);

        let mut nodes = BTreeMap::new();
        for (&id, task) in assignments.iter() {
            let fanout = self.fanout_of(task, &gates)?;
            let actor = NodeActor::new(
                id,
                task.clone(),
                self.exec_time(id, task)?,
                self.bandwidth_row(id)?,
                Arc::clone(&gates[&id]),
                fanout,
            );
            debug!(
                node = id,
                task = %task,
                exec_time = ?actor.exec_time(),
                dependents = actor.fanout().len(),
                "node constructed"
            );
            nodes.insert(id, Arc::new(actor));
        }

        let entry_groups = parents
            .iter()
            .filter(|(_, p)| p.iter().any(|t| t == INPUT_TASK))
            .map(|(task, _)| self.replica_group(task, task, &gates))
            .collect::<Result<Vec<_>>>()?;

        let graph = NodeGraph::new(nodes, self.profile.mapping.clone(), parents, entry_groups);

        info!(
            nodes = graph.len(),
            entry_tasks = ?graph.entry_groups().iter().map(|g| g.task()).collect::<Vec<_>>(),
            terminal_nodes = ?graph.terminal_nodes().map(|n| n.id()).collect::<Vec<_>>(),
            "node graph built"
        );

        Ok(graph)
    }

    /// Parent tasks of every mapped task.
    fn parent_sets(&self) -> Result<BTreeMap<TaskName, Vec<TaskName>>> {
        let mut parents: BTreeMap<TaskName, Vec<TaskName>> = BTreeMap::new();

        for task in self.profile.mapping.keys() {
            let mut preds: Vec<TaskName> = self
                .profile
                .comm
                .iter()
                .filter(|(_, next)| next.contains_key(task))
                .map(|(pre, _)| pre.clone())
                .collect();

            // A parent without nodes would leave this task's gate waiting
            // forever.
            if let Some(pre) = preds
                .iter()
                .find(|pre| !self.profile.mapping.contains_key(pre.as_str()))
            {
                return Err(FlowsimError::UnresolvedNode {
                    task: pre.clone(),
                    referenced_by: task.clone(),
                });
            }

            if preds.is_empty() {
                preds.push(INPUT_TASK.to_string());
            }
            parents.insert(task.clone(), preds);
        }

        Ok(parents)
    }

    /// node id -> task, rejecting nodes assigned twice and tasks with no nodes.
    fn assignments(&self) -> Result<BTreeMap<NodeId, TaskName>> {
        let mut owner: BTreeMap<NodeId, TaskName> = BTreeMap::new();

        for (task, ids) in self.profile.mapping.iter() {
            if ids.is_empty() {
                return Err(FlowsimError::ConfigError(format!(
                    "task '{task}' must be assigned to at least one node"
                )));
            }
            for &id in ids {
                if let Some(first) = owner.insert(id, task.clone()) {
                    return Err(FlowsimError::DuplicateNode {
                        node: id,
                        first,
                        second: task.clone(),
                    });
                }
            }
        }

        Ok(owner)
    }

    fn gates(
        &self,
        assignments: &BTreeMap<NodeId, TaskName>,
        parents: &BTreeMap<TaskName, Vec<TaskName>>,
    ) -> BTreeMap<NodeId, Arc<InputGate>> {
        assignments
            .iter()
            .map(|(&id, task)| {
                let preds = parents.get(task).cloned().unwrap_or_default();
                (id, Arc::new(InputGate::new(id, preds)))
            })
            .collect()
    }

    fn fanout_of(
        &self,
        task: &str,
        gates: &BTreeMap<NodeId, Arc<InputGate>>,
    ) -> Result<Vec<FanoutGroup>> {
        let Some(next) = self.profile.comm.get(task) else {
            return Ok(Vec::new());
        };

        next.iter()
            .map(|(next_task, &comm_req)| {
                Ok(FanoutGroup {
                    replicas: self.replica_group(next_task, task, gates)?,
                    comm_req,
                })
            })
            .collect()
    }

    /// All replicas of `task`, as seen from `referenced_by`.
    fn replica_group(
        &self,
        task: &str,
        referenced_by: &str,
        gates: &BTreeMap<NodeId, Arc<InputGate>>,
    ) -> Result<ReplicaGroup> {
        let unresolved = || FlowsimError::UnresolvedNode {
            task: task.to_string(),
            referenced_by: referenced_by.to_string(),
        };

        let ids = self.profile.mapping.get(task).ok_or_else(unresolved)?;
        let replicas = ids
            .iter()
            .map(|&node| {
                let gate = gates.get(&node).ok_or_else(unresolved)?;
                Ok(Replica {
                    node,
                    gate: Arc::clone(gate),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReplicaGroup::new(task, replicas))
    }

    fn exec_time(&self, id: NodeId, task: &str) -> Result<Duration> {
        let secs = self
            .profile
            .exec
            .get(&id)
            .and_then(|times| times.get(task))
            .copied()
            .ok_or_else(|| {
                FlowsimError::ConfigError(format!(
                    "node {id} runs task '{task}' but has no exec time for it"
                ))
            })?;

        Duration::try_from_secs_f64(secs).map_err(|e| {
            FlowsimError::ConfigError(format!(
                "node {id} has invalid exec time {secs} for task '{task}': {e}"
            ))
        })
    }

    fn bandwidth_row(&self, id: NodeId) -> Result<Vec<f64>> {
        let size = self.profile.node_capacity();
        let row = self.profile.bandwidth.get(id).ok_or_else(|| {
            FlowsimError::ConfigError(format!(
                "node {id} has no bandwidth row (matrix covers {size} nodes)"
            ))
        })?;

        if row.len() != size {
            return Err(FlowsimError::ConfigError(format!(
                "bandwidth matrix must be square: row {id} has {} entries, expected {size}",
                row.len()
            )));
        }
        Ok(row.clone())
    }
}
