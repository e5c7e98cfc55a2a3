// src/graph/topology.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::node::{NodeActor, ReplicaGroup};
use crate::types::{NodeId, TaskName};

/// The wired actor graph, immutable in topology once built.
///
/// Nodes are keyed by identity, so lookup never depends on the order in
/// which they were constructed.
#[derive(Debug, Clone)]
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Arc<NodeActor>>,
    replicas: BTreeMap<TaskName, Vec<NodeId>>,
    parents: BTreeMap<TaskName, Vec<TaskName>>,
    entry_groups: Vec<ReplicaGroup>,
}

impl NodeGraph {
    pub(crate) fn new(
        nodes: BTreeMap<NodeId, Arc<NodeActor>>,
        replicas: BTreeMap<TaskName, Vec<NodeId>>,
        parents: BTreeMap<TaskName, Vec<TaskName>>,
        entry_groups: Vec<ReplicaGroup>,
    ) -> Self {
        Self {
            nodes,
            replicas,
            parents,
            entry_groups,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<NodeActor>> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<NodeActor>> {
        self.nodes.get(&id)
    }

    /// All task names in order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.replicas.keys().map(|s| s.as_str())
    }

    /// Parent tasks of `task` (`["Input"]` for entry tasks).
    pub fn parents_of(&self, task: &str) -> &[TaskName] {
        self.parents.get(task).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// Node replicas executing `task`, in mapping order.
    pub fn replicas_of(&self, task: &str) -> &[NodeId] {
        self.replicas.get(task).map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Replica groups fed by the arrival source, one per entry task.
    pub fn entry_groups(&self) -> &[ReplicaGroup] {
        &self.entry_groups
    }

    /// Nodes with an empty fan-out.
    pub fn terminal_nodes(&self) -> impl Iterator<Item = &Arc<NodeActor>> {
        self.nodes.values().filter(|n| n.is_terminal())
    }

    /// Sum of completed firings over all terminal nodes.
    pub fn terminal_completions(&self) -> u64 {
        self.terminal_nodes().map(|n| n.completed()).sum()
    }
}
