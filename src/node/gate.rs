// src/node/gate.rs

//! Parent-queue counters of a single node.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::trace;

use crate::errors::{FlowsimError, Result};
use crate::types::{NodeId, TaskName};

/// Input side of a node: one token counter per parent task.
///
/// Consistency policy: the readiness check and the decrement of every
/// counter happen under one lock, so a firing can never be admitted on a
/// stale snapshot and a counter can never go negative.
#[derive(Debug)]
pub struct InputGate {
    node: NodeId,
    queues: Mutex<BTreeMap<TaskName, u64>>,
    arrived: Notify,
}

impl InputGate {
    /// Create a gate with a zeroed counter for each parent task.
    pub fn new<I, S>(node: NodeId, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let queues = parents.into_iter().map(|p| (p.into(), 0)).collect();
        Self {
            node,
            queues: Mutex::new(queues),
            arrived: Notify::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Parent tasks this gate waits on, in name order.
    pub fn parents(&self) -> Vec<TaskName> {
        self.lock().keys().cloned().collect()
    }

    /// Current token count for `parent`, or `None` if it is not a parent.
    pub fn pending(&self, parent: &str) -> Option<u64> {
        self.lock().get(parent).copied()
    }

    /// Add one token from `parent` and wake the owning node.
    pub fn notify_arrival(&self, parent: &str) -> Result<()> {
        {
            let mut queues = self.lock();
            let count = queues
                .get_mut(parent)
                .ok_or_else(|| FlowsimError::UnknownParent {
                    node: self.node,
                    parent: parent.to_string(),
                })?;
            *count += 1;
            trace!(node = self.node, parent, queued = *count, "token arrived");
        }
        self.arrived.notify_one();
        Ok(())
    }

    /// Whether every counter currently holds at least one token.
    pub fn is_ready(&self) -> bool {
        Self::all_ready(&self.lock())
    }

    /// Consume one token from every counter if all are non-zero and `admit`
    /// agrees. `admit` runs only when the gate is ready, while the lock is
    /// held.
    pub fn try_take(&self, admit: impl FnOnce() -> bool) -> bool {
        let mut queues = self.lock();
        if !Self::all_ready(&queues) || !admit() {
            return false;
        }
        for count in queues.values_mut() {
            *count -= 1;
        }
        true
    }

    /// Resolves after the next `notify_arrival`, or immediately if one
    /// happened since the last wait.
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    fn all_ready(queues: &BTreeMap<TaskName, u64>) -> bool {
        queues.values().all(|&count| count >= 1)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<TaskName, u64>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
