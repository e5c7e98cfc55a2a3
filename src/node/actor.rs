// src/node/actor.rs

//! The node actor: gate -> execute -> dispatch, until halted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::errors::{FlowsimError, Result};
use crate::node::context::NodeContext;
use crate::node::dispatch::DispatchPool;
use crate::node::fanout::{FanoutGroup, Replica, comm_delay, stagger};
use crate::node::gate::InputGate;
use crate::node::stats::NodeStats;
use crate::types::{NodeId, TaskName};

/// A processing node permanently assigned to one task.
///
/// Topology (task, exec time, bandwidth row, fan-out) is fixed at
/// construction; only the gate counters, the statistics and the liveness
/// flag change while the simulation runs.
#[derive(Debug)]
pub struct NodeActor {
    id: NodeId,
    task: TaskName,
    exec_time: Duration,
    bandwidth: Vec<f64>,
    gate: Arc<InputGate>,
    fanout: Vec<FanoutGroup>,
    active: AtomicBool,
    halt: Notify,
    stats: Mutex<NodeStats>,
}

impl NodeActor {
    pub fn new(
        id: NodeId,
        task: impl Into<TaskName>,
        exec_time: Duration,
        bandwidth: Vec<f64>,
        gate: Arc<InputGate>,
        fanout: Vec<FanoutGroup>,
    ) -> Self {
        Self {
            id,
            task: task.into(),
            exec_time,
            bandwidth,
            gate,
            fanout,
            active: AtomicBool::new(true),
            halt: Notify::new(),
            stats: Mutex::new(NodeStats::default()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn exec_time(&self) -> Duration {
        self.exec_time
    }

    pub fn gate(&self) -> &Arc<InputGate> {
        &self.gate
    }

    pub fn fanout(&self) -> &[FanoutGroup] {
        &self.fanout
    }

    /// A node without dependents is a sink.
    pub fn is_terminal(&self) -> bool {
        self.fanout.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Add one token from `parent`.
    pub fn notify_arrival(&self, parent: &str) -> Result<()> {
        self.gate.notify_arrival(parent)
    }

    /// Stop attempting new firings. Irreversible; an in-flight firing and any
    /// queued fan-outs still complete.
    pub fn shutdown(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            debug!(node = self.id, task = %self.task, "shutdown requested");
        }
        self.halt.notify_one();
    }

    /// Snapshot of the node's statistics.
    pub fn stats(&self) -> NodeStats {
        self.lock_stats().clone()
    }

    /// Number of completed firings.
    pub fn completed(&self) -> u64 {
        self.lock_stats().completed
    }

    /// Gate loop. Returns once the node has been shut down and its pending
    /// fan-outs are delivered.
    pub async fn run(self: Arc<Self>, ctx: NodeContext) {
        let workers = if self.is_terminal() {
            0
        } else {
            ctx.dispatch_workers.max(1)
        };
        let mut pool = DispatchPool::spawn(Arc::clone(&self), workers, ctx.faults.clone());
        let quota = ctx.quota.as_deref();

        info!(
            node = self.id,
            task = %self.task,
            parents = ?self.gate.parents(),
            terminal = self.is_terminal(),
            "node started"
        );

        while self.is_active() {
            let admitted = self
                .gate
                .try_take(|| quota.is_none_or(|q| q.try_claim()));

            if !admitted {
                tokio::select! {
                    _ = self.gate.arrived() => {}
                    _ = self.halt.notified() => {}
                }
                continue;
            }

            let (firing, finished_at) = self.execute().await;
            trace!(node = self.id, task = %self.task, firing, "firing complete");

            if !self.is_terminal() {
                pool.submit(firing, finished_at);
            }
        }

        pool.close().await;
        info!(
            node = self.id,
            task = %self.task,
            completed = self.completed(),
            "node halted"
        );
    }

    /// Elapse the execution time and record the firing. Returns the 1-based
    /// firing index and its completion instant.
    async fn execute(&self) -> (u64, Instant) {
        let start = Instant::now();
        tokio::time::sleep(self.exec_time).await;
        let end = Instant::now();
        (self.lock_stats().record(end - start, end), end)
    }

    /// Destinations of firing `firing` (1-based) in delivery order, each
    /// with the wait preceding its notification.
    pub fn plan_dispatch(&self, firing: u64) -> Result<Vec<(Replica, Duration)>> {
        let seq = firing.saturating_sub(1);
        let mut legs = Vec::with_capacity(self.fanout.len());

        for group in &self.fanout {
            let replica = group.replicas.pick(seq).ok_or_else(|| {
                FlowsimError::ConfigError(format!(
                    "node {} has no replicas to reach task '{}'",
                    self.id,
                    group.replicas.task()
                ))
            })?;
            let delay = comm_delay(self.id, replica.node, group.comm_req, &self.bandwidth)?;
            legs.push((replica.clone(), delay));
        }

        Ok(stagger(legs))
    }

    /// Deliver the outputs of firing `firing`, completed at `finished_at`, to
    /// one replica of every dependent task. Each token lands at
    /// `finished_at` plus its staggered delay, however late this call starts.
    pub async fn dispatch(&self, firing: u64, finished_at: Instant) -> Result<()> {
        let mut due = finished_at;
        for (replica, wait) in self.plan_dispatch(firing)? {
            due += wait;
            tokio::time::sleep_until(due).await;
            replica.gate.notify_arrival(&self.task)?;
            trace!(from = self.id, to = replica.node, firing, "token delivered");
        }
        Ok(())
    }

    fn lock_stats(&self) -> MutexGuard<'_, NodeStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
