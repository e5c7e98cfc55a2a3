// src/node/dispatch.rs

//! Fan-out worker pool of a node.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::errors::FlowsimError;
use crate::node::actor::NodeActor;

/// A completed firing waiting for its fan-out.
#[derive(Debug, Clone, Copy)]
struct Firing {
    index: u64,
    finished_at: Instant,
}

/// Runs the fan-out of completed firings off the gate loop.
///
/// `workers` resident tasks serve the common case. A firing is only queued
/// when a resident worker has been reserved for it; otherwise it gets its
/// own overflow task, so a burst of firings never delays a delivery past
/// `finished_at + delay`. Closing the pool waits for every pending fan-out.
#[derive(Debug)]
pub struct DispatchPool {
    node: Arc<NodeActor>,
    faults: mpsc::UnboundedSender<FlowsimError>,
    tx: Option<mpsc::UnboundedSender<Firing>>,
    idle: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
    overflow: JoinSet<()>,
}

impl DispatchPool {
    /// Spawn `workers` resident dispatch tasks for `node`. Faults are
    /// forwarded to `faults` and do not stop the pool.
    pub fn spawn(
        node: Arc<NodeActor>,
        workers: usize,
        faults: mpsc::UnboundedSender<FlowsimError>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Firing>();
        let rx = Arc::new(Mutex::new(rx));
        let idle = Arc::new(AtomicUsize::new(workers));

        let handles = (0..workers)
            .map(|worker| {
                let node = Arc::clone(&node);
                let rx = Arc::clone(&rx);
                let idle = Arc::clone(&idle);
                let faults = faults.clone();
                tokio::spawn(async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(firing) = next else { break };

                        deliver(&node, firing, &faults).await;
                        idle.fetch_add(1, Ordering::AcqRel);
                    }
                    debug!(node = node.id(), worker, "dispatch worker finished");
                })
            })
            .collect();

        Self {
            node,
            faults,
            tx: Some(tx),
            idle,
            workers: handles,
            overflow: JoinSet::new(),
        }
    }

    /// Schedule the fan-out of firing `index`, completed at `finished_at`.
    /// Returns `false` once the pool is closed.
    pub fn submit(&mut self, index: u64, finished_at: Instant) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        let firing = Firing { index, finished_at };

        let reserved = self
            .idle
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();

        if reserved {
            if tx.send(firing).is_ok() {
                return true;
            }
            self.idle.fetch_add(1, Ordering::AcqRel);
        }

        let node = Arc::clone(&self.node);
        let faults = self.faults.clone();
        debug!(node = node.id(), firing = index, "all dispatch workers busy; spawning overflow");
        self.overflow.spawn(async move {
            deliver(&node, firing, &faults).await;
        });
        true
    }

    /// Stop accepting work and wait until every pending fan-out is done.
    pub async fn close(mut self) {
        self.tx.take();
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "dispatch worker panicked or was cancelled");
            }
        }
        while let Some(res) = self.overflow.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "overflow dispatch panicked or was cancelled");
            }
        }
    }
}

async fn deliver(node: &NodeActor, firing: Firing, faults: &mpsc::UnboundedSender<FlowsimError>) {
    if let Err(err) = node.dispatch(firing.index, firing.finished_at).await {
        error!(
            node = node.id(),
            firing = firing.index,
            error = %err,
            "fan-out failed"
        );
        let _ = faults.send(err);
    }
}
