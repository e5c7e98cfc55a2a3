// src/node/context.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::errors::FlowsimError;

/// Everything a node actor receives from the controller when started.
#[derive(Debug, Clone)]
pub struct NodeContext {
    /// Dispatch failures (e.g. zero bandwidth) are reported here.
    pub faults: mpsc::UnboundedSender<FlowsimError>,
    /// Size of the node's dispatch pool.
    pub dispatch_workers: usize,
    /// Shared budget of terminal firings; `None` for non-terminal nodes.
    pub quota: Option<Arc<CompletionQuota>>,
}

impl NodeContext {
    pub fn new(faults: mpsc::UnboundedSender<FlowsimError>, dispatch_workers: usize) -> Self {
        Self {
            faults,
            dispatch_workers,
            quota: None,
        }
    }

    pub fn with_quota(mut self, quota: Arc<CompletionQuota>) -> Self {
        self.quota = Some(quota);
        self
    }
}

/// Number of terminal firings still allowed before the run is complete.
///
/// Shared by all terminal nodes so that exactly the requested number of
/// jobs is recorded, no matter how fast sinks fire between controller polls.
#[derive(Debug)]
pub struct CompletionQuota {
    remaining: AtomicU64,
}

impl CompletionQuota {
    pub fn new(jobs: u64) -> Self {
        Self {
            remaining: AtomicU64::new(jobs),
        }
    }

    /// Take one slot; `false` once the quota is used up.
    pub fn try_claim(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| r.checked_sub(1))
            .is_ok()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }
}
