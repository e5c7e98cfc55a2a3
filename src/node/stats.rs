// src/node/stats.rs

use std::time::Duration;

use tokio::time::Instant;

/// Running statistics of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStats {
    /// Completed firings.
    pub completed: u64,
    /// Sum of the wall time spent inside firings.
    pub busy: Duration,
    /// Completion instant of every firing, in firing order.
    pub finish_times: Vec<Instant>,
}

impl NodeStats {
    /// Record one finished firing and return its 1-based index.
    pub(crate) fn record(&mut self, elapsed: Duration, finished_at: Instant) -> u64 {
        self.completed += 1;
        self.busy += elapsed;
        self.finish_times.push(finished_at);
        self.completed
    }
}
