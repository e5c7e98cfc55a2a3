// src/engine/controller.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::engine::SimulationOptions;
use crate::engine::arrival::ArrivalSource;
use crate::engine::report::SimulationReport;
use crate::errors::{FlowsimError, Result};
use crate::graph::NodeGraph;
use crate::node::{CompletionQuota, NodeContext};

/// Starts the node actors and the arrival source, waits for the requested
/// number of terminal completions and halts everything.
#[derive(Debug)]
pub struct SimulationController {
    graph: NodeGraph,
    options: SimulationOptions,
}

impl SimulationController {
    pub fn new(graph: NodeGraph, options: SimulationOptions) -> Self {
        Self { graph, options }
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Run the simulation to completion and aggregate the statistics.
    ///
    /// The first fan-out fault (e.g. a zero-bandwidth link) halts the run and
    /// is returned as the error.
    pub async fn run(self) -> Result<SimulationReport> {
        self.options.validate()?;

        let mut source = ArrivalSource::new(self.options.arrival_rate)?;
        for group in self.graph.entry_groups() {
            source.add_destinations(group.clone());
        }
        let source = Arc::new(source);

        let (fault_tx, mut fault_rx) = mpsc::unbounded_channel::<FlowsimError>();
        let quota = Arc::new(CompletionQuota::new(self.options.jobs));

        let node_handles: Vec<JoinHandle<()>> = self
            .graph
            .nodes()
            .map(|node| {
                let mut ctx = NodeContext::new(fault_tx.clone(), self.options.dispatch_workers);
                if node.is_terminal() {
                    ctx = ctx.with_quota(Arc::clone(&quota));
                }
                tokio::spawn(Arc::clone(node).run(ctx))
            })
            .collect();

        let raw_arrivals = self.options.raw_arrivals();
        info!(
            jobs = self.options.jobs,
            raw_arrivals,
            arrival_rate = self.options.arrival_rate,
            nodes = self.graph.len(),
            "simulation started"
        );

        let arrival_handle = {
            let source = Arc::clone(&source);
            let faults = fault_tx.clone();
            tokio::spawn(async move {
                if let Err(err) = source.generate(raw_arrivals).await {
                    let _ = faults.send(err);
                }
            })
        };

        let outcome = self.wait_for_completion(&mut fault_rx).await;
        self.halt(node_handles, arrival_handle).await;
        outcome?;

        let report = SimulationReport::compute(&self.graph, &source.arrival_times())?;
        info!(
            mean_latency = ?report.mean_latency,
            completed_jobs = report.completed_jobs,
            "simulation finished"
        );
        Ok(report)
    }

    async fn wait_for_completion(
        &self,
        faults: &mut mpsc::UnboundedReceiver<FlowsimError>,
    ) -> Result<()> {
        let started = Instant::now();
        let expected = self.options.jobs;

        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(fault) = faults.recv() => {
                    error!(error = %fault, "fault during simulation; halting");
                    return Err(fault);
                }
                _ = ticker.tick() => {
                    let completed = self.graph.terminal_completions();
                    if completed >= expected {
                        info!(completed, expected, "requested jobs completed");
                        return Ok(());
                    }

                    let elapsed = started.elapsed();
                    if self.options.deadline.is_some_and(|d| elapsed >= d) {
                        return Err(FlowsimError::Stalled {
                            completed,
                            expected,
                            elapsed,
                        });
                    }
                }
            }
        }
    }

    /// Shut every node down, stop the arrival source and wait for the
    /// actors' in-flight work to drain.
    async fn halt(&self, node_handles: Vec<JoinHandle<()>>, arrival_handle: JoinHandle<()>) {
        info!("=== halting simulation ===");

        for node in self.graph.nodes() {
            node.shutdown();
        }
        arrival_handle.abort();

        for handle in node_handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "node actor task panicked or was cancelled");
            }
        }
    }
}
