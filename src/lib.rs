// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod node;
pub mod types;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::engine::{SimulationController, SimulationOptions, SimulationReport};
use crate::graph::{GraphBuilder, NodeGraph};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - profile loading and validation
/// - graph construction
/// - the simulation controller
/// - report printing
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)?;

    let profile = cfg.profile();
    let graph = GraphBuilder::build(&profile)?;
    let options = apply_overrides(cfg.options(), &args);
    options.validate()?;

    if args.dry_run {
        print_dry_run(&graph, &options);
        return Ok(());
    }

    info!(config = %config_path.display(), "loaded system profile");
    let report = simulate(graph, options).await?;
    print!("{report}");
    Ok(())
}

/// Run the controller on an already built graph.
pub async fn simulate(graph: NodeGraph, options: SimulationOptions) -> Result<SimulationReport> {
    let controller = SimulationController::new(graph, options);
    Ok(controller.run().await?)
}

fn apply_overrides(mut options: SimulationOptions, args: &CliArgs) -> SimulationOptions {
    if let Some(jobs) = args.jobs {
        options.jobs = jobs;
    }
    if let Some(rate) = args.arrival_rate {
        options.arrival_rate = rate;
    }
    if let Some(margin) = args.arrival_margin {
        options.arrival_margin = margin;
    }
    options
}

/// Dry-run output: tasks, replicas, parents and per-node wiring.
fn print_dry_run(graph: &NodeGraph, options: &SimulationOptions) {
    println!("flowsim dry-run");
    println!("  arrival_rate = {} jobs/s", options.arrival_rate);
    println!("  jobs = {}", options.jobs);
    println!(
        "  arrival_margin = {} ({} raw arrivals)",
        options.arrival_margin,
        options.raw_arrivals()
    );
    println!();

    println!("tasks:");
    for task in graph.tasks() {
        println!("  - {task}");
        println!("      nodes: {:?}", graph.replicas_of(task));
        println!("      parents: {:?}", graph.parents_of(task));
    }
    println!();

    println!("nodes ({}):", graph.len());
    for node in graph.nodes() {
        let dests: Vec<String> = node
            .fanout()
            .iter()
            .map(|g| format!("{}{:?}", g.replicas.task(), g.replicas.node_ids()))
            .collect();
        println!(
            "  - node {} [{}] exec {:?}{}",
            node.id(),
            node.task(),
            node.exec_time(),
            if node.is_terminal() { " (terminal)" } else { "" }
        );
        if !dests.is_empty() {
            println!("      fan-out: {}", dests.join(", "));
        }
    }

    debug!("dry-run complete (no simulation)");
}
