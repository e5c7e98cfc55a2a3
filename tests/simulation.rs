// tests/simulation.rs

mod common;

use std::error::Error;
use std::time::Duration;

use flowsim::engine::report::mean_latency;
use flowsim::engine::{ServiceTime, SimulationController, SimulationOptions, SimulationReport};
use flowsim::errors::FlowsimError;
use flowsim::graph::GraphBuilder;
use flowsim_test_utils::fixtures::{diamond_builder, diamond_profile};
use flowsim_test_utils::{init_tracing, with_timeout};
use tokio::time::Instant;

use common::{ms, options};

type TestResult = Result<(), Box<dyn Error>>;

async fn run_diamond(options: SimulationOptions) -> Result<SimulationReport, FlowsimError> {
    let graph = GraphBuilder::build(&diamond_profile())?;
    SimulationController::new(graph, options).run().await
}

#[tokio::test(start_paused = true)]
async fn diamond_completes_exactly_the_requested_jobs() -> TestResult {
    init_tracing();
    let report = with_timeout(run_diamond(options(10, 10.0))).await?;

    assert_eq!(report.completed_jobs, 10);
    let sink = report
        .nodes
        .iter()
        .find(|n| n.node == 4)
        .ok_or("node 4 missing from report")?;
    assert!(sink.terminal);
    assert_eq!(sink.completed, 10);
    assert!(report.mean_latency > Duration::ZERO);

    // A job needs at least A, the slower branch and D.
    assert!(report.mean_latency >= ms(20 + 30 + 40));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn every_task_gets_a_service_time() -> TestResult {
    init_tracing();
    let report = with_timeout(run_diamond(options(10, 10.0))).await?;

    let tasks: Vec<&str> = report.service_times.keys().map(|t| t.as_str()).collect();
    assert_eq!(tasks, vec!["A", "B", "C", "D"]);

    let d = report.service_times["D"]
        .as_duration()
        .ok_or("D unobserved")?;
    assert!(d >= ms(39) && d <= ms(42), "D service time {d:?}");

    let rendered = report.to_string();
    assert!(rendered.contains("Average latency of the schedule"));
    assert!(rendered.contains("  D: "));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn replayed_runs_agree() -> TestResult {
    init_tracing();
    let first = with_timeout(run_diamond(options(6, 10.0))).await?;
    let second = with_timeout(run_diamond(options(6, 10.0))).await?;

    let counts = |r: &SimulationReport| -> Vec<(usize, u64)> {
        r.nodes.iter().map(|n| (n.node, n.completed)).collect()
    };
    assert_eq!(counts(&first), counts(&second));
    assert_eq!(first.completed_jobs, second.completed_jobs);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn arrivals_alternate_between_entry_replicas() -> TestResult {
    init_tracing();
    let report = with_timeout(run_diamond(options(8, 10.0))).await?;

    let fired = |id: usize| {
        report
            .nodes
            .iter()
            .find(|n| n.node == id)
            .map(|n| n.completed)
            .unwrap_or_default()
    };
    let (a0, a1) = (fired(0), fired(1));
    assert!(a0 >= 4 && a1 >= 4, "A replicas fired {a0} and {a1}");
    assert!(a0.abs_diff(a1) <= 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn zero_bandwidth_link_aborts_the_run() {
    init_tracing();
    let profile = diamond_builder().link(0, 2, 0.0).build();
    let graph = GraphBuilder::build(&profile).expect("graph builds");

    let result = with_timeout(SimulationController::new(graph, options(10, 10.0)).run()).await;

    match result {
        Err(FlowsimError::ZeroBandwidth { from, to }) => assert_eq!((from, to), (0, 2)),
        other => panic!("expected ZeroBandwidth, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn invalid_options_are_rejected_before_starting() {
    let graph = GraphBuilder::build(&diamond_profile()).expect("graph builds");
    let bad = SimulationOptions {
        arrival_rate: 0.0,
        ..SimulationOptions::default()
    };

    let result = SimulationController::new(graph, bad).run().await;

    assert!(matches!(result, Err(FlowsimError::ConfigError(_))));
}

#[tokio::test(start_paused = true)]
async fn slow_arrivals_hit_the_deadline() {
    init_tracing();
    let mut opts = options(10, 1.0);
    opts.deadline = Some(Duration::from_secs(2));

    let result = with_timeout(run_diamond(opts)).await;

    match result {
        Err(FlowsimError::Stalled {
            completed,
            expected,
            elapsed,
        }) => {
            assert_eq!(expected, 10);
            assert!(completed < 10);
            assert!(elapsed >= Duration::from_secs(2));
        }
        other => panic!("expected Stalled, got {other:?}"),
    }
}

#[test]
fn raw_arrivals_scale_with_the_margin() {
    let mut opts = options(10, 10.0);
    assert_eq!(opts.raw_arrivals(), 20);

    opts.arrival_margin = 1.0;
    assert_eq!(opts.raw_arrivals(), 10);

    opts.jobs = 3;
    opts.arrival_margin = 1.5;
    assert_eq!(opts.raw_arrivals(), 5);
}

#[tokio::test(start_paused = true)]
async fn latency_pairs_arrivals_and_completions_by_position() -> TestResult {
    let t0 = Instant::now();
    let arrivals = [t0, t0 + ms(100), t0 + ms(200)];
    let completions = [t0 + ms(50), t0 + ms(170)];

    // (50 + 70) / 2; the third arrival has no completion.
    assert_eq!(mean_latency(&arrivals, &completions)?, ms(60));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn completion_before_its_arrival_counts_as_zero() -> TestResult {
    let t0 = Instant::now();
    let arrivals = [t0 + ms(100), t0 + ms(200)];
    let completions = [t0 + ms(40), t0 + ms(260)];

    // max(40 - 100, 0) = 0 and 260 - 200 = 60, averaged over both pairs.
    assert_eq!(mean_latency(&arrivals, &completions)?, ms(30));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn latency_without_pairs_is_degenerate() {
    let t0 = Instant::now();

    assert!(matches!(
        mean_latency(&[t0], &[]),
        Err(FlowsimError::Degenerate(_))
    ));
}

#[test]
fn service_time_uses_the_busiest_replica() {
    let time = ServiceTime::from_replicas(&[(ms(100), 4), (ms(60), 2)]);
    assert_eq!(time, ServiceTime::Mean(ms(100) / 6));

    assert_eq!(ServiceTime::from_replicas(&[(ms(0), 0)]), ServiceTime::Unobserved);
    assert_eq!(ServiceTime::Unobserved.as_duration(), None);
}
