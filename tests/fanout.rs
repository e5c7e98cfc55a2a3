// tests/fanout.rs

mod common;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use flowsim::errors::FlowsimError;
use flowsim::node::{
    FanoutGroup, InputGate, NodeActor, Replica, ReplicaGroup, comm_delay, stagger,
};
use flowsim::types::{INPUT_TASK, NodeId};
use tokio::time::Instant;

use common::ms;

type TestResult = Result<(), Box<dyn Error>>;

fn close_to(actual: Duration, expected_secs: f64) -> bool {
    (actual.as_secs_f64() - expected_secs).abs() < 1e-6
}

fn replica(node: NodeId, parent: &str) -> Replica {
    Replica {
        node,
        gate: Arc::new(InputGate::new(node, [parent])),
    }
}

#[test]
fn destinations_are_visited_in_delay_order_with_incremental_waits() {
    let legs = stagger(vec![("x", ms(50)), ("y", ms(20)), ("z", ms(80))]);

    assert_eq!(legs, vec![("y", ms(20)), ("x", ms(30)), ("z", ms(30))]);
}

#[test]
fn waits_add_up_to_the_largest_delay() {
    let legs = stagger(vec![(1, ms(7)), (2, ms(3)), (3, ms(12)), (4, ms(5))]);

    let total: Duration = legs.iter().map(|(_, wait)| *wait).sum();
    assert_eq!(total, ms(12));
}

#[test]
fn equal_delays_keep_their_order_and_wait_zero() {
    let legs = stagger(vec![("first", ms(10)), ("second", ms(10)), ("third", ms(4))]);

    assert_eq!(
        legs,
        vec![("third", ms(4)), ("first", ms(6)), ("second", Duration::ZERO)]
    );
}

#[test]
fn empty_fanout_has_nothing_to_stagger() {
    let legs: Vec<((), Duration)> = stagger(Vec::new());
    assert!(legs.is_empty());
}

#[test]
fn delay_is_data_over_link_bandwidth() -> TestResult {
    let row = [1.0, 2.0, 4.0];

    assert!(close_to(comm_delay(0, 1, 0.05, &row)?, 0.025));
    assert!(close_to(comm_delay(0, 2, 0.04, &row)?, 0.01));
    Ok(())
}

#[test]
fn zero_or_negative_bandwidth_is_reported() {
    let row = [1.0, 0.0, -3.0];

    assert!(matches!(
        comm_delay(0, 1, 0.05, &row),
        Err(FlowsimError::ZeroBandwidth { from: 0, to: 1 })
    ));
    assert!(matches!(
        comm_delay(0, 2, 0.05, &row),
        Err(FlowsimError::ZeroBandwidth { from: 0, to: 2 })
    ));
}

#[test]
fn missing_bandwidth_entry_is_a_config_error() {
    assert!(matches!(
        comm_delay(0, 5, 0.05, &[1.0, 1.0]),
        Err(FlowsimError::ConfigError(_))
    ));
}

#[test]
fn replica_group_cycles_through_its_members() {
    let group = ReplicaGroup::new("B", vec![replica(2, "A"), replica(3, "A"), replica(4, "A")]);

    let picked: Vec<NodeId> = (0..7)
        .filter_map(|seq| group.pick(seq))
        .map(|r| r.node)
        .collect();

    assert_eq!(picked, vec![2, 3, 4, 2, 3, 4, 2]);
    assert!(ReplicaGroup::new("B", Vec::new()).pick(0).is_none());
}

fn three_way_source() -> NodeActor {
    let groups = [("B", 1, 0.05), ("C", 2, 0.02), ("D", 3, 0.08)]
        .into_iter()
        .map(|(task, node, comm_req)| FanoutGroup {
            replicas: ReplicaGroup::new(task, vec![replica(node, "A")]),
            comm_req,
        })
        .collect();

    NodeActor::new(
        0,
        "A",
        ms(10),
        vec![1.0; 4],
        Arc::new(InputGate::new(0, [INPUT_TASK])),
        groups,
    )
}

#[test]
fn plan_dispatch_orders_dependents_by_delay() -> TestResult {
    let plan = three_way_source().plan_dispatch(1)?;

    let order: Vec<NodeId> = plan.iter().map(|(r, _)| r.node).collect();
    assert_eq!(order, vec![2, 1, 3]);

    let waits: Vec<Duration> = plan.iter().map(|(_, w)| *w).collect();
    assert!(close_to(waits[0], 0.02));
    assert!(close_to(waits[1], 0.03));
    assert!(close_to(waits[2], 0.03));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dispatch_delivers_one_token_per_dependent() -> TestResult {
    let node = three_way_source();
    let start = Instant::now();

    node.dispatch(1, start).await?;

    let elapsed = start.elapsed();
    assert!(elapsed >= ms(79) && elapsed <= ms(83), "elapsed {elapsed:?}");
    for group in node.fanout() {
        let replica = group.replicas.pick(0).ok_or("no replica")?;
        assert_eq!(replica.gate.pending("A"), Some(1));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn late_dispatch_still_lands_relative_to_completion() -> TestResult {
    let node = three_way_source();
    let finished_at = Instant::now();

    tokio::time::sleep(ms(50)).await;
    node.dispatch(1, finished_at).await?;

    // The 80 ms delay counts from completion, not from when dispatch began.
    let elapsed = finished_at.elapsed();
    assert!(elapsed >= ms(79) && elapsed <= ms(83), "elapsed {elapsed:?}");
    Ok(())
}

#[test]
fn successive_firings_rotate_through_dependent_replicas() -> TestResult {
    let group = FanoutGroup {
        replicas: ReplicaGroup::new(
            "B",
            vec![replica(4, "A"), replica(5, "A"), replica(6, "A")],
        ),
        comm_req: 0.01,
    };
    let node = NodeActor::new(
        0,
        "A",
        ms(10),
        vec![1.0; 7],
        Arc::new(InputGate::new(0, [INPUT_TASK])),
        vec![group],
    );

    let mut picked = Vec::new();
    for firing in 1..=7 {
        let plan = node.plan_dispatch(firing)?;
        assert_eq!(plan.len(), 1);
        picked.push(plan[0].0.node);
    }

    // Firing k goes to replica (k - 1) mod 3.
    assert_eq!(picked, vec![4, 5, 6, 4, 5, 6, 4]);
    Ok(())
}
