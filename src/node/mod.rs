// src/node/mod.rs

//! Per-node concurrent execution units.
//!
//! - [`gate`] holds the parent-queue counters and the firing gate.
//! - [`fanout`] contains replica selection and the communication-delay
//!   stagger used when a firing's outputs are sent downstream.
//! - [`dispatch`] runs fan-outs on a bounded worker pool so the gate loop
//!   never waits for downstream communication.
//! - [`actor`] ties these together into the gate -> execute -> dispatch
//!   cycle.
//! - [`context`] carries what the controller hands each actor at start.
//! - [`stats`] records completions and busy time.

pub mod actor;
pub mod context;
pub mod dispatch;
pub mod fanout;
pub mod gate;
pub mod stats;

pub use actor::NodeActor;
pub use context::{CompletionQuota, NodeContext};
pub use dispatch::DispatchPool;
pub use fanout::{FanoutGroup, Replica, ReplicaGroup, comm_delay, round_robin, stagger};
pub use gate::InputGate;
pub use stats::NodeStats;
