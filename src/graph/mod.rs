// src/graph/mod.rs

//! Construction of the node-level actor graph.
//!
//! - [`builder`] turns a [`SystemProfile`](crate::config::SystemProfile)
//!   into wired [`NodeActor`](crate::node::NodeActor)s.
//! - [`topology`] holds the result: direct node lookup, parent sets,
//!   replica lists, arrival groups and terminal nodes.

pub mod builder;
pub mod topology;

pub use builder::GraphBuilder;
pub use topology::NodeGraph;
