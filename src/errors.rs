// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

use crate::types::{NodeId, TaskName};

#[derive(Error, Debug)]
pub enum FlowsimError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unresolved node: task '{task}' (referenced by '{referenced_by}') has no assigned nodes")]
    UnresolvedNode {
        task: TaskName,
        referenced_by: TaskName,
    },

    #[error("Node {node} is assigned to both '{first}' and '{second}'")]
    DuplicateNode {
        node: NodeId,
        first: TaskName,
        second: TaskName,
    },

    #[error("Node {node} has no input queue for parent task '{parent}'")]
    UnknownParent { node: NodeId, parent: TaskName },

    #[error("Zero bandwidth on required link {from} -> {to}")]
    ZeroBandwidth { from: NodeId, to: NodeId },

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Arithmetic degeneracy: {0}")]
    Degenerate(String),

    #[error("Simulation stalled after {elapsed:?}: {completed}/{expected} jobs completed")]
    Stalled {
        completed: u64,
        expected: u64,
        elapsed: Duration,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowsimError>;
