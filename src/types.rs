// src/types.rs

//! Identifiers shared by every layer of the simulator.

/// Symbolic stage identifier (e.g. `"A"`).
pub type TaskName = String;

/// Processing node identity; doubles as the row/column index into the
/// bandwidth matrix.
pub type NodeId = usize;

/// Synthetic parent of every task that has no real predecessor. Arrival
/// tokens are delivered on this queue.
pub const INPUT_TASK: &str = "Input";
