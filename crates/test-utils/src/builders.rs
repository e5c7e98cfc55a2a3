#![allow(dead_code)]

use flowsim::config::SystemProfile;
use flowsim::types::NodeId;

/// Builder for `SystemProfile` to simplify test setup.
pub struct ProfileBuilder {
    profile: SystemProfile,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self {
            profile: SystemProfile::default(),
        }
    }

    /// Assign `task` to the given node replicas.
    pub fn task(mut self, name: &str, nodes: &[NodeId]) -> Self {
        self.profile.mapping.insert(name.to_string(), nodes.to_vec());
        self
    }

    /// `from` sends `comm_req` data units to `to` after each firing.
    pub fn edge(mut self, from: &str, to: &str, comm_req: f64) -> Self {
        self.profile
            .comm
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), comm_req);
        self
    }

    /// Execution time of `task` on `node`, in seconds.
    pub fn exec(mut self, node: NodeId, task: &str, secs: f64) -> Self {
        self.profile
            .exec
            .entry(node)
            .or_default()
            .insert(task.to_string(), secs);
        self
    }

    /// Same execution time for `task` on every node it is mapped to.
    pub fn exec_everywhere(mut self, task: &str, secs: f64) -> Self {
        let nodes = self.profile.mapping.get(task).cloned().unwrap_or_default();
        for node in nodes {
            self = self.exec(node, task, secs);
        }
        self
    }

    pub fn bandwidth(mut self, matrix: Vec<Vec<f64>>) -> Self {
        self.profile.bandwidth = matrix;
        self
    }

    /// `n x n` matrix with the same bandwidth on every link.
    pub fn uniform_bandwidth(self, n: usize, bw: f64) -> Self {
        self.bandwidth(vec![vec![bw; n]; n])
    }

    /// Override a single link.
    pub fn link(mut self, from: NodeId, to: NodeId, bw: f64) -> Self {
        if let Some(cell) = self
            .profile
            .bandwidth
            .get_mut(from)
            .and_then(|row| row.get_mut(to))
        {
            *cell = bw;
        }
        self
    }

    pub fn build(self) -> SystemProfile {
        self.profile
    }
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
