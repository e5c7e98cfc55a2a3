#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowsim::engine::SimulationOptions;

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Write `contents` as `Flowsim.toml` inside `dir` and return its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Flowsim.toml");
    fs::write(&path, contents).expect("failed to write config");
    path
}

/// Options for a short run: `jobs` jobs at `rate` jobs per second.
pub fn options(jobs: u64, rate: f64) -> SimulationOptions {
    SimulationOptions {
        arrival_rate: rate,
        jobs,
        ..SimulationOptions::default()
    }
}

/// The sample profile shipped with the repository.
pub fn sample_profile_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("profiles/diamond.toml")
}

/// The diamond graph of `flowsim_test_utils::fixtures::diamond_profile`, as
/// TOML.
pub const DIAMOND_TOML: &str = r#"
[simulation]
arrival_rate = 10.0
jobs = 10

[network]
bandwidth = [
    [1.0, 2.0, 3.0, 4.0, 5.0],
    [4.0, 5.0, 2.0, 1.0, 3.0],
    [2.0, 4.0, 6.0, 1.0, 3.0],
    [3.0, 5.0, 1.0, 2.0, 4.0],
    [3.0, 4.0, 2.0, 1.0, 6.0],
]

[task.A]
nodes = [0, 1]
next = { B = 0.05, C = 0.04 }

[task.B]
nodes = [2]
next = { D = 0.03 }

[task.C]
nodes = [3]
next = { D = 0.02 }

[task.D]
nodes = [4]

[[node]]
id = 0
exec = { A = 0.02 }

[[node]]
id = 1
exec = { A = 0.02 }

[[node]]
id = 2
exec = { B = 0.03 }

[[node]]
id = 3
exec = { C = 0.03 }

[[node]]
id = 4
exec = { D = 0.04 }
"#;
