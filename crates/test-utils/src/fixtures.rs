use flowsim::config::SystemProfile;

use crate::builders::ProfileBuilder;

/// Bandwidth between the five nodes of [`diamond_profile`].
pub fn diamond_bandwidth() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 2.0, 3.0, 4.0, 5.0],
        vec![4.0, 5.0, 2.0, 1.0, 3.0],
        vec![2.0, 4.0, 6.0, 1.0, 3.0],
        vec![3.0, 5.0, 1.0, 2.0, 4.0],
        vec![3.0, 4.0, 2.0, 1.0, 6.0],
    ]
}

/// A -> {B, C} -> D, with A replicated on nodes 0 and 1 and B, C, D on
/// nodes 2, 3 and 4.
pub fn diamond_profile() -> SystemProfile {
    diamond_builder().build()
}

/// [`diamond_profile`] as a builder, for tests that tweak one link.
pub fn diamond_builder() -> ProfileBuilder {
    ProfileBuilder::new()
        .task("A", &[0, 1])
        .task("B", &[2])
        .task("C", &[3])
        .task("D", &[4])
        .edge("A", "B", 0.05)
        .edge("A", "C", 0.04)
        .edge("B", "D", 0.03)
        .edge("C", "D", 0.02)
        .exec(0, "A", 0.02)
        .exec(1, "A", 0.02)
        .exec(2, "B", 0.03)
        .exec(3, "C", 0.03)
        .exec(4, "D", 0.04)
        .bandwidth(diamond_bandwidth())
}
