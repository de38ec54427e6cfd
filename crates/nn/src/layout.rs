use reversi_core::NUM_CELLS;
use reversi_weights::{TensorSpec, Topology};

pub const COMMON_WEIGHT: &str = "common.0.weight";
pub const COMMON_BIAS: &str = "common.0.bias";
pub const POLICY_WEIGHT: &str = "policy_head.weight";
pub const POLICY_BIAS: &str = "policy_head.bias";
pub const VALUE_WEIGHT: &str = "value_head.weight";
pub const VALUE_BIAS: &str = "value_head.bias";

pub const POLICY_W1: &str = "W1";
pub const POLICY_B1: &str = "b1";
pub const POLICY_W2: &str = "W2";
pub const POLICY_B2: &str = "b2";

/// Block order of an exported actor-critic network with `hidden` units
pub fn actor_critic_topology(hidden: usize) -> Topology {
    Topology::new(vec![
        TensorSpec::matrix(COMMON_WEIGHT, hidden, NUM_CELLS),
        TensorSpec::vector(COMMON_BIAS, hidden),
        TensorSpec::matrix(POLICY_WEIGHT, NUM_CELLS, hidden),
        TensorSpec::vector(POLICY_BIAS, NUM_CELLS),
        TensorSpec::matrix(VALUE_WEIGHT, 1, hidden),
        TensorSpec::vector(VALUE_BIAS, 1),
    ])
}

/// Block order of an exported policy-only network with `hidden` units
pub fn policy_net_topology(hidden: usize) -> Topology {
    Topology::new(vec![
        TensorSpec::matrix(POLICY_W1, hidden, NUM_CELLS),
        TensorSpec::vector(POLICY_B1, hidden),
        TensorSpec::matrix(POLICY_W2, NUM_CELLS, hidden),
        TensorSpec::vector(POLICY_B2, NUM_CELLS),
    ])
}
