//! Othello networks for self-play and supervised training
//!
//! [`ActorCriticNet`] is the trainable libtorch model used by the self-play
//! trainer. [`PolicyNet`] is a policy-only network fitted to greedy play.
//! [`ExportedModel`] evaluates either architecture from a weight file with
//! `ndarray` only.

mod config;
mod inference;
mod layout;
mod model;
mod params;
mod policy;

pub use config::NnConfig;
pub use inference::ExportedModel;
pub use layout::{
    actor_critic_topology, policy_net_topology, COMMON_BIAS, COMMON_WEIGHT, POLICY_B1, POLICY_B2,
    POLICY_BIAS, POLICY_W1, POLICY_W2, POLICY_WEIGHT, VALUE_BIAS, VALUE_WEIGHT,
};
pub use model::ActorCriticNet;
pub use policy::PolicyNet;
