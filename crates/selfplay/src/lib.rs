//! Self-play actor-critic training for Othello
//!
//! This crate provides functionality for:
//! - Playing self-play episodes with a policy-value predictor
//! - Masked, stochastic move selection with a deterministic fallback
//! - Broadcasting terminal rewards into per-step advantages and losses
//! - Running the training loop against a [`Learner`]
//! - A one-ply greedy baseline and labelled data from greedy games
//!
//! # Example
//!
//! ```no_run
//! use rand::SeedableRng;
//! use reversi_selfplay::{assign_credit, play_episode, PolicyValueModel, SelfPlayConfig};
//!
//! struct Uniform;
//!
//! impl PolicyValueModel for Uniform {
//!     fn predict(&self, _features: &[f32]) -> anyhow::Result<(Vec<f32>, f32)> {
//!         Ok((vec![0.0; 64], 0.0))
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SelfPlayConfig::default();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//!
//! let record = play_episode(&Uniform, &config, &mut rng)?;
//! let credit = assign_credit(&record.trajectory, &record.rewards, config.attribution);
//! println!("{} moves, total loss {:.3}", record.len(), credit.total_loss);
//! # Ok(())
//! # }
//! ```

mod config;
mod credit;
mod data;
mod error;
mod evaluation;
mod game;
mod greedy;
mod selection;
mod trainer;

// Re-export public API
pub use config::{ActorAttribution, SelfPlayConfig, TrainerConfig};
pub use credit::{actor_for_step, assign_credit, EpisodeCredit, StepCredit};
pub use data::{EpisodeRecord, GameResult, Step, TerminalRewards, Trajectory};
pub use error::{Result, SelfPlayError};
pub use evaluation::{evaluate, log_prob_of, softmax_legal_moves, PolicyValueModel};
pub use game::play_episode;
pub use greedy::{generate_greedy_samples, greedy_move, greedy_moves, PolicySample};
pub use selection::{select_action, ActionChoice};
pub use trainer::{Learner, Trainer, TrainingStats};
