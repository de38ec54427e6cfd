use reversi_core::Player;

use crate::config::ActorAttribution;
use crate::data::{Step, TerminalRewards, Trajectory};

/// Credit for a single recorded step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCredit {
    pub actor: Player,
    /// Terminal reward of `actor`
    pub reward: f32,
    /// `reward - value`
    pub advantage: f32,
    /// `-log_prob * advantage`
    pub policy_loss: f32,
    /// `(value - reward)^2`
    pub value_loss: f32,
}

/// Per-step credit and summed losses of one episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeCredit {
    pub steps: Vec<StepCredit>,
    pub policy_loss: f32,
    pub value_loss: f32,
    pub total_loss: f32,
}

impl EpisodeCredit {
    pub fn advantages(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.advantage).collect()
    }

    pub fn rewards(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.reward).collect()
    }

    pub fn mean_policy_loss(&self) -> f32 {
        if self.steps.is_empty() {
            0.0
        } else {
            self.policy_loss / self.steps.len() as f32
        }
    }

    pub fn mean_value_loss(&self) -> f32 {
        if self.steps.is_empty() {
            0.0
        } else {
            self.value_loss / self.steps.len() as f32
        }
    }
}

/// Side credited with step `index`
///
/// Under `StepParity` even indices belong to black and odd ones to white,
/// regardless of passes in between.
pub fn actor_for_step(index: usize, step: &Step, attribution: ActorAttribution) -> Player {
    match attribution {
        ActorAttribution::StepParity => {
            if index % 2 == 0 {
                Player::Black
            } else {
                Player::White
            }
        }
        ActorAttribution::RecordedPlayer => step.player,
    }
}

/// Broadcast the terminal rewards over a finished trajectory
///
/// No discounting: every step of the same actor gets the same reward.
/// The episode loss is the plain sum of all policy and value terms.
pub fn assign_credit(
    trajectory: &Trajectory,
    rewards: &TerminalRewards,
    attribution: ActorAttribution,
) -> EpisodeCredit {
    let steps: Vec<StepCredit> = trajectory
        .iter()
        .enumerate()
        .map(|(t, step)| {
            let actor = actor_for_step(t, step, attribution);
            let reward = rewards.for_player(actor);
            let advantage = reward - step.value;
            StepCredit {
                actor,
                reward,
                advantage,
                policy_loss: -step.log_prob * advantage,
                value_loss: (step.value - reward).powi(2),
            }
        })
        .collect();

    let policy_loss: f32 = steps.iter().map(|s| s.policy_loss).sum();
    let value_loss: f32 = steps.iter().map(|s| s.value_loss).sum();

    EpisodeCredit {
        steps,
        policy_loss,
        value_loss,
        total_loss: policy_loss + value_loss,
    }
}
