use log::info;
use rand::Rng;

use crate::config::{SelfPlayConfig, TrainerConfig};
use crate::credit::{assign_credit, EpisodeCredit};
use crate::data::{EpisodeRecord, GameResult};
use crate::error::Result;
use crate::evaluation::PolicyValueModel;
use crate::game::play_episode;

/// A predictor whose parameters can be trained from self-play episodes
pub trait Learner: PolicyValueModel {
    /// Perform one parameter-adjustment step on the episode loss
    ///
    /// The loss is the one described by `credit`: the sum over steps of
    /// `-log_prob * advantage` plus the squared value error. Implementations
    /// rebuild it inside their framework (so gradients flow) from the recorded
    /// steps and the per-step advantages and rewards, and return its value.
    /// Steps with `fallback` set were not sampled from the policy; learners
    /// may leave them out of the policy term.
    fn update(&mut self, record: &EpisodeRecord, credit: &EpisodeCredit) -> anyhow::Result<f32>;
}

/// Running statistics of a training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingStats {
    pub episodes: u32,
    pub black_wins: u32,
    pub white_wins: u32,
    pub draws: u32,
    pub total_steps: u64,
    pub fallbacks: u64,
    pub truncated: u32,
    pub last_total_loss: f32,
}

impl TrainingStats {
    pub fn record(&mut self, record: &EpisodeRecord, loss: f32) {
        self.episodes += 1;
        match record.result {
            GameResult::BlackWin => self.black_wins += 1,
            GameResult::WhiteWin => self.white_wins += 1,
            GameResult::Draw => self.draws += 1,
        }
        self.total_steps += record.len() as u64;
        self.fallbacks += record.fallback_count() as u64;
        if record.truncated {
            self.truncated += 1;
        }
        self.last_total_loss = loss;
    }

    pub fn black_win_rate(&self) -> f32 {
        if self.episodes == 0 {
            0.0
        } else {
            self.black_wins as f32 / self.episodes as f32
        }
    }
}

/// Self-play actor-critic training loop
pub struct Trainer {
    selfplay: SelfPlayConfig,
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(selfplay: SelfPlayConfig, config: TrainerConfig) -> Self {
        Self { selfplay, config }
    }

    pub fn selfplay_config(&self) -> &SelfPlayConfig {
        &self.selfplay
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Play one episode, assign credit and apply one update
    pub fn run_episode<L, R>(
        &self,
        learner: &mut L,
        rng: &mut R,
    ) -> Result<(EpisodeRecord, EpisodeCredit, f32)>
    where
        L: Learner + ?Sized,
        R: Rng + ?Sized,
    {
        let record = play_episode(&*learner, &self.selfplay, rng)?;
        let credit = assign_credit(&record.trajectory, &record.rewards, self.selfplay.attribution);
        let loss = learner.update(&record, &credit)?;
        Ok((record, credit, loss))
    }

    /// Run `config.episodes` episodes sequentially, one update per episode
    pub fn run<L, R>(&self, learner: &mut L, rng: &mut R) -> Result<TrainingStats>
    where
        L: Learner + ?Sized,
        R: Rng + ?Sized,
    {
        let mut stats = TrainingStats::default();
        info!(
            "Starting self-play training for {} episodes",
            self.config.episodes
        );

        for episode in 0..self.config.episodes {
            let (record, credit, loss) = self.run_episode(learner, rng)?;
            stats.record(&record, loss);

            let interval = self.config.log_interval;
            if interval > 0 && (episode + 1) % interval == 0 {
                info!(
                    "Episode {}/{}, Final Reward (Black): {:.1}, (White): {:.1}, Avg Policy Loss: {:.4}, Avg Value Loss: {:.4}, Black win rate: {:.3}",
                    episode + 1,
                    self.config.episodes,
                    record.rewards.black,
                    record.rewards.white,
                    credit.mean_policy_loss(),
                    credit.mean_value_loss(),
                    stats.black_win_rate()
                );
            }
        }

        info!(
            "Training finished: {} episodes, {} black / {} white / {} draws, {} fallbacks",
            stats.episodes, stats.black_wins, stats.white_wins, stats.draws, stats.fallbacks
        );
        Ok(stats)
    }
}
