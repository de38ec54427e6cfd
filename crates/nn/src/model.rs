use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use log::{debug, info, warn};
use reversi_core::NUM_CELLS;
use reversi_selfplay::{EpisodeCredit, EpisodeRecord, Learner, PolicyValueModel};
use reversi_weights::{load_weights, save_weights, NamedTensor, Topology};
use tch::nn::{self, Module, OptimizerConfig};
use tch::{Device, Kind, Tensor};

use crate::config::NnConfig;
use crate::layout::actor_critic_topology;
use crate::params::{export_vars, import_vars, legal_mask_rows, tensor_to_vec};

/// Trainable actor-critic network
///
/// A shared ReLU layer feeds a policy head (one logit per cell) and a value
/// head (one scalar). Parameter names match the exported weight blocks.
pub struct ActorCriticNet {
    vs: nn::VarStore,
    common: nn::Linear,
    policy_head: nn::Linear,
    value_head: nn::Linear,
    optimizer: nn::Optimizer,
    config: NnConfig,
}

impl ActorCriticNet {
    /// Create a freshly initialised network
    pub fn new(config: NnConfig) -> Result<Self> {
        let vs = nn::VarStore::new(config.device);
        let root = vs.root();
        let hidden = config.hidden_size as i64;
        let cells = NUM_CELLS as i64;

        let common = nn::linear(&root / "common" / "0", cells, hidden, Default::default());
        let policy_head = nn::linear(&root / "policy_head", hidden, cells, Default::default());
        let value_head = nn::linear(&root / "value_head", hidden, 1, Default::default());

        let optimizer = nn::Adam::default()
            .build(&vs, config.learning_rate)
            .context("Failed to build Adam optimizer")?;

        Ok(Self {
            vs,
            common,
            policy_head,
            value_head,
            optimizer,
            config,
        })
    }

    /// Create a network and initialise it from a weight file
    pub fn load<P: AsRef<Path>>(path: P, config: NnConfig) -> Result<Self> {
        let mut net = Self::new(config)?;
        let path = path.as_ref();
        let tensors = load_weights(path, &net.topology())
            .with_context(|| format!("Failed to load weights from {}", path.display()))?;
        net.import_tensors(&tensors)?;
        Ok(net)
    }

    pub fn config(&self) -> &NnConfig {
        &self.config
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn topology(&self) -> Topology {
        actor_critic_topology(self.config.hidden_size)
    }

    /// Batched forward pass: `[n, 64]` -> (`[n, 64]` logits, `[n, 1]` values)
    pub fn forward(&self, x: &Tensor) -> (Tensor, Tensor) {
        let hidden = self.common.forward(x).relu();
        (self.policy_head.forward(&hidden), self.value_head.forward(&hidden))
    }

    /// Copy parameters out in weight-file order
    pub fn export_tensors(&self) -> Result<Vec<NamedTensor>> {
        export_vars(&self.vs, &self.topology(), |name| name)
    }

    /// Overwrite parameters from exported tensors
    ///
    /// The tensors are checked against the topology before anything is
    /// copied, so a rejected set leaves the network unchanged.
    pub fn import_tensors(&mut self, tensors: &[NamedTensor]) -> Result<()> {
        import_vars(&self.vs, &self.topology(), tensors, |name| name)?;
        debug!("Imported {} tensors", tensors.len());
        Ok(())
    }

    /// Export parameters to a weight file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tensors = self.export_tensors()?;
        save_weights(path, &tensors)
            .with_context(|| format!("Failed to save weights to {}", path.display()))?;
        info!("Saved actor-critic weights to {}", path.display());
        Ok(())
    }
}

impl PolicyValueModel for ActorCriticNet {
    fn predict(&self, features: &[f32]) -> Result<(Vec<f32>, f32)> {
        ensure!(
            features.len() == NUM_CELLS,
            "Expected {NUM_CELLS} features, got {}",
            features.len()
        );

        let (logits, value) = tch::no_grad(|| {
            let x = Tensor::from_slice(features)
                .view([1, NUM_CELLS as i64])
                .to_device(self.device());
            self.forward(&x)
        });

        let logits = tensor_to_vec(&logits);
        let value = tensor_to_vec(&value);
        match value.as_slice() {
            &[v] => Ok((logits, v)),
            other => bail!("Expected a single value, got {} values", other.len()),
        }
    }
}

impl Learner for ActorCriticNet {
    fn update(&mut self, record: &EpisodeRecord, credit: &EpisodeCredit) -> Result<f32> {
        let n = record.len();
        ensure!(
            credit.steps.len() == n,
            "Credit has {} steps but the episode has {n}",
            credit.steps.len()
        );
        if n == 0 {
            return Ok(0.0);
        }

        let mut features = Vec::with_capacity(n * NUM_CELLS);
        let mut actions = Vec::with_capacity(n);
        let mut sampled = Vec::with_capacity(n);
        for (i, step) in record.trajectory.iter().enumerate() {
            features.extend_from_slice(&step.features);
            actions.push(step.action as i64);
            if !step.fallback {
                sampled.push(i as i64);
            }
        }

        let device = self.device();
        let rows = n as i64;
        let cells = NUM_CELLS as i64;
        let x = Tensor::from_slice(&features).view([rows, cells]).to_device(device);
        let rewards = Tensor::from_slice(&credit.rewards()).to_device(device);

        let (logits, values) = self.forward(&x);

        // Fallback moves were not drawn from the policy, so their rows are
        // dropped before the softmax and carry no policy gradient
        let policy_loss = if sampled.is_empty() {
            Tensor::from(0.0f32).to_device(device)
        } else {
            let keep = Tensor::from_slice(&sampled).to_device(device);
            let legal = legal_mask_rows(record.trajectory.iter().map(|s| s.legal_mask), NUM_CELLS);
            let illegal = Tensor::from_slice(&legal)
                .view([rows, cells])
                .to_device(device)
                .index_select(0, &keep)
                .eq(0.0);
            let actions = Tensor::from_slice(&actions)
                .view([rows, 1])
                .to_device(device)
                .index_select(0, &keep);
            let advantages = Tensor::from_slice(&credit.advantages())
                .to_device(device)
                .index_select(0, &keep);

            let log_probs = logits
                .index_select(0, &keep)
                .masked_fill(&illegal, f64::NEG_INFINITY)
                .log_softmax(-1, Kind::Float)
                .gather(1, &actions, false)
                .squeeze_dim(1);
            -(log_probs * advantages).sum(Kind::Float)
        };
        let value_loss = (values.squeeze_dim(1) - rewards).square().sum(Kind::Float);
        let total = policy_loss + value_loss;
        let loss = total.double_value(&[]) as f32;

        if !loss.is_finite() {
            warn!(
                "Skipping update: episode loss is {loss} ({} of {n} steps used the fallback)",
                n - sampled.len()
            );
            self.optimizer.zero_grad();
            return Ok(loss);
        }

        self.optimizer.backward_step(&total);
        Ok(loss)
    }
}
