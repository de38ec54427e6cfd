use std::path::Path;

use anyhow::{ensure, Context, Result};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use reversi_core::NUM_CELLS;
use reversi_selfplay::{PolicySample, PolicyValueModel};
use reversi_weights::{load_weights, save_weights, NamedTensor, Topology};
use tch::nn::{self, Module, OptimizerConfig};
use tch::{Device, Kind, Tensor};

use crate::config::NnConfig;
use crate::layout::{policy_net_topology, POLICY_B1, POLICY_B2, POLICY_W1, POLICY_W2};
use crate::params::{export_vars, import_vars, tensor_to_vec};

/// Variable holding each exported block
fn var_for(block: &str) -> &str {
    match block {
        POLICY_W1 => "fc1.weight",
        POLICY_B1 => "fc1.bias",
        POLICY_W2 => "fc2.weight",
        POLICY_B2 => "fc2.bias",
        other => other,
    }
}

/// Policy-only network trained by supervision on labelled moves
///
/// `fc1` (64 -> hidden, ReLU) then `fc2` (hidden -> 64 logits). Exports as
/// the `W1`/`b1`/`W2`/`b2` weight file.
pub struct PolicyNet {
    vs: nn::VarStore,
    fc1: nn::Linear,
    fc2: nn::Linear,
    optimizer: nn::Optimizer,
    config: NnConfig,
}

impl PolicyNet {
    pub fn new(config: NnConfig) -> Result<Self> {
        let vs = nn::VarStore::new(config.device);
        let root = vs.root();
        let hidden = config.hidden_size as i64;
        let cells = NUM_CELLS as i64;

        let fc1 = nn::linear(&root / "fc1", cells, hidden, Default::default());
        let fc2 = nn::linear(&root / "fc2", hidden, cells, Default::default());

        let optimizer = nn::Adam::default()
            .build(&vs, config.learning_rate)
            .context("Failed to build Adam optimizer")?;

        Ok(Self {
            vs,
            fc1,
            fc2,
            optimizer,
            config,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P, config: NnConfig) -> Result<Self> {
        let mut net = Self::new(config)?;
        let path = path.as_ref();
        let tensors = load_weights(path, &net.topology())
            .with_context(|| format!("Failed to load weights from {}", path.display()))?;
        net.import_tensors(&tensors)?;
        Ok(net)
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn topology(&self) -> Topology {
        policy_net_topology(self.config.hidden_size)
    }

    /// `[n, 64]` features -> `[n, 64]` logits
    pub fn forward(&self, x: &Tensor) -> Tensor {
        self.fc2.forward(&self.fc1.forward(x).relu())
    }

    /// One optimizer step on the mean cross-entropy of `batch`
    pub fn train_batch(&mut self, batch: &[&PolicySample]) -> Result<f32> {
        ensure!(!batch.is_empty(), "Empty training batch");

        let rows = batch.len() as i64;
        let mut features = Vec::with_capacity(batch.len() * NUM_CELLS);
        let mut targets = Vec::with_capacity(batch.len());
        for sample in batch {
            ensure!(sample.action < NUM_CELLS, "Target cell {} out of range", sample.action);
            features.extend_from_slice(&sample.features);
            targets.push(sample.action as i64);
        }

        let device = self.device();
        let x = Tensor::from_slice(&features)
            .view([rows, NUM_CELLS as i64])
            .to_device(device);
        let targets = Tensor::from_slice(&targets).view([rows, 1]).to_device(device);

        let loss = -self
            .forward(&x)
            .log_softmax(-1, Kind::Float)
            .gather(1, &targets, false)
            .mean(Kind::Float);

        self.optimizer.backward_step(&loss);
        Ok(loss.double_value(&[]) as f32)
    }

    /// One pass over `samples` in shuffled mini-batches; returns the mean batch loss
    pub fn train_epoch<R: Rng + ?Sized>(
        &mut self,
        samples: &[PolicySample],
        batch_size: usize,
        rng: &mut R,
    ) -> Result<f32> {
        ensure!(!samples.is_empty(), "No training samples");
        let batch_size = batch_size.max(1);

        let mut order: Vec<&PolicySample> = samples.iter().collect();
        order.shuffle(rng);

        let mut total = 0.0;
        let mut batches = 0;
        for batch in order.chunks(batch_size) {
            total += self.train_batch(batch)?;
            batches += 1;
        }
        Ok(total / batches as f32)
    }

    /// Train for `epochs` passes and return the last epoch's loss
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        samples: &[PolicySample],
        epochs: usize,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<f32> {
        info!(
            "Training policy net on {} samples for {epochs} epochs (batch {batch_size})",
            samples.len()
        );
        let report_every = (epochs / 10).max(1);

        let mut loss = 0.0;
        for epoch in 0..epochs {
            loss = self.train_epoch(samples, batch_size, rng)?;
            debug!("Epoch {}/{epochs}, loss {loss:.4}", epoch + 1);
            if (epoch + 1) % report_every == 0 {
                info!("Epoch {}/{epochs}, Loss: {loss:.4}", epoch + 1);
            }
        }
        Ok(loss)
    }

    pub fn export_tensors(&self) -> Result<Vec<NamedTensor>> {
        export_vars(&self.vs, &self.topology(), var_for)
    }

    /// Overwrite parameters; a rejected set leaves the network unchanged
    pub fn import_tensors(&mut self, tensors: &[NamedTensor]) -> Result<()> {
        import_vars(&self.vs, &self.topology(), tensors, var_for)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        save_weights(path, &self.export_tensors()?)
            .with_context(|| format!("Failed to save weights to {}", path.display()))?;
        info!("Saved policy weights to {}", path.display());
        Ok(())
    }
}

/// Logits only; the value estimate is always 0
impl PolicyValueModel for PolicyNet {
    fn predict(&self, features: &[f32]) -> Result<(Vec<f32>, f32)> {
        ensure!(
            features.len() == NUM_CELLS,
            "Expected {NUM_CELLS} features, got {}",
            features.len()
        );
        let logits = tch::no_grad(|| {
            let x = Tensor::from_slice(features)
                .view([1, NUM_CELLS as i64])
                .to_device(self.device());
            self.forward(&x)
        });
        Ok((tensor_to_vec(&logits), 0.0))
    }
}
