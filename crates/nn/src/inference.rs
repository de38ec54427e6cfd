use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, bail, ensure, Context, Result};
use log::info;
use ndarray::{Array1, Array2, ArrayView1};
use reversi_core::NUM_CELLS;
use reversi_selfplay::PolicyValueModel;
use reversi_weights::{read_tensors, NamedTensor};

use crate::layout::{
    actor_critic_topology, policy_net_topology, COMMON_BIAS, COMMON_WEIGHT, POLICY_B1, POLICY_B2,
    POLICY_BIAS, POLICY_W1, POLICY_W2, POLICY_WEIGHT, VALUE_BIAS, VALUE_WEIGHT,
};

/// Forward-only network built from exported weights
///
/// Reads either file layout: the actor-critic blocks (`common.0`,
/// `policy_head`, `value_head`) or the policy-only `W1`/`b1`/`W2`/`b2`
/// blocks, whose value estimate is always 0. Computes the same function as
/// the `tch` networks with plain `ndarray` arithmetic, so a weight file can be
/// played without libtorch parameters in memory.
#[derive(Debug, Clone)]
pub struct ExportedModel {
    common_weight: Array2<f32>,
    common_bias: Array1<f32>,
    policy_weight: Array2<f32>,
    policy_bias: Array1<f32>,
    value_head: Option<(Array2<f32>, Array1<f32>)>,
}

impl ExportedModel {
    /// Build from tensors in weight-file order
    ///
    /// The layout is picked from the first block's name and its hidden width
    /// from that block's row count; the whole set is then checked against
    /// the matching topology.
    pub fn from_tensors(tensors: &[NamedTensor]) -> Result<Self> {
        let first = tensors
            .first()
            .ok_or_else(|| anyhow!("Weight file has no blocks"))?;
        let hidden = first
            .as_matrix()
            .map(|m| m.nrows())
            .ok_or_else(|| anyhow!("First block {} must be a matrix", first.name))?;

        let matrix = |name: &str| -> Result<Array2<f32>> {
            find(tensors, name)?
                .as_matrix()
                .cloned()
                .ok_or_else(|| anyhow!("{name} is not a matrix"))
        };
        let vector = |name: &str| -> Result<Array1<f32>> {
            find(tensors, name)?
                .as_vector()
                .cloned()
                .ok_or_else(|| anyhow!("{name} is not a vector"))
        };

        match first.name.as_str() {
            COMMON_WEIGHT => {
                actor_critic_topology(hidden).check(tensors)?;
                Ok(Self {
                    common_weight: matrix(COMMON_WEIGHT)?,
                    common_bias: vector(COMMON_BIAS)?,
                    policy_weight: matrix(POLICY_WEIGHT)?,
                    policy_bias: vector(POLICY_BIAS)?,
                    value_head: Some((matrix(VALUE_WEIGHT)?, vector(VALUE_BIAS)?)),
                })
            }
            POLICY_W1 => {
                policy_net_topology(hidden).check(tensors)?;
                Ok(Self {
                    common_weight: matrix(POLICY_W1)?,
                    common_bias: vector(POLICY_B1)?,
                    policy_weight: matrix(POLICY_W2)?,
                    policy_bias: vector(POLICY_B2)?,
                    value_head: None,
                })
            }
            other => bail!(
                "Unknown weight layout: first block is {other}, expected {COMMON_WEIGHT} or {POLICY_W1}"
            ),
        }
    }

    /// Read a weight file of any hidden width
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let tensors = read_tensors(BufReader::new(file))
            .with_context(|| format!("Failed to read weights from {}", path.display()))?;
        let model = Self::from_tensors(&tensors)?;
        info!(
            "Loaded exported {} model with {} hidden units from {}",
            if model.has_value_head() { "actor-critic" } else { "policy" },
            model.hidden_size(),
            path.display()
        );
        Ok(model)
    }

    pub fn hidden_size(&self) -> usize {
        self.common_bias.len()
    }

    /// Whether the file carried a value head
    pub fn has_value_head(&self) -> bool {
        self.value_head.is_some()
    }

    /// Policy logits and value for one feature vector
    pub fn forward(&self, features: ArrayView1<f32>) -> (Array1<f32>, f32) {
        let hidden = (self.common_weight.dot(&features) + &self.common_bias).mapv(|v| v.max(0.0));
        let logits = self.policy_weight.dot(&hidden) + &self.policy_bias;
        let value = match &self.value_head {
            Some((weight, bias)) => weight.row(0).dot(&hidden) + bias[0],
            None => 0.0,
        };
        (logits, value)
    }
}

fn find<'a>(tensors: &'a [NamedTensor], name: &str) -> Result<&'a NamedTensor> {
    tensors
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| anyhow!("Missing block {name}"))
}

impl PolicyValueModel for ExportedModel {
    fn predict(&self, features: &[f32]) -> Result<(Vec<f32>, f32)> {
        ensure!(
            features.len() == NUM_CELLS,
            "Expected {NUM_CELLS} features, got {}",
            features.len()
        );
        let (logits, value) = self.forward(ArrayView1::from(features));
        Ok((logits.to_vec(), value))
    }
}
