use reversi_core::NUM_CELLS;

use crate::error::{Result, SelfPlayError};

/// Minimal interface required from a policy-value predictor
///
/// `features` holds the 64 player-relative cell values (+1 own stone,
/// -1 opponent stone, 0 empty). Implementations return one logit per cell
/// and a scalar value estimate from the side to move.
pub trait PolicyValueModel {
    fn predict(&self, features: &[f32]) -> anyhow::Result<(Vec<f32>, f32)>;
}

impl<M: PolicyValueModel + ?Sized> PolicyValueModel for &M {
    fn predict(&self, features: &[f32]) -> anyhow::Result<(Vec<f32>, f32)> {
        (**self).predict(features)
    }
}

/// Run the model on a feature vector and check the output shape
pub fn evaluate<M: PolicyValueModel + ?Sized>(
    model: &M,
    features: &[f32],
) -> Result<(Vec<f32>, f32)> {
    let (logits, value) = model.predict(features)?;

    if logits.len() != NUM_CELLS {
        return Err(SelfPlayError::EvaluationFailed(format!(
            "Expected policy of length {NUM_CELLS}, got {}",
            logits.len()
        )));
    }

    Ok((logits, value))
}

/// Compute softmax over legal moves only
///
/// Illegal moves are treated as masked with -inf, so the result holds one
/// probability per entry of `legal_moves`, in the same order.
pub fn softmax_legal_moves(logits: &[f32], legal_moves: &[usize]) -> Vec<f32> {
    if legal_moves.is_empty() {
        return Vec::new();
    }

    // Find max for numerical stability
    let max = legal_moves
        .iter()
        .map(|&m| logits[m])
        .fold(f32::NEG_INFINITY, f32::max);

    let exp_vals: Vec<f32> = legal_moves.iter().map(|&m| (logits[m] - max).exp()).collect();
    let exp_sum: f32 = exp_vals.iter().sum();

    exp_vals.into_iter().map(|e| e / exp_sum).collect()
}

/// Log-probability of `action` under the masked distribution (log-sum-exp form)
pub fn log_prob_of(logits: &[f32], legal_moves: &[usize], action: usize) -> f32 {
    let max = legal_moves
        .iter()
        .map(|&m| logits[m])
        .fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = legal_moves.iter().map(|&m| (logits[m] - max).exp()).sum();

    logits[action] - max - exp_sum.ln()
}
