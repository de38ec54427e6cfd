use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{Result, SelfPlayError};
use crate::evaluation::{log_prob_of, softmax_legal_moves};

/// Move picked from the masked policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionChoice {
    pub action: usize,
    /// Log-probability of `action` under the masked distribution
    pub log_prob: f32,
    /// Set when the distribution was degenerate and the first legal move was taken
    pub fallback: bool,
}

/// Sample a move from the softmax over legal moves.
///
/// `legal_moves` must be in canonical row-major order. If the masked
/// distribution has no usable probability mass (underflow, NaN or infinite
/// logits) the first legal move is chosen and a warning is logged; its
/// log-probability is then that of a uniform pick, `-ln(n)`.
pub fn select_action<R: Rng + ?Sized>(
    logits: &[f32],
    legal_moves: &[usize],
    rng: &mut R,
) -> Result<ActionChoice> {
    let first = *legal_moves.first().ok_or(SelfPlayError::NoLegalMoves)?;

    let probs = softmax_legal_moves(logits, legal_moves);
    let mass: f32 = probs.iter().sum();

    let sampled = if mass.is_finite() && mass > 0.0 {
        WeightedIndex::new(&probs)
            .ok()
            .map(|dist| legal_moves[dist.sample(rng)])
    } else {
        None
    };

    match sampled {
        Some(action) => {
            let log_prob = log_prob_of(logits, legal_moves, action);
            Ok(ActionChoice {
                action,
                log_prob,
                fallback: false,
            })
        }
        None => {
            warn!(
                "Degenerate move distribution (mass {mass}), falling back to first legal move {first} of {legal_moves:?}"
            );
            Ok(ActionChoice {
                action: first,
                log_prob: -(legal_moves.len() as f32).ln(),
                fallback: true,
            })
        }
    }
}
