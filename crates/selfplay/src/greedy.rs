use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use reversi_core::{Board, Player, NUM_CELLS};

use crate::config::SelfPlayConfig;
use crate::error::Result;

/// Stone difference `player - opponent` after `player` plays `cell`
fn margin_after(board: &Board, cell: usize, player: Player) -> Result<i32> {
    let next = board.apply_move(cell, player)?;
    Ok(next.count(player) as i32 - next.count(player.opponent()) as i32)
}

/// Every legal move that maximises the immediate stone difference, row-major
pub fn greedy_moves(board: &Board, player: Player) -> Result<Vec<usize>> {
    let mut best = Vec::new();
    let mut best_margin = i32::MIN;
    for cell in board.legal_moves(player) {
        let margin = margin_after(board, cell, player)?;
        if margin > best_margin {
            best_margin = margin;
            best.clear();
        }
        if margin == best_margin {
            best.push(cell);
        }
    }
    Ok(best)
}

/// One-ply greedy baseline: the move leaving `player` the largest stone lead
///
/// Ties go to the first such cell in row-major order. Returns `None` when
/// `player` has no legal move.
pub fn greedy_move(board: &Board, player: Player) -> Result<Option<usize>> {
    Ok(greedy_moves(board, player)?.first().copied())
}

/// A labelled position for supervised policy training
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySample {
    /// Player-relative features of the position
    pub features: [f32; NUM_CELLS],
    /// Cell the greedy player chose
    pub action: usize,
    pub player: Player,
}

/// Play `games` greedy-vs-greedy games and record every move
///
/// Each turn the mover plays one of its greedy moves, chosen uniformly among
/// ties. Passes follow the self-play rules and a game stops after
/// `config.max_steps` recorded moves.
pub fn generate_greedy_samples<R: Rng + ?Sized>(
    games: usize,
    config: &SelfPlayConfig,
    rng: &mut R,
) -> Result<Vec<PolicySample>> {
    info!("Generating data from {games} greedy games");
    let mut samples = Vec::new();

    for game in 0..games {
        let mut board = Board::new();
        let mut player = Player::Black;
        let mut moves = 0;

        while moves < config.max_steps {
            let candidates = greedy_moves(&board, player)?;
            let Some(&action) = candidates.choose(rng) else {
                if !board.has_legal_move(player.opponent()) {
                    break;
                }
                player = player.opponent();
                continue;
            };

            samples.push(PolicySample {
                features: board.features(player),
                action,
                player,
            });
            board = board.apply_move(action, player)?;
            player = player.opponent();
            moves += 1;
        }

        debug!("Greedy game {} finished after {moves} moves", game + 1);
        if (game + 1) % 1000 == 0 {
            info!("Processed {}/{games} greedy games", game + 1);
        }
    }

    info!("Generated {} samples", samples.len());
    Ok(samples)
}
