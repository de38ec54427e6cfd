use log::debug;
use rand::Rng;
use reversi_core::{Board, Player};

use crate::config::SelfPlayConfig;
use crate::data::{EpisodeRecord, GameResult, Step, TerminalRewards, Trajectory};
use crate::error::Result;
use crate::evaluation::{evaluate, PolicyValueModel};
use crate::selection::select_action;

/// Play a single self-play episode
///
/// Both sides are driven by the same `model`. Every turn with at least one
/// legal move is recorded; a side without moves passes and is not recorded.
/// The episode ends when neither side can move or `config.max_steps` moves
/// have been recorded.
///
/// # Returns
/// The trajectory, the final board and the rewards derived from it
pub fn play_episode<M, R>(model: &M, config: &SelfPlayConfig, rng: &mut R) -> Result<EpisodeRecord>
where
    M: PolicyValueModel + ?Sized,
    R: Rng + ?Sized,
{
    let mut board = Board::new();
    let mut player = Player::Black;
    let mut trajectory = Trajectory::default();
    let mut passes = 0;
    let mut truncated = false;

    loop {
        if trajectory.len() >= config.max_steps {
            truncated = !board.is_terminal();
            break;
        }

        let legal_moves = board.legal_moves(player);
        if legal_moves.is_empty() {
            if !board.has_legal_move(player.opponent()) {
                break;
            }
            debug!("{player} has no legal move and passes");
            passes += 1;
            player = player.opponent();
            continue;
        }

        let features = board.features(player);
        let (logits, value) = evaluate(model, &features)?;
        let choice = select_action(&logits, &legal_moves, rng)?;

        trajectory.push(Step {
            features,
            action: choice.action,
            log_prob: choice.log_prob,
            value,
            player,
            legal_mask: board.legal_moves_mask(player),
            fallback: choice.fallback,
        });

        board = board.apply_move(choice.action, player)?;
        player = player.opponent();
    }

    let rewards = TerminalRewards::from_board(&board);
    let result = GameResult::from_board(&board);
    debug!(
        "Episode finished after {} moves ({} passes): {:?}",
        trajectory.len(),
        passes,
        result
    );

    Ok(EpisodeRecord {
        trajectory,
        final_board: board,
        rewards,
        result,
        passes,
        truncated,
    })
}
