use reversi_core::{Board, Player, NUM_CELLS};

/// Result of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    BlackWin,
    WhiteWin,
    Draw,
}

impl GameResult {
    pub fn from_board(board: &Board) -> Self {
        match board.winner() {
            Some(Player::Black) => GameResult::BlackWin,
            Some(Player::White) => GameResult::WhiteWin,
            None => GameResult::Draw,
        }
    }
}

/// Final rewards for both sides: +1 win, -1 loss, 0 draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalRewards {
    pub black: f32,
    pub white: f32,
}

impl TerminalRewards {
    /// Majority of stones wins; equal counts give 0 to both
    pub fn from_board(board: &Board) -> Self {
        match board.winner() {
            Some(Player::Black) => Self {
                black: 1.0,
                white: -1.0,
            },
            Some(Player::White) => Self {
                black: -1.0,
                white: 1.0,
            },
            None => Self {
                black: 0.0,
                white: 0.0,
            },
        }
    }

    pub fn for_player(&self, player: Player) -> f32 {
        match player {
            Player::Black => self.black,
            Player::White => self.white,
        }
    }
}

/// One recorded move of an episode
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Board from the mover's point of view
    pub features: [f32; NUM_CELLS],
    /// Chosen cell
    pub action: usize,
    /// Log-probability of `action` under the masked policy
    pub log_prob: f32,
    /// Value predicted for `features`
    pub value: f32,
    /// Side that actually made the move
    pub player: Player,
    /// Legal moves at this step (cell `i` at bit `63 - i`)
    pub legal_mask: u64,
    /// Whether the degenerate-distribution fallback picked the move
    pub fallback: bool,
}

impl Step {
    /// Legal moves of this step in row-major order
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..NUM_CELLS)
            .filter(|&i| self.legal_mask & (1u64 << (63 - i)) != 0)
            .collect()
    }
}

/// Ordered moves of one episode; passes are not recorded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Everything produced by one self-play episode
#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    pub trajectory: Trajectory,
    pub final_board: Board,
    pub rewards: TerminalRewards,
    pub result: GameResult,
    /// Number of forced passes during the game
    pub passes: usize,
    /// The step cap ended the game before a terminal position
    pub truncated: bool,
}

impl EpisodeRecord {
    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }

    /// Number of steps that used the first-legal-move fallback
    pub fn fallback_count(&self) -> usize {
        self.trajectory.iter().filter(|s| s.fallback).count()
    }
}
