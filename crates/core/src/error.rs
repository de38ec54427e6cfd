use thiserror::Error;

use crate::player::Player;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Illegal move: cell {cell} is not playable for {player}")]
    IllegalMove { cell: usize, player: Player },

    #[error("Cell index {0} is outside the board")]
    OutOfRange(usize),

    #[error("Invalid cell value {value} at index {index}")]
    InvalidCell { index: usize, value: i8 },

    #[error("Failed to parse board: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;
