//! Othello rule engine
//!
//! The board is a plain 64-cell value (`row * 8 + col`) holding `0` for empty,
//! `+1` for black and `-1` for white. Every operation is pure: applying a move
//! returns a new [`Board`] and leaves the input untouched.

mod board;
mod error;
mod player;

pub use board::{Board, BOARD_SIZE, NUM_CELLS};
pub use error::{BoardError, Result};
pub use player::Player;
