use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{BoardError, Result};
use crate::player::Player;

pub const BOARD_SIZE: usize = 8;
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

const EMPTY: i8 = 0;

/// (row delta, column delta), scanned in this fixed order
const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Bit used for cell `i` in move masks: index 0 is the most significant bit.
const BITS: [u64; NUM_CELLS] = {
    let mut bits = [0u64; NUM_CELLS];
    let mut i = 0;
    while i < NUM_CELLS {
        bits[i] = 1u64 << (63 - i);
        i += 1;
    }
    bits
};

/// Immutable 8x8 Othello position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [i8; NUM_CELLS],
}

impl Board {
    /// Standard opening layout: black on 27 and 36, white on 28 and 35
    pub fn new() -> Self {
        let mut cells = [EMPTY; NUM_CELLS];
        cells[27] = Player::Black.sign();
        cells[36] = Player::Black.sign();
        cells[28] = Player::White.sign();
        cells[35] = Player::White.sign();
        Self { cells }
    }

    /// Build a board from raw cell values, each of which must be -1, 0 or 1
    pub fn from_cells(cells: [i8; NUM_CELLS]) -> Result<Self> {
        if let Some((index, &value)) = cells
            .iter()
            .enumerate()
            .find(|&(_, &v)| !(-1..=1).contains(&v))
        {
            return Err(BoardError::InvalidCell { index, value });
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[i8; NUM_CELLS] {
        &self.cells
    }

    /// Owner of a cell, `None` when empty or out of range
    pub fn cell(&self, index: usize) -> Option<Player> {
        self.cells.get(index).copied().and_then(Player::from_sign)
    }

    pub fn count(&self, player: Player) -> usize {
        let sign = player.sign();
        self.cells.iter().filter(|&&c| c == sign).count()
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }

    pub fn empty_count(&self) -> usize {
        NUM_CELLS - self.stone_count()
    }

    /// Board seen from `player`: own stones are +1, opponent stones -1
    pub fn features(&self, player: Player) -> [f32; NUM_CELLS] {
        let sign = player.sign();
        let mut features = [0f32; NUM_CELLS];
        for (out, &cell) in features.iter_mut().zip(self.cells.iter()) {
            *out = f32::from(cell * sign);
        }
        features
    }

    /// Number of opponent stones flanked by `player` when walking from
    /// `index` in direction `(dr, dc)`. Zero if the run is not closed by an
    /// own stone before an empty cell or the edge.
    fn flanked_run(&self, index: usize, player: Player, (dr, dc): (isize, isize)) -> usize {
        let own = player.sign();
        let mut row = (index / BOARD_SIZE) as isize + dr;
        let mut col = (index % BOARD_SIZE) as isize + dc;
        let mut run = 0;

        while (0..BOARD_SIZE as isize).contains(&row) && (0..BOARD_SIZE as isize).contains(&col) {
            let cell = self.cells[row as usize * BOARD_SIZE + col as usize];
            if cell == -own {
                run += 1;
            } else if cell == own {
                return run;
            } else {
                return 0;
            }
            row += dr;
            col += dc;
        }

        0
    }

    fn is_legal_unchecked(&self, index: usize, player: Player) -> bool {
        self.cells[index] == EMPTY
            && DIRECTIONS
                .iter()
                .any(|&dir| self.flanked_run(index, player, dir) > 0)
    }

    /// Whether `cell` is a legal move for `player`. Out-of-range cells are never legal.
    pub fn is_legal(&self, cell: usize, player: Player) -> bool {
        cell < NUM_CELLS && self.is_legal_unchecked(cell, player)
    }

    /// Legal moves in canonical (row-major) order
    pub fn legal_moves(&self, player: Player) -> Vec<usize> {
        (0..NUM_CELLS)
            .filter(|&i| self.is_legal_unchecked(i, player))
            .collect()
    }

    /// Legal moves as a bitmask (cell `i` at bit `63 - i`)
    pub fn legal_moves_mask(&self, player: Player) -> u64 {
        (0..NUM_CELLS)
            .filter(|&i| self.is_legal_unchecked(i, player))
            .fold(0u64, |mask, i| mask | BITS[i])
    }

    pub fn has_legal_move(&self, player: Player) -> bool {
        (0..NUM_CELLS).any(|i| self.is_legal_unchecked(i, player))
    }

    /// Place a stone for `player` at `cell` and flip every flanked run.
    ///
    /// Returns the resulting board; `self` is left unchanged.
    pub fn apply_move(&self, cell: usize, player: Player) -> Result<Board> {
        if cell >= NUM_CELLS {
            return Err(BoardError::OutOfRange(cell));
        }
        if !self.is_legal_unchecked(cell, player) {
            return Err(BoardError::IllegalMove { cell, player });
        }

        let sign = player.sign();
        let mut next = *self;
        next.cells[cell] = sign;

        for &(dr, dc) in DIRECTIONS.iter() {
            let run = self.flanked_run(cell, player, (dr, dc));
            let mut row = (cell / BOARD_SIZE) as isize;
            let mut col = (cell % BOARD_SIZE) as isize;
            for _ in 0..run {
                row += dr;
                col += dc;
                next.cells[row as usize * BOARD_SIZE + col as usize] = sign;
            }
        }

        Ok(next)
    }

    /// Game over: neither side has a legal move
    pub fn is_terminal(&self) -> bool {
        !self.has_legal_move(Player::Black) && !self.has_legal_move(Player::White)
    }

    /// Side with more stones, `None` on equal counts
    pub fn winner(&self) -> Option<Player> {
        match self.count(Player::Black).cmp(&self.count(Player::White)) {
            Ordering::Greater => Some(Player::Black),
            Ordering::Less => Some(Player::White),
            Ordering::Equal => None,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(BOARD_SIZE) {
            for &cell in row {
                let c = match Player::from_sign(cell) {
                    Some(Player::Black) => 'X',
                    Some(Player::White) => 'O',
                    None => '.',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parses 64 cells of `X` (black), `O` (white) and `.` (empty); whitespace is ignored.
impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cells = [EMPTY; NUM_CELLS];
        let mut n = 0;
        for ch in s.chars().filter(|c| !c.is_whitespace()) {
            if n >= NUM_CELLS {
                return Err(BoardError::Parse(format!(
                    "more than {NUM_CELLS} cells"
                )));
            }
            cells[n] = match ch {
                'X' | 'x' => Player::Black.sign(),
                'O' | 'o' => Player::White.sign(),
                '.' => EMPTY,
                other => {
                    return Err(BoardError::Parse(format!(
                        "unexpected character {other:?} at cell {n}"
                    )))
                }
            };
            n += 1;
        }
        if n != NUM_CELLS {
            return Err(BoardError::Parse(format!(
                "expected {NUM_CELLS} cells, got {n}"
            )));
        }
        Ok(Self { cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_layout() {
        let board = Board::new();
        assert_eq!(board.cell(27), Some(Player::Black));
        assert_eq!(board.cell(36), Some(Player::Black));
        assert_eq!(board.cell(28), Some(Player::White));
        assert_eq!(board.cell(35), Some(Player::White));
        assert_eq!(board.stone_count(), 4);
        assert_eq!(board.empty_count(), 60);
    }

    #[test]
    fn test_opening_moves() {
        let board = Board::new();
        assert_eq!(board.legal_moves(Player::Black), vec![20, 29, 34, 43]);
        assert_eq!(board.legal_moves(Player::White), vec![19, 26, 37, 44]);
    }

    #[test]
    fn test_mask_matches_list() {
        let board = Board::new();
        let mask = board.legal_moves_mask(Player::White);
        let expected = BITS[19] | BITS[26] | BITS[37] | BITS[44];
        assert_eq!(mask, expected);
        assert_eq!(mask.count_ones(), 4);
    }

    #[test]
    fn test_apply_opening_move_flips_one() {
        let board = Board::new();
        let next = board.apply_move(20, Player::Black).unwrap();

        assert_eq!(next.cell(20), Some(Player::Black));
        assert_eq!(next.cell(28), Some(Player::Black));
        assert_eq!(next.count(Player::Black), 4);
        assert_eq!(next.count(Player::White), 1);
        assert_eq!(next.stone_count(), 5);

        // Input untouched
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_white_opening_move() {
        let next = Board::new().apply_move(19, Player::White).unwrap();
        assert_eq!(next.cell(27), Some(Player::White));
        assert_eq!(next.count(Player::White), 4);
        assert_eq!(next.count(Player::Black), 1);
    }

    #[test]
    fn test_illegal_move_rejected() {
        let board = Board::new();
        assert_eq!(
            board.apply_move(19, Player::Black),
            Err(BoardError::IllegalMove {
                cell: 19,
                player: Player::Black
            })
        );
        // Occupied cell
        assert!(board.apply_move(27, Player::White).is_err());
        assert_eq!(
            board.apply_move(64, Player::Black),
            Err(BoardError::OutOfRange(64))
        );
    }

    #[test]
    fn test_flips_multiple_directions() {
        let board: Board = "\
            ........\
            ........\
            ..X.X...\
            ...OO...\
            ..XO....\
            ........\
            ........\
            ........"
            .parse()
            .unwrap();

        // 36 closes runs up-left (27 by 18), up (28 by 20) and left (35 by 34)
        let next = board.apply_move(36, Player::Black).unwrap();
        assert_eq!(next.cell(27), Some(Player::Black));
        assert_eq!(next.cell(28), Some(Player::Black));
        assert_eq!(next.cell(35), Some(Player::Black));
        assert_eq!(next.count(Player::White), 0);
        assert_eq!(next.stone_count(), board.stone_count() + 1);
    }

    #[test]
    fn test_open_run_not_flipped() {
        // The run 4..5 is open towards the empty cell 6
        let board: Board = "\
            XOO.OO..\
            ........\
            ........\
            ........\
            ........\
            ........\
            ........\
            ........"
            .parse()
            .unwrap();

        assert_eq!(board.legal_moves(Player::Black), vec![3]);
        let next = board.apply_move(3, Player::Black).unwrap();
        assert_eq!(next.count(Player::Black), 4);
        assert_eq!(next.cell(4), Some(Player::White));
        assert_eq!(next.cell(5), Some(Player::White));
    }

    #[test]
    fn test_full_board_is_terminal() {
        let mut cells = [0i8; NUM_CELLS];
        for (i, c) in cells.iter_mut().enumerate() {
            *c = if (i / BOARD_SIZE + i % BOARD_SIZE) % 2 == 0 { 1 } else { -1 };
        }
        let board = Board::from_cells(cells).unwrap();
        assert!(board.legal_moves(Player::Black).is_empty());
        assert!(board.legal_moves(Player::White).is_empty());
        assert!(board.is_terminal());
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn test_single_color_is_terminal() {
        let board: Board = "\
            ........\
            ........\
            ........\
            ...XX...\
            ...XX...\
            ........\
            ........\
            ........"
            .parse()
            .unwrap();
        assert!(board.is_terminal());
        assert_eq!(board.winner(), Some(Player::Black));
    }

    #[test]
    fn test_initial_not_terminal() {
        assert!(!Board::new().is_terminal());
    }

    #[test]
    fn test_features_are_player_relative() {
        let board = Board::new();
        let black = board.features(Player::Black);
        let white = board.features(Player::White);
        assert_eq!(black[27], 1.0);
        assert_eq!(black[28], -1.0);
        assert_eq!(white[27], -1.0);
        assert_eq!(white[28], 1.0);
        assert_eq!(black[0], 0.0);
        assert!(black.iter().zip(white.iter()).all(|(b, w)| *b == -*w));
    }

    #[test]
    fn test_from_cells_rejects_bad_value() {
        let mut cells = [0i8; NUM_CELLS];
        cells[5] = 2;
        assert_eq!(
            Board::from_cells(cells),
            Err(BoardError::InvalidCell { index: 5, value: 2 })
        );
    }

    #[test]
    fn test_display_parse_round_trip() {
        let board = Board::new().apply_move(20, Player::Black).unwrap();
        let text = board.to_string();
        let parsed: Board = text.parse().unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn test_parse_errors() {
        assert!("XO".parse::<Board>().is_err());
        assert!("?".repeat(64).parse::<Board>().is_err());
        assert!(".".repeat(65).parse::<Board>().is_err());
    }
}
