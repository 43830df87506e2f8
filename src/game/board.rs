use std::fmt;

use super::Player;
use crate::error::GameError;

pub const SIZE: usize = 3;
pub const CELLS: usize = SIZE * SIZE;

/// Every winning line: three rows, three columns, both diagonals.
const LINES: [[(usize, usize); SIZE]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Taken(Player),
}

impl Cell {
    /// Two-bit code used when packing a board into a `StateKey`.
    pub(crate) fn code(self) -> u64 {
        match self {
            Cell::Empty => 0,
            Cell::Taken(Player::One) => 1,
            Cell::Taken(Player::Two) => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; SIZE]; SIZE],
        }
    }

    /// Build a board from three rows of `X`, `O` and `.` characters.
    pub fn from_rows(rows: [&str; SIZE]) -> Result<Self, GameError> {
        let mut board = Board::new();
        for (row, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            if chars.len() != SIZE {
                return Err(GameError::InvalidMove(format!(
                    "row {row} must have {SIZE} cells, got {:?}",
                    line
                )));
            }
            for (col, ch) in chars.into_iter().enumerate() {
                board.cells[row][col] = match ch {
                    'X' | 'x' => Cell::Taken(Player::One),
                    'O' | 'o' => Cell::Taken(Player::Two),
                    '.' | ' ' => Cell::Empty,
                    other => {
                        return Err(GameError::InvalidMove(format!(
                            "unknown cell symbol {other:?}"
                        )))
                    }
                };
            }
        }
        Ok(board)
    }

    /// Get the cell at a specific position
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        self.cells[row][col] == Cell::Empty
    }

    /// Mark a cell for `player`. An occupied cell is never overwritten.
    pub fn place(&mut self, row: usize, col: usize, player: Player) -> Result<(), GameError> {
        if row >= SIZE || col >= SIZE {
            return Err(GameError::OutOfRange {
                what: "coordinate",
                value: row.max(col) as i64,
                min: 0,
                max: SIZE as i64 - 1,
            });
        }
        if !self.is_empty_at(row, col) {
            return Err(GameError::InvalidMove(format!(
                "cell ({row}, {col}) is already occupied"
            )));
        }
        self.cells[row][col] = Cell::Taken(player);
        Ok(())
    }

    /// Row-major iterator over empty coordinates.
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..SIZE)
            .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| self.is_empty_at(row, col))
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        self.empty_cells().next().is_none()
    }

    pub fn count(&self, player: Player) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == Cell::Taken(player))
            .count()
    }

    /// Player owning a complete line, if any.
    pub fn line_winner(&self) -> Option<Player> {
        LINES.iter().find_map(|line| {
            let [a, b, c] = line.map(|(r, col)| self.cells[r][col]);
            match a {
                Cell::Taken(p) if a == b && b == c => Some(p),
                _ => None,
            }
        })
    }

    /// All players that own a complete line. More than one only on boards
    /// that could not arise from alternating play.
    pub fn line_owners(&self) -> Vec<Player> {
        let mut owners = Vec::new();
        for line in LINES.iter() {
            let [a, b, c] = line.map(|(r, col)| self.cells[r][col]);
            if let Cell::Taken(p) = a {
                if a == b && b == c && !owners.contains(&p) {
                    owners.push(p);
                }
            }
        }
        owners
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE {
            let line: Vec<String> = (0..SIZE)
                .map(|col| match self.cells[row][col] {
                    Cell::Empty => ".".to_string(),
                    Cell::Taken(p) => p.symbol().to_string(),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        for row in 0..SIZE {
            for col in 0..SIZE {
                assert_eq!(board.get(row, col), Cell::Empty);
            }
        }
        assert_eq!(board.empty_cells().count(), CELLS);
    }

    #[test]
    fn test_place_rejects_occupied() {
        let mut board = Board::new();
        board.place(1, 1, Player::One).unwrap();
        let err = board.place(1, 1, Player::Two).unwrap_err();
        assert!(matches!(err, GameError::InvalidMove(_)));
        assert_eq!(board.get(1, 1), Cell::Taken(Player::One));
    }

    #[test]
    fn test_place_rejects_out_of_range() {
        let mut board = Board::new();
        assert!(matches!(
            board.place(3, 0, Player::One),
            Err(GameError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_row_column_and_diagonal_wins() {
        let row = Board::from_rows(["XXX", "OO.", "..."]).unwrap();
        assert_eq!(row.line_winner(), Some(Player::One));

        let col = Board::from_rows(["OX.", "OX.", "O.X"]).unwrap();
        assert_eq!(col.line_winner(), Some(Player::Two));

        let anti = Board::from_rows(["O.X", "OX.", "X.."]).unwrap();
        assert_eq!(anti.line_winner(), Some(Player::One));
    }

    #[test]
    fn test_full_board_without_line() {
        let board = Board::from_rows(["XOX", "XOO", "OXX"]).unwrap();
        assert!(board.is_full());
        assert_eq!(board.line_winner(), None);
    }

    #[test]
    fn test_display_uses_symbols() {
        let board = Board::from_rows(["X..", ".O.", "..."]).unwrap();
        assert_eq!(board.to_string(), "X . .\n. O .\n. . .\n");
    }
}
