use super::board::{Board, SIZE};
use super::{Action, GameOutcome, Player, StateKey};
use crate::error::GameError;

/// A Tic-Tac-Toe position: board, side to move, and derived outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    board: Board,
    to_move: Player,
    outcome: Option<GameOutcome>,
}

impl GameState {
    /// Create initial game state
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            to_move: Player::One, // X starts
            outcome: None,
        }
    }

    /// Wrap an arbitrary board, deriving its outcome.
    pub fn from_board(board: Board, to_move: Player) -> Self {
        GameState {
            board,
            to_move,
            outcome: derive_outcome(&board),
        }
    }

    /// Player whose turn it is
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Get reference to board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Check if game is over
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Empty cells in reading order; empty once the game is over.
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.board
            .empty_cells()
            .filter_map(|(row, col)| Action::from_coords(row, col).ok())
            .collect()
    }

    /// Place `player`'s mark and return the new state. The receiver is untouched.
    pub fn apply_action(&self, action: Action, player: Player) -> Result<GameState, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        let (row, col) = action.coords();
        let mut board = self.board;
        board.place(row, col, player)?;

        Ok(GameState {
            board,
            to_move: player.other(),
            outcome: derive_outcome(&board),
        })
    }

    /// Apply a move for the side to move.
    pub fn apply_move(&self, action: Action) -> Result<GameState, GameError> {
        self.apply_action(action, self.to_move)
    }

    /// Content key: two bits per cell in reading order, side to move on top.
    pub fn key(&self) -> StateKey {
        let mut packed = 0u64;
        for row in 0..SIZE {
            for col in 0..SIZE {
                packed = (packed << 2) | self.board.get(row, col).code();
            }
        }
        let turn = match self.to_move {
            Player::One => 0u64,
            Player::Two => 1,
        };
        StateKey((turn << (2 * SIZE * SIZE)) | packed)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

fn derive_outcome(board: &Board) -> Option<GameOutcome> {
    if let Some(player) = board.line_winner() {
        Some(GameOutcome::Winner(player))
    } else if board.is_full() {
        Some(GameOutcome::Draw)
    } else {
        None
    }
}
