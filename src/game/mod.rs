//! Core Tic-Tac-Toe logic and the `GameRules` capability that search agents
//! are built on: board, player, actions, and immutable state transitions.

mod action;
mod board;
mod player;
mod rules;
mod state;

pub use action::Action;
pub use board::{Board, Cell, CELLS, SIZE};
pub use player::{GameOutcome, Player};
pub use rules::{GameRules, StateKey, TicTacToe};
pub use state::GameState;
