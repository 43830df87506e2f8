//! Single-agent environments the DQN learner trains against.

mod minesweeper;
mod snake;
mod tic_tac_toe;
mod treasure_hunt;

pub use minesweeper::{MineCell, MinesweeperAction, MinesweeperConfig, MinesweeperEnv, MoveKind};
pub use snake::{Direction, SnakeConfig, SnakeEnv};
pub use tic_tac_toe::TicTacToeEnv;
pub use treasure_hunt::{Feedback, TreasureHuntConfig, TreasureHuntEnv};

use crate::error::GameError;

/// What one environment step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// Episodic environment with flat observations and dense action indices.
pub trait Environment {
    fn name(&self) -> &str;

    /// Start a new episode and return the first observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Advance one step. Fails with `GameError::GameOver` once the episode is
    /// done and with `OutOfRange` for an index outside `0..num_actions()`.
    fn step(&mut self, action: usize) -> Result<StepResult, GameError>;

    /// Actions that make sense in the current state; empty once done.
    fn legal_actions(&self) -> Vec<usize>;

    fn observation_dim(&self) -> usize;

    fn num_actions(&self) -> usize;

    /// Plain-text view for logs.
    fn render(&self) -> String;
}

fn out_of_range(what: &'static str, value: usize, len: usize) -> GameError {
    GameError::OutOfRange {
        what,
        value: value as i64,
        min: 0,
        max: len as i64 - 1,
    }
}
