use std::fmt::Debug;
use std::hash::Hash;

use super::{Action, GameOutcome, GameState, Player};
use crate::error::GameError;

/// Content key for a game position. Used by search agents for table lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(pub u64);

/// Rules of a two-player, alternating, perfect-information game.
///
/// Agents hold a rules object instead of re-implementing board logic, so one
/// search implementation serves every game that provides these operations.
pub trait GameRules {
    type State: Clone + Debug;
    type Action: Copy + Eq + Hash + Debug;

    /// All permissible moves. Empty iff the state is terminal.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Return the state after `player` plays `action`.
    ///
    /// An action outside `legal_actions(state)` is an error and leaves
    /// `state` untouched.
    fn apply_action(
        &self,
        state: &Self::State,
        action: Self::Action,
        player: Player,
    ) -> Result<Self::State, GameError>;

    fn is_terminal(&self, state: &Self::State) -> bool;

    /// `None` while the game is ongoing.
    fn winner(&self, state: &Self::State) -> Option<GameOutcome>;

    fn to_move(&self, state: &Self::State) -> Player;

    fn state_key(&self, state: &Self::State) -> StateKey;

    /// Plain-text rendering handed to agents; never consulted by the engines.
    fn render(&self, state: &Self::State) -> String;
}

/// Standard 3x3 Tic-Tac-Toe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl GameRules for TicTacToe {
    type State = GameState;
    type Action = Action;

    fn legal_actions(&self, state: &GameState) -> Vec<Action> {
        state.legal_actions()
    }

    fn apply_action(
        &self,
        state: &GameState,
        action: Action,
        player: Player,
    ) -> Result<GameState, GameError> {
        state.apply_action(action, player)
    }

    fn is_terminal(&self, state: &GameState) -> bool {
        state.is_terminal()
    }

    fn winner(&self, state: &GameState) -> Option<GameOutcome> {
        state.outcome()
    }

    fn to_move(&self, state: &GameState) -> Player {
        state.to_move()
    }

    fn state_key(&self, state: &GameState) -> StateKey {
        state.key()
    }

    fn render(&self, state: &GameState) -> String {
        format!("{}to move: {}", state.board(), state.to_move().name())
    }
}
