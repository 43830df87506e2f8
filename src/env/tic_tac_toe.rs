use super::{Environment, StepResult};
use crate::ai::state_encoding::{encode_state, TIC_TAC_TOE_FEATURES};
use crate::ai::Agent;
use crate::error::GameError;
use crate::game::{Action, GameState, Player, TicTacToe, CELLS};

/// Tic-Tac-Toe from one side's point of view; the other side is played by
/// an injected opponent agent inside `step`.
pub struct TicTacToeEnv {
    opponent: Box<dyn Agent<TicTacToe>>,
    learner_side: Player,
    state: GameState,
    steps: usize,
}

impl TicTacToeEnv {
    pub fn new(opponent: Box<dyn Agent<TicTacToe>>, learner_side: Player) -> Self {
        let mut env = TicTacToeEnv {
            opponent,
            learner_side,
            state: GameState::initial(),
            steps: 0,
        };
        env.reset();
        env
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn learner_side(&self) -> Player {
        self.learner_side
    }

    fn opponent_move(&mut self) -> Result<(), GameError> {
        let player = self.learner_side.other();
        let rendered = self.state.board().to_string();
        let decision = self
            .opponent
            .choose_action(self.steps, &self.state, &rendered, player)?;
        self.state = self.state.apply_action(decision.action, player)?;
        self.steps += 1;
        Ok(())
    }

    fn result(&self) -> StepResult {
        let (reward, done) = match self.state.outcome() {
            Some(outcome) => (outcome.reward_for(self.learner_side), true),
            None => (0.0, false),
        };
        StepResult {
            observation: encode_state(&self.state, self.learner_side),
            reward,
            done,
        }
    }
}

impl Environment for TicTacToeEnv {
    fn name(&self) -> &str {
        "tic_tac_toe"
    }

    fn reset(&mut self) -> Vec<f32> {
        self.state = GameState::initial();
        self.steps = 0;
        if self.learner_side == Player::Two {
            if let Err(e) = self.opponent_move() {
                log::warn!("opponent {} failed on the opening move: {e}", self.opponent.name());
            }
        }
        encode_state(&self.state, self.learner_side)
    }

    fn step(&mut self, action: usize) -> Result<StepResult, GameError> {
        if self.state.is_terminal() {
            return Err(GameError::GameOver);
        }
        let action = Action::from_index(action)?;
        self.state = self.state.apply_action(action, self.learner_side)?;
        self.steps += 1;

        if !self.state.is_terminal() {
            self.opponent_move()?;
        }
        Ok(self.result())
    }

    fn legal_actions(&self) -> Vec<usize> {
        self.state.legal_actions().iter().map(|a| a.index()).collect()
    }

    fn observation_dim(&self) -> usize {
        TIC_TAC_TOE_FEATURES
    }

    fn num_actions(&self) -> usize {
        CELLS
    }

    fn render(&self) -> String {
        format!("{}to move: {}", self.state.board(), self.state.to_move().name())
    }
}
