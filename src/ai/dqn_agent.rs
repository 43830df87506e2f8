use super::agent::{Agent, Decision};
use super::algorithms::{DqnConfig, DqnLearner};
use super::state_encoding::{encode_state, TIC_TAC_TOE_FEATURES};
use crate::error::{GameError, LearnerError};
use crate::game::{Action, GameState, Player, TicTacToe, CELLS};

/// Tic-Tac-Toe player backed by a [`DqnLearner`].
///
/// The board is encoded from the mover's perspective, so one network can play
/// either side. With `training` off the learner plays greedily.
pub struct DqnAgent {
    learner: DqnLearner,
    training: bool,
}

impl DqnAgent {
    pub fn new(learner: DqnLearner) -> Self {
        DqnAgent {
            learner,
            training: false,
        }
    }

    /// Fresh learner sized for the Tic-Tac-Toe encoding.
    pub fn for_tic_tac_toe(config: DqnConfig) -> Self {
        Self::new(DqnLearner::new(TIC_TAC_TOE_FEATURES, CELLS, config))
    }

    pub fn with_training(mut self, training: bool) -> Self {
        self.training = training;
        self
    }

    pub fn learner(&self) -> &DqnLearner {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut DqnLearner {
        &mut self.learner
    }

    pub fn into_learner(self) -> DqnLearner {
        self.learner
    }
}

fn to_game_error(err: LearnerError) -> GameError {
    match err {
        LearnerError::NoLegalMove => GameError::NoLegalMove,
        other => GameError::InvalidMove(other.to_string()),
    }
}

impl Agent<TicTacToe> for DqnAgent {
    fn choose_action(
        &mut self,
        step: usize,
        state: &GameState,
        _rendered: &str,
        player: Player,
    ) -> Result<Decision<Action>, GameError> {
        let legal: Vec<usize> = state.legal_actions().iter().map(|a| a.index()).collect();
        if legal.is_empty() {
            return Err(GameError::NoLegalMove);
        }
        let encoded = encode_state(state, player);
        let index = if self.training {
            self.learner.select_action(&encoded, &legal)
        } else {
            self.learner.greedy_action(&encoded, &legal)
        }
        .map_err(to_game_error)?;

        let action = Action::from_index(index)?;
        log::debug!("dqn step {step}: {player:?} plays {action}");
        Ok(Decision::new(action))
    }

    fn name(&self) -> &str {
        "DQN"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> DqnAgent {
        DqnAgent::for_tic_tac_toe(DqnConfig {
            hidden_1: 16,
            hidden_2: 8,
            seed: Some(1),
            ..Default::default()
        })
    }

    #[test]
    fn test_dqn_agent_selects_legal_action() {
        let mut agent = agent();
        let mut state = GameState::initial();
        for n in [1, 5, 9] {
            state = state.apply_move(Action::new(n).unwrap()).unwrap();
        }
        let legal = state.legal_actions();
        for step in 0..10 {
            let decision = agent.choose_action(step, &state, "", state.to_move()).unwrap();
            assert!(legal.contains(&decision.action), "{} is not legal", decision.action);
        }
    }

    #[test]
    fn test_training_mode_explores_legally() {
        let mut agent = agent().with_training(true);
        agent.learner_mut().set_epsilon(1.0);
        let state = GameState::initial().apply_move(Action::new(5).unwrap()).unwrap();
        for step in 0..50 {
            let decision = agent.choose_action(step, &state, "", Player::Two).unwrap();
            assert_ne!(decision.action, Action::new(5).unwrap());
        }
    }

    #[test]
    fn test_terminal_state_has_no_move() {
        let mut agent = agent();
        let mut state = GameState::initial();
        for n in [1, 4, 2, 5, 3] {
            state = state.apply_move(Action::new(n).unwrap()).unwrap();
        }
        assert_eq!(
            agent.choose_action(5, &state, "", Player::Two),
            Err(GameError::NoLegalMove)
        );
    }
}
