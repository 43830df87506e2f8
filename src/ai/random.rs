use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::agent::{Agent, Decision};
use crate::error::GameError;
use crate::game::{GameRules, Player};

/// An agent that selects uniformly at random from legal actions.
pub struct RandomAgent<R> {
    rules: R,
    rng: StdRng,
}

impl<R: GameRules> RandomAgent<R> {
    pub fn new(rules: R) -> Self {
        RandomAgent {
            rules,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(rules: R, seed: u64) -> Self {
        RandomAgent {
            rules,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: GameRules> Agent<R> for RandomAgent<R> {
    fn choose_action(
        &mut self,
        _step: usize,
        state: &R::State,
        _rendered: &str,
        _player: Player,
    ) -> Result<Decision<R::Action>, GameError> {
        let actions = self.rules.legal_actions(state);
        if actions.is_empty() {
            return Err(GameError::NoLegalMove);
        }
        let idx = self.rng.random_range(0..actions.len());
        Ok(Decision::new(actions[idx]))
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameState, TicTacToe};

    #[test]
    fn test_random_agent_selects_legal_action() {
        let mut agent = RandomAgent::new(TicTacToe);
        let state = GameState::initial();
        let legal = state.legal_actions();

        for step in 0..100 {
            let decision = agent.choose_action(step, &state, "", Player::One).unwrap();
            assert!(legal.contains(&decision.action), "{:?} is not legal", decision.action);
        }
    }

    #[test]
    fn test_random_agent_plays_full_game() {
        let mut agent1 = RandomAgent::seeded(TicTacToe, 1);
        let mut agent2 = RandomAgent::seeded(TicTacToe, 2);
        let mut state = GameState::initial();

        let mut turn = 0;
        while !state.is_terminal() {
            let player = state.to_move();
            let decision = if turn % 2 == 0 {
                agent1.choose_action(turn, &state, "", player).unwrap()
            } else {
                agent2.choose_action(turn, &state, "", player).unwrap()
            };
            state = state.apply_move(decision.action).unwrap();
            turn += 1;
        }

        assert!(state.outcome().is_some());
    }

    #[test]
    fn test_terminal_state_has_no_move() {
        let mut agent = RandomAgent::new(TicTacToe);
        let mut state = GameState::initial();
        for n in [1, 4, 2, 5, 3] {
            state = state.apply_move(crate::game::Action::new(n).unwrap()).unwrap();
        }
        assert_eq!(
            agent.choose_action(5, &state, "", Player::Two),
            Err(GameError::NoLegalMove)
        );
    }
}
