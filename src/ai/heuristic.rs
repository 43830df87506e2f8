use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::agent::{Agent, Decision};
use crate::error::GameError;
use crate::game::{Action, GameOutcome, GameRules, GameState, Player, TicTacToe};

const CENTER: u8 = 5;
const CORNERS: [u8; 4] = [1, 3, 7, 9];

/// Rule-of-thumb Tic-Tac-Toe player: win, block, centre, corner, then
/// a random edge.
pub struct HeuristicAgent {
    rng: StdRng,
}

impl HeuristicAgent {
    pub fn new() -> Self {
        HeuristicAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        HeuristicAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// First action in `legal` that completes a line for `player`.
    fn completing_move(state: &GameState, legal: &[Action], player: Player) -> Option<Action> {
        legal.iter().copied().find(|&action| {
            state
                .apply_action(action, player)
                .is_ok_and(|next| next.outcome() == Some(GameOutcome::Winner(player)))
        })
    }
}

impl Default for HeuristicAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent<TicTacToe> for HeuristicAgent {
    fn choose_action(
        &mut self,
        _step: usize,
        state: &GameState,
        _rendered: &str,
        player: Player,
    ) -> Result<Decision<Action>, GameError> {
        let legal = TicTacToe.legal_actions(state);
        if legal.is_empty() {
            return Err(GameError::NoLegalMove);
        }

        if let Some(action) = Self::completing_move(state, &legal, player) {
            return Ok(Decision::new(action).with_rationale("completes a line"));
        }
        if let Some(action) = Self::completing_move(state, &legal, player.other()) {
            return Ok(Decision::new(action).with_rationale("blocks the opponent"));
        }
        if let Some(&action) = legal.iter().find(|a| a.number() == CENTER) {
            return Ok(Decision::new(action).with_rationale("takes the centre"));
        }
        if let Some(&action) = legal.iter().find(|a| CORNERS.contains(&a.number())) {
            return Ok(Decision::new(action).with_rationale("takes a corner"));
        }
        let idx = self.rng.random_range(0..legal.len());
        Ok(Decision::new(legal[idx]))
    }

    fn name(&self) -> &str {
        "Heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;

    fn state(rows: [&str; 3], to_move: Player) -> GameState {
        GameState::from_board(Board::from_rows(rows).unwrap(), to_move)
    }

    fn act(n: u8) -> Action {
        Action::new(n).unwrap()
    }

    #[test]
    fn test_prefers_win_over_block() {
        let mut agent = HeuristicAgent::seeded(0);
        let s = state(["OO.", "XX.", "..."], Player::One);
        let decision = agent.choose_action(0, &s, "", Player::One).unwrap();
        assert_eq!(decision.action, act(6));
        assert_eq!(decision.rationale.as_deref(), Some("completes a line"));
    }

    #[test]
    fn test_blocks_open_line() {
        let mut agent = HeuristicAgent::seeded(0);
        let s = state(["XX.", "O..", "..."], Player::Two);
        let decision = agent.choose_action(0, &s, "", Player::Two).unwrap();
        assert_eq!(decision.action, act(3));
    }

    #[test]
    fn test_centre_then_corner() {
        let mut agent = HeuristicAgent::seeded(0);
        let empty = GameState::initial();
        assert_eq!(agent.choose_action(0, &empty, "", Player::One).unwrap().action, act(5));

        let s = state(["...", ".X.", "..."], Player::Two);
        assert_eq!(agent.choose_action(1, &s, "", Player::Two).unwrap().action, act(1));
    }

    #[test]
    fn test_falls_back_to_legal_edge() {
        let mut agent = HeuristicAgent::seeded(3);
        let s = state(["XOX", ".X.", "OXO"], Player::Two);
        let legal = s.legal_actions();
        for step in 0..20 {
            let action = agent.choose_action(step, &s, "", Player::Two).unwrap().action;
            assert!(legal.contains(&action));
        }
    }

    #[test]
    fn test_terminal_state_has_no_move() {
        let mut agent = HeuristicAgent::seeded(0);
        let s = state(["XXX", "OO.", "..."], Player::Two);
        assert_eq!(
            agent.choose_action(5, &s, "", Player::Two),
            Err(GameError::NoLegalMove)
        );
    }
}
