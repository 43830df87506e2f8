use super::agent::{Agent, Decision};
use crate::error::GameError;
use crate::game::{GameOutcome, GameRules, Player};

/// Minimax hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    /// Terminal score scale. Must exceed the deepest possible game so that a
    /// faster win always outranks a slower one.
    pub win_bonus: i32,
    /// Alpha-beta cutoffs below the root. Does not change the chosen action.
    pub pruning: bool,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        MinimaxConfig {
            win_bonus: 10,
            pruning: true,
        }
    }
}

/// Exhaustive minimax search with depth-adjusted terminal scores.
///
/// A win for the searching player at depth `d` scores `win_bonus - d`, a loss
/// `d - win_bonus`, a draw `0`. Ties at the root go to the first action in
/// enumeration order.
pub struct MinimaxAgent<R> {
    rules: R,
    config: MinimaxConfig,
}

impl<R: GameRules> MinimaxAgent<R> {
    pub fn new(rules: R, config: MinimaxConfig) -> Self {
        MinimaxAgent { rules, config }
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }

    /// Exact minimax score of every legal root action, in enumeration order.
    pub fn score_actions(
        &self,
        state: &R::State,
        player: Player,
    ) -> Result<Vec<(R::Action, i32)>, GameError> {
        let legal = self.rules.legal_actions(state);
        if legal.is_empty() {
            return Err(GameError::NoLegalMove);
        }

        let mut scores = Vec::with_capacity(legal.len());
        for action in legal {
            let next = self.rules.apply_action(state, action, player)?;
            // Full window per root child keeps every root score exact.
            let score = self.minimax(&next, 1, false, player, i32::MIN, i32::MAX)?;
            scores.push((action, score));
        }
        Ok(scores)
    }

    /// Highest-scoring action; the first one wins ties.
    pub fn best_action(
        &self,
        state: &R::State,
        player: Player,
    ) -> Result<(R::Action, i32), GameError> {
        let scores = self.score_actions(state, player)?;
        let mut best: Option<(R::Action, i32)> = None;
        for (action, score) in scores {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((action, score)),
            }
        }
        best.ok_or(GameError::NoLegalMove)
    }

    fn minimax(
        &self,
        state: &R::State,
        depth: i32,
        maximizing: bool,
        player: Player,
        mut alpha: i32,
        mut beta: i32,
    ) -> Result<i32, GameError> {
        match self.rules.winner(state) {
            Some(GameOutcome::Winner(winner)) if winner == player => {
                return Ok(self.config.win_bonus - depth)
            }
            Some(GameOutcome::Winner(_)) => return Ok(depth - self.config.win_bonus),
            Some(GameOutcome::Draw) => return Ok(0),
            None => {}
        }

        let mover = if maximizing { player } else { player.other() };
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for action in self.rules.legal_actions(state) {
            let next = self.rules.apply_action(state, action, mover)?;
            let score = self.minimax(&next, depth + 1, !maximizing, player, alpha, beta)?;

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if self.config.pruning && alpha >= beta {
                break;
            }
        }

        Ok(best)
    }
}

impl<R: GameRules> Agent<R> for MinimaxAgent<R> {
    fn choose_action(
        &mut self,
        step: usize,
        state: &R::State,
        _rendered: &str,
        player: Player,
    ) -> Result<Decision<R::Action>, GameError> {
        let (action, score) = self.best_action(state, player)?;
        log::debug!("minimax step {step}: {player:?} plays {action:?} (score {score})");
        Ok(Decision::new(action).with_rationale(format!("minimax score {score}")))
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}
