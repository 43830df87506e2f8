use std::collections::HashMap;
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::agent::{Agent, Decision};
use crate::error::GameError;
use crate::game::{GameOutcome, GameRules, Player, StateKey};

/// Whose result a rollout is credited to when backing up an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPerspective {
    /// Credit the player who made the move on that edge.
    Mover,
    /// Credit the searching agent on every edge, whoever moved.
    Agent,
}

/// MCTS hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Simulations per decision.
    pub simulations: usize,
    /// `C` in the UCB1 exploration term.
    pub exploration_weight: f64,
    pub credit: CreditPerspective,
    /// Credit added for a drawn rollout; 0.0 counts wins only.
    pub draw_credit: f64,
    /// Keep edge statistics between decisions instead of starting fresh.
    /// Single-worker only; parallel searches always start from an empty tree.
    pub retain_tree: bool,
    /// Independent root-parallel searches, merged by summing root counters.
    pub workers: usize,
    pub seed: Option<u64>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            simulations: 5_000,
            exploration_weight: 1.0,
            credit: CreditPerspective::Mover,
            draw_credit: 0.5,
            retain_tree: false,
            workers: 1,
            seed: None,
        }
    }
}

/// Visit and win counters for one (state, action) edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeStats {
    pub visits: u32,
    pub wins: f64,
}

impl EdgeStats {
    /// Mean credit; zero for an unvisited edge.
    pub fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / self.visits as f64
        }
    }

    fn merge(&mut self, other: EdgeStats) {
        self.visits += other.visits;
        self.wins += other.wins;
    }
}

/// Edge table keyed by (state key, action) plus the registered children of
/// each expanded state.
struct SearchTree<A> {
    edges: HashMap<(StateKey, A), EdgeStats>,
    children: HashMap<StateKey, Vec<A>>,
}

impl<A: Copy + Eq + Hash> SearchTree<A> {
    fn new() -> Self {
        SearchTree {
            edges: HashMap::new(),
            children: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.edges.clear();
        self.children.clear();
    }

    fn stats(&self, key: StateKey, action: A) -> EdgeStats {
        self.edges.get(&(key, action)).copied().unwrap_or_default()
    }

    /// Expanded, and every legal action has been tried at least once.
    fn is_fully_expanded(&self, key: StateKey, legal: &[A]) -> bool {
        self.children.contains_key(&key)
            && legal.iter().all(|&a| self.stats(key, a).visits > 0)
    }

    /// UCB1 over `legal`. Unvisited actions score +inf, so `ln` is only taken
    /// once every action has a visit.
    fn select_ucb(&self, key: StateKey, legal: &[A], exploration_weight: f64) -> A {
        let total: u32 = legal.iter().map(|&a| self.stats(key, a).visits).sum();
        let log_total = if total > 0 { (total as f64).ln() } else { 0.0 };

        let mut best = legal[0];
        let mut best_score = f64::NEG_INFINITY;
        for &action in legal {
            let stats = self.stats(key, action);
            let score = if stats.visits == 0 {
                f64::INFINITY
            } else {
                stats.win_rate()
                    + exploration_weight * (log_total / stats.visits as f64).sqrt()
            };
            if score > best_score {
                best_score = score;
                best = action;
            }
        }
        best
    }

    fn record(&mut self, key: StateKey, action: A, credit: f64) {
        let entry = self.edges.entry((key, action)).or_default();
        entry.visits += 1;
        entry.wins += credit;
    }
}

/// Outcome of one search: chosen root action and per-action root statistics.
#[derive(Debug, Clone)]
pub struct SearchResult<A> {
    pub action: A,
    pub root: Vec<(A, EdgeStats)>,
}

impl<A: PartialEq> SearchResult<A> {
    pub fn stats_for(&self, action: A) -> EdgeStats {
        self.root
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    pub fn total_visits(&self) -> u32 {
        self.root.iter().map(|(_, s)| s.visits).sum()
    }
}

/// Monte Carlo Tree Search with UCB1 selection and uniform random rollouts.
pub struct MctsAgent<R: GameRules> {
    rules: R,
    config: MctsConfig,
    tree: SearchTree<R::Action>,
    rng: StdRng,
}

impl<R> MctsAgent<R>
where
    R: GameRules + Clone + Send + Sync,
    R::State: Send + Sync,
    R::Action: Send + Sync,
{
    pub fn new(rules: R, config: MctsConfig) -> Self {
        if config.retain_tree && config.workers > 1 {
            log::warn!("mcts: retain_tree has no effect with {} workers", config.workers);
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        MctsAgent {
            rules,
            config,
            tree: SearchTree::new(),
            rng,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Run `budget` simulations from `state` with `player` to move and pick the
    /// root action with the best win rate. Falls back to the first legal action if nothing was
    /// visited (a zero budget).
    pub fn search(
        &mut self,
        state: &R::State,
        player: Player,
        budget: usize,
    ) -> Result<SearchResult<R::Action>, GameError> {
        let legal = self.rules.legal_actions(state);
        if legal.is_empty() {
            return Err(GameError::NoLegalMove);
        }

        let root = if self.config.workers > 1 {
            self.search_parallel(state, player, budget)?
        } else {
            if !self.config.retain_tree {
                self.tree.clear();
            }
            for _ in 0..budget {
                self.run_simulation(state, player)?;
            }
            let key = self.rules.state_key(state);
            legal
                .iter()
                .map(|&a| (a, self.tree.stats(key, a)))
                .collect::<Vec<_>>()
        };

        let action = best_by_win_rate(&legal, &root);
        Ok(SearchResult { action, root })
    }

    /// Independent searches on the rayon pool, root counters summed afterwards.
    fn search_parallel(
        &mut self,
        state: &R::State,
        player: Player,
        budget: usize,
    ) -> Result<Vec<(R::Action, EdgeStats)>, GameError> {
        let workers = self.config.workers;
        let jobs: Vec<(u64, usize)> = (0..workers)
            .map(|i| {
                let share = budget / workers + usize::from(i < budget % workers);
                (self.rng.random::<u64>(), share)
            })
            .collect();

        let rules = &self.rules;
        let config = &self.config;
        let partials = jobs
            .into_par_iter()
            .map(|(seed, share)| {
                let mut worker = MctsAgent {
                    rules: rules.clone(),
                    config: MctsConfig {
                        workers: 1,
                        retain_tree: false,
                        ..config.clone()
                    },
                    tree: SearchTree::new(),
                    rng: StdRng::seed_from_u64(seed),
                };
                worker.search(state, player, share).map(|r| r.root)
            })
            .collect::<Result<Vec<_>, GameError>>()?;

        let mut merged: Vec<(R::Action, EdgeStats)> = self
            .rules
            .legal_actions(state)
            .into_iter()
            .map(|a| (a, EdgeStats::default()))
            .collect();
        for partial in partials {
            for (action, stats) in partial {
                if let Some((_, total)) = merged.iter_mut().find(|(a, _)| *a == action) {
                    total.merge(stats);
                }
            }
        }
        Ok(merged)
    }

    /// Selection, expansion, rollout and backpropagation for one simulation.
    ///
    /// `player` moves first from `root`; below the root the rules decide.
    fn run_simulation(&mut self, root: &R::State, player: Player) -> Result<(), GameError> {
        let mut state = root.clone();
        let mut path: Vec<(StateKey, R::Action, Player)> = Vec::new();
        let mut root_mover = Some(player);

        while !self.rules.is_terminal(&state) {
            let key = self.rules.state_key(&state);
            let legal = self.rules.legal_actions(&state);
            let mover = root_mover
                .take()
                .unwrap_or_else(|| self.rules.to_move(&state));

            if self.tree.is_fully_expanded(key, &legal) {
                let action = self
                    .tree
                    .select_ucb(key, &legal, self.config.exploration_weight);
                path.push((key, action, mover));
                state = self.rules.apply_action(&state, action, mover)?;
                continue;
            }

            self.tree.children.entry(key).or_insert_with(|| legal.clone());
            let untried: Vec<R::Action> = legal
                .iter()
                .copied()
                .filter(|&a| self.tree.stats(key, a).visits == 0)
                .collect();
            let pool = if untried.is_empty() { &legal } else { &untried };
            let action = pool[self.rng.random_range(0..pool.len())];
            path.push((key, action, mover));
            state = self.rules.apply_action(&state, action, mover)?;
            break;
        }

        let outcome = self.rollout(state)?;
        for (key, action, mover) in path {
            let credited = match self.config.credit {
                CreditPerspective::Mover => mover,
                CreditPerspective::Agent => player,
            };
            let credit = match outcome {
                GameOutcome::Winner(winner) if winner == credited => 1.0,
                GameOutcome::Winner(_) => 0.0,
                GameOutcome::Draw => self.config.draw_credit,
            };
            self.tree.record(key, action, credit);
        }
        Ok(())
    }

    /// Uniform random playout to a terminal state.
    fn rollout(&mut self, mut state: R::State) -> Result<GameOutcome, GameError> {
        while !self.rules.is_terminal(&state) {
            let legal = self.rules.legal_actions(&state);
            if legal.is_empty() {
                return Err(GameError::NoLegalMove);
            }
            let mover = self.rules.to_move(&state);
            let action = legal[self.rng.random_range(0..legal.len())];
            state = self.rules.apply_action(&state, action, mover)?;
        }
        self.rules
            .winner(&state)
            .ok_or_else(|| GameError::InvalidMove("terminal state without an outcome".into()))
    }
}

/// Highest win rate among visited actions; first legal action if none visited.
fn best_by_win_rate<A: Copy + PartialEq>(legal: &[A], root: &[(A, EdgeStats)]) -> A {
    let mut best: Option<(A, f64)> = None;
    for &(action, stats) in root {
        if stats.visits == 0 || !legal.contains(&action) {
            continue;
        }
        let rate = stats.win_rate();
        match best {
            Some((_, best_rate)) if rate <= best_rate => {}
            _ => best = Some((action, rate)),
        }
    }
    best.map(|(a, _)| a).unwrap_or(legal[0])
}

impl<R> Agent<R> for MctsAgent<R>
where
    R: GameRules + Clone + Send + Sync,
    R::State: Send + Sync,
    R::Action: Send + Sync,
{
    fn choose_action(
        &mut self,
        step: usize,
        state: &R::State,
        _rendered: &str,
        player: Player,
    ) -> Result<Decision<R::Action>, GameError> {
        let result = self.search(state, player, self.config.simulations)?;
        let stats = result.stats_for(result.action);
        log::debug!(
            "mcts step {step}: {player:?} plays {:?} (win rate {:.3} over {} visits)",
            result.action,
            stats.win_rate(),
            stats.visits
        );
        Ok(Decision::new(result.action).with_rationale(format!(
            "win rate {:.3} over {} visits",
            stats.win_rate(),
            stats.visits
        )))
    }

    fn name(&self) -> &str {
        "MCTS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MinimaxAgent;
    use crate::ai::MinimaxConfig;
    use crate::game::{Action, Board, GameState, TicTacToe};

    fn act(n: u8) -> Action {
        Action::new(n).unwrap()
    }

    fn seeded(seed: u64) -> MctsAgent<TicTacToe> {
        MctsAgent::new(
            TicTacToe,
            MctsConfig {
                seed: Some(seed),
                ..MctsConfig::default()
            },
        )
    }

    fn position(rows: [&str; 3], to_move: Player) -> GameState {
        GameState::from_board(Board::from_rows(rows).unwrap(), to_move)
    }

    #[test]
    fn edge_stats_guard_zero_visits() {
        let stats = EdgeStats::default();
        assert_eq!(stats.win_rate(), 0.0);
        assert!(!stats.win_rate().is_nan());
    }

    #[test]
    fn ucb_tries_every_action_before_revisiting() {
        let mut tree = SearchTree::new();
        let key = StateKey(1);
        let legal = [act(1), act(2), act(3)];
        tree.record(key, act(1), 1.0);
        tree.record(key, act(3), 0.0);
        assert_eq!(tree.select_ucb(key, &legal, 1.0), act(2));
    }

    #[test]
    fn takes_immediate_win() {
        let state = position(["XX.", "OO.", "..."], Player::One);
        let result = seeded(1).search(&state, Player::One, 2_000).unwrap();
        assert_eq!(result.action, act(3));
    }

    #[test]
    fn player_argument_decides_the_root_mover() {
        // X is recorded to move, but the search plays for O.
        let state = position(["XX.", "OO.", "..."], Player::One);
        let minimax = MinimaxAgent::new(TicTacToe, MinimaxConfig::default());
        let (expected, _) = minimax.best_action(&state, Player::Two).unwrap();
        assert_eq!(expected, act(6));

        let result = seeded(8).search(&state, Player::Two, 2_000).unwrap();
        assert_eq!(result.action, expected);
    }

    #[test]
    fn blocks_opponent_win() {
        let state = position(["XX.", ".O.", "..."], Player::Two);
        let result = seeded(2).search(&state, Player::Two, 5_000).unwrap();
        assert_eq!(result.action, act(3));
    }

    #[test]
    fn agrees_with_minimax_on_forced_positions() {
        let minimax = MinimaxAgent::new(TicTacToe, MinimaxConfig::default());
        let positions = [
            position(["XX.", "OO.", "..."], Player::One),
            position(["XX.", "OO.", "X.."], Player::Two),
            position(["XX.", ".O.", "..."], Player::Two),
            position(["O..", ".X.", "..X"], Player::Two),
            position(["X.O", "...", "X.."], Player::Two),
        ];

        let mut trials = 0;
        let mut agreements = 0;
        for state in &positions {
            let player = state.to_move();
            let scores = minimax.score_actions(state, player).unwrap();
            let best = scores.iter().map(|&(_, s)| s).max().unwrap();
            let optimal: Vec<Action> = scores
                .iter()
                .filter(|&&(_, s)| s == best)
                .map(|&(a, _)| a)
                .collect();

            for seed in 0..4 {
                let result = seeded(100 + seed).search(state, player, 5_000).unwrap();
                trials += 1;
                if optimal.contains(&result.action) {
                    agreements += 1;
                }
            }
        }
        assert!(
            agreements as f64 >= 0.95 * trials as f64,
            "agreed on {agreements}/{trials} trials"
        );
    }

    #[test]
    fn root_visits_match_budget_and_wins_never_exceed_visits() {
        for credit in [CreditPerspective::Mover, CreditPerspective::Agent] {
            let mut agent = MctsAgent::new(
                TicTacToe,
                MctsConfig {
                    seed: Some(9),
                    credit,
                    ..MctsConfig::default()
                },
            );
            let state = GameState::initial();
            let result = agent.search(&state, Player::One, 1_000).unwrap();
            assert_eq!(result.total_visits(), 1_000);
            assert!(state.legal_actions().contains(&result.action));
            for stats in agent.tree.edges.values() {
                assert!(stats.wins <= stats.visits as f64);
            }
        }
    }

    #[test]
    fn zero_budget_falls_back_to_first_legal_action() {
        let state = GameState::initial().apply_move(act(1)).unwrap();
        let result = seeded(3).search(&state, Player::Two, 0).unwrap();
        assert_eq!(result.action, act(2));
    }

    #[test]
    fn terminal_state_is_an_error() {
        let state = position(["XXX", "OO.", "..."], Player::Two);
        assert!(matches!(
            seeded(4).search(&state, Player::Two, 10),
            Err(GameError::NoLegalMove)
        ));
    }

    #[test]
    fn retained_tree_accumulates_across_calls() {
        let mut agent = MctsAgent::new(
            TicTacToe,
            MctsConfig {
                seed: Some(5),
                retain_tree: true,
                ..MctsConfig::default()
            },
        );
        let state = GameState::initial();
        agent.search(&state, Player::One, 300).unwrap();
        let second = agent.search(&state, Player::One, 300).unwrap();
        assert_eq!(second.total_visits(), 600);
    }

    #[test]
    fn parallel_workers_merge_root_counters() {
        let mut agent = MctsAgent::new(
            TicTacToe,
            MctsConfig {
                seed: Some(6),
                workers: 4,
                ..MctsConfig::default()
            },
        );
        let state = position(["XX.", "OO.", "..."], Player::One);
        let result = agent.search(&state, Player::One, 2_001).unwrap();
        assert_eq!(result.total_visits(), 2_001);
        assert_eq!(result.action, act(3));
    }
}
