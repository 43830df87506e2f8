//! Turn-taking loop that pits two agents against each other.

use std::fmt::Debug;

use crate::ai::Agent;
use crate::error::GameError;
use crate::game::{GameOutcome, GameRules, Player};

/// Receives every decision made during a match.
pub trait DecisionSink<A> {
    fn record(&mut self, step: usize, player: Player, action: &A, rationale: Option<&str>);
}

/// Forwards decisions to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl<A: Debug> DecisionSink<A> for LogSink {
    fn record(&mut self, step: usize, player: Player, action: &A, rationale: Option<&str>) {
        match rationale {
            Some(why) => log::info!("step {step}: {} plays {action:?} ({why})", player.name()),
            None => log::info!("step {step}: {} plays {action:?}", player.name()),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<A> DecisionSink<A> for NullSink {
    fn record(&mut self, _: usize, _: Player, _: &A, _: Option<&str>) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord<A> {
    pub player: Player,
    pub action: A,
    pub rationale: Option<String>,
}

/// Result of one finished match.
#[derive(Debug, Clone)]
pub struct MatchRecord<S, A> {
    pub outcome: GameOutcome,
    pub moves: Vec<MoveRecord<A>>,
    pub final_state: S,
}

/// Play `initial` to completion. `agents[0]` moves for `Player::One`,
/// `agents[1]` for `Player::Two`.
///
/// Each returned action is checked against the rules' legal set before it is
/// applied; an agent proposing anything else aborts the match with
/// `GameError::InvalidMove`.
pub fn play_match<R: GameRules>(
    rules: &R,
    initial: R::State,
    agents: [&mut dyn Agent<R>; 2],
    sink: &mut dyn DecisionSink<R::Action>,
) -> Result<MatchRecord<R::State, R::Action>, GameError> {
    let [one, two] = agents;
    let mut state = initial;
    let mut moves: Vec<MoveRecord<R::Action>> = Vec::new();

    while !rules.is_terminal(&state) {
        let player = rules.to_move(&state);
        let agent = match player {
            Player::One => &mut *one,
            Player::Two => &mut *two,
        };
        let step = moves.len();
        let rendered = rules.render(&state);
        let decision = agent.choose_action(step, &state, &rendered, player)?;

        if !rules.legal_actions(&state).contains(&decision.action) {
            return Err(GameError::InvalidMove(format!(
                "{} proposed illegal action {:?}",
                agent.name(),
                decision.action
            )));
        }

        sink.record(step, player, &decision.action, decision.rationale.as_deref());
        state = rules.apply_action(&state, decision.action, player)?;
        moves.push(MoveRecord {
            player,
            action: decision.action,
            rationale: decision.rationale,
        });
    }

    let outcome = rules.winner(&state).ok_or(GameError::NoLegalMove)?;
    Ok(MatchRecord {
        outcome,
        moves,
        final_state: state,
    })
}

/// Win/draw counts across a series, from the first agent's seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchTally {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
}

impl MatchTally {
    /// Count a game in which the first agent played `first_side`.
    pub fn record(&mut self, outcome: GameOutcome, first_side: Player) {
        match outcome {
            GameOutcome::Draw => self.draws += 1,
            GameOutcome::Winner(p) if p == first_side => self.first_wins += 1,
            GameOutcome::Winner(_) => self.second_wins += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.first_wins + self.second_wins + self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Decision, MinimaxAgent, MinimaxConfig, RandomAgent};
    use crate::game::{Action, GameState, TicTacToe};

    #[derive(Default)]
    struct CollectSink(Vec<(usize, Player, Action)>);

    impl DecisionSink<Action> for CollectSink {
        fn record(&mut self, step: usize, player: Player, action: &Action, _: Option<&str>) {
            self.0.push((step, player, *action));
        }
    }

    /// Always answers with the centre, legal or not.
    struct Stubborn;

    impl Agent<TicTacToe> for Stubborn {
        fn choose_action(
            &mut self,
            _: usize,
            _: &GameState,
            _: &str,
            _: Player,
        ) -> Result<Decision<Action>, GameError> {
            Ok(Decision::new(Action::new(5)?))
        }

        fn name(&self) -> &str {
            "stubborn"
        }
    }

    #[test]
    fn test_minimax_self_play_is_a_draw() {
        let mut a = MinimaxAgent::new(TicTacToe, MinimaxConfig::default());
        let mut b = MinimaxAgent::new(TicTacToe, MinimaxConfig::default());
        let mut sink = CollectSink::default();
        let record =
            play_match(&TicTacToe, GameState::initial(), [&mut a, &mut b], &mut sink).unwrap();

        assert_eq!(record.outcome, GameOutcome::Draw);
        assert_eq!(record.moves.len(), 9);
        assert_eq!(sink.0.len(), 9);
        assert!(record.final_state.is_terminal());
    }

    #[test]
    fn test_sides_alternate_starting_with_one() {
        let mut a = RandomAgent::seeded(TicTacToe, 3);
        let mut b = RandomAgent::seeded(TicTacToe, 4);
        let mut sink = CollectSink::default();
        let record =
            play_match(&TicTacToe, GameState::initial(), [&mut a, &mut b], &mut sink).unwrap();

        for (i, (step, player, _)) in sink.0.iter().enumerate() {
            assert_eq!(*step, i);
            let expected = if i % 2 == 0 { Player::One } else { Player::Two };
            assert_eq!(*player, expected);
        }
        assert_eq!(
            record.moves.iter().map(|m| m.action).collect::<Vec<_>>(),
            sink.0.iter().map(|(_, _, a)| *a).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_illegal_action_aborts_match() {
        let mut a = Stubborn;
        let mut b = Stubborn;
        let result = play_match(&TicTacToe, GameState::initial(), [&mut a, &mut b], &mut NullSink);
        assert!(matches!(result, Err(GameError::InvalidMove(_))));
    }

    #[test]
    fn test_tally_counts_from_first_seat() {
        let mut tally = MatchTally::default();
        tally.record(GameOutcome::Winner(Player::One), Player::One);
        tally.record(GameOutcome::Winner(Player::One), Player::Two);
        tally.record(GameOutcome::Draw, Player::Two);
        assert_eq!(
            tally,
            MatchTally {
                first_wins: 1,
                second_wins: 1,
                draws: 1
            }
        );
        assert_eq!(tally.games(), 3);
    }
}
