use crate::error::GameError;
use crate::game::{GameRules, Player};

/// An action together with an optional free-text explanation for the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision<A> {
    pub action: A,
    pub rationale: Option<String>,
}

impl<A> Decision<A> {
    pub fn new(action: A) -> Self {
        Decision {
            action,
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Universal interface for all decision engines playing a game under `R`.
pub trait Agent<R: GameRules> {
    /// Choose a move for `player` in `state`.
    ///
    /// `rendered` is the plain-text board the orchestrator shows to agents;
    /// search and learning agents may ignore it. Must only return actions in
    /// `R::legal_actions(state)`; fails with `GameError::NoLegalMove` on a
    /// terminal state.
    fn choose_action(
        &mut self,
        step: usize,
        state: &R::State,
        rendered: &str,
        player: Player,
    ) -> Result<Decision<R::Action>, GameError>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}
