use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Get the other player
    pub fn other(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Board symbol for this player ('X' moves first)
    pub fn symbol(self) -> char {
        match self {
            Player::One => 'X',
            Player::Two => 'O',
        }
    }

    /// Get player name for display
    pub fn name(self) -> &'static str {
        match self {
            Player::One => "X",
            Player::Two => "O",
        }
    }
}

/// Final result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

impl GameOutcome {
    /// Reward for `player` under the win 1 / draw 0.5 / loss -1 scheme.
    pub fn reward_for(self, player: Player) -> f32 {
        match self {
            GameOutcome::Winner(p) if p == player => 1.0,
            GameOutcome::Winner(_) => -1.0,
            GameOutcome::Draw => 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_player() {
        assert_eq!(Player::One.other(), Player::Two);
        assert_eq!(Player::Two.other(), Player::One);
    }

    #[test]
    fn test_player_symbols() {
        assert_eq!(Player::One.symbol(), 'X');
        assert_eq!(Player::Two.name(), "O");
    }

    #[test]
    fn test_outcome_rewards() {
        assert_eq!(GameOutcome::Winner(Player::One).reward_for(Player::One), 1.0);
        assert_eq!(GameOutcome::Winner(Player::One).reward_for(Player::Two), -1.0);
        assert_eq!(GameOutcome::Draw.reward_for(Player::Two), 0.5);
    }
}
