use std::fmt;

use serde::{Deserialize, Serialize};

use super::board::SIZE;
use crate::error::GameError;

/// A Tic-Tac-Toe move, numbered 1..=9 in reading order:
///
/// ```text
/// 1 | 2 | 3
/// 4 | 5 | 6
/// 7 | 8 | 9
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Action(u8);

impl Action {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = (SIZE * SIZE) as u8;

    /// Validate a move number; anything outside 1..=9 is rejected, never clamped.
    pub fn new(number: u8) -> Result<Self, GameError> {
        if (Self::MIN..=Self::MAX).contains(&number) {
            Ok(Action(number))
        } else {
            Err(GameError::OutOfRange {
                what: "action",
                value: number as i64,
                min: Self::MIN as i64,
                max: Self::MAX as i64,
            })
        }
    }

    pub fn from_coords(row: usize, col: usize) -> Result<Self, GameError> {
        if row >= SIZE || col >= SIZE {
            return Err(GameError::OutOfRange {
                what: "coordinate",
                value: row.max(col) as i64,
                min: 0,
                max: SIZE as i64 - 1,
            });
        }
        Ok(Action((row * SIZE + col) as u8 + 1))
    }

    /// Inverse of [`Action::index`].
    pub fn from_index(index: usize) -> Result<Self, GameError> {
        if index >= SIZE * SIZE {
            return Err(GameError::OutOfRange {
                what: "action index",
                value: index as i64,
                min: 0,
                max: (SIZE * SIZE) as i64 - 1,
            });
        }
        Ok(Action(index as u8 + 1))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position, used as the value-estimator output slot.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn coords(self) -> (usize, usize) {
        (self.index() / SIZE, self.index() % SIZE)
    }

    pub fn all() -> impl Iterator<Item = Action> {
        (Self::MIN..=Self::MAX).map(Action)
    }
}

impl TryFrom<u8> for Action {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Action::new(value)
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        action.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coords_bijection() {
        for action in Action::all() {
            let (row, col) = action.coords();
            assert_eq!(Action::from_coords(row, col).unwrap(), action);
            assert_eq!(Action::from_index(action.index()).unwrap(), action);
        }
        assert_eq!(Action::new(1).unwrap().coords(), (0, 0));
        assert_eq!(Action::new(6).unwrap().coords(), (1, 2));
        assert_eq!(Action::new(9).unwrap().coords(), (2, 2));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Action::new(0).is_err());
        assert!(Action::new(10).is_err());
        assert!(Action::from_coords(0, 3).is_err());
        assert!(Action::from_index(9).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let action: Action = serde_json::from_str("5").unwrap();
        assert_eq!(action.number(), 5);
        assert!(serde_json::from_str::<Action>("12").is_err());
    }
}
