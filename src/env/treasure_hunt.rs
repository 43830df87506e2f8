use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{out_of_range, Environment, StepResult};
use crate::error::GameError;

const FOUND_REWARD: f32 = 1.0;
const MISS_PENALTY: f32 = -0.1;

/// Where the treasure lies relative to a missed guess.
///
/// Rows are checked before columns, so a guess in the wrong row only ever
/// hears North or South.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feedback {
    Found,
    North,
    South,
    East,
    West,
}

impl Feedback {
    /// (row, col) direction encoded in the hint planes.
    fn hint(self) -> (f32, f32) {
        match self {
            Feedback::Found => (0.0, 0.0),
            Feedback::North => (-1.0, 0.0),
            Feedback::South => (1.0, 0.0),
            Feedback::East => (0.0, 1.0),
            Feedback::West => (0.0, -1.0),
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Found => write!(f, "found the treasure"),
            Feedback::North => write!(f, "the treasure is to the North"),
            Feedback::South => write!(f, "the treasure is to the South"),
            Feedback::East => write!(f, "the treasure is to the East"),
            Feedback::West => write!(f, "the treasure is to the West"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasureHuntConfig {
    pub size: usize,
    pub seed: Option<u64>,
}

impl Default for TreasureHuntConfig {
    fn default() -> Self {
        TreasureHuntConfig {
            size: 5,
            seed: None,
        }
    }
}

/// Guess the hidden treasure cell; every miss answers with a compass hint.
///
/// Action `row * size + col` guesses that cell. The observation has three
/// planes: guessed cells, then the row and column hints left at each guess.
pub struct TreasureHuntEnv {
    size: usize,
    treasure: (usize, usize),
    guesses: Vec<Option<Feedback>>,
    found: bool,
    steps: usize,
    rng: StdRng,
}

impl TreasureHuntEnv {
    pub fn new(config: TreasureHuntConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let size = config.size.max(1);
        let mut env = TreasureHuntEnv {
            size,
            treasure: (0, 0),
            guesses: Vec::new(),
            found: false,
            steps: 0,
            rng,
        };
        env.reset();
        env
    }

    /// Board with the treasure at a known cell.
    pub fn with_treasure(size: usize, row: usize, col: usize) -> Result<Self, GameError> {
        let mut env = Self::new(TreasureHuntConfig {
            size,
            seed: Some(0),
        });
        env.check_coords(row, col)?;
        env.treasure = (row, col);
        Ok(env)
    }

    /// Guess `(row, col)`. Out-of-range coordinates and repeated guesses are
    /// rejected and leave the board untouched.
    pub fn guess(&mut self, row: usize, col: usize) -> Result<Feedback, GameError> {
        if self.found {
            return Err(GameError::GameOver);
        }
        self.check_coords(row, col)?;
        let i = row * self.size + col;
        if self.guesses[i].is_some() {
            return Err(GameError::InvalidMove(format!(
                "cell ({row}, {col}) was already guessed"
            )));
        }

        let feedback = self.feedback(row, col);
        self.guesses[i] = Some(feedback);
        self.steps += 1;
        self.found = feedback == Feedback::Found;
        log::debug!("treasure hunt step {}: ({row}, {col}) -> {feedback}", self.steps);
        Ok(feedback)
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn feedback(&self, row: usize, col: usize) -> Feedback {
        let (tr, tc) = self.treasure;
        if row < tr {
            Feedback::South
        } else if row > tr {
            Feedback::North
        } else if col < tc {
            Feedback::East
        } else if col > tc {
            Feedback::West
        } else {
            Feedback::Found
        }
    }

    fn check_coords(&self, row: usize, col: usize) -> Result<(), GameError> {
        if row >= self.size {
            return Err(out_of_range("row", row, self.size));
        }
        if col >= self.size {
            return Err(out_of_range("column", col, self.size));
        }
        Ok(())
    }

    fn observation(&self) -> Vec<f32> {
        let plane = self.size * self.size;
        let mut obs = vec![0.0f32; 3 * plane];
        for (i, guess) in self.guesses.iter().enumerate() {
            if let Some(feedback) = guess {
                let (dr, dc) = feedback.hint();
                obs[i] = 1.0;
                obs[plane + i] = dr;
                obs[2 * plane + i] = dc;
            }
        }
        obs
    }
}

impl Environment for TreasureHuntEnv {
    fn name(&self) -> &str {
        "treasure_hunt"
    }

    fn reset(&mut self) -> Vec<f32> {
        self.treasure = (
            self.rng.random_range(0..self.size),
            self.rng.random_range(0..self.size),
        );
        self.guesses = vec![None; self.size * self.size];
        self.found = false;
        self.steps = 0;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<StepResult, GameError> {
        let cells = self.size * self.size;
        if action >= cells {
            return Err(out_of_range("treasure hunt action", action, cells));
        }
        let feedback = self.guess(action / self.size, action % self.size)?;
        let reward = if feedback == Feedback::Found {
            FOUND_REWARD
        } else {
            MISS_PENALTY
        };
        Ok(StepResult {
            observation: self.observation(),
            reward,
            done: self.found,
        })
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.found {
            return Vec::new();
        }
        (0..self.guesses.len())
            .filter(|&i| self.guesses[i].is_none())
            .collect()
    }

    fn observation_dim(&self) -> usize {
        3 * self.size * self.size
    }

    fn num_actions(&self) -> usize {
        self.size * self.size
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for row in self.guesses.chunks(self.size) {
            let line: Vec<&str> = row
                .iter()
                .map(|g| match g {
                    None => ".",
                    Some(Feedback::Found) => "T",
                    Some(_) => "X",
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out.push_str(&format!("steps: {}  found: {}", self.steps, self.found));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_hides_treasure_on_board() {
        let mut env = TreasureHuntEnv::new(TreasureHuntConfig {
            seed: Some(3),
            ..Default::default()
        });
        let obs = env.reset();
        let (row, col) = env.treasure;
        assert!(row < 5 && col < 5);
        assert_eq!(obs.len(), env.observation_dim());
        assert!(obs.iter().all(|&v| v == 0.0));
        assert_eq!(env.legal_actions().len(), 25);
        assert_eq!(env.num_actions(), 25);
    }

    #[test]
    fn test_feedback_checks_rows_before_columns() {
        let mut env = TreasureHuntEnv::with_treasure(5, 2, 3).unwrap();
        assert_eq!(env.guess(0, 0).unwrap(), Feedback::South);
        assert_eq!(env.guess(4, 3).unwrap(), Feedback::North);
        assert_eq!(env.guess(2, 0).unwrap(), Feedback::East);
        assert_eq!(env.guess(2, 4).unwrap(), Feedback::West);
        assert_eq!(env.guess(2, 3).unwrap(), Feedback::Found);
        assert!(env.is_found());
        assert_eq!(env.steps(), 5);
    }

    #[test]
    fn test_repeated_and_out_of_range_guesses_are_rejected() {
        let mut env = TreasureHuntEnv::with_treasure(5, 4, 4).unwrap();
        env.guess(1, 1).unwrap();
        assert!(matches!(env.guess(1, 1), Err(GameError::InvalidMove(_))));
        assert!(matches!(
            env.guess(5, 0),
            Err(GameError::OutOfRange { what: "row", .. })
        ));
        assert!(matches!(env.step(25), Err(GameError::OutOfRange { .. })));
        assert_eq!(env.steps(), 1);
        assert_eq!(env.legal_actions().len(), 24);
    }

    #[test]
    fn test_step_rewards_and_hint_planes() {
        let mut env = TreasureHuntEnv::with_treasure(3, 1, 1).unwrap();
        let miss = env.step(0).unwrap();
        assert_eq!(miss.reward, MISS_PENALTY);
        assert!(!miss.done);
        // Guessed (0, 0): South hint in the row plane.
        assert_eq!(miss.observation[0], 1.0);
        assert_eq!(miss.observation[9], 1.0);
        assert_eq!(miss.observation[18], 0.0);

        let hit = env.step(4).unwrap();
        assert_eq!(hit.reward, FOUND_REWARD);
        assert!(hit.done);
        assert!(env.legal_actions().is_empty());
        assert_eq!(env.step(8), Err(GameError::GameOver));
        assert!(env.render().contains('T'));
    }
}
