use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{out_of_range, Environment, StepResult};
use crate::error::GameError;

const PLANES: usize = 4;
const BODY_PLANE: usize = 0;
const HEAD_PLANE: usize = 1;
const FOOD_PLANE: usize = 2;
const NEXT_HEAD_PLANE: usize = 3;

type Position = (usize, usize);

/// Heading of the snake; the action index is the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn from_index(index: usize) -> Result<Direction, GameError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| out_of_range("snake action", index, Self::ALL.len()))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }
}

/// Snake rules and reward shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    pub size: usize,
    /// The episode ends once this many steps pass without eating.
    pub max_steps_without_food: usize,
    /// Past this many steps without food, ordinary moves cost -1.
    pub hunger_threshold: usize,
    pub seed: Option<u64>,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        SnakeConfig {
            size: 10,
            max_steps_without_food: 100,
            hunger_threshold: 49,
            seed: None,
        }
    }
}

/// Classic Snake on a walled square grid.
pub struct SnakeEnv {
    config: SnakeConfig,
    /// Tail at the front, head at the back.
    body: VecDeque<Position>,
    food: Position,
    direction: Direction,
    steps: usize,
    steps_since_food: usize,
    done: bool,
    rng: StdRng,
}

impl SnakeEnv {
    pub fn new(config: SnakeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut env = SnakeEnv {
            body: VecDeque::new(),
            food: (0, 0),
            direction: Direction::Up,
            steps: 0,
            steps_since_food: 0,
            done: false,
            config,
            rng,
        };
        env.reset();
        env
    }

    pub fn head(&self) -> Position {
        self.body.back().copied().unwrap_or((0, 0))
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn food(&self) -> Position {
        self.food
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn score(&self) -> usize {
        self.body.len().saturating_sub(1)
    }

    /// Put food on a random free cell. Returns false when the snake fills the grid.
    fn place_food(&mut self) -> bool {
        let size = self.config.size;
        let free: Vec<Position> = (0..size * size)
            .map(|i| (i / size, i % size))
            .filter(|p| !self.body.contains(p))
            .collect();
        if free.is_empty() {
            return false;
        }
        self.food = free[self.rng.random_range(0..free.len())];
        true
    }

    fn next_head(&self) -> Option<Position> {
        let (row, col) = self.head();
        let (dr, dc) = self.direction.delta();
        let (row, col) = (row as i64 + dr, col as i64 + dc);
        let size = self.config.size as i64;
        if (0..size).contains(&row) && (0..size).contains(&col) {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    fn reward(&self, eaten: bool, dead: bool) -> f32 {
        if dead {
            -1.0
        } else if eaten {
            1.0
        } else if self.steps_since_food > self.config.hunger_threshold {
            -1.0
        } else {
            0.0
        }
    }

    fn observation(&self) -> Vec<f32> {
        let size = self.config.size;
        let plane = size * size;
        let mut obs = vec![0.0f32; PLANES * plane];
        for &(r, c) in &self.body {
            obs[BODY_PLANE * plane + r * size + c] = 1.0;
        }
        let (hr, hc) = self.head();
        obs[HEAD_PLANE * plane + hr * size + hc] = 1.0;
        obs[FOOD_PLANE * plane + self.food.0 * size + self.food.1] = 1.0;
        if let Some((nr, nc)) = self.next_head() {
            obs[NEXT_HEAD_PLANE * plane + nr * size + nc] = 1.0;
        }
        obs
    }

    fn finish(&mut self, eaten: bool) -> StepResult {
        self.done = true;
        StepResult {
            observation: self.observation(),
            reward: self.reward(eaten, true),
            done: true,
        }
    }
}

impl Environment for SnakeEnv {
    fn name(&self) -> &str {
        "snake"
    }

    fn reset(&mut self) -> Vec<f32> {
        let centre = self.config.size / 2;
        self.body.clear();
        self.body.push_back((centre, centre));
        self.place_food();
        self.direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
        self.steps = 0;
        self.steps_since_food = 0;
        self.done = false;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<StepResult, GameError> {
        if self.done {
            return Err(GameError::GameOver);
        }
        let requested = Direction::from_index(action)?;
        // A 180 degree turn is ignored.
        if requested != self.direction.opposite() {
            self.direction = requested;
        }

        let new_head = match self.next_head() {
            Some(p) if !self.body.contains(&p) => p,
            _ => return Ok(self.finish(false)),
        };
        if self.steps_since_food > self.config.max_steps_without_food {
            return Ok(self.finish(false));
        }

        self.body.push_back(new_head);
        let eaten = new_head == self.food;
        let reward = if eaten {
            let reward = self.reward(true, false);
            self.steps_since_food = 0;
            if !self.place_food() {
                // Grid is full: nothing left to eat.
                self.done = true;
            }
            reward
        } else {
            self.body.pop_front();
            let reward = self.reward(false, false);
            self.steps_since_food += 1;
            reward
        };
        self.steps += 1;

        Ok(StepResult {
            observation: self.observation(),
            reward,
            done: self.done,
        })
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.done {
            return Vec::new();
        }
        let reverse = self.direction.opposite();
        Direction::ALL
            .iter()
            .filter(|&&d| d != reverse)
            .map(|d| d.index())
            .collect()
    }

    fn observation_dim(&self) -> usize {
        PLANES * self.config.size * self.config.size
    }

    fn num_actions(&self) -> usize {
        Direction::ALL.len()
    }

    fn render(&self) -> String {
        let size = self.config.size;
        let mut grid = vec![vec!['.'; size]; size];
        for &(r, c) in &self.body {
            grid[r][c] = 'O';
        }
        let (hr, hc) = self.head();
        grid[hr][hc] = 'H';
        grid[self.food.0][self.food.1] = 'F';

        let mut out = String::new();
        for row in grid {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out.push_str(&format!(
            "score: {}  direction: {:?}  steps since food: {}",
            self.score(),
            self.direction,
            self.steps_since_food
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> SnakeEnv {
        SnakeEnv::new(SnakeConfig {
            seed: Some(17),
            ..SnakeConfig::default()
        })
    }

    /// Snake of length one at `head` heading `direction`, food far away.
    fn placed(head: Position, direction: Direction, food: Position) -> SnakeEnv {
        let mut env = env();
        env.body = VecDeque::from(vec![head]);
        env.direction = direction;
        env.food = food;
        env
    }

    #[test]
    fn test_reset_starts_at_centre() {
        let mut env = env();
        let obs = env.reset();
        assert_eq!(env.head(), (5, 5));
        assert_eq!(env.len(), 1);
        assert_ne!(env.food(), env.head());
        assert_eq!(obs.len(), env.observation_dim());
        assert_eq!(obs.len(), 400);
    }

    #[test]
    fn test_observation_planes() {
        let env = placed((5, 5), Direction::Right, (0, 0));
        let obs = env.observation();
        let plane = 100;
        assert_eq!(obs[BODY_PLANE * plane + 55], 1.0);
        assert_eq!(obs[HEAD_PLANE * plane + 55], 1.0);
        assert_eq!(obs[FOOD_PLANE * plane], 1.0);
        assert_eq!(obs[NEXT_HEAD_PLANE * plane + 56], 1.0);
        assert_eq!(obs.iter().filter(|&&v| v == 1.0).count(), 4);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut env = placed((5, 5), Direction::Right, (0, 0));
        let result = env.step(Direction::Left.index()).unwrap();
        assert!(!result.done);
        assert_eq!(env.head(), (5, 6));
        assert_eq!(env.direction(), Direction::Right);
    }

    #[test]
    fn test_legal_actions_exclude_reversal() {
        let env = placed((5, 5), Direction::Up, (0, 0));
        assert_eq!(
            env.legal_actions(),
            vec![Direction::Up.index(), Direction::Right.index(), Direction::Left.index()]
        );
    }

    #[test]
    fn test_eating_grows_and_rewards() {
        let mut env = placed((5, 5), Direction::Right, (5, 6));
        let result = env.step(Direction::Right.index()).unwrap();
        assert_eq!(result.reward, 1.0);
        assert_eq!(env.len(), 2);
        assert_eq!(env.score(), 1);
        assert!(!env.body.contains(&env.food()));
    }

    #[test]
    fn test_wall_collision_ends_episode() {
        let mut env = placed((0, 3), Direction::Up, (9, 9));
        let result = env.step(Direction::Up.index()).unwrap();
        assert!(result.done);
        assert_eq!(result.reward, -1.0);
        assert_eq!(env.step(0), Err(GameError::GameOver));
        assert!(env.legal_actions().is_empty());
    }

    #[test]
    fn test_self_collision_ends_episode() {
        let mut env = env();
        // Head at (5,5) moving Left into its own body at (5,4).
        env.body = VecDeque::from(vec![(6, 4), (5, 4), (4, 4), (4, 5), (5, 5)]);
        env.direction = Direction::Down;
        env.food = (9, 9);
        let result = env.step(Direction::Left.index()).unwrap();
        assert!(result.done);
        assert_eq!(result.reward, -1.0);
    }

    #[test]
    fn test_hunger_penalty_and_starvation() {
        let mut env = placed((5, 0), Direction::Right, (0, 0));
        env.steps_since_food = 50;
        let result = env.step(Direction::Right.index()).unwrap();
        assert!(!result.done);
        assert_eq!(result.reward, -1.0);

        env.steps_since_food = 101;
        let result = env.step(Direction::Right.index()).unwrap();
        assert!(result.done);
        assert_eq!(result.reward, -1.0);
    }

    #[test]
    fn test_out_of_range_action() {
        let mut env = env();
        assert!(matches!(
            env.step(4),
            Err(GameError::OutOfRange { value: 4, .. })
        ));
    }

    #[test]
    fn test_render_marks_head_and_food() {
        let env = placed((1, 1), Direction::Right, (0, 0));
        let text = env.render();
        assert!(text.starts_with("F . ."));
        assert!(text.lines().nth(1).unwrap().starts_with(". H"));
        assert!(text.contains("score: 0"));
    }
}
