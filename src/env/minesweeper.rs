use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{out_of_range, Environment, StepResult};
use crate::error::GameError;

const MINE_PENALTY: f32 = -10.0;
const FLAG_REWARD: f32 = 0.5;
const HIDDEN_VALUE: f32 = -2.0;

/// One square of the minefield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MineCell {
    pub mine: bool,
    /// Mines among the eight neighbours.
    pub adjacent: u8,
    pub revealed: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Reveal,
    Flag,
}

/// A decoded action. Index layout is `2 * (row * size + col) + kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinesweeperAction {
    pub row: usize,
    pub col: usize,
    pub kind: MoveKind,
}

impl MinesweeperAction {
    pub fn reveal(row: usize, col: usize) -> Self {
        MinesweeperAction {
            row,
            col,
            kind: MoveKind::Reveal,
        }
    }

    pub fn flag(row: usize, col: usize) -> Self {
        MinesweeperAction {
            row,
            col,
            kind: MoveKind::Flag,
        }
    }

    pub fn to_index(self, size: usize) -> usize {
        let kind = match self.kind {
            MoveKind::Reveal => 0,
            MoveKind::Flag => 1,
        };
        2 * (self.row * size + self.col) + kind
    }

    pub fn from_index(index: usize, size: usize) -> Result<Self, GameError> {
        let total = 2 * size * size;
        if index >= total {
            return Err(out_of_range("minesweeper action", index, total));
        }
        let cell = index / 2;
        let kind = if index % 2 == 0 {
            MoveKind::Reveal
        } else {
            MoveKind::Flag
        };
        Ok(MinesweeperAction {
            row: cell / size,
            col: cell % size,
            kind,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinesweeperConfig {
    pub size: usize,
    pub mines: usize,
    pub seed: Option<u64>,
}

impl Default for MinesweeperConfig {
    fn default() -> Self {
        MinesweeperConfig {
            size: 10,
            mines: 10,
            seed: None,
        }
    }
}

/// Minesweeper with flood reveal and flagging.
pub struct MinesweeperEnv {
    size: usize,
    mines: usize,
    cells: Vec<MineCell>,
    done: bool,
    won: bool,
    steps: usize,
    rng: StdRng,
}

impl MinesweeperEnv {
    pub fn new(config: MinesweeperConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let size = config.size.max(1);
        let mut env = MinesweeperEnv {
            size,
            mines: config.mines.min(size * size - 1),
            cells: Vec::new(),
            done: false,
            won: false,
            steps: 0,
            rng,
        };
        env.reset();
        env
    }

    /// Board with mines at exactly the given positions.
    pub fn with_mines(size: usize, mines: &[(usize, usize)]) -> Result<Self, GameError> {
        let mut env = Self::new(MinesweeperConfig {
            size,
            mines: 0,
            seed: Some(0),
        });
        for &(row, col) in mines {
            env.check_coords(row, col)?;
        }
        env.lay_mines(mines.iter().map(|&(r, c)| r * size + c));
        env.mines = env.cells.iter().filter(|c| c.mine).count();
        Ok(env)
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<MineCell, GameError> {
        self.check_coords(row, col)?;
        Ok(self.cells[row * self.size + col])
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn steps(&self) -> usize {
        self.steps
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

    fn neighbours(&self, row: usize, col: usize) -> impl Iterator<Item = usize> + '_ {
        let rows = row.saturating_sub(1)..(row + 2).min(self.size);
        rows.flat_map(move |r| {
            let cols = col.saturating_sub(1)..(col + 2).min(self.size);
            cols.filter(move |&c| (r, c) != (row, col))
                .map(move |c| r * self.size + c)
        })
    }

    fn lay_mines(&mut self, positions: impl Iterator<Item = usize>) {
        self.cells = vec![MineCell::default(); self.size * self.size];
        for i in positions {
            self.cells[i].mine = true;
        }
        for i in 0..self.cells.len() {
            let (row, col) = (i / self.size, i % self.size);
            let count = self
                .neighbours(row, col)
                .filter(|&n| self.cells[n].mine)
                .count();
            self.cells[i].adjacent = count as u8;
        }
    }

    /// Reveal from `start`, spreading through zero cells. Returns cells revealed.
    fn flood_reveal(&mut self, start: usize) -> usize {
        let mut revealed = 0;
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            let cell = self.cells[i];
            if cell.revealed || cell.flagged || cell.mine {
                continue;
            }
            self.cells[i].revealed = true;
            revealed += 1;
            if cell.adjacent == 0 {
                let (row, col) = (i / self.size, i % self.size);
                stack.extend(self.neighbours(row, col).filter(|&n| !self.cells[n].revealed));
            }
        }
        revealed
    }

    fn update_outcome(&mut self) {
        if self.done {
            return;
        }
        let all_safe_revealed = self.cells.iter().all(|c| c.mine || c.revealed);
        let flags = self.cells.iter().filter(|c| c.flagged).count();
        let flags_exact = flags == self.mines && self.cells.iter().all(|c| c.flagged == c.mine);
        if all_safe_revealed || flags_exact {
            self.won = true;
            self.done = true;
        }
    }

    fn observation(&self) -> Vec<f32> {
        let plane = self.size * self.size;
        let mut obs = vec![0.0f32; 3 * plane];
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.revealed {
                obs[i] = 1.0;
            }
            if cell.flagged {
                obs[plane + i] = 1.0;
            }
            obs[2 * plane + i] = match (cell.revealed, cell.mine) {
                (false, _) => HIDDEN_VALUE,
                (true, true) => -1.0,
                (true, false) => cell.adjacent as f32,
            };
        }
        obs
    }
}

impl Environment for MinesweeperEnv {
    fn name(&self) -> &str {
        "minesweeper"
    }

    fn reset(&mut self) -> Vec<f32> {
        let cells = self.size * self.size;
        let positions = index::sample(&mut self.rng, cells, self.mines);
        self.lay_mines(positions.into_iter());
        self.done = false;
        self.won = false;
        self.steps = 0;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<StepResult, GameError> {
        if self.done {
            return Err(GameError::GameOver);
        }
        let action = MinesweeperAction::from_index(action, self.size)?;
        let i = action.row * self.size + action.col;
        self.steps += 1;

        let cell = self.cells[i];
        let reward = match action.kind {
            MoveKind::Flag if !cell.revealed => {
                self.cells[i].flagged = !cell.flagged;
                if cell.flagged {
                    -FLAG_REWARD
                } else {
                    FLAG_REWARD
                }
            }
            MoveKind::Reveal if !cell.revealed && !cell.flagged => {
                if cell.mine {
                    self.cells[i].revealed = true;
                    self.done = true;
                    MINE_PENALTY
                } else {
                    self.flood_reveal(i) as f32
                }
            }
            _ => 0.0,
        };

        self.update_outcome();
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
        let mut actions = Vec::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.revealed {
                continue;
            }
            let (row, col) = (i / self.size, i % self.size);
            if !cell.flagged {
                actions.push(MinesweeperAction::reveal(row, col).to_index(self.size));
            }
            actions.push(MinesweeperAction::flag(row, col).to_index(self.size));
        }
        actions
    }

    fn observation_dim(&self) -> usize {
        3 * self.size * self.size
    }

    fn num_actions(&self) -> usize {
        2 * self.size * self.size
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for row in self.cells.chunks(self.size) {
            let line: Vec<String> = row
                .iter()
                .map(|c| match c {
                    MineCell { flagged: true, .. } => "F".to_string(),
                    MineCell { revealed: false, .. } => ".".to_string(),
                    MineCell { mine: true, .. } => "*".to_string(),
                    MineCell { adjacent: 0, .. } => " ".to_string(),
                    MineCell { adjacent, .. } => adjacent.to_string(),
                })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        let flags = self.cells.iter().filter(|c| c.flagged).count();
        out.push_str(&format!(
            "mines: {}  flagged: {}  steps: {}  won: {}",
            self.mines, flags, self.steps, self.won
        ));
        out
    }
}
