use std::path::Path;

use crate::ai::{DqnConfig, MctsConfig, MinimaxConfig};
use crate::checkpoint::CheckpointManagerConfig;
use crate::env::{MinesweeperConfig, SnakeConfig, TreasureHuntConfig};
use crate::error::ConfigError;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
///
/// Every section is optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub minimax: MinimaxConfig,
    pub mcts: MctsConfig,
    pub dqn: DqnConfig,
    pub training: TrainerConfig,
    pub snake: SnakeConfig,
    pub minesweeper: MinesweeperConfig,
    pub treasure_hunt: TreasureHuntConfig,
    pub checkpoint: CheckpointManagerConfig,
}

fn invalid(msg: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(msg.into()))
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dqn = &self.dqn;
        if dqn.learning_rate <= 0.0 {
            return invalid("dqn.learning_rate must be > 0");
        }
        if !(0.0..=1.0).contains(&dqn.gamma) {
            return invalid("dqn.gamma must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_start) {
            return invalid("dqn.epsilon_start must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&dqn.epsilon_min) {
            return invalid("dqn.epsilon_min must be in [0, 1]");
        }
        if dqn.epsilon_min > dqn.epsilon_start {
            return invalid("dqn.epsilon_min must be <= dqn.epsilon_start");
        }
        if dqn.epsilon_decay <= 0.0 || dqn.epsilon_decay > 1.0 {
            return invalid("dqn.epsilon_decay must be in (0, 1]");
        }
        if dqn.batch_size == 0 {
            return invalid("dqn.batch_size must be > 0");
        }
        if dqn.replay_capacity < dqn.batch_size {
            return invalid("dqn.replay_capacity must be >= dqn.batch_size");
        }
        if dqn.alpha < 0.0 {
            return invalid("dqn.alpha must be >= 0");
        }
        if !(0.0..=1.0).contains(&dqn.beta_start) {
            return invalid("dqn.beta_start must be in [0, 1]");
        }
        if dqn.beta_increment < 0.0 {
            return invalid("dqn.beta_increment must be >= 0");
        }
        if dqn.priority_epsilon <= 0.0 {
            return invalid("dqn.priority_epsilon must be > 0");
        }
        if dqn.hidden_1 == 0 || dqn.hidden_2 == 0 {
            return invalid("dqn hidden layer sizes must be > 0");
        }

        if self.mcts.simulations == 0 {
            return invalid("mcts.simulations must be >= 1");
        }
        if self.mcts.exploration_weight < 0.0 {
            return invalid("mcts.exploration_weight must be >= 0");
        }
        if !(0.0..=1.0).contains(&self.mcts.draw_credit) {
            return invalid("mcts.draw_credit must be in [0, 1]");
        }
        if self.mcts.workers == 0 {
            return invalid("mcts.workers must be >= 1");
        }
        if self.mcts.retain_tree && self.mcts.workers > 1 {
            return invalid("mcts.retain_tree requires mcts.workers = 1");
        }

        // A win must outrank any depth penalty on a nine-cell board.
        if self.minimax.win_bonus <= 9 {
            return invalid("minimax.win_bonus must be > 9");
        }

        if self.training.num_episodes == 0 {
            return invalid("training.num_episodes must be > 0");
        }
        if self.training.max_steps_per_episode == 0 {
            return invalid("training.max_steps_per_episode must be > 0");
        }
        if self.training.metrics_window == 0 {
            return invalid("training.metrics_window must be > 0");
        }

        if self.snake.size < 2 {
            return invalid("snake.size must be >= 2");
        }
        if self.minesweeper.size == 0 {
            return invalid("minesweeper.size must be > 0");
        }
        if self.minesweeper.mines >= self.minesweeper.size * self.minesweeper.size {
            return invalid("minesweeper.mines must leave at least one safe cell");
        }
        if self.treasure_hunt.size == 0 {
            return invalid("treasure_hunt.size must be > 0");
        }

        if self.checkpoint.keep_last_n == 0 {
            return invalid("checkpoint.keep_last_n must be >= 1");
        }

        Ok(())
    }

    /// Render every default value as TOML, for seeding a config file.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}
