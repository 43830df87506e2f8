use std::path::PathBuf;

use crate::ai::DqnLearner;
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::env::Environment;
use crate::error::{LearnerError, TrainingError};
use crate::training::metrics::{EpisodeResult, TrainingMetrics};

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    /// Episodes are cut off after this many steps.
    pub max_steps_per_episode: usize,
    /// Hard-copy the live network into the target every this many episodes.
    pub target_update_episodes: usize,
    pub log_interval: usize,
    pub checkpoint_interval: usize,
    /// Rolling window for reward and loss averages.
    pub metrics_window: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 1_000,
            max_steps_per_episode: 1_000,
            target_update_episodes: 10,
            log_interval: 50,
            checkpoint_interval: 500,
            metrics_window: 100,
        }
    }
}

/// What a training run achieved.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub train_steps: usize,
    pub average_reward: f32,
    pub best_reward: f32,
    pub final_epsilon: f32,
    pub checkpoints: Vec<PathBuf>,
}

/// Episode loop driving a [`DqnLearner`] through an [`Environment`].
pub struct Trainer {
    config: TrainerConfig,
    checkpoint_manager: Option<CheckpointManager>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Trainer {
            config,
            checkpoint_manager: None,
        }
    }

    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoint_manager = Some(manager);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run the full training loop.
    pub fn train(
        &self,
        env: &mut dyn Environment,
        learner: &mut DqnLearner,
    ) -> Result<TrainingSummary, TrainingError> {
        if env.observation_dim() != learner.state_dim() {
            return Err(LearnerError::StateDim {
                got: env.observation_dim(),
                expected: learner.state_dim(),
            }
            .into());
        }

        let mut metrics = TrainingMetrics::with_capacity(self.config.metrics_window);
        let mut checkpoints = Vec::new();
        let window = self.config.metrics_window;

        log::info!(
            "starting DQN training on {} for {} episodes",
            env.name(),
            self.config.num_episodes
        );

        for episode in 1..=self.config.num_episodes {
            let result = self.run_episode(env, learner, &mut metrics)?;
            metrics.record_episode(result);

            if self.config.target_update_episodes > 0
                && episode % self.config.target_update_episodes == 0
            {
                learner.update_target_network();
            }

            if self.config.log_interval > 0 && episode % self.config.log_interval == 0 {
                log::info!(
                    "episode {}/{} | eps: {:.3} | loss: {:.4} | reward({}): {:.2} | len: {:.1}",
                    episode,
                    self.config.num_episodes,
                    learner.epsilon(),
                    metrics.average_loss(window),
                    window,
                    metrics.average_reward(window),
                    metrics.average_length(window),
                );
            }

            if let Some(manager) = &self.checkpoint_manager {
                if self.config.checkpoint_interval > 0
                    && episode % self.config.checkpoint_interval == 0
                {
                    let ckpt_metrics = CheckpointMetrics {
                        average_reward: metrics.average_reward(window),
                        average_length: metrics.average_length(window),
                        current_loss: metrics.average_loss(window),
                        training_steps: learner.train_steps(),
                    };
                    match manager.save_checkpoint(learner, env.name(), &ckpt_metrics, episode) {
                        Ok(path) => checkpoints.push(path),
                        Err(e) => log::warn!("checkpoint at episode {episode} failed: {e}"),
                    }
                }
            }
        }

        let summary = TrainingSummary {
            episodes: metrics.total_episodes(),
            train_steps: learner.train_steps(),
            average_reward: metrics.average_reward(window),
            best_reward: metrics.best_reward().unwrap_or(0.0),
            final_epsilon: learner.epsilon(),
            checkpoints,
        };
        log::info!(
            "training complete: {} episodes, {} gradient steps, avg reward {:.2}",
            summary.episodes,
            summary.train_steps,
            summary.average_reward
        );
        Ok(summary)
    }

    /// Play one episode: select, step, observe, train until done or cut off.
    fn run_episode(
        &self,
        env: &mut dyn Environment,
        learner: &mut DqnLearner,
        metrics: &mut TrainingMetrics,
    ) -> Result<EpisodeResult, TrainingError> {
        let batch_size = learner.config().batch_size;
        let mut state = env.reset();
        let mut total_reward = 0.0;
        let mut length = 0;

        while length < self.config.max_steps_per_episode {
            let legal = env.legal_actions();
            if legal.is_empty() {
                break;
            }
            let action = learner.select_action(&state, &legal)?;
            let step = env.step(action)?;
            let next_legal = env.legal_actions();
            learner.observe(
                &state,
                action,
                step.reward,
                &step.observation,
                step.done,
                &next_legal,
            )?;
            if let Some(loss) = learner.train_step(batch_size)? {
                metrics.record_update(loss);
            }

            total_reward += step.reward;
            length += 1;
            state = step.observation;
            if step.done {
                break;
            }
        }

        Ok(EpisodeResult {
            total_reward,
            length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{DqnConfig, RandomAgent};
    use crate::checkpoint::CheckpointManagerConfig;
    use crate::env::{SnakeConfig, SnakeEnv, TicTacToeEnv};
    use crate::game::{Player, TicTacToe};

    fn small_learner(state_dim: usize, num_actions: usize) -> DqnLearner {
        DqnLearner::new(
            state_dim,
            num_actions,
            DqnConfig {
                learning_rate: 1e-3,
                batch_size: 8,
                replay_capacity: 256,
                hidden_1: 16,
                hidden_2: 8,
                seed: Some(5),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_train_on_tic_tac_toe() {
        let mut env = TicTacToeEnv::new(Box::new(RandomAgent::seeded(TicTacToe, 9)), Player::One);
        let mut learner = small_learner(env.observation_dim(), env.num_actions());
        let trainer = Trainer::new(TrainerConfig {
            num_episodes: 12,
            target_update_episodes: 4,
            log_interval: 5,
            ..Default::default()
        });

        let summary = trainer.train(&mut env, &mut learner).unwrap();
        assert_eq!(summary.episodes, 12);
        assert_eq!(learner.target_updates(), 3);
        assert!(summary.train_steps > 0);
        assert!(summary.final_epsilon < 1.0);
        assert!(summary.checkpoints.is_empty());
    }

    #[test]
    fn test_train_writes_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = SnakeEnv::new(SnakeConfig {
            size: 5,
            seed: Some(1),
            ..Default::default()
        });
        let mut learner = small_learner(env.observation_dim(), env.num_actions());
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            keep_last_n: 5,
            keep_best_n: 1,
        });
        let trainer = Trainer::new(TrainerConfig {
            num_episodes: 4,
            max_steps_per_episode: 30,
            checkpoint_interval: 2,
            ..Default::default()
        })
        .with_checkpoints(manager);

        let summary = trainer.train(&mut env, &mut learner).unwrap();
        assert_eq!(summary.checkpoints.len(), 2);
        assert!(summary.checkpoints[1].ends_with("checkpoint_0000004"));
        assert!(dir.path().join("latest").exists());
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut env = SnakeEnv::new(SnakeConfig {
            seed: Some(2),
            ..Default::default()
        });
        let mut learner = small_learner(10, 4);
        let trainer = Trainer::new(TrainerConfig::default());
        assert!(matches!(
            trainer.train(&mut env, &mut learner),
            Err(TrainingError::Learner(LearnerError::StateDim { .. }))
        ));
    }
}
