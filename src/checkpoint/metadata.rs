use serde::{Deserialize, Serialize};

use crate::ai::DqnConfig;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub average_reward: f32,
    pub average_length: f32,
    pub current_loss: f32,
    pub training_steps: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub episode: usize,
    pub timestamp: u64,
    /// Name of the environment the learner was trained on.
    pub environment: String,
    pub metrics: CheckpointMetrics,
    pub epsilon: f32,
    pub hyperparameters: DqnConfig,
}

/// DQN training state written to training_state.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqnTrainingState {
    pub epsilon: f32,
    pub beta: f32,
    pub train_steps: usize,
    pub target_updates: usize,
    pub state_dim: usize,
    pub num_actions: usize,
    pub config: DqnConfig,
}
