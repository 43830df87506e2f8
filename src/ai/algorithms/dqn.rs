use std::fs;
use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::networks::{QNetwork, QNetworkConfig};
use crate::ai::state_encoding::{rows_to_tensor, tensor_to_vec};
use crate::checkpoint::DqnTrainingState;
use crate::error::{CheckpointError, LearnerError};
use crate::training::replay_buffer::{PrioritizedReplayBuffer, Transition};

pub type InferBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<InferBackend>;

type QOptimizer =
    burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, QNetwork<TrainBackend>, TrainBackend>;

const TRAINING_STATE_FILE: &str = "training_state.json";

/// DQN hyperparameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    /// Multiplicative decay applied to epsilon after every gradient step.
    pub epsilon_decay: f32,
    pub batch_size: usize,
    pub replay_capacity: usize,
    /// Prioritization exponent; 0.0 samples uniformly.
    pub alpha: f32,
    pub beta_start: f32,
    /// Added to beta after every gradient step, capped at 1.0.
    pub beta_increment: f32,
    pub priority_epsilon: f32,
    pub hidden_1: usize,
    pub hidden_2: usize,
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-4,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.1,
            epsilon_decay: 0.9995,
            batch_size: 32,
            replay_capacity: 100_000,
            alpha: 0.6,
            beta_start: 0.4,
            beta_increment: 1e-3,
            priority_epsilon: 1e-5,
            hidden_1: 128,
            hidden_2: 64,
            seed: None,
        }
    }
}

/// Deep Q-learner with a live and a target network, prioritized replay,
/// double-Q targets and an Adam optimizer.
///
/// Works on flat `f32` observations and dense action indices, so the same
/// learner serves board games and single-agent environments.
pub struct DqnLearner {
    q_network: QNetwork<TrainBackend>,
    target_network: QNetwork<InferBackend>,
    optimizer: QOptimizer,
    replay_buffer: PrioritizedReplayBuffer,
    net_config: QNetworkConfig,
    config: DqnConfig,
    device: <TrainBackend as Backend>::Device,
    state_dim: usize,
    num_actions: usize,
    epsilon: f32,
    beta: f32,
    train_steps: usize,
    target_updates: usize,
    rng: StdRng,
}

impl DqnLearner {
    pub fn new(state_dim: usize, num_actions: usize, config: DqnConfig) -> Self {
        let device = Default::default();
        let net_config = QNetworkConfig::new(state_dim, num_actions)
            .with_hidden_1(config.hidden_1)
            .with_hidden_2(config.hidden_2);
        let q_network: QNetwork<TrainBackend> = net_config.init(&device);
        let target_network = q_network.valid();
        let optimizer = AdamConfig::new().init();

        let (rng, replay_buffer) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                PrioritizedReplayBuffer::seeded(
                    config.replay_capacity,
                    config.priority_epsilon,
                    seed.wrapping_add(1),
                ),
            ),
            None => (
                StdRng::from_os_rng(),
                PrioritizedReplayBuffer::new(config.replay_capacity, config.priority_epsilon),
            ),
        };

        DqnLearner {
            q_network,
            target_network,
            optimizer,
            replay_buffer,
            net_config,
            epsilon: config.epsilon_start,
            beta: config.beta_start,
            config,
            device,
            state_dim,
            num_actions,
            train_steps: 0,
            target_updates: 0,
            rng,
        }
    }

    fn check_state(&self, state: &[f32]) -> Result<(), LearnerError> {
        if state.len() != self.state_dim {
            return Err(LearnerError::StateDim {
                got: state.len(),
                expected: self.state_dim,
            });
        }
        Ok(())
    }

    fn check_action(&self, action: usize) -> Result<(), LearnerError> {
        if action >= self.num_actions {
            return Err(LearnerError::IllegalAction {
                action,
                num_actions: self.num_actions,
            });
        }
        Ok(())
    }

    fn check_legal(&self, legal: &[usize]) -> Result<(), LearnerError> {
        if legal.is_empty() {
            return Err(LearnerError::NoLegalMove);
        }
        legal.iter().try_for_each(|&a| self.check_action(a))
    }

    /// Q-values of the live network for a single state.
    pub fn q_values(&self, state: &[f32]) -> Result<Vec<f32>, LearnerError> {
        let input = rows_to_tensor::<InferBackend>(&[state], self.state_dim, &self.device)?;
        tensor_to_vec(self.q_network.valid().forward(input))
    }

    /// Epsilon-greedy choice restricted to `legal`.
    pub fn select_action(&mut self, state: &[f32], legal: &[usize]) -> Result<usize, LearnerError> {
        self.check_legal(legal)?;
        self.check_state(state)?;

        if self.rng.random_range(0.0..1.0) < self.epsilon {
            let idx = self.rng.random_range(0..legal.len());
            return Ok(legal[idx]);
        }
        self.greedy_action(state, legal)
    }

    /// Arg-max of the live network over `legal`; the first action wins ties.
    pub fn greedy_action(&self, state: &[f32], legal: &[usize]) -> Result<usize, LearnerError> {
        self.check_legal(legal)?;
        let q = self.q_values(state)?;
        Ok(argmax_over(&q, legal))
    }

    /// Store a transition with priority `|td| + priority_epsilon`, where the
    /// TD error comes from the current networks. Returns the TD error.
    pub fn observe(
        &mut self,
        state: &[f32],
        action: usize,
        reward: f32,
        next_state: &[f32],
        done: bool,
        next_legal: &[usize],
    ) -> Result<f32, LearnerError> {
        self.check_state(state)?;
        self.check_state(next_state)?;
        self.check_action(action)?;
        next_legal.iter().try_for_each(|&a| self.check_action(a))?;

        let transition = Transition {
            state: state.to_vec(),
            action,
            reward,
            next_state: next_state.to_vec(),
            done,
            next_legal: next_legal.to_vec(),
        };

        let q = self.q_values(state)?;
        let target = self.double_q_targets(std::slice::from_ref(&transition))?[0];
        let td = target - q[action];

        self.replay_buffer
            .push(transition, td.abs() + self.config.priority_epsilon);
        Ok(td)
    }

    /// Double-Q bootstrap: the live network picks the next action among the
    /// legal ones, the target network evaluates it.
    fn double_q_targets(&self, batch: &[Transition]) -> Result<Vec<f32>, LearnerError> {
        let rows: Vec<&[f32]> = batch.iter().map(|t| t.next_state.as_slice()).collect();
        let live_input = rows_to_tensor::<InferBackend>(&rows, self.state_dim, &self.device)?;
        let target_input = live_input.clone();
        let next_live = tensor_to_vec(self.q_network.valid().forward(live_input))?;
        let next_target = tensor_to_vec(self.target_network.forward(target_input))?;

        let n = self.num_actions;
        let all: Vec<usize> = (0..n).collect();
        let targets = batch
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if t.done {
                    return t.reward;
                }
                let legal = if t.next_legal.is_empty() {
                    &all
                } else {
                    &t.next_legal
                };
                let row = &next_live[i * n..(i + 1) * n];
                let best = argmax_over(row, legal);
                t.reward + self.config.gamma * next_target[i * n + best]
            })
            .collect();
        Ok(targets)
    }

    /// One prioritized gradient step. `Ok(None)` while the buffer holds fewer
    /// than `batch_size` transitions.
    pub fn train_step(&mut self, batch_size: usize) -> Result<Option<f32>, LearnerError> {
        if batch_size == 0 || self.replay_buffer.len() < batch_size {
            return Ok(None);
        }
        let Some(batch) = self
            .replay_buffer
            .sample(batch_size, self.config.alpha, self.beta)
        else {
            return Ok(None);
        };
        let b = batch.len();
        let n = self.num_actions;

        let targets = self.double_q_targets(&batch.transitions)?;

        let rows: Vec<&[f32]> = batch.transitions.iter().map(|t| t.state.as_slice()).collect();
        let states = rows_to_tensor::<TrainBackend>(&rows, self.state_dim, &self.device)?;
        let q_all = self.q_network.forward(states);

        // One-hot action mask [B, n] to extract Q(s, a)
        let mut mask = vec![0.0f32; b * n];
        for (i, t) in batch.transitions.iter().enumerate() {
            mask[i * n + t.action] = 1.0;
        }
        let mask = Tensor::<TrainBackend, 2>::from_data(TensorData::new(mask, [b, n]), &self.device);
        let q_taken = (q_all * mask).sum_dim(1);

        let targets =
            Tensor::<TrainBackend, 2>::from_data(TensorData::new(targets, [b, 1]), &self.device);
        let weights = Tensor::<TrainBackend, 2>::from_data(
            TensorData::new(batch.weights.clone(), [b, 1]),
            &self.device,
        );

        let diff = q_taken - targets;
        let td_errors = tensor_to_vec(diff.clone())?;
        let loss = (diff.clone() * diff * weights).mean();
        let loss_val = tensor_to_vec(loss.clone())?[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.replay_buffer.update_priorities(&batch.indices, &td_errors);
        self.beta = (self.beta + self.config.beta_increment).min(1.0);
        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
        self.train_steps += 1;

        log::debug!(
            "dqn train step {}: loss {:.5}, epsilon {:.4}, beta {:.3}",
            self.train_steps,
            loss_val,
            self.epsilon,
            self.beta
        );
        Ok(Some(loss_val))
    }

    /// Hard copy of the live network into the target network.
    pub fn update_target_network(&mut self) {
        self.target_network = self.q_network.valid();
        self.target_updates += 1;
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy play).
    pub fn set_epsilon(&mut self, eps: f32) {
        self.epsilon = eps;
    }

    pub fn beta(&self) -> f32 {
        self.beta
    }

    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn target_updates(&self) -> usize {
        self.target_updates
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Export current training state for checkpointing.
    pub fn training_state(&self) -> DqnTrainingState {
        DqnTrainingState {
            epsilon: self.epsilon,
            beta: self.beta,
            train_steps: self.train_steps,
            target_updates: self.target_updates,
            state_dim: self.state_dim,
            num_actions: self.num_actions,
            config: self.config.clone(),
        }
    }

    /// Restore counters and schedule values from a checkpoint.
    pub fn restore_training_state(&mut self, state: &DqnTrainingState) -> Result<(), LearnerError> {
        if state.state_dim != self.state_dim {
            return Err(LearnerError::StateDim {
                got: state.state_dim,
                expected: self.state_dim,
            });
        }
        if state.num_actions != self.num_actions {
            return Err(LearnerError::ActionCount {
                got: state.num_actions,
                expected: self.num_actions,
            });
        }
        self.epsilon = state.epsilon;
        self.beta = state.beta;
        self.train_steps = state.train_steps;
        self.target_updates = state.target_updates;
        Ok(())
    }

    /// Write both networks and `training_state.json` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), LearnerError> {
        fs::create_dir_all(dir).map_err(CheckpointError::Io)?;
        let recorder = DefaultRecorder::default();
        self.q_network
            .clone()
            .valid()
            .save_file(dir.join("q_network"), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;
        self.target_network
            .clone()
            .save_file(dir.join("target_network"), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;

        let json = serde_json::to_string_pretty(&self.training_state())
            .map_err(CheckpointError::Json)?;
        fs::write(dir.join(TRAINING_STATE_FILE), json).map_err(CheckpointError::Io)?;
        Ok(())
    }

    /// Load both networks and the training state written by [`DqnLearner::save`].
    pub fn load(&mut self, dir: &Path) -> Result<(), LearnerError> {
        if !dir.is_dir() {
            return Err(CheckpointError::DirNotFound(dir.to_path_buf()).into());
        }

        let state_path = dir.join(TRAINING_STATE_FILE);
        let json = fs::read_to_string(&state_path).map_err(|e| CheckpointError::MetadataRead {
            path: state_path.clone(),
            source: e,
        })?;
        let state: DqnTrainingState =
            serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
                path: state_path,
                source: e,
            })?;

        let recorder = DefaultRecorder::default();
        let q: QNetwork<TrainBackend> = self
            .net_config
            .init(&self.device)
            .load_file(dir.join("q_network"), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        let target: QNetwork<InferBackend> = self
            .net_config
            .init(&self.device)
            .load_file(dir.join("target_network"), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;

        self.restore_training_state(&state)?;
        self.q_network = q;
        self.target_network = target;
        self.optimizer = AdamConfig::new().init();
        Ok(())
    }
}

/// Index in `legal` with the highest value in `q`; the first one wins ties.
fn argmax_over(q: &[f32], legal: &[usize]) -> usize {
    let mut best_action = legal[0];
    let mut best_q = f32::NEG_INFINITY;
    for &a in legal {
        if q[a] > best_q {
            best_q = q[a];
            best_action = a;
        }
    }
    best_action
}
