pub mod metrics;
pub mod replay_buffer;
pub mod trainer;

pub use metrics::{EpisodeResult, TrainingMetrics};
pub use replay_buffer::{PrioritizedReplayBuffer, SampledBatch, Transition};
pub use trainer::{Trainer, TrainerConfig, TrainingSummary};
