mod dqn;

pub use dqn::{DqnConfig, DqnLearner, InferBackend, TrainBackend};
