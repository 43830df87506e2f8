use std::path::PathBuf;

/// Rule violations raised by game states and environments.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("no legal move available")]
    NoLegalMove,

    #[error("{what} {value} out of range (expected {min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("game is already over")]
    GameOver,
}

/// Errors raised by the DQN learner.
#[derive(Debug, thiserror::Error)]
pub enum LearnerError {
    #[error("no legal action to choose from")]
    NoLegalMove,

    #[error("action {action} is outside the {num_actions} network outputs")]
    IllegalAction { action: usize, num_actions: usize },

    #[error("state has {got} features, network expects {expected}")]
    StateDim { got: usize, expected: usize },

    #[error("checkpoint has {got} action outputs, network has {expected}")]
    ActionCount { got: usize, expected: usize },

    #[error("tensor data error: {0}")]
    Tensor(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint directory not found: {0}")]
    DirNotFound(PathBuf),

    #[error("no 'latest' marker found in {0}")]
    NoLatest(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("environment error: {0}")]
    Game(#[from] GameError),

    #[error("learner error: {0}")]
    Learner(#[from] LearnerError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
