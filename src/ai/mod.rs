mod agent;
pub mod algorithms;
mod dqn_agent;
mod heuristic;
pub mod mcts;
pub mod minimax;
pub mod networks;
mod random;
pub mod state_encoding;

pub use agent::{Agent, Decision};
pub use algorithms::{DqnConfig, DqnLearner};
pub use dqn_agent::DqnAgent;
pub use heuristic::HeuristicAgent;
pub use mcts::{CreditPerspective, EdgeStats, MctsAgent, MctsConfig, SearchResult};
pub use minimax::{MinimaxAgent, MinimaxConfig};
pub use networks::{QNetwork, QNetworkConfig};
pub use random::RandomAgent;
