//! # grid_arena
//!
//! Decision engines for small grid games: exact Minimax search, Monte Carlo
//! Tree Search with UCB1, and a DQN learner with prioritized replay and
//! double-Q targets, built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`]: Tic-Tac-Toe board, state machine and the `GameRules` trait
//! - [`ai`]: Agent trait, Minimax, MCTS, DQN learner, networks, state encoding
//! - [`env`]: Single-agent environments (Snake, Minesweeper, Tic-Tac-Toe vs an opponent)
//! - [`arena`]: Turn loop that plays two agents against each other
//! - [`training`]: Episode trainer, prioritized replay buffer, metrics
//! - [`checkpoint`]: Model persistence and versioning
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod arena;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod game;
pub mod training;
