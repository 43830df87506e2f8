#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use grid_arena::ai::{Agent, DqnLearner, HeuristicAgent, MinimaxAgent, RandomAgent};
use grid_arena::checkpoint::CheckpointManager;
use grid_arena::config::AppConfig;
use grid_arena::env::{Environment, MinesweeperEnv, SnakeEnv, TicTacToeEnv, TreasureHuntEnv};
use grid_arena::game::{Player, TicTacToe};
use grid_arena::training::{Trainer, TrainingSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnvKind {
    Snake,
    Minesweeper,
    TicTacToe,
    TreasureHunt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Opponent {
    Random,
    Heuristic,
    Minimax,
}

/// Train a DQN agent on one of the grid environments.
#[derive(Parser)]
#[command(name = "train", about = "Train a DQN agent on a grid environment")]
struct Cli {
    /// Environment to train on
    #[arg(long, value_enum, default_value = "snake")]
    env: EnvKind,

    /// Opponent for the Tic-Tac-Toe environment
    #[arg(long, value_enum, default_value = "random")]
    opponent: Opponent,

    /// Train as O instead of X in Tic-Tac-Toe
    #[arg(long)]
    second: bool,

    /// Resume training from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Override the checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Seed environments and the learner
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(episodes) = cli.episodes {
        config.training.num_episodes = episodes;
    }
    if let Some(lr) = cli.lr {
        config.dqn.learning_rate = lr;
    }
    if let Some(dir) = cli.checkpoint_dir.clone() {
        config.checkpoint.checkpoint_dir = dir;
    }
    if let Some(seed) = cli.seed {
        config.dqn.seed = Some(seed);
        config.snake.seed = Some(seed);
        config.minesweeper.seed = Some(seed);
        config.treasure_hunt.seed = Some(seed);
    }
    config.validate().context("validating overrides")?;

    let mut env = build_env(&cli, &config);
    let mut learner = DqnLearner::new(env.observation_dim(), env.num_actions(), config.dqn.clone());

    let manager = CheckpointManager::new(config.checkpoint.clone());
    if cli.resume {
        match manager.load_latest(&mut learner) {
            Ok(data) => log::info!(
                "resuming {} from episode {} (epsilon {:.3})",
                data.metadata.environment,
                data.metadata.episode,
                learner.epsilon()
            ),
            Err(e) => log::warn!("no checkpoint found ({e}), starting fresh"),
        }
    }

    let trainer = Trainer::new(config.training.clone()).with_checkpoints(manager);
    let summary = trainer
        .train(env.as_mut(), &mut learner)
        .with_context(|| format!("training on {}", env.name()))?;
    report(&summary);
    Ok(())
}

fn build_env(cli: &Cli, config: &AppConfig) -> Box<dyn Environment> {
    match cli.env {
        EnvKind::Snake => Box::new(SnakeEnv::new(config.snake.clone())),
        EnvKind::Minesweeper => Box::new(MinesweeperEnv::new(config.minesweeper.clone())),
        EnvKind::TreasureHunt => Box::new(TreasureHuntEnv::new(config.treasure_hunt.clone())),
        EnvKind::TicTacToe => {
            let opponent: Box<dyn Agent<TicTacToe>> = match (cli.opponent, cli.seed) {
                (Opponent::Random, Some(seed)) => Box::new(RandomAgent::seeded(TicTacToe, seed)),
                (Opponent::Random, None) => Box::new(RandomAgent::new(TicTacToe)),
                (Opponent::Heuristic, Some(seed)) => Box::new(HeuristicAgent::seeded(seed)),
                (Opponent::Heuristic, None) => Box::new(HeuristicAgent::new()),
                (Opponent::Minimax, _) => {
                    Box::new(MinimaxAgent::new(TicTacToe, config.minimax.clone()))
                }
            };
            let side = if cli.second { Player::Two } else { Player::One };
            Box::new(TicTacToeEnv::new(opponent, side))
        }
    }
}

fn report(summary: &TrainingSummary) {
    println!("episodes:       {}", summary.episodes);
    println!("gradient steps: {}", summary.train_steps);
    println!("avg reward:     {:.3}", summary.average_reward);
    println!("best reward:    {:.3}", summary.best_reward);
    println!("final epsilon:  {:.4}", summary.final_epsilon);
    if let Some(last) = summary.checkpoints.last() {
        println!("last checkpoint: {}", last.display());
    }
}
