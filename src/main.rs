use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use grid_arena::ai::{Agent, DqnAgent, HeuristicAgent, MctsAgent, MinimaxAgent, RandomAgent};
use grid_arena::arena::{play_match, LogSink, MatchTally, NullSink};
use grid_arena::checkpoint::CheckpointManager;
use grid_arena::config::AppConfig;
use grid_arena::game::{GameOutcome, GameState, Player, TicTacToe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Random,
    Heuristic,
    Minimax,
    Mcts,
    Dqn,
}

/// Play Tic-Tac-Toe matches between two agents.
#[derive(Parser)]
#[command(name = "arena", about = "Pit Tic-Tac-Toe agents against each other")]
struct Cli {
    /// Agent playing X in the first game
    #[arg(long, value_enum, default_value = "minimax")]
    first: AgentKind,

    /// Agent playing O in the first game
    #[arg(long, value_enum, default_value = "mcts")]
    second: AgentKind,

    /// Number of games to play
    #[arg(long, default_value_t = 1)]
    games: usize,

    /// Swap sides after every game
    #[arg(long)]
    alternate: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Checkpoint directory for DQN agents (defaults to the latest checkpoint)
    #[arg(long)]
    dqn_checkpoint: Option<PathBuf>,

    /// Override MCTS simulations per move
    #[arg(long)]
    simulations: Option<usize>,

    /// Log every decision
    #[arg(long)]
    verbose: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.dump_config {
        print!("{}", AppConfig::default_toml().context("serializing default config")?);
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(simulations) = cli.simulations {
        config.mcts.simulations = simulations;
    }
    config.validate().context("validating overrides")?;

    let mut first = build_agent(cli.first, &config, cli.dqn_checkpoint.as_ref())?;
    let mut second = build_agent(cli.second, &config, cli.dqn_checkpoint.as_ref())?;

    let mut tally = MatchTally::default();
    for game in 0..cli.games {
        let swapped = cli.alternate && game % 2 == 1;
        let first_side = if swapped { Player::Two } else { Player::One };
        let agents: [&mut dyn Agent<TicTacToe>; 2] = if swapped {
            [second.as_mut(), first.as_mut()]
        } else {
            [first.as_mut(), second.as_mut()]
        };

        let record = if cli.verbose {
            play_match(&TicTacToe, GameState::initial(), agents, &mut LogSink)
        } else {
            play_match(&TicTacToe, GameState::initial(), agents, &mut NullSink)
        }
        .with_context(|| format!("playing game {}", game + 1))?;

        let result = match record.outcome {
            GameOutcome::Draw => "draw".to_string(),
            GameOutcome::Winner(p) if p == first_side => format!("{} wins", first.name()),
            GameOutcome::Winner(_) => format!("{} wins", second.name()),
        };
        log::info!(
            "game {}: {} in {} moves\n{}",
            game + 1,
            result,
            record.moves.len(),
            record.final_state.board()
        );
        tally.record(record.outcome, first_side);
    }

    println!(
        "{} vs {} over {} games: {} wins, {} losses, {} draws",
        first.name(),
        second.name(),
        tally.games(),
        tally.first_wins,
        tally.second_wins,
        tally.draws
    );
    Ok(())
}

fn build_agent(
    kind: AgentKind,
    config: &AppConfig,
    dqn_checkpoint: Option<&PathBuf>,
) -> Result<Box<dyn Agent<TicTacToe>>> {
    Ok(match kind {
        AgentKind::Random => Box::new(RandomAgent::new(TicTacToe)),
        AgentKind::Heuristic => Box::new(HeuristicAgent::new()),
        AgentKind::Minimax => Box::new(MinimaxAgent::new(TicTacToe, config.minimax.clone())),
        AgentKind::Mcts => Box::new(MctsAgent::new(TicTacToe, config.mcts.clone())),
        AgentKind::Dqn => {
            let mut agent = DqnAgent::for_tic_tac_toe(config.dqn.clone());
            match dqn_checkpoint {
                Some(dir) => agent
                    .learner_mut()
                    .load(dir)
                    .with_context(|| format!("loading DQN weights from {}", dir.display()))?,
                None => {
                    let manager = CheckpointManager::new(config.checkpoint.clone());
                    manager
                        .load_latest(agent.learner_mut())
                        .context("loading latest DQN checkpoint")?;
                }
            }
            Box::new(agent)
        }
    })
}
