use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use tile_slide::config::GameConfig;
use tile_slide::engine::Direction;
use tile_slide::session::Session;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Up, Down, Left, Right, repeat
    Cycle,
    /// Uniformly random direction each turn
    Random,
}

/// Autoplay one game and print the board after each turn.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE", value_parser = clap::value_parser!(PathBuf))]
    config: Option<PathBuf>,

    /// RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many turns even if the game is not over
    #[arg(long, default_value_t = 100_000)]
    max_moves: u64,

    #[arg(long, value_enum, default_value_t = Policy::Cycle)]
    policy: Policy,

    /// Only print the final summary
    #[arg(long, short)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::from_toml(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut policy_rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut session = Session::new(config).context("starting session")?;
    if !args.quiet {
        println!("{}", session.board());
    }

    let mut moves = 0u64;
    while !session.is_over() && moves < args.max_moves {
        let direction = match args.policy {
            Policy::Cycle => Direction::ALL[(moves % 4) as usize],
            Policy::Random => Direction::ALL[policy_rng.gen_range(0..4)],
        };
        let turn = session.input(direction);
        moves += 1;
        if !args.quiet {
            println!("{:?} -> {:?}\n{}", direction, turn.outcome, session.board());
        }
    }

    let board = session.board();
    info!("finished after {} turns (game over: {})", session.turns(), session.is_over());
    println!(
        "Moves made: {}, Highest tile: {}, Tile sum: {}, Game over: {}",
        moves,
        board.highest_tile(),
        board.sum(),
        session.is_over()
    );
    Ok(())
}
