//! Labyrinth - command-line driver
//!
//! Plays simulated games and prints generated mazes.

#![warn(missing_docs)]

mod cli;
mod simulation;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use labyrinth_core::{Board, GameConfig};
use simulation::{SimulationSettings, SimulationSummary};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            config,
            players,
            moves,
            seed,
            prepare_delay_ms,
            json,
        } => run_simulation(config, players, moves, seed, prepare_delay_ms, json).await,
        Command::Maze { seed } => {
            print_maze(seed);
            Ok(())
        }
    }
}

/// Play a game between computer players and print the result
#[instrument]
async fn run_simulation(
    config: Option<PathBuf>,
    players: usize,
    moves: usize,
    seed: Option<u64>,
    prepare_delay_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::default(),
    }
    .override_seed(seed)
    .override_prepare_delay_ms(prepare_delay_ms);
    info!(?config, "Using game configuration");

    let summary = simulation::run(SimulationSettings {
        players,
        moves,
        config,
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &SimulationSummary) {
    for line in &summary.maze {
        println!("{}", line);
    }
    println!();
    println!("{} shifts, {} moves", summary.shifts, summary.moves);
    for player in &summary.players {
        match player.location {
            Some(location) => println!(
                "player {}: score {} at {}",
                player.player, player.score, location
            ),
            None => println!("player {}: score {}", player.player, player.score),
        }
    }
}

/// Print a generated maze and its leftover card
fn print_maze(seed: Option<u64>) {
    let board = Board::generate(seed);
    for line in board.maze().to_text() {
        println!("{}", line);
    }
    if let Some(card) = board.maze().card(board.leftover()) {
        println!();
        println!(
            "leftover: {} {} at {} degrees",
            card.id(),
            card.shape(),
            card.rotation()
        );
    }
}
