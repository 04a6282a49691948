//! Command-line interface for labyrinth.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Labyrinth - turn-based board game on a shiftable maze
#[derive(Parser, Debug)]
#[command(name = "labyrinth")]
#[command(about = "Play and inspect labyrinth games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a game between computer players
    Simulate {
        /// Path to a game configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of bots taking part
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Number of moves to play before stopping
        #[arg(short, long, default_value = "40")]
        moves: usize,

        /// Seed for the maze, objectives and bots (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Prepare phase before each shift, in milliseconds (overrides config)
        #[arg(long)]
        prepare_delay_ms: Option<u64>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a generated maze
    Maze {
        /// Seed for maze generation
        #[arg(long)]
        seed: Option<u64>,
    },
}
