//! Labyrinth game core.
//!
//! Authoritative state of a turn-based board game played on a shiftable
//! maze. Transport, persistence and authentication live elsewhere; this crate
//! only accepts player requests, reports turn changes through callbacks and
//! fails with typed [`LabyrinthError`]s.
//!
//! # Architecture
//!
//! - **Maze**: 7×7 grid of rotatable cards with the shift mechanic
//! - **Graph**: reachability between maze locations
//! - **Board**: maze, leftover card and pieces
//! - **Turns**: strict action order with an optional timed prepare phase
//! - **Game**: façade binding players, board and turns
//! - **Solver**: exhaustive search for a computer player's next turns
//!
//! # Example
//!
//! ```
//! use labyrinth_core::{Action, BoardLocation, Game, GameConfig};
//!
//! # fn example() -> Result<(), labyrinth_core::LabyrinthError> {
//! let mut game = Game::new(1, &GameConfig::new(None, Some(42)))?;
//! let player = game.add_player(None)?;
//! game.start_game();
//!
//! assert!(game.turns().is_action_possible(player, Action::Shift));
//! game.shift(player, BoardLocation::new(0, 1), 90)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod config;
mod error;
mod game;
mod graph;
mod location;
mod maze;
mod maze_card;
mod solver;
mod turns;

pub use board::{Board, Piece, PieceId};
pub use config::{ConfigError, ConfigErrorKind, GameConfig};
pub use error::{LabyrinthError, LabyrinthResult};
pub use game::{Game, GameId, MAX_PLAYERS, Player};
pub use graph::{Graph, ReachedLocation};
pub use location::{BoardLocation, Direction};
pub use maze::{MAZE_SIZE, Maze};
pub use maze_card::{CardId, MazeCard, OutPaths, Shape, normalize_rotation};
pub use solver::{DEFAULT_SEARCH_DEPTH, SolverAction, best_actions};
pub use turns::{Action, PlayerAction, PlayerId, TurnCallback, Turns};
