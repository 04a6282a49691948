//! Domain error types.

use crate::location::BoardLocation;
use crate::turns::{Action, PlayerId};

/// Failure raised by a labyrinth operation.
///
/// Every operation that returns this error leaves the maze, the board and
/// the turn scheduler exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum LabyrinthError {
    /// The location lies outside of the maze.
    #[display("Location {} is outside of the maze", _0)]
    InvalidLocation(BoardLocation),

    /// The location is not one of the insert locations of the maze.
    #[display("Location {} is not shiftable", _0)]
    InvalidShiftLocation(BoardLocation),

    /// The rotation is not a multiple of 90 degrees.
    #[display("Rotation {} is not divisible by 90", _0)]
    InvalidRotation(i32),

    /// The target cannot be reached from the piece's location.
    #[display("Locations {} and {} are not connected", from, to)]
    MoveUnreachable {
        /// Location of the piece.
        from: BoardLocation,
        /// Requested target.
        to: BoardLocation,
    },

    /// The player may not perform this action now.
    #[display("Player {} should not be able to perform action {}", player, action)]
    TurnActionViolation {
        /// Requesting player.
        player: PlayerId,
        /// Requested action.
        action: Action,
    },

    /// The game already has the maximum number of players.
    #[display("Already {} players playing the game", _0)]
    GameFull(usize),

    /// No player with this identifier takes part in the game.
    #[display("No matching player for id {} in this game", _0)]
    PlayerNotFound(PlayerId),

    /// Input has the wrong dimensions.
    #[display("Invalid size: {}", _0)]
    InvalidSize(String),

    /// Malformed combination of arguments.
    #[display("Invalid arguments: {}", _0)]
    InvalidArguments(String),
}

impl std::error::Error for LabyrinthError {}

/// Result alias used throughout the crate.
pub type LabyrinthResult<T> = Result<T, LabyrinthError>;
