//! The board: the maze, the leftover card and the players' pieces.

use crate::error::{LabyrinthError, LabyrinthResult};
use crate::graph::Graph;
use crate::location::BoardLocation;
use crate::maze::{MAZE_SIZE, Maze};
use crate::maze_card::{CardId, normalize_rotation};
use derive_getters::Getters;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Corners where pieces start, assigned round-robin.
const START_LOCATIONS: [BoardLocation; 4] = [
    BoardLocation::new(0, 0),
    BoardLocation::new(0, MAZE_SIZE - 1),
    BoardLocation::new(MAZE_SIZE - 1, MAZE_SIZE - 1),
    BoardLocation::new(MAZE_SIZE - 1, 0),
];

/// Identifier of a piece on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub struct PieceId(usize);

/// A player's piece.
///
/// The piece stands on a card rather than on a location: when a shift moves
/// the card, the piece travels with it.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Piece {
    /// The piece's identifier.
    #[getter(copy)]
    id: PieceId,
    /// The card the piece stands on.
    #[getter(copy)]
    maze_card: CardId,
    /// The card the piece has to reach.
    #[getter(copy)]
    objective: CardId,
    /// Number of objectives reached so far.
    #[getter(copy)]
    score: u32,
}

impl Piece {
    /// Whether the piece stands on its objective.
    pub fn has_reached_objective(&self) -> bool {
        self.maze_card == self.objective
    }
}

/// The state of the game components on the table.
#[derive(Debug, Clone)]
pub struct Board {
    maze: Maze,
    leftover: CardId,
    pieces: Vec<Piece>,
    next_piece: usize,
    previous_shift: Option<BoardLocation>,
    rng: ChaCha8Rng,
}

impl Board {
    /// Creates a board from a maze and the identifier of its leftover card.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if the leftover is not a card of the maze
    /// or is placed on the grid.
    pub fn new(maze: Maze, leftover: CardId, rng: ChaCha8Rng) -> LabyrinthResult<Self> {
        if maze.card(leftover).is_none() || maze.location_of(leftover).is_some() {
            return Err(LabyrinthError::InvalidArguments(format!(
                "card {} cannot be the leftover",
                leftover
            )));
        }
        Ok(Self {
            maze,
            leftover,
            pieces: Vec::new(),
            next_piece: 0,
            previous_shift: None,
            rng,
        })
    }

    /// Creates a board with a randomly generated maze.
    ///
    /// The same seed always yields the same maze and objectives.
    #[instrument]
    pub fn generate(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let (maze, leftover) = Maze::generate(&mut rng);
        Self {
            maze,
            leftover,
            pieces: Vec::new(),
            next_piece: 0,
            previous_shift: None,
            rng,
        }
    }

    /// The maze.
    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    /// The card currently not placed in the maze.
    pub fn leftover(&self) -> CardId {
        self.leftover
    }

    /// All pieces on the board.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Looks up a piece.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|piece| piece.id == id)
    }

    /// Location of the piece, or `None` if its card is the leftover.
    pub fn piece_location(&self, id: PieceId) -> Option<BoardLocation> {
        self.piece(id)
            .and_then(|piece| self.maze.location_of(piece.maze_card))
    }

    /// Removes all pieces.
    pub fn clear_pieces(&mut self) {
        self.pieces.clear();
    }

    /// Insert location of the last successful shift.
    pub fn previous_shift_location(&self) -> Option<BoardLocation> {
        self.previous_shift
    }

    /// Replaces a piece's objective.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for unknown pieces or cards.
    #[instrument(skip(self))]
    pub fn set_objective(&mut self, id: PieceId, objective: CardId) -> LabyrinthResult<()> {
        if self.maze.card(objective).is_none() {
            return Err(LabyrinthError::InvalidArguments(format!(
                "unknown card {}",
                objective
            )));
        }
        let piece = self
            .pieces
            .iter_mut()
            .find(|piece| piece.id == id)
            .ok_or_else(|| LabyrinthError::InvalidArguments(format!("unknown piece {}", id)))?;
        piece.objective = objective;
        Ok(())
    }

    /// Removes a single piece. Unknown identifiers are ignored.
    pub fn remove_piece(&mut self, id: PieceId) {
        self.pieces.retain(|piece| piece.id != id);
    }

    /// Creates a piece on the next start corner and draws its objective.
    #[instrument(skip(self))]
    pub fn create_piece(&mut self) -> PieceId {
        let start = START_LOCATIONS[self.pieces.len() % START_LOCATIONS.len()];
        let id = PieceId(self.next_piece);
        self.next_piece += 1;

        let start_card = self.cell(start);
        self.pieces.push(Piece {
            id,
            maze_card: start_card,
            objective: start_card,
            score: 0,
        });
        let objective = self.random_unoccupied_card();
        if let Some(piece) = self.pieces.last_mut() {
            piece.objective = objective;
        }

        info!(piece = %id, %start, %objective, "Piece created");
        id
    }

    /// Inserts the leftover at `insert_location` with the given rotation.
    ///
    /// The card pushed out becomes the new leftover. Pieces standing on it
    /// are placed on the inserted card, wrapping around to the other end of
    /// the shifted line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRotation`, `InvalidLocation` or `InvalidShiftLocation`;
    /// nothing is changed in those cases.
    #[instrument(skip(self))]
    pub fn shift(&mut self, insert_location: BoardLocation, rotation: i32) -> LabyrinthResult<()> {
        let rotation = normalize_rotation(rotation)?;
        if !Maze::is_inside(insert_location) {
            return Err(LabyrinthError::InvalidLocation(insert_location));
        }
        if !self.maze.insert_locations().contains(&insert_location) {
            return Err(LabyrinthError::InvalidShiftLocation(insert_location));
        }

        let inserted = self.leftover;
        if let Some(card) = self.maze.card_mut(inserted) {
            card.set_rotation(i32::from(rotation))?;
        }
        let pushed_out = self.maze.shift(insert_location, inserted)?;
        self.leftover = pushed_out;
        self.previous_shift = Some(insert_location);

        for piece in self.pieces.iter_mut().filter(|piece| piece.maze_card == pushed_out) {
            debug!(piece = %piece.id, "Piece pushed out, moving onto inserted card");
            piece.maze_card = inserted;
        }
        Ok(())
    }

    /// Moves a piece to the target location.
    ///
    /// When the piece reaches its objective its score increases and a new
    /// objective is drawn.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for unknown pieces, `InvalidLocation` for
    /// targets outside the maze and `MoveUnreachable` if no path connects the
    /// piece to the target.
    #[instrument(skip(self))]
    pub fn move_piece(&mut self, id: PieceId, target: BoardLocation) -> LabyrinthResult<()> {
        let piece = self
            .piece(id)
            .ok_or_else(|| LabyrinthError::InvalidArguments(format!("unknown piece {}", id)))?;
        let source = self.maze.location_of(piece.maze_card).ok_or_else(|| {
            LabyrinthError::InvalidArguments(format!("piece {} is not in the maze", id))
        })?;
        let target_card = self.maze.get(target)?;
        if !Graph::new(&self.maze).is_reachable(source, target)? {
            warn!(%source, %target, "Move target unreachable");
            return Err(LabyrinthError::MoveUnreachable {
                from: source,
                to: target,
            });
        }

        let reached = {
            let Some(piece) = self.pieces.iter_mut().find(|piece| piece.id == id) else {
                return Ok(());
            };
            piece.maze_card = target_card;
            piece.has_reached_objective()
        };
        if reached {
            let objective = self.random_unoccupied_card();
            if let Some(piece) = self.pieces.iter_mut().find(|piece| piece.id == id) {
                piece.score += 1;
                piece.objective = objective;
                info!(piece = %id, score = piece.score, %objective, "Objective reached");
            }
        }
        Ok(())
    }

    /// Draws a random card that is neither stood on nor the objective of any
    /// piece. Falls back to all cards when every card is taken.
    pub fn random_unoccupied_card(&mut self) -> CardId {
        let all: Vec<CardId> = self.maze.cards().iter().map(|card| card.id()).collect();
        let free: Vec<CardId> = all
            .iter()
            .copied()
            .filter(|&card| {
                !self
                    .pieces
                    .iter()
                    .any(|piece| piece.maze_card == card || piece.objective == card)
            })
            .collect();
        let pool = if free.is_empty() {
            debug!("No unoccupied card left, drawing from all cards");
            &all
        } else {
            &free
        };
        *pool.choose(&mut self.rng).unwrap_or(&self.leftover)
    }

    /// Card at a location known to be inside the maze.
    fn cell(&self, location: BoardLocation) -> CardId {
        self.maze.get(location).unwrap_or(self.leftover)
    }
}
