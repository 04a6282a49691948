//! The maze: a fixed-size grid of maze cards and the shift mechanic.
//!
//! The maze owns every card of the game in an arena indexed by [`CardId`],
//! including the one card that is currently not placed on the grid. Cells and
//! the board's leftover slot only hold identifiers into that arena.

use crate::error::{LabyrinthError, LabyrinthResult};
use crate::location::{BoardLocation, Direction};
use crate::maze_card::{CardId, MazeCard, Shape};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Number of rows and columns of the maze.
pub const MAZE_SIZE: i32 = 7;

const CELL_COUNT: usize = (MAZE_SIZE * MAZE_SIZE) as usize;

/// Characters per cell edge in the text format.
const TEXT_BLOCK: usize = 3;

const ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// The state of the maze.
#[derive(Debug, Clone)]
pub struct Maze {
    cards: Vec<MazeCard>,
    cells: Vec<CardId>,
    insert_locations: HashSet<BoardLocation>,
}

impl Maze {
    /// Builds a maze from per-cell shapes and rotations in row-major order,
    /// plus the shape and rotation of the card left over.
    ///
    /// Identifiers are issued in the same order, so the leftover receives the
    /// last one. Returns the maze and the leftover's identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` unless exactly `MAZE_SIZE²` cells are given.
    pub fn from_shapes(
        cells: Vec<(Shape, u16)>,
        leftover: (Shape, u16),
    ) -> LabyrinthResult<(Self, CardId)> {
        if cells.len() != CELL_COUNT {
            return Err(LabyrinthError::InvalidSize(format!(
                "expected {} cells, got {}",
                CELL_COUNT,
                cells.len()
            )));
        }

        Ok(Self::assemble(cells, leftover))
    }

    /// Issues identifiers in order and places the first `MAZE_SIZE²` cards.
    fn assemble(cells: Vec<(Shape, u16)>, leftover: (Shape, u16)) -> (Self, CardId) {
        debug_assert_eq!(cells.len(), CELL_COUNT);
        let mut cards = Vec::with_capacity(CELL_COUNT + 1);
        for (shape, rotation) in cells.into_iter().chain(std::iter::once(leftover)) {
            let id = CardId(cards.len());
            cards.push(MazeCard::new(id, shape, rotation));
        }

        let maze = Self {
            cards,
            cells: (0..CELL_COUNT).map(CardId).collect(),
            insert_locations: standard_insert_locations(),
        };
        (maze, CardId(CELL_COUNT))
    }

    /// Generates a random maze.
    ///
    /// The four corners hold corner cards opening toward the inside of the
    /// board; every other card has a random shape and rotation.
    #[instrument(skip(rng))]
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> (Self, CardId) {
        const SHAPES: [Shape; 3] = [Shape::Straight, Shape::Corner, Shape::TJunction];
        let random_card = |rng: &mut R| {
            let shape = *SHAPES.choose(rng).unwrap_or(&Shape::Straight);
            let rotation = *ROTATIONS.choose(rng).unwrap_or(&0);
            (shape, rotation)
        };

        let last = MAZE_SIZE - 1;
        let cells = locations()
            .map(|location| match (location.row, location.column) {
                (0, 0) => (Shape::Corner, 90),
                (0, c) if c == last => (Shape::Corner, 180),
                (r, c) if r == last && c == last => (Shape::Corner, 270),
                (r, 0) if r == last => (Shape::Corner, 0),
                _ => random_card(rng),
            })
            .collect();
        let leftover = random_card(rng);

        debug!("Generated random maze");
        Self::assemble(cells, leftover)
    }

    /// Parses a maze from its text representation.
    ///
    /// Each cell is a 3×3 block of characters. A `.` at the middle of the
    /// block's top, right, bottom or left edge marks an open path in that
    /// direction; any other character is a wall. The leftover card gets the
    /// given shape at rotation 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if there are not `3 * MAZE_SIZE` lines of at least
    /// `3 * MAZE_SIZE` characters, and `InvalidArguments` if a block's paths
    /// match no card shape.
    #[instrument(skip(lines))]
    pub fn from_text<S: AsRef<str>>(
        lines: &[S],
        leftover: Shape,
    ) -> LabyrinthResult<(Self, CardId)> {
        let extent = TEXT_BLOCK * MAZE_SIZE as usize;
        if lines.len() != extent {
            return Err(LabyrinthError::InvalidSize(format!(
                "expected {} lines, got {}",
                extent,
                lines.len()
            )));
        }
        let grid: Vec<Vec<char>> = lines
            .iter()
            .map(|line| line.as_ref().chars().collect())
            .collect();
        if let Some(short) = grid.iter().position(|line| line.len() < extent) {
            return Err(LabyrinthError::InvalidSize(format!(
                "line {} is shorter than {} characters",
                short, extent
            )));
        }

        let is_open = |row: usize, column: usize| grid[row][column] == '.';
        let mut cells = Vec::with_capacity(CELL_COUNT);
        for location in locations() {
            let top = location.row as usize * TEXT_BLOCK;
            let left = location.column as usize * TEXT_BLOCK;
            let open: Vec<Direction> = Direction::ALL
                .into_iter()
                .filter(|direction| match direction {
                    Direction::North => is_open(top, left + 1),
                    Direction::East => is_open(top + 1, left + 2),
                    Direction::South => is_open(top + 2, left + 1),
                    Direction::West => is_open(top + 1, left),
                })
                .collect();
            let card = card_for_paths(&open).ok_or_else(|| {
                LabyrinthError::InvalidArguments(format!(
                    "paths {:?} at {} match no maze card",
                    open, location
                ))
            })?;
            cells.push(card);
        }

        Self::from_shapes(cells, (leftover, 0))
    }

    /// Renders the maze in the text format accepted by [`Maze::from_text`].
    pub fn to_text(&self) -> Vec<String> {
        let mut lines = vec![String::new(); TEXT_BLOCK * MAZE_SIZE as usize];
        for (index, id) in self.cells.iter().enumerate() {
            let location = location_at(index);
            let card = &self.cards[id.0];
            let mark = |direction| if card.has_out_path(direction) { '.' } else { '#' };
            let top = location.row as usize * TEXT_BLOCK;
            lines[top].extend(['#', mark(Direction::North), '#']);
            lines[top + 1].extend([mark(Direction::West), '.', mark(Direction::East)]);
            lines[top + 2].extend(['#', mark(Direction::South), '#']);
        }
        lines
    }

    /// Whether the location lies inside the maze.
    pub fn is_inside(location: BoardLocation) -> bool {
        (0..MAZE_SIZE).contains(&location.row) && (0..MAZE_SIZE).contains(&location.column)
    }

    /// Iterator over all locations in row-major order.
    pub fn locations() -> impl Iterator<Item = BoardLocation> + Clone {
        locations()
    }

    /// Border locations where the leftover can be inserted.
    pub fn insert_locations(&self) -> &HashSet<BoardLocation> {
        &self.insert_locations
    }

    /// Identifier of the card at the given location.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if the location is outside the maze.
    pub fn get(&self, location: BoardLocation) -> LabyrinthResult<CardId> {
        let index = index_of(location).ok_or(LabyrinthError::InvalidLocation(location))?;
        Ok(self.cells[index])
    }

    /// Places a card at the given location.
    ///
    /// This is a raw cell write; keeping every card on at most one cell is
    /// the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if the location is outside the maze, and
    /// `InvalidArguments` if the card does not belong to this maze.
    pub fn set(&mut self, location: BoardLocation, card: CardId) -> LabyrinthResult<()> {
        let index = index_of(location).ok_or(LabyrinthError::InvalidLocation(location))?;
        if card.0 >= self.cards.len() {
            return Err(LabyrinthError::InvalidArguments(format!(
                "card {} does not belong to this maze",
                card
            )));
        }
        self.cells[index] = card;
        Ok(())
    }

    /// The card at the given location.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if the location is outside the maze.
    pub fn card_at(&self, location: BoardLocation) -> LabyrinthResult<&MazeCard> {
        let id = self.get(location)?;
        Ok(&self.cards[id.0])
    }

    /// Looks up a card by identifier.
    pub fn card(&self, id: CardId) -> Option<&MazeCard> {
        self.cards.get(id.0)
    }

    pub(crate) fn card_mut(&mut self, id: CardId) -> Option<&mut MazeCard> {
        self.cards.get_mut(id.0)
    }

    /// All cards of the game, placed or not, ordered by identifier.
    pub fn cards(&self) -> &[MazeCard] {
        &self.cards
    }

    /// Location of the given card, or `None` if it is not on the grid.
    pub fn location_of(&self, card: CardId) -> Option<BoardLocation> {
        self.cells
            .iter()
            .position(|&id| id == card)
            .map(location_at)
    }

    /// Inserts a card at a border location, pushing the line of cards one
    /// step toward the opposite border.
    ///
    /// Returns the card pushed out at the far end.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` for locations outside the maze and
    /// `InvalidShiftLocation` for locations that are not insert locations.
    /// The maze is unchanged on error.
    #[instrument(skip(self))]
    pub fn shift(
        &mut self,
        insert_location: BoardLocation,
        inserted: CardId,
    ) -> LabyrinthResult<CardId> {
        if !Self::is_inside(insert_location) {
            return Err(LabyrinthError::InvalidLocation(insert_location));
        }
        if !self.insert_locations.contains(&insert_location) {
            return Err(LabyrinthError::InvalidShiftLocation(insert_location));
        }
        let direction = shift_direction(insert_location)?;

        let line: Vec<usize> = std::iter::successors(Some(insert_location), |location| {
            Some(location.step(direction)).filter(|next| Self::is_inside(*next))
        })
        .filter_map(index_of)
        .collect();

        let far_end = line[line.len() - 1];
        let pushed_out = self.cells[far_end];
        for step in (1..line.len()).rev() {
            self.cells[line[step]] = self.cells[line[step - 1]];
        }
        self.cells[line[0]] = inserted;

        debug!(%direction, pushed_out = %pushed_out, "Shifted maze line");
        Ok(pushed_out)
    }
}

impl Maze {
    /// Insert location at the other end of the line shifted from `location`.
    ///
    /// Inserting there right after inserting at `location` undoes the shift.
    /// Locations off the border map to themselves.
    pub fn opposing_shift_location(location: BoardLocation) -> BoardLocation {
        let last = MAZE_SIZE - 1;
        match shift_direction(location) {
            Ok(Direction::North) => BoardLocation::new(0, location.column),
            Ok(Direction::South) => BoardLocation::new(last, location.column),
            Ok(Direction::West) => BoardLocation::new(location.row, 0),
            Ok(Direction::East) => BoardLocation::new(location.row, last),
            Err(_) => location,
        }
    }

    /// Where whatever stands at `location` ends up after inserting at
    /// `insert_location`.
    ///
    /// Locations on the shifted line advance one step; the far end wraps
    /// around to the insert location. Other locations stay put.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShiftLocation` if `insert_location` is not on the
    /// border.
    pub fn location_after_shift(
        location: BoardLocation,
        insert_location: BoardLocation,
    ) -> LabyrinthResult<BoardLocation> {
        let direction = shift_direction(insert_location)?;
        let on_line = match direction {
            Direction::North | Direction::South => location.column == insert_location.column,
            Direction::East | Direction::West => location.row == insert_location.row,
        };
        if !on_line {
            return Ok(location);
        }
        let next = location.step(direction);
        Ok(if Self::is_inside(next) {
            next
        } else {
            insert_location
        })
    }
}

/// Direction in which cards move when inserting at the given border location.
fn shift_direction(location: BoardLocation) -> LabyrinthResult<Direction> {
    let last = MAZE_SIZE - 1;
    if location.row == last {
        Ok(Direction::North)
    } else if location.row == 0 {
        Ok(Direction::South)
    } else if location.column == last {
        Ok(Direction::West)
    } else if location.column == 0 {
        Ok(Direction::East)
    } else {
        Err(LabyrinthError::InvalidShiftLocation(location))
    }
}

/// Every other border cell, corners excluded.
fn standard_insert_locations() -> HashSet<BoardLocation> {
    let last = MAZE_SIZE - 1;
    (1..MAZE_SIZE)
        .step_by(2)
        .flat_map(|position| {
            [
                BoardLocation::new(0, position),
                BoardLocation::new(position, 0),
                BoardLocation::new(last, position),
                BoardLocation::new(position, last),
            ]
        })
        .collect()
}

/// First shape and rotation whose open paths are exactly `open`.
fn card_for_paths(open: &[Direction]) -> Option<(Shape, u16)> {
    [Shape::Straight, Shape::Corner, Shape::TJunction]
        .into_iter()
        .flat_map(|shape| ROTATIONS.into_iter().map(move |rotation| (shape, rotation)))
        .find(|&(shape, rotation)| {
            let card = MazeCard::new(CardId(0), shape, rotation);
            card.out_paths().eq(open.iter().copied())
        })
}

fn locations() -> impl Iterator<Item = BoardLocation> + Clone {
    (0..MAZE_SIZE).flat_map(|row| (0..MAZE_SIZE).map(move |column| BoardLocation::new(row, column)))
}

fn index_of(location: BoardLocation) -> Option<usize> {
    Maze::is_inside(location).then(|| (location.row * MAZE_SIZE + location.column) as usize)
}

fn location_at(index: usize) -> BoardLocation {
    let index = index as i32;
    BoardLocation::new(index / MAZE_SIZE, index % MAZE_SIZE)
}
