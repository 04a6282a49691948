//! Board coordinates and compass directions.

use serde::{Deserialize, Serialize};

/// A location on the board, defined by row and column.
///
/// The location does not know the extent of the maze; negative or too large
/// coordinates are representable and rejected by the maze itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardLocation {
    /// Row, counted from the top.
    pub row: i32,
    /// Column, counted from the left.
    pub column: i32,
}

impl BoardLocation {
    /// Creates a new location.
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Returns a new location offset by the given deltas.
    pub const fn add(self, row_delta: i32, column_delta: i32) -> Self {
        Self::new(self.row + row_delta, self.column + column_delta)
    }

    /// Returns the neighboring location in the given direction.
    pub const fn step(self, direction: Direction) -> Self {
        let (row_delta, column_delta) = direction.delta();
        self.add(row_delta, column_delta)
    }
}

impl std::fmt::Display for BoardLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// One of the four absolute directions on the board.
///
/// The discriminant is the clockwise index starting at north, which is what
/// rotation arithmetic works on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
pub enum Direction {
    /// Up.
    North = 0,
    /// Right.
    East = 1,
    /// Down.
    South = 2,
    /// Left.
    West = 3,
}

impl Direction {
    /// All directions, clockwise from north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Row and column delta of one step in this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    /// The opposite direction.
    pub const fn mirror(self) -> Self {
        self.turned(2)
    }

    /// Rotates clockwise by the given number of quarter turns (negative turns
    /// rotate counter-clockwise).
    pub const fn turned(self, quarter_turns: i32) -> Self {
        Self::ALL[(self as i32 + quarter_turns).rem_euclid(4) as usize]
    }
}
