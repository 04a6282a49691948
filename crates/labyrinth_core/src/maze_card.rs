//! Maze cards: tiles with a fixed path shape and a mutable rotation.

use crate::error::{LabyrinthError, LabyrinthResult};
use crate::location::Direction;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Identifier of a maze card, issued by the maze's card arena.
///
/// The identifier is the card's index in the arena and is stable for the
/// lifetime of the maze.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("#{}", _0)]
pub struct CardId(pub(crate) usize);

impl CardId {
    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The three card shapes, described by their doors at rotation 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
pub enum Shape {
    /// Path from north to south.
    Straight,
    /// Path from north to east.
    Corner,
    /// Paths to north, east and south.
    TJunction,
}

impl Shape {
    /// Doors of the shape at rotation 0.
    pub fn doors(self) -> &'static [Direction] {
        match self {
            Shape::Straight => &[Direction::North, Direction::South],
            Shape::Corner => &[Direction::North, Direction::East],
            Shape::TJunction => &[Direction::North, Direction::East, Direction::South],
        }
    }

    /// Whether the unrotated shape has a door in the given direction.
    pub fn has_door(self, direction: Direction) -> bool {
        self.doors().contains(&direction)
    }
}

/// Validates a rotation in degrees and normalizes it into `[0, 360)`.
pub fn normalize_rotation(degrees: i32) -> LabyrinthResult<u16> {
    if degrees % 90 != 0 {
        return Err(LabyrinthError::InvalidRotation(degrees));
    }
    Ok(degrees.rem_euclid(360) as u16)
}

/// A single maze card.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct MazeCard {
    /// The card's identifier.
    #[getter(copy)]
    id: CardId,
    /// The card's shape.
    #[getter(copy)]
    shape: Shape,
    /// Rotation in degrees, one of 0, 90, 180 and 270.
    #[getter(copy)]
    rotation: u16,
}

impl MazeCard {
    pub(crate) fn new(id: CardId, shape: Shape, rotation: u16) -> Self {
        Self {
            id,
            shape,
            rotation: rotation % 360,
        }
    }

    /// Sets the rotation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRotation` if `degrees` is not a multiple of 90. The
    /// stored rotation is left untouched in that case.
    pub fn set_rotation(&mut self, degrees: i32) -> LabyrinthResult<()> {
        self.rotation = normalize_rotation(degrees)?;
        Ok(())
    }

    /// Whether there is an outgoing path in the given absolute direction,
    /// taking the rotation into account.
    pub fn has_out_path(&self, direction: Direction) -> bool {
        let turns = i32::from(self.rotation / 90);
        self.shape.has_door(direction.turned(-turns))
    }

    /// Iterator over the absolute directions with an outgoing path.
    pub fn out_paths(&self) -> OutPaths<'_> {
        OutPaths {
            card: self,
            next: 0,
        }
    }
}

/// Lazy iterator over a card's open directions. Clone it to restart.
#[derive(Debug, Clone)]
pub struct OutPaths<'a> {
    card: &'a MazeCard,
    next: usize,
}

impl Iterator for OutPaths<'_> {
    type Item = Direction;

    fn next(&mut self) -> Option<Direction> {
        while let Some(&direction) = Direction::ALL.get(self.next) {
            self.next += 1;
            if self.card.has_out_path(direction) {
                return Some(direction);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(shape: Shape, rotation: u16) -> MazeCard {
        MazeCard::new(CardId(0), shape, rotation)
    }

    #[test]
    fn test_corner_rotated_90_opens_east_and_south() {
        let corner = card(Shape::Corner, 90);
        let open: Vec<_> = corner.out_paths().collect();
        assert_eq!(open, vec![Direction::East, Direction::South]);
    }

    #[test]
    fn test_t_junction_rotated_270() {
        let junction = card(Shape::TJunction, 270);
        assert!(junction.has_out_path(Direction::North));
        assert!(junction.has_out_path(Direction::East));
        assert!(!junction.has_out_path(Direction::South));
        assert!(junction.has_out_path(Direction::West));
    }

    #[test]
    fn test_straight_rotated_180_is_unchanged() {
        let straight = card(Shape::Straight, 180);
        assert!(straight.has_out_path(Direction::North));
        assert!(straight.has_out_path(Direction::South));
        assert!(!straight.has_out_path(Direction::East));
    }

    #[test]
    fn test_set_rotation_normalizes() {
        let mut straight = card(Shape::Straight, 0);
        straight.set_rotation(450).unwrap();
        assert_eq!(straight.rotation(), 90);
        straight.set_rotation(-90).unwrap();
        assert_eq!(straight.rotation(), 270);
        straight.set_rotation(720).unwrap();
        assert_eq!(straight.rotation(), 0);
    }

    #[test]
    fn test_set_rotation_rejects_non_multiples() {
        let mut corner = card(Shape::Corner, 180);
        for degrees in [1, 45, 89, 91, 181, -30] {
            assert_eq!(
                corner.set_rotation(degrees),
                Err(LabyrinthError::InvalidRotation(degrees))
            );
            assert_eq!(corner.rotation(), 180);
        }
    }

    #[test]
    fn test_out_paths_is_restartable() {
        let junction = card(Shape::TJunction, 0);
        let paths = junction.out_paths();
        assert_eq!(paths.clone().count(), 3);
        assert_eq!(paths.count(), 3);
    }
}
