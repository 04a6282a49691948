//! Reachability over the current state of the maze.

use crate::error::{LabyrinthError, LabyrinthResult};
use crate::location::BoardLocation;
use crate::maze::Maze;
use std::collections::{HashSet, VecDeque};
use tracing::{instrument, trace};

/// A location found by [`Graph::multi_source_reachable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachedLocation {
    /// The reached location.
    pub location: BoardLocation,
    /// Index of the source it was reached from.
    pub source: usize,
}

/// Breadth-first search over the maze's connectivity.
///
/// Two neighboring locations are connected only if both cards have an open
/// path toward each other. The graph borrows the maze, so every query sees
/// the maze as it is now; there is nothing to invalidate after a shift.
#[derive(Debug, Clone, Copy)]
pub struct Graph<'a> {
    maze: &'a Maze,
}

impl<'a> Graph<'a> {
    /// Creates a graph view of the maze.
    pub fn new(maze: &'a Maze) -> Self {
        Self { maze }
    }

    /// Whether `target` can be reached from `source`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if `source` is outside the maze.
    pub fn is_reachable(
        &self,
        source: BoardLocation,
        target: BoardLocation,
    ) -> LabyrinthResult<bool> {
        Ok(self.reachable_locations(source)?.contains(&target))
    }

    /// All locations reachable from `source`, including `source` itself.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if `source` is outside the maze.
    pub fn reachable_locations(
        &self,
        source: BoardLocation,
    ) -> LabyrinthResult<HashSet<BoardLocation>> {
        Ok(self
            .multi_source_reachable(&[source])?
            .into_iter()
            .map(|reached| reached.location)
            .collect())
    }

    /// Locations reachable from any of `sources`, in breadth-first order.
    ///
    /// Each location appears once and records the index of the source it was
    /// first reached from. Sources themselves come first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLocation` if a source is outside the maze.
    #[instrument(skip(self, sources), fields(sources = sources.len()))]
    pub fn multi_source_reachable(
        &self,
        sources: &[BoardLocation],
    ) -> LabyrinthResult<Vec<ReachedLocation>> {
        let mut seen = HashSet::with_capacity(sources.len());
        let mut queue = VecDeque::with_capacity(sources.len());
        for (source, &location) in sources.iter().enumerate() {
            if !Maze::is_inside(location) {
                return Err(LabyrinthError::InvalidLocation(location));
            }
            if seen.insert(location) {
                queue.push_back(ReachedLocation { location, source });
            }
        }

        let mut reached = Vec::new();
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current.location)? {
                if seen.insert(neighbor) {
                    queue.push_back(ReachedLocation {
                        location: neighbor,
                        source: current.source,
                    });
                }
            }
            reached.push(current);
        }

        trace!(count = reached.len(), "Computed reachable locations");
        Ok(reached)
    }

    /// Neighbors connected to `location` in both directions.
    fn neighbors(&self, location: BoardLocation) -> LabyrinthResult<Vec<BoardLocation>> {
        let card = self.maze.card_at(location)?;
        let mut connected = Vec::with_capacity(3);
        for direction in card.out_paths() {
            let candidate = location.step(direction);
            if !Maze::is_inside(candidate) {
                continue;
            }
            if self.maze.card_at(candidate)?.has_out_path(direction.mirror()) {
                connected.push(candidate);
            }
        }
        Ok(connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze_card::Shape;

    /// Row 0 is a horizontal corridor: straight cards turned to 90 degrees.
    /// Every other cell is a vertical straight, so columns are corridors too,
    /// except that they do not connect to row 0.
    fn corridor_maze() -> Maze {
        let cells = Maze::locations()
            .map(|location| {
                if location.row == 0 {
                    (Shape::Straight, 90)
                } else {
                    (Shape::Straight, 0)
                }
            })
            .collect();
        Maze::from_shapes(cells, (Shape::Corner, 0)).unwrap().0
    }

    #[test]
    fn test_source_is_always_reachable() {
        let maze = corridor_maze();
        let graph = Graph::new(&maze);
        for location in Maze::locations() {
            assert!(graph.is_reachable(location, location).unwrap());
        }
    }

    #[test]
    fn test_corridor_reaches_whole_row() {
        let maze = corridor_maze();
        let reached = Graph::new(&maze)
            .reachable_locations(BoardLocation::new(0, 3))
            .unwrap();
        let expected: HashSet<_> = (0..7).map(|column| BoardLocation::new(0, column)).collect();
        assert_eq!(reached, expected);
    }

    #[test]
    fn test_connection_requires_both_cards() {
        let maze = corridor_maze();
        let graph = Graph::new(&maze);
        // (1, 2) opens north, but (0, 2) only opens east and west.
        assert!(!graph.is_reachable(BoardLocation::new(1, 2), BoardLocation::new(0, 2)).unwrap());
        assert!(!graph.is_reachable(BoardLocation::new(0, 2), BoardLocation::new(1, 2)).unwrap());
        assert!(graph.is_reachable(BoardLocation::new(1, 2), BoardLocation::new(6, 2)).unwrap());
    }

    #[test]
    fn test_source_outside_fails() {
        let maze = corridor_maze();
        let source = BoardLocation::new(7, 0);
        assert_eq!(
            Graph::new(&maze).reachable_locations(source),
            Err(LabyrinthError::InvalidLocation(source))
        );
    }

    #[test]
    fn test_multi_source_records_first_source() {
        let maze = corridor_maze();
        let sources = [
            BoardLocation::new(0, 0),
            BoardLocation::new(3, 2),
            BoardLocation::new(0, 4),
            BoardLocation::new(0, 0),
        ];

        let reached = Graph::new(&maze).multi_source_reachable(&sources).unwrap();

        assert_eq!(reached.len(), 13);
        assert_eq!(&reached[..3], &[
            ReachedLocation { location: sources[0], source: 0 },
            ReachedLocation { location: sources[1], source: 1 },
            ReachedLocation { location: sources[2], source: 2 },
        ]);
        let source_of = |row, column| {
            reached
                .iter()
                .find(|r| r.location == BoardLocation::new(row, column))
                .map(|r| r.source)
        };
        assert_eq!(source_of(0, 2), Some(0));
        assert_eq!(source_of(0, 3), Some(2));
        assert_eq!(source_of(6, 2), Some(1));
        assert_eq!(source_of(1, 3), None);
    }
}
