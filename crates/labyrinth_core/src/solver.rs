//! Computer player: exhaustive search for shift and move sequences.
//!
//! The search explores game states breadth-first. Each state is the maze
//! after a sequence of the piece's own shifts, together with every location
//! the piece could stand on by then. Successors try each insert location and
//! each distinct rotation of the leftover, skipping the shift that would undo
//! the previous one. The first state in which the objective is reachable
//! yields the plan, so plans are as short as possible.
//!
//! Other players' turns are not modelled; callers re-plan every turn.

use crate::board::{Board, PieceId};
use crate::error::{LabyrinthError, LabyrinthResult};
use crate::graph::{Graph, ReachedLocation};
use crate::location::BoardLocation;
use crate::maze::Maze;
use crate::maze_card::{CardId, Shape};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, instrument};

/// Search depth that keeps a turn's computation well below a second.
pub const DEFAULT_SEARCH_DEPTH: usize = 2;

/// One turn of a plan: where and how to insert the leftover, then where to
/// move the piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolverAction {
    /// Insert location of the shift.
    pub shift_location: BoardLocation,
    /// Rotation of the leftover when inserted, in degrees.
    pub rotation: u16,
    /// Location to move the piece to after the shift.
    pub move_location: BoardLocation,
}

/// A searched state. The root has neither parent nor shift.
struct SearchNode {
    parent: Option<usize>,
    shift: Option<(BoardLocation, u16)>,
    reached: Vec<ReachedLocation>,
}

/// A state waiting to be expanded.
struct Frontier {
    node: usize,
    depth: usize,
    maze: Maze,
    leftover: CardId,
    previous_shift: Option<BoardLocation>,
}

/// Finds the shortest sequence of turns that brings the piece onto its
/// objective, looking at most `max_depth` turns ahead.
///
/// Every turn starts with a shift, so even an objective already in reach
/// takes one turn. Returns an empty plan when no sequence within the depth
/// reaches the objective. Only the first action is guaranteed to be valid
/// once other players have moved.
///
/// # Errors
///
/// Returns `InvalidArguments` for pieces that are unknown or not in the maze.
#[instrument(skip(board))]
pub fn best_actions(
    board: &Board,
    piece: PieceId,
    max_depth: usize,
) -> LabyrinthResult<Vec<SolverAction>> {
    let objective = board
        .piece(piece)
        .ok_or_else(|| LabyrinthError::InvalidArguments(format!("unknown piece {}", piece)))?
        .objective();
    let start = board.piece_location(piece).ok_or_else(|| {
        LabyrinthError::InvalidArguments(format!("piece {} is not in the maze", piece))
    })?;

    if max_depth == 0 {
        return Ok(Vec::new());
    }

    let mut nodes = vec![SearchNode {
        parent: None,
        shift: None,
        reached: vec![ReachedLocation {
            location: start,
            source: 0,
        }],
    }];
    let mut queue = VecDeque::from([Frontier {
        node: 0,
        depth: 0,
        maze: board.maze().clone(),
        leftover: board.leftover(),
        previous_shift: board.previous_shift_location(),
    }]);

    while let Some(state) = queue.pop_front() {
        let forbidden = state.previous_shift.map(Maze::opposing_shift_location);
        let mut shift_locations: Vec<BoardLocation> = state
            .maze
            .insert_locations()
            .iter()
            .copied()
            .filter(|&location| Some(location) != forbidden)
            .collect();
        shift_locations.sort();
        let shape = state
            .maze
            .card(state.leftover)
            .map_or(Shape::TJunction, |card| card.shape());

        for shift_location in shift_locations {
            for &rotation in distinct_rotations(shape) {
                let mut maze = state.maze.clone();
                if let Some(card) = maze.card_mut(state.leftover) {
                    card.set_rotation(i32::from(rotation))?;
                }
                let leftover = maze.shift(shift_location, state.leftover)?;

                let sources = nodes[state.node]
                    .reached
                    .iter()
                    .map(|reached| Maze::location_after_shift(reached.location, shift_location))
                    .collect::<LabyrinthResult<Vec<_>>>()?;
                let reached = Graph::new(&maze).multi_source_reachable(&sources)?;
                let found = reached
                    .iter()
                    .position(|reached| maze.get(reached.location) == Ok(objective));

                nodes.push(SearchNode {
                    parent: Some(state.node),
                    shift: Some((shift_location, rotation)),
                    reached,
                });
                let node = nodes.len() - 1;

                if let Some(index) = found {
                    let plan = reconstruct(&nodes, node, index);
                    debug!(turns = plan.len(), searched = nodes.len(), "Found plan");
                    return Ok(plan);
                }
                if state.depth + 1 < max_depth {
                    queue.push_back(Frontier {
                        node,
                        depth: state.depth + 1,
                        maze,
                        leftover,
                        previous_shift: Some(shift_location),
                    });
                }
            }
        }
    }

    debug!(searched = nodes.len(), "No plan reaches the objective");
    Ok(Vec::new())
}

/// Rotations that give the leftover distinct out paths.
fn distinct_rotations(shape: Shape) -> &'static [u16] {
    match shape {
        Shape::Straight => &[0, 90],
        Shape::Corner | Shape::TJunction => &[0, 90, 180, 270],
    }
}

/// Walks back from the reached objective to the root.
fn reconstruct(nodes: &[SearchNode], mut node: usize, mut index: usize) -> Vec<SolverAction> {
    let mut actions = Vec::new();
    while let (Some(parent), Some((shift_location, rotation))) =
        (nodes[node].parent, nodes[node].shift)
    {
        let reached = nodes[node].reached[index];
        actions.push(SolverAction {
            shift_location,
            rotation,
            move_location: reached.location,
        });
        index = reached.source;
        node = parent;
    }
    actions.reverse();
    actions
}
