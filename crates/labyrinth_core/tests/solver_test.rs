//! Solver plans on a hand-drawn maze where one shift opens the way.

use labyrinth_core::{
    Board, BoardLocation, DEFAULT_SEARCH_DEPTH, Graph, Maze, PieceId, Shape, SolverAction,
    best_actions,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Every row is two horizontal corridors, columns 0 to 2 and 4 to 6,
/// separated by a vertical straight in column 3. The leftover is a straight.
fn gated_lines() -> Vec<&'static str> {
    (0..7)
        .flat_map(|_| {
            [
                "##########.##########",
                ".........#.#.........",
                "##########.##########",
            ]
        })
        .collect()
}

fn loc(row: i32, column: i32) -> BoardLocation {
    BoardLocation::new(row, column)
}

/// Board with one piece at (0, 0) whose objective is the card at (0, 5).
fn gated_board() -> (Board, PieceId) {
    let (maze, leftover) = Maze::from_text(&gated_lines(), Shape::Straight).unwrap();
    let mut board = Board::new(maze, leftover, ChaCha8Rng::seed_from_u64(3)).unwrap();
    let piece = board.create_piece();
    let objective = board.maze().get(loc(0, 5)).unwrap();
    board.set_objective(piece, objective).unwrap();
    (board, piece)
}

fn play(board: &mut Board, piece: PieceId, plan: &[SolverAction]) {
    for action in plan {
        board
            .shift(action.shift_location, i32::from(action.rotation))
            .unwrap();
        board.move_piece(piece, action.move_location).unwrap();
    }
}

#[test]
fn test_objective_behind_gate_is_unreachable_without_shift() {
    let (board, piece) = gated_board();
    let objective = board.piece(piece).unwrap().objective();

    assert_eq!(board.piece_location(piece), Some(loc(0, 0)));
    assert_eq!(board.maze().location_of(objective), Some(loc(0, 5)));
    assert!(!Graph::new(board.maze()).is_reachable(loc(0, 0), loc(0, 5)).unwrap());
}

#[test]
fn test_only_horizontal_insert_at_gate_column_works() {
    let (mut board, piece) = gated_board();

    let plan = best_actions(&board, piece, 1).unwrap();

    assert_eq!(
        plan,
        vec![SolverAction {
            shift_location: loc(0, 3),
            rotation: 90,
            move_location: loc(0, 5),
        }]
    );

    play(&mut board, piece, &plan);
    assert_eq!(board.piece(piece).unwrap().score(), 1);
}

#[test]
fn test_undoing_previous_shift_is_not_considered() {
    let (mut board, piece) = gated_board();
    // Pushing column 3 north makes its top insert location the undo move.
    board.shift(loc(6, 3), 0).unwrap();
    assert_eq!(board.previous_shift_location(), Some(loc(6, 3)));

    assert_eq!(best_actions(&board, piece, 1).unwrap(), Vec::new());

    let plan = best_actions(&board, piece, 2).unwrap();
    assert_eq!(plan.len(), 2);
    assert_ne!(plan[0].shift_location, loc(0, 3));
    assert_eq!(plan[1].move_location, loc(0, 5));

    play(&mut board, piece, &plan);
    assert_eq!(board.piece(piece).unwrap().score(), 1);
}

#[test]
fn test_generated_board_plans_are_playable() {
    for seed in 0..4 {
        let mut board = Board::generate(Some(seed));
        let piece = board.create_piece();

        let plan = best_actions(&board, piece, DEFAULT_SEARCH_DEPTH).unwrap();
        assert!(plan.len() <= DEFAULT_SEARCH_DEPTH);

        if let Some(first) = plan.first() {
            board
                .shift(first.shift_location, i32::from(first.rotation))
                .unwrap();
            board.move_piece(piece, first.move_location).unwrap();
        }
    }
}
