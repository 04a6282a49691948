//! Games played by computer players.
//!
//! Each bot registers a callback that forwards its turn notifications into a
//! channel. The driver loop waits on that channel and answers every
//! notification. On a shift it asks the solver for a plan toward the bot's
//! objective and plays its first turn, falling back to a random shift when
//! no plan exists. The move then follows the plan, or heads for the
//! objective or a random reachable location.

use anyhow::{Context, Result, bail};
use labyrinth_core::{
    Action, BoardLocation, DEFAULT_SEARCH_DEPTH, Game, GameConfig, Graph, MAX_PLAYERS, PieceId,
    PlayerAction, PlayerId, TurnCallback, best_actions,
};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

const ROTATIONS: [i32; 4] = [0, 90, 180, 270];

/// Slack on top of the prepare delay before a missing notification is an error.
const NOTIFICATION_GRACE: Duration = Duration::from_secs(1);

/// Parameters of a simulated game.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Number of bots.
    pub players: usize,
    /// Moves to play in total before stopping.
    pub moves: usize,
    /// Game configuration.
    pub config: GameConfig,
}

/// Final state of one bot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    /// The bot's player identifier.
    pub player: PlayerId,
    /// Objectives reached.
    pub score: u32,
    /// Where the bot's piece ended up.
    pub location: Option<BoardLocation>,
}

/// Outcome of a simulated game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Seed the game was played with, if any.
    pub seed: Option<u64>,
    /// Shifts performed.
    pub shifts: usize,
    /// Moves performed.
    pub moves: usize,
    /// Per-bot results in joining order.
    pub players: Vec<PlayerSummary>,
    /// The maze after the last move, in text form.
    pub maze: Vec<String>,
}

/// Plays a game between solver-driven bots until the configured number of moves.
#[instrument(skip(settings), fields(players = settings.players, moves = settings.moves))]
pub async fn run(settings: SimulationSettings) -> Result<SimulationSummary> {
    if settings.players == 0 || settings.players > MAX_PLAYERS {
        bail!("Between 1 and {} players can take part", MAX_PLAYERS);
    }

    let config = &settings.config;
    let mut game = Game::new(1, config).context("Failed to create game")?;
    let (sender, mut notifications) = mpsc::unbounded_channel();
    for _ in 0..settings.players {
        let slot = Arc::new(OnceLock::new());
        let callback_slot = Arc::clone(&slot);
        let sender = sender.clone();
        let callback: TurnCallback = Arc::new(move |action| {
            if let Some(&player) = callback_slot.get() {
                // The receiver only goes away once the simulation is over.
                let _ = sender.send(PlayerAction::new(player, action));
            }
        });
        let player = game.add_player(Some(callback))?;
        let _ = slot.set(player);
    }
    drop(sender);

    let mut rng = match config.seed() {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        None => ChaCha8Rng::from_entropy(),
    };
    let wait = config.prepare_delay().unwrap_or_default() + NOTIFICATION_GRACE;

    info!("Starting simulation");
    game.start_game();

    let mut shifts = 0;
    let mut moves = 0;
    let mut planned_moves: HashMap<PlayerId, BoardLocation> = HashMap::new();
    while moves < settings.moves {
        let PlayerAction { player, action } = next_notification(&mut notifications, wait).await?;
        match action {
            Action::PrepareShift => {
                debug!(%player, "Waiting for prepare phase");
            }
            Action::Shift => {
                let piece = piece_of(&game, player)?;
                let plan = best_actions(game.board(), piece, DEFAULT_SEARCH_DEPTH)?;
                match plan.first() {
                    Some(action) => {
                        debug!(%player, turns = plan.len(), "Following plan");
                        game.shift(player, action.shift_location, i32::from(action.rotation))?;
                        planned_moves.insert(player, action.move_location);
                    }
                    None => {
                        let insert_location = random_insert_location(&game, &mut rng)?;
                        let rotation = *ROTATIONS.choose(&mut rng).unwrap_or(&0);
                        game.shift(player, insert_location, rotation)?;
                    }
                }
                shifts += 1;
            }
            Action::Move => {
                let target = match planned_moves.remove(&player) {
                    Some(target) if is_reachable_for(&game, player, target)? => target,
                    _ => choose_target(&game, player, &mut rng)?,
                };
                game.move_piece(player, target)?;
                moves += 1;
            }
        }
    }

    let summary = summarize(&game, *config.seed(), shifts, moves);
    info!(shifts, moves, "Simulation finished");
    Ok(summary)
}

async fn next_notification(
    notifications: &mut UnboundedReceiver<PlayerAction>,
    wait: Duration,
) -> Result<PlayerAction> {
    match timeout(wait, notifications.recv()).await {
        Ok(Some(notification)) => Ok(notification),
        Ok(None) => bail!("Turn notifications stopped"),
        Err(_) => {
            warn!(?wait, "No turn notification received");
            bail!("Timed out waiting for a turn notification")
        }
    }
}

fn random_insert_location(game: &Game, rng: &mut ChaCha8Rng) -> Result<BoardLocation> {
    let mut locations: Vec<BoardLocation> = game
        .board()
        .maze()
        .insert_locations()
        .iter()
        .copied()
        .collect();
    locations.sort();
    locations
        .choose(rng)
        .copied()
        .context("Maze has no insert locations")
}

fn piece_of(game: &Game, player: PlayerId) -> Result<PieceId> {
    game.player(player)?
        .piece()
        .with_context(|| format!("Player {} has no piece", player))
}

fn is_reachable_for(game: &Game, player: PlayerId, target: BoardLocation) -> Result<bool> {
    let piece = piece_of(game, player)?;
    let Some(source) = game.board().piece_location(piece) else {
        return Ok(false);
    };
    Ok(Graph::new(game.board().maze()).is_reachable(source, target)?)
}

/// The objective if it can be reached, otherwise a random reachable location.
fn choose_target(game: &Game, player: PlayerId, rng: &mut ChaCha8Rng) -> Result<BoardLocation> {
    let board = game.board();
    let piece_id = piece_of(game, player)?;
    let piece = board
        .piece(piece_id)
        .with_context(|| format!("Piece {} is not on the board", piece_id))?;
    let source = board
        .piece_location(piece_id)
        .with_context(|| format!("Piece {} is not in the maze", piece_id))?;

    let mut reachable: Vec<BoardLocation> = Graph::new(board.maze())
        .reachable_locations(source)?
        .into_iter()
        .collect();
    reachable.sort();

    let objective = board.maze().location_of(piece.objective());
    if let Some(objective) = objective.filter(|location| reachable.contains(location)) {
        debug!(%player, %objective, "Heading for objective");
        return Ok(objective);
    }
    Ok(*reachable.choose(rng).unwrap_or(&source))
}

fn summarize(game: &Game, seed: Option<u64>, shifts: usize, moves: usize) -> SimulationSummary {
    let board = game.board();
    let players = game
        .players()
        .iter()
        .map(|player| {
            let piece = player.piece().and_then(|id| board.piece(id));
            PlayerSummary {
                player: player.id(),
                score: piece.map_or(0, |piece| piece.score()),
                location: player.piece().and_then(|id| board.piece_location(id)),
            }
        })
        .collect();
    SimulationSummary {
        seed,
        shifts,
        moves,
        players,
        maze: board.maze().to_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(players: usize, moves: usize, config: GameConfig) -> SimulationSettings {
        SimulationSettings {
            players,
            moves,
            config,
        }
    }

    #[tokio::test]
    async fn test_simulation_plays_requested_moves() {
        let summary = run(settings(3, 12, GameConfig::new(None, Some(5))))
            .await
            .unwrap();

        assert_eq!(summary.moves, 12);
        assert_eq!(summary.shifts, 12);
        assert_eq!(summary.players.len(), 3);
        assert!(summary.players.iter().all(|p| p.location.is_some()));
        assert_eq!(summary.maze.len(), 21);
    }

    #[tokio::test]
    async fn test_lone_solver_bot_scores() {
        let summary = run(settings(1, 20, GameConfig::new(None, Some(5))))
            .await
            .unwrap();

        assert!(summary.players[0].score > 0);
    }

    #[test]
    fn test_planned_move_is_reachable_after_planned_shift() {
        let mut game = Game::new(1, &GameConfig::new(None, Some(21))).unwrap();
        let player = game.add_player(None).unwrap();
        game.start_game();
        let piece = piece_of(&game, player).unwrap();

        let plan = best_actions(game.board(), piece, DEFAULT_SEARCH_DEPTH).unwrap();
        let Some(action) = plan.first() else {
            return;
        };
        game.shift(player, action.shift_location, i32::from(action.rotation))
            .unwrap();

        assert!(is_reachable_for(&game, player, action.move_location).unwrap());
        game.move_piece(player, action.move_location).unwrap();
    }

    #[tokio::test]
    async fn test_seeded_simulations_are_identical() {
        let first = run(settings(2, 10, GameConfig::new(None, Some(77))))
            .await
            .unwrap();
        let second = run(settings(2, 10, GameConfig::new(None, Some(77))))
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_simulation_with_prepare_phase() {
        let summary = run(settings(2, 4, GameConfig::new(Some(5), Some(9))))
            .await
            .unwrap();

        assert_eq!(summary.moves, 4);
    }

    #[tokio::test]
    async fn test_player_count_is_validated() {
        assert!(run(settings(0, 1, GameConfig::default())).await.is_err());
        assert!(
            run(settings(MAX_PLAYERS + 1, 1, GameConfig::default()))
                .await
                .is_err()
        );
    }

    #[test]
    fn test_choose_target_is_reachable() {
        let mut game = Game::new(1, &GameConfig::new(None, Some(13))).unwrap();
        let player = game.add_player(None).unwrap();
        game.start_game();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let target = choose_target(&game, player, &mut rng).unwrap();

        let piece = game.player(player).unwrap().piece().unwrap();
        let source = game.board().piece_location(piece).unwrap();
        assert!(Graph::new(game.board().maze()).is_reachable(source, target).unwrap());
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let mut game = Game::new(1, &GameConfig::new(None, Some(1))).unwrap();
        game.add_player(None).unwrap();
        game.start_game();

        let json = serde_json::to_value(summarize(&game, Some(1), 0, 0)).unwrap();

        assert_eq!(json["seed"], 1);
        assert_eq!(json["players"][0]["score"], 0);
        assert_eq!(json["maze"].as_array().unwrap().len(), 21);
    }
}
