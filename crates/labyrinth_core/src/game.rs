//! A single played game: players, board and turns.

use crate::board::{Board, PieceId};
use crate::config::GameConfig;
use crate::error::{LabyrinthError, LabyrinthResult};
use crate::location::BoardLocation;
use crate::turns::{Action, PlayerId, TurnCallback, Turns};
use derive_getters::Getters;
use tracing::{debug, info, instrument, warn};

/// Maximum number of players in one game.
pub const MAX_PLAYERS: usize = 4;

/// Identifier of a game.
pub type GameId = u64;

/// A player taking part in a game.
#[derive(Clone, Getters)]
pub struct Player {
    /// The player's identifier.
    #[getter(copy)]
    id: PlayerId,
    /// The game the player belongs to.
    #[getter(copy)]
    game_id: GameId,
    /// The player's piece, once the game has started.
    #[getter(copy)]
    piece: Option<PieceId>,
    #[getter(skip)]
    callback: Option<TurnCallback>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("game_id", &self.game_id)
            .field("piece", &self.piece)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// One played game.
///
/// All requests go through this type. It checks the turn order before
/// touching the board and advances the turns afterwards.
#[derive(Debug)]
pub struct Game {
    id: GameId,
    players: Vec<Player>,
    board: Board,
    turns: Turns,
    next_player_id: usize,
}

impl Game {
    /// Creates a game with a generated board.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if the configuration asks for a prepare
    /// delay outside of a tokio runtime.
    #[instrument(skip(config))]
    pub fn new(id: GameId, config: &GameConfig) -> LabyrinthResult<Self> {
        let board = Board::generate(*config.seed());
        let turns = Turns::new(config.prepare_delay())?;
        info!(game_id = id, prepare_delay = ?turns.prepare_delay(), "Game created");
        Ok(Self::with_board(id, board, turns))
    }

    /// Creates a game from an existing board and turn progression.
    pub fn with_board(id: GameId, board: Board, turns: Turns) -> Self {
        Self {
            id,
            players: Vec::new(),
            board,
            turns,
            next_player_id: 0,
        }
    }

    /// The game's identifier.
    pub fn id(&self) -> GameId {
        self.id
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The turn progression.
    pub fn turns(&self) -> &Turns {
        &self.turns
    }

    /// All players, in joining order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Finds a player by identifier.
    ///
    /// # Errors
    ///
    /// Returns `PlayerNotFound` if no such player takes part in the game.
    pub fn player(&self, id: PlayerId) -> LabyrinthResult<&Player> {
        self.players
            .iter()
            .find(|player| player.id == id)
            .ok_or(LabyrinthError::PlayerNotFound(id))
    }

    /// Adds a player. The callback is notified whenever the player is
    /// expected to act.
    ///
    /// # Errors
    ///
    /// Returns `GameFull` once [`MAX_PLAYERS`] players have joined.
    #[instrument(skip(self, callback), fields(game_id = self.id))]
    pub fn add_player(&mut self, callback: Option<TurnCallback>) -> LabyrinthResult<PlayerId> {
        if self.players.len() >= MAX_PLAYERS {
            warn!(players = self.players.len(), "Game is full");
            return Err(LabyrinthError::GameFull(MAX_PLAYERS));
        }

        let id = PlayerId::new(self.next_player_id);
        self.next_player_id += 1;
        self.players.push(Player {
            id,
            game_id: self.id,
            piece: None,
            callback,
        });
        info!(player = %id, "Player joined");
        Ok(id)
    }

    /// Removes a player together with their piece and turns.
    ///
    /// If it was the player's turn, the next player is notified.
    ///
    /// # Errors
    ///
    /// Returns `PlayerNotFound` for unknown players.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn remove_player(&mut self, id: PlayerId) -> LabyrinthResult<()> {
        let index = self
            .players
            .iter()
            .position(|player| player.id == id)
            .ok_or(LabyrinthError::PlayerNotFound(id))?;
        let player = self.players.remove(index);
        if let Some(piece) = player.piece {
            self.board.remove_piece(piece);
        }
        self.turns.remove_player(id);
        info!(player = %id, "Player left");
        Ok(())
    }

    /// Places a piece for every player and starts the turns.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn start_game(&mut self) {
        self.board.clear_pieces();
        for player in &mut self.players {
            player.piece = Some(self.board.create_piece());
            self.turns.add_player(player.id, player.callback.clone());
        }
        info!(players = self.players.len(), "Game started");
        self.turns.start();
    }

    /// Shifts the leftover card into the maze on behalf of a player.
    ///
    /// # Errors
    ///
    /// Returns `PlayerNotFound`, the board's shift errors, or
    /// `TurnActionViolation` if it is not the player's turn to shift.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn shift(
        &mut self,
        player_id: PlayerId,
        insert_location: BoardLocation,
        rotation: i32,
    ) -> LabyrinthResult<()> {
        self.player(player_id)?;
        if self.turns.is_action_possible(player_id, Action::Shift) {
            self.board.shift(insert_location, rotation)?;
            debug!("Shift applied");
        }
        self.turns.perform_action(player_id, Action::Shift)
    }

    /// Moves a player's piece.
    ///
    /// # Errors
    ///
    /// Returns `PlayerNotFound`, the board's move errors, or
    /// `TurnActionViolation` if it is not the player's turn to move.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn move_piece(&mut self, player_id: PlayerId, target: BoardLocation) -> LabyrinthResult<()> {
        let piece = self.player(player_id)?.piece;
        if self.turns.is_action_possible(player_id, Action::Move) {
            let piece = piece.ok_or_else(|| {
                LabyrinthError::InvalidArguments(format!("player {} has no piece", player_id))
            })?;
            self.board.move_piece(piece, target)?;
            debug!("Move applied");
        }
        self.turns.perform_action(player_id, Action::Move)
    }
}
