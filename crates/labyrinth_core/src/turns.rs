//! Turn progression.
//!
//! [`Turns`] keeps the ordered sequence of `(player, action)` entries and a
//! pointer to the entry whose action is expected next. With a prepare delay
//! configured, every player's turn starts with a `PrepareShift` entry that no
//! request can satisfy: a timer task advances it to the same player's `Shift`
//! once the delay has elapsed.
//!
//! All state sits behind a single mutex. Timer tasks capture the generation
//! counter when armed; every pointer mutation bumps the counter, so a timer
//! that fires after the state moved on finds a different generation and does
//! nothing.
//!
//! Callbacks run synchronously while the lock is held and must not call back
//! into the scheduler. Queue the notification and act on it later instead.

use crate::error::{LabyrinthError, LabyrinthResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// Identifier of a player within a game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub struct PlayerId(usize);

impl PlayerId {
    /// Creates a player identifier.
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// The numeric value.
    pub fn value(self) -> usize {
        self.0
    }
}

/// An action a player has to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Waiting phase before a shift; ends by itself after the prepare delay.
    PrepareShift,
    /// Insert the leftover card into the maze.
    Shift,
    /// Move the piece.
    Move,
}

/// Notification that the player is now expected to perform the given action.
pub type TurnCallback = Arc<dyn Fn(Action) + Send + Sync>;

/// The player and the action expected next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerAction {
    /// The player whose turn it is.
    pub player: PlayerId,
    /// The action the player has to perform.
    pub action: Action,
}

impl PlayerAction {
    /// Creates a player action.
    pub fn new(player: PlayerId, action: Action) -> Self {
        Self { player, action }
    }
}

struct TurnEntry {
    player: PlayerId,
    action: Action,
    callback: Option<TurnCallback>,
}

impl TurnEntry {
    fn player_action(&self) -> PlayerAction {
        PlayerAction::new(self.player, self.action)
    }

    fn notify(&self) {
        trace!(player = %self.player, action = %self.action, "Notifying player");
        if let Some(callback) = &self.callback {
            callback(self.action);
        }
    }
}

impl std::fmt::Debug for TurnEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnEntry")
            .field("player", &self.player)
            .field("action", &self.action)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct TurnState {
    entries: Vec<TurnEntry>,
    current: Option<usize>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl TurnState {
    fn current_entry(&self) -> Option<&TurnEntry> {
        self.current.and_then(|index| self.entries.get(index))
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            trace!("Cancelling prepare timer");
            timer.abort();
        }
    }

    /// Moves the pointer and invalidates any timer armed for the old slot.
    fn point_to(&mut self, index: Option<usize>) {
        self.current = index;
        self.generation += 1;
    }
}

fn lock(state: &Mutex<TurnState>) -> MutexGuard<'_, TurnState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Manages the players' turns and the order of their actions.
#[derive(Debug)]
pub struct Turns {
    state: Arc<Mutex<TurnState>>,
    prepare_delay: Option<Duration>,
    runtime: Option<Handle>,
}

impl Turns {
    /// Creates an empty turn progression.
    ///
    /// A zero delay is the same as no delay.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` if a prepare delay is requested outside of
    /// a tokio runtime; prepare timers run as tasks on the current runtime.
    #[instrument]
    pub fn new(prepare_delay: Option<Duration>) -> LabyrinthResult<Self> {
        let prepare_delay = prepare_delay.filter(|delay| !delay.is_zero());
        let runtime = match prepare_delay {
            Some(_) => Some(Handle::try_current().map_err(|_| {
                LabyrinthError::InvalidArguments(
                    "a prepare delay requires a running tokio runtime".to_string(),
                )
            })?),
            None => None,
        };
        Ok(Self {
            state: Arc::new(Mutex::new(TurnState::default())),
            prepare_delay,
            runtime,
        })
    }

    /// The configured prepare delay, if any.
    pub fn prepare_delay(&self) -> Option<Duration> {
        self.prepare_delay
    }

    /// Adds a player to the end of the progression, unless already present.
    #[instrument(skip(self, callback))]
    pub fn add_player(&self, player: PlayerId, callback: Option<TurnCallback>) {
        let mut state = lock(&self.state);
        if state.entries.iter().any(|entry| entry.player == player) {
            debug!(%player, "Player already registered");
            return;
        }

        let actions: &[Action] = if self.prepare_delay.is_some() {
            &[Action::PrepareShift, Action::Shift, Action::Move]
        } else {
            &[Action::Shift, Action::Move]
        };
        for &action in actions {
            state.entries.push(TurnEntry {
                player,
                action,
                callback: callback.clone(),
            });
        }
        debug!(%player, entries = state.entries.len(), "Player registered");
    }

    /// Starts the progression with the first entry and notifies its player.
    #[instrument(skip(self))]
    pub fn start(&self) {
        let mut state = lock(&self.state);
        state.cancel_timer();
        if state.entries.is_empty() {
            state.point_to(None);
            debug!("No players registered, nothing to start");
            return;
        }
        state.point_to(Some(0));
        info!("Turns started");
        self.enter_current(&mut state);
    }

    /// Whether the player is expected to perform the action now.
    ///
    /// Always false for [`Action::PrepareShift`], which only the prepare
    /// timer can complete.
    pub fn is_action_possible(&self, player: PlayerId, action: Action) -> bool {
        action != Action::PrepareShift
            && lock(&self.state)
                .current_entry()
                .is_some_and(|entry| entry.player_action() == PlayerAction::new(player, action))
    }

    /// Records that the player performed the action and hands the turn to
    /// the next entry, notifying its player.
    ///
    /// # Errors
    ///
    /// Returns `TurnActionViolation` if the action is not the one expected
    /// from this player; the progression is unchanged in that case.
    #[instrument(skip(self))]
    pub fn perform_action(&self, player: PlayerId, action: Action) -> LabyrinthResult<()> {
        let mut state = lock(&self.state);
        let expected = state.current_entry().map(TurnEntry::player_action);
        let current = match state.current {
            Some(current)
                if action != Action::PrepareShift
                    && expected == Some(PlayerAction::new(player, action)) =>
            {
                current
            }
            _ => {
                warn!(%player, %action, ?expected, "Action out of turn");
                return Err(LabyrinthError::TurnActionViolation { player, action });
            }
        };

        state.cancel_timer();
        let next = (current + 1) % state.entries.len();
        state.point_to(Some(next));

        let upcoming = state.entries[next].player_action();
        debug!(from = ?expected, to = ?upcoming, "Turn advanced");
        if upcoming.action == Action::PrepareShift || Some(upcoming) != expected {
            self.enter_current(&mut state);
        }
        Ok(())
    }

    /// Removes all of the player's entries.
    ///
    /// If it was the player's turn, the turn passes to the next remaining
    /// entry, whose player is notified. Otherwise nobody is notified and a
    /// pending prepare timer keeps running.
    #[instrument(skip(self))]
    pub fn remove_player(&self, player: PlayerId) {
        let mut state = lock(&self.state);
        if !state.entries.iter().any(|entry| entry.player == player) {
            debug!(%player, "Player not registered");
            return;
        }

        let had_turn = state
            .current_entry()
            .is_some_and(|entry| entry.player == player);
        let kept_before_current = state.current.map(|current| {
            state.entries[..current]
                .iter()
                .filter(|entry| entry.player != player)
                .count()
        });
        state.entries.retain(|entry| entry.player != player);
        info!(%player, remaining = state.entries.len(), "Player removed from turns");

        if state.entries.is_empty() {
            state.cancel_timer();
            state.point_to(None);
            return;
        }

        if !had_turn {
            // Same entry, new index.
            state.current = kept_before_current;
            return;
        }

        state.cancel_timer();
        let len = state.entries.len();
        state.point_to(kept_before_current.map(|index| index % len));
        self.enter_current(&mut state);
    }

    /// The player and action expected next, or `None` without players.
    pub fn next_player_action(&self) -> Option<PlayerAction> {
        lock(&self.state)
            .current_entry()
            .map(TurnEntry::player_action)
    }

    /// Notifies the current entry and arms the prepare timer if needed.
    fn enter_current(&self, state: &mut TurnState) {
        let Some(entry) = state.current_entry() else {
            return;
        };
        entry.notify();
        if entry.action == Action::PrepareShift {
            self.arm_prepare_timer(state);
        }
    }

    fn arm_prepare_timer(&self, state: &mut TurnState) {
        let (Some(delay), Some(runtime)) = (self.prepare_delay, &self.runtime) else {
            return;
        };
        state.cancel_timer();

        let generation = state.generation;
        let shared: Weak<Mutex<TurnState>> = Arc::downgrade(&self.state);
        trace!(generation, ?delay, "Arming prepare timer");
        state.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                finish_prepare(&shared, generation);
            }
        }));
    }
}

impl Default for Turns {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(TurnState::default())),
            prepare_delay: None,
            runtime: None,
        }
    }
}

impl Drop for Turns {
    fn drop(&mut self) {
        lock(&self.state).cancel_timer();
    }
}

/// Timer body: advances from `PrepareShift` to the same player's `Shift`.
fn finish_prepare(shared: &Mutex<TurnState>, generation: u64) {
    let mut state = lock(shared);
    if state.generation != generation {
        debug!(generation, live = state.generation, "Ignoring stale prepare timer");
        return;
    }
    let Some(current) = state
        .current
        .filter(|&index| state.entries[index].action == Action::PrepareShift)
    else {
        return;
    };

    state.timer = None;
    let next = (current + 1) % state.entries.len();
    state.point_to(Some(next));
    let entry = &state.entries[next];
    debug!(player = %entry.player, "Prepare phase over");
    entry.notify();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (TurnCallback, Arc<Mutex<Vec<Action>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let callback: TurnCallback = Arc::new(move |action| sink.lock().unwrap().push(action));
        (callback, calls)
    }

    fn player(value: usize) -> PlayerId {
        PlayerId::new(value)
    }

    #[test]
    fn test_next_player_action_without_players_is_none() {
        let turns = Turns::default();
        turns.start();
        assert_eq!(turns.next_player_action(), None);
    }

    #[test]
    fn test_add_player_is_idempotent() {
        let turns = Turns::default();
        turns.add_player(player(7), None);
        turns.add_player(player(7), None);
        turns.start();
        turns.perform_action(player(7), Action::Shift).unwrap();
        turns.perform_action(player(7), Action::Move).unwrap();
        assert_eq!(
            turns.next_player_action(),
            Some(PlayerAction::new(player(7), Action::Shift))
        );
    }

    #[test]
    fn test_invalid_action_does_not_alter_turns() {
        let turns = Turns::default();
        turns.add_player(player(7), None);
        turns.add_player(player(11), None);
        turns.start();

        assert_eq!(
            turns.perform_action(player(11), Action::Shift),
            Err(LabyrinthError::TurnActionViolation {
                player: player(11),
                action: Action::Shift
            })
        );
        turns.perform_action(player(7), Action::Shift).unwrap();
        turns.perform_action(player(7), Action::Move).unwrap();
        turns.perform_action(player(11), Action::Shift).unwrap();
        assert!(turns.perform_action(player(11), Action::Shift).is_err());
    }

    #[test]
    fn test_is_action_possible_does_not_mutate() {
        let turns = Turns::default();
        turns.add_player(player(1), None);
        turns.start();
        for _ in 0..5 {
            assert!(turns.is_action_possible(player(1), Action::Shift));
            assert!(!turns.is_action_possible(player(1), Action::Move));
        }
        assert_eq!(
            turns.next_player_action(),
            Some(PlayerAction::new(player(1), Action::Shift))
        );
    }

    #[test]
    fn test_callback_fires_on_every_handoff_with_one_player() {
        let turns = Turns::default();
        let (callback, calls) = recorder();
        turns.add_player(player(1), Some(callback));

        turns.start();
        turns.perform_action(player(1), Action::Shift).unwrap();
        turns.perform_action(player(1), Action::Move).unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec![Action::Shift, Action::Move, Action::Shift]
        );
    }

    #[test]
    fn test_removing_non_current_player_keeps_pointer_and_stays_silent() {
        let turns = Turns::default();
        let (first, first_calls) = recorder();
        let (second, second_calls) = recorder();
        let (third, third_calls) = recorder();
        turns.add_player(player(1), Some(first));
        turns.add_player(player(2), Some(second));
        turns.add_player(player(3), Some(third));
        turns.start();
        turns.perform_action(player(1), Action::Shift).unwrap();
        turns.perform_action(player(1), Action::Move).unwrap();
        turns.perform_action(player(2), Action::Shift).unwrap();
        first_calls.lock().unwrap().clear();
        second_calls.lock().unwrap().clear();

        turns.remove_player(player(1));

        assert_eq!(
            turns.next_player_action(),
            Some(PlayerAction::new(player(2), Action::Move))
        );
        assert!(first_calls.lock().unwrap().is_empty());
        assert!(second_calls.lock().unwrap().is_empty());
        assert!(third_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_removing_last_entry_holder_wraps_to_front() {
        let turns = Turns::default();
        let (first, first_calls) = recorder();
        turns.add_player(player(1), Some(first));
        turns.add_player(player(2), None);
        turns.start();
        turns.perform_action(player(1), Action::Shift).unwrap();
        turns.perform_action(player(1), Action::Move).unwrap();
        turns.perform_action(player(2), Action::Shift).unwrap();
        first_calls.lock().unwrap().clear();

        turns.remove_player(player(2));

        assert_eq!(
            turns.next_player_action(),
            Some(PlayerAction::new(player(1), Action::Shift))
        );
        assert_eq!(*first_calls.lock().unwrap(), vec![Action::Shift]);
    }

    #[test]
    fn test_prepare_delay_outside_runtime_fails() {
        let result = Turns::new(Some(Duration::from_millis(10)));
        assert!(matches!(result, Err(LabyrinthError::InvalidArguments(_))));
    }

    #[test]
    fn test_zero_prepare_delay_means_no_prepare_phase() {
        let turns = Turns::new(Some(Duration::ZERO)).unwrap();
        turns.add_player(player(1), None);
        turns.start();
        assert_eq!(
            turns.next_player_action(),
            Some(PlayerAction::new(player(1), Action::Shift))
        );
    }
}
