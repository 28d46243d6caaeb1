//! Arena of blind games keyed by id.
//!
//! Each game owns its own trackers, previews and reveal guard; nothing is shared between
//! games. Errors from one game are logged and never stop the hub from driving the others.

use std::collections::BTreeMap;

use blindchess_types::{Color, GamePhase};
use tracing::{info, warn};

use crate::game::{BlindGame, GameConfig, GameError, GameEvent, GameId, Notification};
use crate::oracle::LegalityOracle;

pub struct GameHub<O: LegalityOracle + Clone> {
    oracle: O,
    config: GameConfig,
    games: BTreeMap<GameId, BlindGame<O>>,
    next_id: GameId,
}

impl<O: LegalityOracle + Clone> GameHub<O> {
    pub fn new(oracle: O, config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            oracle,
            config,
            games: BTreeMap::new(),
            next_id: 1,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn create_game(&mut self) -> Result<GameId, GameError> {
        let id = self.next_id;
        let game = BlindGame::new(id, self.oracle.clone(), self.config)?;
        self.games.insert(id, game);
        self.next_id += 1;
        info!(game_id = id, "game created");
        Ok(id)
    }

    pub fn game(&self, id: GameId) -> Option<&BlindGame<O>> {
        self.games.get(&id)
    }

    pub fn game_mut(&mut self, id: GameId) -> Option<&mut BlindGame<O>> {
        self.games.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Game `player` already sits in, if any.
    pub fn find_player(&self, player: &str) -> Option<(GameId, Color)> {
        self.games
            .iter()
            .find_map(|(id, game)| game.color_of(player).map(|color| (*id, color)))
    }

    /// Seat `player` at the oldest waiting table, opening a new one if none has room.
    pub fn seat_player(
        &mut self,
        player: &str,
        now_ms: u64,
    ) -> Result<(GameId, Color, Vec<GameEvent>), GameError> {
        if let Some((id, color)) = self.find_player(player) {
            return Ok((id, color, Vec::new()));
        }
        let open = self
            .games
            .iter()
            .find(|(_, game)| game.current_phase() == GamePhase::Waiting && game.has_open_seat())
            .map(|(id, _)| *id);
        let id = match open {
            Some(id) => id,
            None => self.create_game()?,
        };
        let game = self
            .games
            .get_mut(&id)
            .ok_or(GameError::UnknownGame(id))?;
        let (color, events) = game.join(player, now_ms)?;
        Ok((id, color, events))
    }

    /// Drive `id` with a notification.
    pub fn notify(
        &mut self,
        id: GameId,
        notification: Notification,
        now_ms: u64,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.games
            .get_mut(&id)
            .ok_or(GameError::UnknownGame(id))?
            .handle(notification, now_ms)
    }

    /// Fire every timer that is due across all games.
    pub fn tick(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.drive(now_ms, |game, now_ms| game.tick(now_ms))
    }

    /// Reconnect/restart scan: reveal games whose trigger was missed and close finished
    /// playback windows. Safe to run any number of times.
    pub fn recover(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.drive(now_ms, |game, now_ms| game.recover(now_ms))
    }

    fn drive(
        &mut self,
        now_ms: u64,
        step: impl Fn(&mut BlindGame<O>, u64) -> Result<Vec<GameEvent>, GameError>,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for (id, game) in self.games.iter_mut() {
            match step(game, now_ms) {
                Ok(produced) => events.extend(produced),
                Err(err) => warn!(game_id = *id, ?err, "failed to advance game"),
            }
        }
        events
    }

    /// Drop games that reached a phase with no further blind-phase work.
    pub fn prune_finished(&mut self) -> usize {
        let before = self.games.len();
        self.games.retain(|_, game| {
            !matches!(game.current_phase(), GamePhase::Live | GamePhase::Complete)
        });
        before - self.games.len()
    }
}
