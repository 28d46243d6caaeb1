//! Per-game phase state machine.
//!
//! A [`BlindGame`] owns both seats (blind sequence plus private preview), the reveal guard
//! and, once revealed, the canonical reconciliation output. It is driven entirely by
//! caller-supplied notifications and `now_ms`; it owns no thread and never blocks.
//!
//! ## Idempotency
//! Reconciliation runs at most once per game. Every path that can reveal (both seats
//! submitted, deadline elapsed, recovery on reconnect) goes through [`BlindGame::reveal`],
//! which takes the single-acquire [`RevealGuard`] before doing any work. Signals that lose
//! the race, or arrive late, return no events.

use blindchess_types::{
    BlindMove, BlindRules, BlindSequence, Color, ConfigError, GamePhase, MoveRecord,
    ReconciliationResult, RewardConfig, SequenceError, Settlement, ValidationResult,
    DEFAULT_ENTRY_FEE,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::oracle::{LegalityOracle, OracleError};
use crate::phase::{PhaseConfig, PhaseScheduler};
use crate::preview::BlindPreview;
use crate::reveal::{RevealGuard, RevealTrigger};
use crate::simulator::{Reconciled, Reconciler};

pub type GameId = u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("action not allowed in phase {phase:?}")]
    WrongPhase { phase: GamePhase },
    #[error("{color} already submitted")]
    AlreadySubmitted { color: Color },
    #[error("table is full")]
    TableFull,
    #[error("unknown game {0}")]
    UnknownGame(GameId),
    #[error("move rejected: {}", .0.message())]
    Rejected(ValidationResult),
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Tuning for one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub rules: BlindRules,
    pub rewards: RewardConfig,
    pub phases: PhaseConfig,
    pub entry_fee: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rules: BlindRules::default(),
            rewards: RewardConfig::default(),
            phases: PhaseConfig::default(),
            entry_fee: DEFAULT_ENTRY_FEE,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.rewards.validate()?;
        self.phases.validate()
    }
}

/// Asynchronous signals delivered to a game. Delivery may be duplicated or reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    SequenceSubmitted { color: Color },
    BothSubmitted,
    DeadlineElapsed,
    Reconnect,
    PlaybackFinished,
}

/// Observable outcomes of driving a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PhaseChanged {
        game_id: GameId,
        from: GamePhase,
        to: GamePhase,
        phase_ends_at_ms: Option<u64>,
    },
    SequenceSubmitted {
        game_id: GameId,
        color: Color,
        moves: usize,
    },
    Revealed {
        game_id: GameId,
        result: ReconciliationResult,
    },
    /// Emitted exactly once per game, for the economy ledger.
    Settled {
        game_id: GameId,
        settlement: Settlement,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            GameEvent::PhaseChanged { game_id, .. }
            | GameEvent::SequenceSubmitted { game_id, .. }
            | GameEvent::Revealed { game_id, .. }
            | GameEvent::Settled { game_id, .. } => *game_id,
        }
    }
}

/// Starting point of live play.
#[derive(Clone, Debug)]
pub struct LiveState<P> {
    pub position: P,
    pub fen: String,
    /// Remaining time per player, indexed by [`Color::index`].
    pub clocks_ms: [u64; 2],
    pub started_at_ms: u64,
}

struct Seat<O: LegalityOracle> {
    player: Option<String>,
    sequence: BlindSequence,
    preview: BlindPreview<O>,
}

pub struct BlindGame<O: LegalityOracle> {
    id: GameId,
    oracle: O,
    config: GameConfig,
    scheduler: PhaseScheduler,
    phase: GamePhase,
    phase_ends_at_ms: Option<u64>,
    seats: [Seat<O>; 2],
    reveal_guard: RevealGuard,
    reconciled: Option<Reconciled<O::Position>>,
    live: Option<LiveState<O::Position>>,
    reconciliations: u32,
}

impl<O: LegalityOracle> BlindGame<O> {
    pub fn new(id: GameId, oracle: O, config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let seat = |color| -> Result<Seat<O>, GameError> {
            Ok(Seat {
                player: None,
                sequence: BlindSequence::new(),
                preview: BlindPreview::new(&oracle, color, config.rules)?,
            })
        };
        let seats = [seat(Color::White)?, seat(Color::Black)?];
        Ok(Self {
            id,
            oracle,
            config,
            scheduler: PhaseScheduler::new(config.phases),
            phase: GamePhase::Waiting,
            phase_ends_at_ms: None,
            seats,
            reveal_guard: RevealGuard::new(),
            reconciled: None,
            live: None,
            reconciliations: 0,
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_phase(&self) -> GamePhase {
        self.phase
    }

    pub fn phase_ends_at_ms(&self) -> Option<u64> {
        self.phase_ends_at_ms
    }

    pub fn player(&self, color: Color) -> Option<&str> {
        self.seats[color.index()].player.as_deref()
    }

    pub fn color_of(&self, player: &str) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|color| self.player(*color) == Some(player))
    }

    pub fn has_open_seat(&self) -> bool {
        self.seats.iter().any(|seat| seat.player.is_none())
    }

    pub fn sequence(&self, color: Color) -> &BlindSequence {
        &self.seats[color.index()].sequence
    }

    pub fn preview(&self, color: Color) -> &BlindPreview<O> {
        &self.seats[color.index()].preview
    }

    pub fn result(&self) -> Option<&ReconciliationResult> {
        self.reconciled.as_ref().map(|reconciled| &reconciled.result)
    }

    pub fn live(&self) -> Option<&LiveState<O::Position>> {
        self.live.as_ref()
    }

    pub fn is_reveal_triggered(&self) -> bool {
        self.reveal_guard.is_triggered()
    }

    /// How many times reconciliation ran. Never more than one.
    pub fn reconciliations(&self) -> u32 {
        self.reconciliations
    }

    fn transition(&mut self, to: GamePhase, phase_ends_at_ms: Option<u64>) -> GameEvent {
        let from = std::mem::replace(&mut self.phase, to);
        self.phase_ends_at_ms = phase_ends_at_ms;
        info!(
            game_id = self.id,
            from = from.as_str(),
            to = to.as_str(),
            ?phase_ends_at_ms,
            "phase changed"
        );
        GameEvent::PhaseChanged {
            game_id: self.id,
            from,
            to,
            phase_ends_at_ms,
        }
    }

    /// Seat `player`. The second participant starts the blind phase, so an open seat
    /// implies the game is still waiting.
    ///
    /// Joining again with a seated id returns the existing colour without side effects.
    pub fn join(
        &mut self,
        player: &str,
        now_ms: u64,
    ) -> Result<(Color, Vec<GameEvent>), GameError> {
        if let Some(color) = self.color_of(player) {
            return Ok((color, Vec::new()));
        }
        let color = Color::ALL
            .into_iter()
            .find(|color| self.seats[color.index()].player.is_none())
            .ok_or(GameError::TableFull)?;
        self.seats[color.index()].player = Some(player.to_string());
        info!(game_id = self.id, %color, player, "player seated");

        let mut events = Vec::new();
        if !self.has_open_seat() {
            let deadline = self.scheduler.blind_deadline(now_ms);
            events.push(self.transition(GamePhase::Blind, Some(deadline)));
        }
        Ok((color, events))
    }

    /// Refuse edits outside an open blind window or after the seat submitted.
    fn ensure_editable(&self, color: Color, now_ms: u64) -> Result<(), GameError> {
        let deadline = self.phase_ends_at_ms.unwrap_or(0);
        if !self.scheduler.is_blind_open(self.phase, deadline, now_ms) {
            return Err(GameError::WrongPhase { phase: self.phase });
        }
        if self.seats[color.index()].sequence.is_submitted() {
            warn!(game_id = self.id, %color, "edit after submission ignored");
            return Err(GameError::AlreadySubmitted { color });
        }
        Ok(())
    }

    /// Validate and queue one blind move for `color`.
    pub fn submit_blind_move(
        &mut self,
        color: Color,
        mv: BlindMove,
        now_ms: u64,
    ) -> Result<MoveRecord, GameError> {
        self.ensure_editable(color, now_ms)?;
        let max_total_moves = self.config.rules.max_total_moves;
        let oracle = &self.oracle;
        let seat = &mut self.seats[color.index()];

        let record = match seat.preview.try_push(oracle, mv) {
            Ok(record) => record,
            Err(result) => {
                warn!(
                    game_id = self.id,
                    %color,
                    from = %mv.from,
                    to = %mv.to,
                    reason = %result.message(),
                    "blind move refused"
                );
                return Err(GameError::Rejected(result));
            }
        };
        if let Err(err) = seat.sequence.push(mv, max_total_moves) {
            seat.preview.rebuild(oracle, seat.sequence.moves())?;
            return Err(err.into());
        }
        debug!(
            game_id = self.id,
            %color,
            from = %mv.from,
            to = %mv.to,
            san = record.san_label.as_str(),
            move_number = record.move_number,
            "blind move queued"
        );
        Ok(record)
    }

    /// Drop the most recent queued move and rebuild the preview without it.
    pub fn undo_last_blind_move(
        &mut self,
        color: Color,
        now_ms: u64,
    ) -> Result<Option<BlindMove>, GameError> {
        self.ensure_editable(color, now_ms)?;
        let oracle = &self.oracle;
        let seat = &mut self.seats[color.index()];
        let undone = seat.sequence.pop()?;
        if undone.is_some() {
            seat.preview.rebuild(oracle, seat.sequence.moves())?;
        }
        debug!(game_id = self.id, %color, ?undone, "blind move undone");
        Ok(undone)
    }

    /// Clear the whole queue and the preview.
    pub fn reset_blind_sequence(&mut self, color: Color, now_ms: u64) -> Result<(), GameError> {
        self.ensure_editable(color, now_ms)?;
        let oracle = &self.oracle;
        let seat = &mut self.seats[color.index()];
        seat.sequence.clear()?;
        seat.preview.rebuild(oracle, &[])?;
        debug!(game_id = self.id, %color, "blind sequence reset");
        Ok(())
    }

    /// Freeze `color`'s queue. Reveals immediately once both seats are frozen.
    pub fn submit_sequence(
        &mut self,
        color: Color,
        now_ms: u64,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != GamePhase::Blind {
            return Err(GameError::WrongPhase { phase: self.phase });
        }
        let seat = &mut self.seats[color.index()];
        if !seat.sequence.submit() {
            return Err(GameError::AlreadySubmitted { color });
        }
        let moves = seat.sequence.len();
        info!(game_id = self.id, %color, moves, "blind sequence submitted");

        let mut events = vec![GameEvent::SequenceSubmitted {
            game_id: self.id,
            color,
            moves,
        }];
        if self.both_submitted() {
            events.extend(self.reveal(RevealTrigger::BothSubmitted, now_ms)?);
        }
        Ok(events)
    }

    pub fn both_submitted(&self) -> bool {
        self.seats.iter().all(|seat| seat.sequence.is_submitted())
    }

    /// Entry point for the notification channel. Duplicate or stale signals are no-ops.
    pub fn handle(
        &mut self,
        notification: Notification,
        now_ms: u64,
    ) -> Result<Vec<GameEvent>, GameError> {
        match notification {
            Notification::SequenceSubmitted { color } => match self.submit_sequence(color, now_ms) {
                Err(GameError::AlreadySubmitted { .. } | GameError::WrongPhase { .. }) => {
                    debug!(game_id = self.id, %color, "duplicate submission signal");
                    Ok(Vec::new())
                }
                other => other,
            },
            Notification::BothSubmitted if self.both_submitted() => {
                self.reveal(RevealTrigger::BothSubmitted, now_ms)
            }
            Notification::DeadlineElapsed if self.deadline_elapsed(now_ms) => {
                self.reveal(RevealTrigger::DeadlineElapsed, now_ms)
            }
            Notification::Reconnect => self.recover(now_ms),
            Notification::PlaybackFinished => self.finish_playback(now_ms),
            _ => {
                debug!(
                    game_id = self.id,
                    ?notification,
                    phase = self.phase.as_str(),
                    "notification ignored"
                );
                Ok(Vec::new())
            }
        }
    }

    fn deadline_elapsed(&self, now_ms: u64) -> bool {
        self.phase_ends_at_ms
            .is_some_and(|ends_at| self.scheduler.deadline_elapsed(self.phase, ends_at, now_ms))
    }

    fn playback_elapsed(&self, now_ms: u64) -> bool {
        self.phase_ends_at_ms
            .is_some_and(|ends_at| self.scheduler.playback_complete(self.phase, ends_at, now_ms))
    }

    /// Advance every timer-driven transition that is due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64) -> Result<Vec<GameEvent>, GameError> {
        if self.deadline_elapsed(now_ms) {
            return self.reveal(RevealTrigger::DeadlineElapsed, now_ms);
        }
        if self.playback_elapsed(now_ms) {
            return self.finish_playback(now_ms);
        }
        Ok(Vec::new())
    }

    /// Catch up after a reconnect or restart: reveal a game whose trigger was missed and
    /// finish playback whose window already closed.
    pub fn recover(&mut self, now_ms: u64) -> Result<Vec<GameEvent>, GameError> {
        let missed = self.both_submitted() || self.deadline_elapsed(now_ms);
        if self.phase == GamePhase::Blind && missed {
            return self.reveal(RevealTrigger::Recovery, now_ms);
        }
        if self.playback_elapsed(now_ms) {
            return self.finish_playback(now_ms);
        }
        Ok(Vec::new())
    }

    /// Run reconciliation exactly once and move to animated playback.
    pub fn reveal(
        &mut self,
        trigger: RevealTrigger,
        now_ms: u64,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != GamePhase::Blind {
            debug!(
                game_id = self.id,
                %trigger,
                phase = self.phase.as_str(),
                "reveal ignored"
            );
            return Ok(Vec::new());
        }
        if !self.reveal_guard.try_acquire() {
            warn!(game_id = self.id, %trigger, "reveal already triggered");
            return Ok(Vec::new());
        }

        for color in Color::ALL {
            if self.seats[color.index()].sequence.submit() {
                info!(
                    game_id = self.id,
                    %color,
                    moves = self.seats[color.index()].sequence.len(),
                    "auto-submitted blind sequence"
                );
            }
        }

        let reconciled = Reconciler::new(&self.oracle, self.config.rules, self.config.rewards)
            .reconcile(
                self.seats[Color::White.index()].sequence.moves(),
                self.seats[Color::Black.index()].sequence.moves(),
                self.config.entry_fee,
            )?;
        self.reconciliations += 1;
        let result = reconciled.result.clone();
        info!(
            game_id = self.id,
            %trigger,
            moves = result.move_log.len(),
            white_reward = result.white_reward,
            black_reward = result.black_reward,
            checkmate = ?result.checkmate,
            "blind game revealed"
        );
        self.reconciled = Some(reconciled);

        let mut events = vec![self.transition(GamePhase::Reveal, None)];
        events.push(GameEvent::Revealed {
            game_id: self.id,
            result: result.clone(),
        });
        events.push(GameEvent::Settled {
            game_id: self.id,
            settlement: result.settlement(),
        });
        let playback_ends_at = self
            .scheduler
            .playback_ends_at(now_ms, result.move_log.len());
        events.push(self.transition(GamePhase::AnimatedReveal, Some(playback_ends_at)));
        if result.move_log.is_empty() {
            events.extend(self.finish_playback(now_ms)?);
        }
        Ok(events)
    }

    /// End playback: start live play, or stop for good if reconciliation delivered mate.
    pub fn finish_playback(&mut self, now_ms: u64) -> Result<Vec<GameEvent>, GameError> {
        if self.phase != GamePhase::AnimatedReveal {
            return Ok(Vec::new());
        }
        let Some(reconciled) = self.reconciled.as_ref() else {
            return Ok(Vec::new());
        };
        let checkmate = reconciled.result.checkmate.is_some();
        let next = PhaseScheduler::next_phase(GamePhase::AnimatedReveal, checkmate)
            .unwrap_or(GamePhase::Live);

        if next == GamePhase::Live {
            let position = self
                .oracle
                .with_side_to_move(&reconciled.position, Color::White)
                .unwrap_or_else(|| {
                    warn!(
                        game_id = self.id,
                        "white cannot take the move, live play keeps the reconciled turn"
                    );
                    reconciled.position.clone()
                });
            self.live = Some(LiveState {
                fen: self.oracle.to_portable_position(&position),
                position,
                clocks_ms: self.scheduler.live_clocks(),
                started_at_ms: now_ms,
            });
        }
        Ok(vec![self.transition(next, None)])
    }
}
