//! Phase scheduler for blind games.
//!
//! Pure timing and transition logic, kept apart from seat state and I/O. Every method
//! takes `now_ms` from the caller; nothing here reads a clock.
//!
//! ## Phases
//!
//! 1. **Waiting** - fewer than two participants seated
//! 2. **Blind** - both players queue moves until they submit or the deadline passes
//! 3. **Reveal** - reconciliation has run; instantaneous
//! 4. **AnimatedReveal** - clients play back the move log
//! 5. **Live** - ordinary alternating chess from the reconciled position
//!
//! If reconciliation ended in checkmate, playback leads to **Complete** instead of Live.

use blindchess_types::{ConfigError, GamePhase};

pub const DEFAULT_BLIND_MS: u64 = 60_000;
pub const DEFAULT_PLAYBACK_MS_PER_MOVE: u64 = 800;
pub const DEFAULT_LIVE_MS: u64 = 300_000;

/// Phase durations in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseConfig {
    /// How long the blind phase stays open.
    pub blind_ms: u64,
    /// Playback time budgeted per move log entry.
    pub playback_ms_per_move: u64,
    /// Fresh per-player clock when live play begins.
    pub live_ms: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            blind_ms: DEFAULT_BLIND_MS,
            playback_ms_per_move: DEFAULT_PLAYBACK_MS_PER_MOVE,
            live_ms: DEFAULT_LIVE_MS,
        }
    }
}

impl PhaseConfig {
    pub fn new(blind_ms: u64, playback_ms_per_move: u64, live_ms: u64) -> Self {
        Self {
            blind_ms,
            playback_ms_per_move,
            live_ms,
        }
    }

    /// All durations must be > 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blind_ms == 0 {
            return Err(ConfigError::Zero("blind_ms"));
        }
        if self.playback_ms_per_move == 0 {
            return Err(ConfigError::Zero("playback_ms_per_move"));
        }
        if self.live_ms == 0 {
            return Err(ConfigError::Zero("live_ms"));
        }
        Ok(())
    }

    /// Playback length for a log of `moves` entries.
    pub fn playback_duration_ms(&self, moves: usize) -> u64 {
        self.playback_ms_per_move
            .saturating_mul(u64::try_from(moves).unwrap_or(u64::MAX))
    }
}

#[derive(Clone, Debug)]
pub struct PhaseScheduler {
    config: PhaseConfig,
}

impl PhaseScheduler {
    pub fn new(config: PhaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    /// Phase that follows `phase`. `checkmate` decides where playback leads.
    ///
    /// Returns `None` for Live and Complete.
    pub fn next_phase(phase: GamePhase, checkmate: bool) -> Option<GamePhase> {
        match phase {
            GamePhase::Waiting => Some(GamePhase::Blind),
            GamePhase::Blind => Some(GamePhase::Reveal),
            GamePhase::Reveal => Some(GamePhase::AnimatedReveal),
            GamePhase::AnimatedReveal if checkmate => Some(GamePhase::Complete),
            GamePhase::AnimatedReveal => Some(GamePhase::Live),
            GamePhase::Live | GamePhase::Complete => None,
        }
    }

    /// Deadline for a blind phase that starts at `start_ms`.
    pub fn blind_deadline(&self, start_ms: u64) -> u64 {
        start_ms.saturating_add(self.config.blind_ms)
    }

    /// Blind moves may only be queued before the deadline.
    pub fn is_blind_open(&self, phase: GamePhase, phase_ends_at_ms: u64, now_ms: u64) -> bool {
        matches!(phase, GamePhase::Blind) && now_ms < phase_ends_at_ms
    }

    /// The blind deadline has passed and the game has not been revealed yet.
    pub fn deadline_elapsed(&self, phase: GamePhase, phase_ends_at_ms: u64, now_ms: u64) -> bool {
        matches!(phase, GamePhase::Blind) && now_ms >= phase_ends_at_ms
    }

    /// When playback of a `moves`-entry log started at `now_ms` finishes.
    pub fn playback_ends_at(&self, now_ms: u64, moves: usize) -> u64 {
        now_ms.saturating_add(self.config.playback_duration_ms(moves))
    }

    pub fn playback_complete(&self, phase: GamePhase, phase_ends_at_ms: u64, now_ms: u64) -> bool {
        matches!(phase, GamePhase::AnimatedReveal) && now_ms >= phase_ends_at_ms
    }

    /// Both players start live play with a full clock.
    pub fn live_clocks(&self) -> [u64; 2] {
        [self.config.live_ms; 2]
    }
}
