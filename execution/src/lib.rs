//! Blindchess execution layer.
//!
//! This crate contains the blind-phase reconciliation engine and the per-game phase state
//! machine that drives it. A legality oracle (see [`oracle`]) supplies every chess rule; the
//! engine only sequences moves, enforces blind quotas, and settles rewards.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; callers pass `now_ms`.
//! - Do not let submission order or hash-based iteration order influence outputs.
//! - Reconciliation is implemented once ([`Reconciler`]); preview, playback, settlement and
//!   recovery all consume its output.
//!
//! ## Idempotency invariants
//! Reveal signals may be delivered more than once and out of order. Every signal funnels into
//! [`BlindGame::reveal`], which is guarded by a single-acquire [`RevealGuard`]; reconciliation
//! runs at most once per game.
//!
//! ## Minimal game (example)
//! ```rust,ignore
//! use blindchess_execution::{BlindGame, GameConfig, ShakmatyOracle};
//! use blindchess_types::{BlindMove, Color};
//!
//! let mut game = BlindGame::new(1, ShakmatyOracle, GameConfig::default())?;
//! game.join("alice", 0)?;
//! game.join("bob", 0)?;
//! game.submit_blind_move(Color::White, BlindMove::parse("e2", "e4")?, 100)?;
//! game.submit_sequence(Color::White, 200)?;
//! let events = game.submit_sequence(Color::Black, 300)?; // reveals
//! ```

pub mod game;
pub mod hub;
pub mod oracle;
pub mod phase;
pub mod preview;
pub mod reveal;
pub mod rewards;
pub mod rules;
pub mod simulator;
pub mod tracker;

#[cfg(test)]
mod scenario_tests;

pub use game::{BlindGame, GameConfig, GameError, GameEvent, GameId, LiveState, Notification};
pub use hub::GameHub;
pub use oracle::{LegalityOracle, OracleError, ShakmatyMove, ShakmatyOracle, DEFAULT_PROMOTION};
pub use phase::{
    PhaseConfig, PhaseScheduler, DEFAULT_BLIND_MS, DEFAULT_LIVE_MS, DEFAULT_PLAYBACK_MS_PER_MOVE,
};
pub use preview::{revalidate, BlindPreview, PlannedMove};
pub use reveal::{RevealGuard, RevealTrigger};
pub use rewards::{settle, Payout};
pub use rules::{LegalityRule, MoveLimitRule, PieceQuotaRule, Rule, RuleContext, RuleEngine};
pub use simulator::{Reconciled, Reconciler};
pub use tracker::{PieceMoveTracker, TrackedMove};
