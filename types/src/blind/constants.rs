/// Maximum number of moves a player may queue during the blind phase
pub const MAX_TOTAL_MOVES: u8 = 5;

/// Maximum number of times a single piece may be the mover during the blind phase
pub const MAX_MOVES_PER_PIECE: u8 = 2;

/// Upper bound accepted for a configured `max_total_moves`
pub const MAX_TOTAL_MOVES_LIMIT: u8 = 32;

/// Reward for a valid, non-capturing reconciled move
pub const VALID_REWARD: u64 = 2;

/// Reward for a valid capturing move (replaces the valid reward, does not stack)
pub const CAPTURE_BONUS: u64 = 5;

/// Deducted from the mover when a queued move turns out to be illegal
pub const INVALID_PENALTY: u64 = 5;

/// Credited to the opponent when a queued move turns out to be illegal
pub const OPPONENT_BONUS: u64 = 10;

/// Platform commission in basis points (1_000 = 10%)
pub const COMMISSION_BPS: u16 = 1_000;

/// Basis point denominator
pub const BASIS_POINTS_DENOMINATOR: u64 = 10_000;

/// Default per-player entry fee
pub const DEFAULT_ENTRY_FEE: u64 = 100;

/// Maximum encoded length of a move label (SAN or "from-to")
pub const MAX_LABEL_LENGTH: usize = 16;

/// Maximum encoded length of a portable (FEN) position string
pub const MAX_POSITION_LENGTH: usize = 128;

/// Maximum number of entries in an encoded move log
pub const MAX_MOVE_LOG_LENGTH: usize = 2 * MAX_TOTAL_MOVES_LIMIT as usize;
