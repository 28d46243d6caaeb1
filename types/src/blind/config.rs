use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{
    BASIS_POINTS_DENOMINATOR, CAPTURE_BONUS, COMMISSION_BPS, INVALID_PENALTY, MAX_MOVES_PER_PIECE,
    MAX_TOTAL_MOVES, MAX_TOTAL_MOVES_LIMIT, OPPONENT_BONUS, VALID_REWARD,
};

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("max_total_moves out of range (got={got}, max={max})")]
    TooManyMoves { got: u8, max: u8 },
    #[error("commission_bps out of range (got={got}, max={max})")]
    CommissionOutOfRange { got: u16, max: u64 },
}

/// Blind-phase quotas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindRules {
    pub max_total_moves: u8,
    pub max_moves_per_piece: u8,
}

impl Default for BlindRules {
    fn default() -> Self {
        Self {
            max_total_moves: MAX_TOTAL_MOVES,
            max_moves_per_piece: MAX_MOVES_PER_PIECE,
        }
    }
}

impl BlindRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_total_moves == 0 {
            return Err(ConfigError::Zero("max_total_moves"));
        }
        if self.max_total_moves > MAX_TOTAL_MOVES_LIMIT {
            return Err(ConfigError::TooManyMoves {
                got: self.max_total_moves,
                max: MAX_TOTAL_MOVES_LIMIT,
            });
        }
        if self.max_moves_per_piece == 0 {
            return Err(ConfigError::Zero("max_moves_per_piece"));
        }
        Ok(())
    }
}

/// Per-move reward schedule and platform cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub valid_reward: u64,
    pub capture_bonus: u64,
    pub invalid_penalty: u64,
    pub opponent_bonus: u64,
    pub commission_bps: u16,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            valid_reward: VALID_REWARD,
            capture_bonus: CAPTURE_BONUS,
            invalid_penalty: INVALID_PENALTY,
            opponent_bonus: OPPONENT_BONUS,
            commission_bps: COMMISSION_BPS,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if u64::from(self.commission_bps) > BASIS_POINTS_DENOMINATOR {
            return Err(ConfigError::CommissionOutOfRange {
                got: self.commission_bps,
                max: BASIS_POINTS_DENOMINATOR,
            });
        }
        Ok(())
    }

    /// `floor(total_pot * commission_rate)`.
    pub fn commission(&self, total_pot: u64) -> u64 {
        let scaled = u128::from(total_pot) * u128::from(self.commission_bps)
            / u128::from(BASIS_POINTS_DENOMINATOR);
        scaled as u64
    }
}
