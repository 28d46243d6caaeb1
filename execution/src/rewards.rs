//! Reward settlement for a reconciled timeline.
//!
//! Per accepted log entry:
//! - valid, non-capture: mover `+valid_reward`
//! - valid, capture: mover `+capture_bonus` (instead of the valid reward)
//! - invalid: mover `-invalid_penalty`, opponent `+opponent_bonus`
//!
//! Running totals may dip below zero. A negative total is clamped to zero and the
//! shortfall is taken from the opponent's total. Rewards are then bounded by the
//! distributable pot (`total_pot - commission`), trimming the larger reward first, so
//! `white + black + remaining + commission == total_pot` for every entry fee.
//!
//! A checkmate overrides all of the above: the winner takes the distributable pot.

use blindchess_types::{Checkmate, Color, MoveLogItem, RewardConfig};

/// Outcome of settling one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub white_reward: u64,
    pub black_reward: u64,
    pub remaining_pot: u64,
    pub commission: u64,
    pub total_pot: u64,
}

impl Payout {
    /// `white + black + remaining + commission == total_pot`.
    pub fn is_conserved(&self) -> bool {
        u128::from(self.white_reward)
            + u128::from(self.black_reward)
            + u128::from(self.remaining_pot)
            + u128::from(self.commission)
            == u128::from(self.total_pot)
    }
}

fn clamp_u64(value: i128) -> u64 {
    value.clamp(0, u64::MAX as i128) as u64
}

/// Signed running totals `[white, black]` before clamping.
pub fn accumulate(log: &[MoveLogItem], rewards: &RewardConfig) -> [i128; 2] {
    let mut totals = [0i128; 2];
    for item in log {
        let mover = item.player.index();
        if item.is_invalid {
            totals[mover] -= i128::from(rewards.invalid_penalty);
            totals[(!item.player).index()] += i128::from(rewards.opponent_bonus);
        } else if item.is_capture {
            totals[mover] += i128::from(rewards.capture_bonus);
        } else {
            totals[mover] += i128::from(rewards.valid_reward);
        }
    }
    totals
}

/// Clamp both totals at zero, moving each shortfall onto the other player.
pub fn clamp_and_transfer([mut white, mut black]: [i128; 2]) -> (u64, u64) {
    if white < 0 {
        black += white;
        white = 0;
    }
    if black < 0 {
        white += black;
        black = 0;
    }
    (clamp_u64(white), clamp_u64(black))
}

/// Trim rewards so they never exceed `distributable`, larger reward first.
fn bound_to_pot(white: u64, black: u64, distributable: u64) -> (u64, u64) {
    let total = u128::from(white) + u128::from(black);
    if total <= u128::from(distributable) {
        return (white, black);
    }
    let excess = total - u128::from(distributable);
    let (larger, smaller) = if white > black {
        (white, black)
    } else {
        (black, white)
    };
    let cut = excess.min(u128::from(larger));
    let larger = larger - cut as u64;
    let smaller = smaller - (excess - cut) as u64;
    if white > black {
        (larger, smaller)
    } else {
        (smaller, larger)
    }
}

pub fn settle(
    log: &[MoveLogItem],
    checkmate: Option<Checkmate>,
    rewards: &RewardConfig,
    entry_fee: u64,
) -> Payout {
    let total_pot = entry_fee.saturating_mul(2);
    let commission = rewards.commission(total_pot);
    let distributable = total_pot - commission;

    if let Some(Checkmate { winner }) = checkmate {
        let (white_reward, black_reward) = match winner {
            Color::White => (distributable, 0),
            Color::Black => (0, distributable),
        };
        return Payout {
            white_reward,
            black_reward,
            remaining_pot: 0,
            commission,
            total_pot,
        };
    }

    let (white, black) = clamp_and_transfer(accumulate(log, rewards));
    let (white_reward, black_reward) = bound_to_pot(white, black, distributable);
    Payout {
        white_reward,
        black_reward,
        remaining_pot: distributable - white_reward - black_reward,
        commission,
        total_pot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(player: Color, is_invalid: bool, is_capture: bool) -> MoveLogItem {
        MoveLogItem {
            ply: 0,
            player,
            label: String::new(),
            is_invalid,
            is_capture,
            is_forced: false,
            position_after: String::new(),
        }
    }

    #[test]
    fn test_empty_log_keeps_pot() {
        let payout = settle(&[], None, &RewardConfig::default(), 100);
        assert_eq!(
            payout,
            Payout {
                white_reward: 0,
                black_reward: 0,
                remaining_pot: 180,
                commission: 20,
                total_pot: 200,
            }
        );
        assert!(payout.is_conserved());
    }

    #[test]
    fn test_capture_supersedes_valid_reward() {
        let rewards = RewardConfig::default();
        let log = vec![
            item(Color::White, false, false),
            item(Color::Black, false, true),
        ];
        assert_eq!(
            accumulate(&log, &rewards),
            [rewards.valid_reward as i128, rewards.capture_bonus as i128]
        );
    }

    #[test]
    fn test_invalid_penalty_clamped_and_transferred() {
        let rewards = RewardConfig::default();
        let log = vec![item(Color::White, true, false)];
        let payout = settle(&log, None, &rewards, 100);
        assert_eq!(payout.white_reward, 0);
        assert_eq!(
            payout.black_reward,
            rewards.opponent_bonus - rewards.invalid_penalty
        );
        assert!(payout.is_conserved());
    }

    #[test]
    fn test_clamp_and_transfer() {
        assert_eq!(clamp_and_transfer([-5, 10]), (0, 5));
        assert_eq!(clamp_and_transfer([10, -15]), (0, 0));
        assert_eq!(clamp_and_transfer([-3, -4]), (0, 0));
        assert_eq!(clamp_and_transfer([7, 2]), (7, 2));
    }

    #[test]
    fn test_rewards_bounded_by_pot() {
        let rewards = RewardConfig::default();
        let log: Vec<_> = (0..5)
            .flat_map(|_| [item(Color::White, false, true), item(Color::Black, false, false)])
            .collect();
        // White earns 25, black 10, but a fee of 10 only leaves 18 to distribute.
        let payout = settle(&log, None, &rewards, 10);
        assert_eq!(payout.commission, 2);
        assert_eq!(payout.white_reward, 8);
        assert_eq!(payout.black_reward, 10);
        assert_eq!(payout.remaining_pot, 0);
        assert!(payout.is_conserved());
    }

    #[test]
    fn test_checkmate_overrides_accumulation() {
        let rewards = RewardConfig::default();
        let log = vec![
            item(Color::White, false, true),
            item(Color::Black, true, false),
        ];
        let payout = settle(
            &log,
            Some(Checkmate {
                winner: Color::Black,
            }),
            &rewards,
            100,
        );
        assert_eq!(payout.white_reward, 0);
        assert_eq!(payout.black_reward, 180);
        assert_eq!(payout.remaining_pot, 0);
        assert!(payout.is_conserved());
    }

    #[test]
    fn test_zero_entry_fee() {
        let log = vec![item(Color::White, false, false)];
        let payout = settle(&log, None, &RewardConfig::default(), 0);
        assert_eq!(payout.white_reward, 0);
        assert_eq!(payout.total_pot, 0);
        assert!(payout.is_conserved());
    }
}
