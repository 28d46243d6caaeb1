//! Canonical reconciliation of two blind sequences.
//!
//! This is the only implementation of the merge. Reveal, playback, settlement and recovery
//! all consume [`Reconciler::reconcile`]'s output; none of them re-simulate.
//!
//! ## Ordering
//! The loop follows the side to move on the merged board. When the side whose turn it is
//! has nothing left but the other side does, the other side's next move is *forced*: it is
//! attempted on a copy of the board with the turn handed over. A forced move that lands
//! leaves the original side to move, so natural alternation resumes on the next iteration.
//! Wall-clock submission order never influences the result.
//!
//! ## Termination
//! The loop stops when both queues are exhausted or immediately after a move that
//! delivers checkmate; queued moves after the mate are never evaluated.

use blindchess_types::{
    BlindMove, BlindRules, Checkmate, Color, MoveLogItem, ReconciliationResult, RewardConfig,
};
use tracing::debug;

use crate::oracle::{LegalityOracle, OracleError, DEFAULT_PROMOTION};
use crate::preview::{revalidate, PlannedMove};
use crate::rewards::settle;

/// Reconciliation output plus the oracle's final position, used to seed live play.
#[derive(Clone, Debug)]
pub struct Reconciled<P> {
    pub result: ReconciliationResult,
    pub position: P,
}

pub struct Reconciler<'a, O: LegalityOracle> {
    oracle: &'a O,
    rules: BlindRules,
    rewards: RewardConfig,
}

impl<'a, O: LegalityOracle> Reconciler<'a, O> {
    pub fn new(oracle: &'a O, rules: BlindRules, rewards: RewardConfig) -> Self {
        Self {
            oracle,
            rules,
            rewards,
        }
    }

    /// Re-validate both sequences, merge them into one timeline, and settle rewards.
    pub fn reconcile(
        &self,
        white: &[BlindMove],
        black: &[BlindMove],
        entry_fee: u64,
    ) -> Result<Reconciled<O::Position>, OracleError> {
        let white = revalidate(self.oracle, self.rules, Color::White, white)?;
        let black = revalidate(self.oracle, self.rules, Color::Black, black)?;
        self.simulate(&white, &black, entry_fee)
    }

    /// Merge two already re-validated sequences.
    pub fn simulate(
        &self,
        white: &[PlannedMove],
        black: &[PlannedMove],
        entry_fee: u64,
    ) -> Result<Reconciled<O::Position>, OracleError> {
        let oracle = self.oracle;
        let mut position = oracle.starting_position()?;
        let queues = [white, black];
        let mut next = [0usize; 2];
        let mut move_log = Vec::with_capacity(white.len() + black.len());
        let mut checkmate = None;

        loop {
            let turn = oracle.side_to_move(&position);
            let has_move = |color: Color| next[color.index()] < queues[color.index()].len();
            let color = if has_move(turn) {
                turn
            } else if has_move(!turn) {
                !turn
            } else {
                break;
            };
            let forced = color != turn;
            let planned = &queues[color.index()][next[color.index()]];
            next[color.index()] += 1;

            let (label, is_invalid, is_capture) =
                self.attempt(&mut position, color, planned);
            debug!(
                %color,
                mv = %planned.blind_move(),
                forced,
                is_invalid,
                "reconciled blind move"
            );
            move_log.push(MoveLogItem {
                ply: (move_log.len() + 1) as u16,
                player: color,
                label,
                is_invalid,
                is_capture,
                is_forced: forced,
                position_after: oracle.to_portable_position(&position),
            });

            if oracle.is_checkmate(&position) {
                checkmate = Some(Checkmate {
                    winner: !oracle.side_to_move(&position),
                });
                break;
            }
        }

        let payout = settle(&move_log, checkmate, &self.rewards, entry_fee);
        debug_assert!(payout.is_conserved());
        Ok(Reconciled {
            result: ReconciliationResult {
                final_position: oracle.to_portable_position(&position),
                move_log,
                white_reward: payout.white_reward,
                black_reward: payout.black_reward,
                remaining_pot: payout.remaining_pot,
                commission: payout.commission,
                total_pot: payout.total_pot,
                checkmate,
            },
            position,
        })
    }

    /// Attempt one planned move. The position only changes if the oracle accepts it.
    fn attempt(
        &self,
        position: &mut O::Position,
        color: Color,
        planned: &PlannedMove,
    ) -> (String, bool, bool) {
        let mv = match planned {
            PlannedMove::Attempt(mv) => *mv,
            PlannedMove::Malformed(mv, _) => return (mv.label(), true, false),
        };
        let oracle = self.oracle;
        // A forced move hands the turn over for this one move; landing it hands it back.
        match oracle.apply_move_as(position, color, mv.from, mv.to, DEFAULT_PROMOTION) {
            Some(applied) => {
                debug_assert_eq!(oracle.side_to_move(position), !color);
                (
                    oracle.to_algebraic_label(&applied),
                    false,
                    oracle.is_capture(&applied),
                )
            }
            None => (mv.label(), true, false),
        }
    }
}
