//! Private per-player board used while a blind sequence is being built.
//!
//! The preview holds only the owner's own moves. Before each candidate the side to move is
//! forced to the owner's colour, so the 2nd..nth queued moves are judged the way they will be
//! attempted during reconciliation. The same replay is used to re-validate a finished
//! sequence before it is reconciled.

use blindchess_types::{
    BlindMove, BlindRules, Color, MoveRecord, RuleViolation, ValidationResult, ViolationKind,
};
use tracing::warn;

use crate::oracle::{LegalityOracle, OracleError, DEFAULT_PROMOTION};
use crate::rules::RuleEngine;

pub struct BlindPreview<O: LegalityOracle> {
    engine: RuleEngine<O>,
    position: O::Position,
    records: Vec<MoveRecord>,
}

impl<O: LegalityOracle> BlindPreview<O> {
    pub fn new(oracle: &O, color: Color, rules: BlindRules) -> Result<Self, OracleError> {
        Ok(Self {
            engine: RuleEngine::new(color, rules),
            position: oracle.starting_position()?,
            records: Vec::new(),
        })
    }

    pub fn color(&self) -> Color {
        self.engine.color()
    }

    pub fn engine(&self) -> &RuleEngine<O> {
        &self.engine
    }

    pub fn position(&self) -> &O::Position {
        &self.position
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn validate(&self, oracle: &O, candidate: BlindMove) -> ValidationResult {
        self.engine.validate(oracle, &self.position, candidate)
    }

    /// Validate `candidate` and, if accepted, apply it to the preview and the tracker.
    pub fn try_push(
        &mut self,
        oracle: &O,
        candidate: BlindMove,
    ) -> Result<MoveRecord, ValidationResult> {
        let result = self.validate(oracle, candidate);
        if !result.is_valid() {
            return Err(result);
        }

        let color = self.engine.color();
        let mut next = self.position.clone();
        let applied =
            oracle.apply_move_as(&mut next, color, candidate.from, candidate.to, DEFAULT_PROMOTION);
        let Some(mv) = applied else {
            let mut refused = result;
            refused.push(RuleViolation::error(
                ViolationKind::IllegalMove,
                format!("{candidate} could not be applied for {color}"),
            ));
            return Err(refused);
        };

        let move_number = (self.records.len() + 1) as u8;
        self.engine
            .process_move(oracle, &self.position, candidate, move_number);
        self.position = next;
        let record = MoveRecord {
            from: candidate.from,
            to: candidate.to,
            san_label: oracle.to_algebraic_label(&mv),
            move_number,
        };
        self.records.push(record.clone());
        Ok(record)
    }

    /// Start over and replay `moves`. Used after undo and reset so quota counts stay exact.
    pub fn rebuild(&mut self, oracle: &O, moves: &[BlindMove]) -> Result<(), OracleError> {
        self.engine.reset();
        self.position = oracle.starting_position()?;
        self.records.clear();
        for &mv in moves {
            if let Err(result) = self.try_push(oracle, mv) {
                warn!(
                    color = %self.engine.color(),
                    mv = %mv,
                    reason = %result.message(),
                    "previously accepted blind move refused on rebuild"
                );
            }
        }
        Ok(())
    }
}

/// A queued move after defensive re-validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlannedMove {
    /// Passed re-validation; reconciliation will attempt it.
    Attempt(BlindMove),
    /// Failed re-validation; reconciliation records it as invalid without attempting it.
    Malformed(BlindMove, ValidationResult),
}

impl PlannedMove {
    pub fn blind_move(&self) -> BlindMove {
        match self {
            PlannedMove::Attempt(mv) | PlannedMove::Malformed(mv, _) => *mv,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, PlannedMove::Malformed(..))
    }
}

/// Re-validate a finished sequence through a fresh rule engine.
///
/// Moves past `max_total_moves` are dropped. Moves that break quota or legality on the
/// owner's preview are kept as [`PlannedMove::Malformed`].
pub fn revalidate<O: LegalityOracle>(
    oracle: &O,
    rules: BlindRules,
    color: Color,
    moves: &[BlindMove],
) -> Result<Vec<PlannedMove>, OracleError> {
    let limit = rules.max_total_moves as usize;
    if moves.len() > limit {
        warn!(
            %color,
            queued = moves.len(),
            max = limit,
            "blind sequence longer than the move limit, dropping the excess"
        );
    }

    let mut preview = BlindPreview::new(oracle, color, rules)?;
    let mut planned = Vec::with_capacity(moves.len().min(limit));
    for &mv in moves.iter().take(limit) {
        match preview.try_push(oracle, mv) {
            Ok(_) => planned.push(PlannedMove::Attempt(mv)),
            Err(mut result) => {
                warn!(%color, mv = %mv, reason = %result.message(), "malformed blind move");
                result.push(RuleViolation::error(
                    ViolationKind::MalformedSequence,
                    format!("{mv} failed re-validation"),
                ));
                planned.push(PlannedMove::Malformed(mv, result));
            }
        }
    }
    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ShakmatyOracle;

    fn mv(from: &str, to: &str) -> BlindMove {
        BlindMove::parse(from, to).unwrap()
    }

    #[test]
    fn test_consecutive_moves_by_same_color() {
        let oracle = ShakmatyOracle;
        let mut preview = BlindPreview::new(&oracle, Color::White, BlindRules::default()).unwrap();
        for (from, to) in [("e2", "e4"), ("g1", "f3"), ("f1", "c4"), ("e1", "g1")] {
            preview.try_push(&oracle, mv(from, to)).unwrap();
        }
        let labels: Vec<_> = preview.records().iter().map(|r| r.san_label.as_str()).collect();
        assert_eq!(labels, vec!["e4", "Nf3", "Bc4", "O-O"]);
        assert_eq!(preview.records()[3].move_number, 4);
    }

    #[test]
    fn test_black_preview_starts_on_black_turn() {
        let oracle = ShakmatyOracle;
        let mut preview = BlindPreview::new(&oracle, Color::Black, BlindRules::default()).unwrap();
        let record = preview.try_push(&oracle, mv("g8", "f6")).unwrap();
        assert_eq!(record.san_label, "Nf6");
        assert_eq!(record.move_number, 1);
    }

    #[test]
    fn test_quota_enforced_across_hops() {
        let oracle = ShakmatyOracle;
        let mut preview = BlindPreview::new(&oracle, Color::White, BlindRules::default()).unwrap();
        preview.try_push(&oracle, mv("g1", "f3")).unwrap();
        preview.try_push(&oracle, mv("f3", "g5")).unwrap();
        let err = preview.try_push(&oracle, mv("g5", "f3")).unwrap_err();
        assert!(err.has(ViolationKind::PieceExhausted));
        assert_eq!(preview.records().len(), 2);
    }

    #[test]
    fn test_move_limit_enforced() {
        let oracle = ShakmatyOracle;
        let mut preview = BlindPreview::new(&oracle, Color::White, BlindRules::default()).unwrap();
        for (from, to) in [
            ("a2", "a3"),
            ("b2", "b3"),
            ("c2", "c3"),
            ("d2", "d3"),
            ("e2", "e3"),
        ] {
            preview.try_push(&oracle, mv(from, to)).unwrap();
        }
        let err = preview.try_push(&oracle, mv("f2", "f3")).unwrap_err();
        assert!(err.has(ViolationKind::MoveLimitReached));
        assert!(!err.has(ViolationKind::IllegalMove));
    }

    #[test]
    fn test_rebuild_restores_quota() {
        let oracle = ShakmatyOracle;
        let mut preview = BlindPreview::new(&oracle, Color::White, BlindRules::default()).unwrap();
        preview.try_push(&oracle, mv("g1", "f3")).unwrap();
        preview.try_push(&oracle, mv("f3", "g5")).unwrap();

        // Undo the second hop: the knight is back on f3 with one move left.
        preview.rebuild(&oracle, &[mv("g1", "f3")]).unwrap();
        assert_eq!(preview.engine().tracker().total_moves(), 1);
        preview.try_push(&oracle, mv("f3", "e5")).unwrap();
    }

    #[test]
    fn test_queueing_continues_after_giving_check() {
        let oracle = ShakmatyOracle;
        let mut preview = BlindPreview::new(&oracle, Color::White, BlindRules::default()).unwrap();
        for (from, to) in [("e2", "e4"), ("f1", "c4"), ("c4", "f7")] {
            preview.try_push(&oracle, mv(from, to)).unwrap();
        }
        assert_eq!(preview.records()[2].san_label, "Bxf7+");

        let record = preview.try_push(&oracle, mv("d2", "d3")).unwrap();
        assert_eq!(record.san_label, "d3+");
        assert_eq!(record.move_number, 4);

        // The checked king itself can never be taken.
        let err = preview.try_push(&oracle, mv("f7", "e8")).unwrap_err();
        assert!(err.has(ViolationKind::IllegalMove));
        assert_eq!(preview.records().len(), 4);
    }

    #[test]
    fn test_revalidate_flags_and_truncates() {
        let oracle = ShakmatyOracle;
        let moves = vec![
            mv("e2", "e5"),
            mv("g1", "f3"),
            mv("f3", "g5"),
            mv("g5", "f3"),
            mv("a2", "a3"),
            mv("b2", "b3"),
            mv("c2", "c3"),
        ];
        let planned = revalidate(&oracle, BlindRules::default(), Color::White, &moves).unwrap();
        assert_eq!(planned.len(), 5, "moves beyond the limit are dropped");
        assert!(planned[0].is_malformed());
        assert!(!planned[1].is_malformed());
        assert!(!planned[2].is_malformed());
        match &planned[3] {
            PlannedMove::Malformed(m, result) => {
                assert_eq!(*m, mv("g5", "f3"));
                assert!(result.has(ViolationKind::PieceExhausted));
                assert!(result.has(ViolationKind::MalformedSequence));
            }
            other => panic!("expected malformed, got {other:?}"),
        }
        assert_eq!(planned[4], PlannedMove::Attempt(mv("a2", "a3")));
    }
}
