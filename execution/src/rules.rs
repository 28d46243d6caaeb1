//! Validation pipeline run before a blind move is queued.
//!
//! A [`RuleEngine`] owns one player's [`PieceMoveTracker`] and a list of [`Rule`]s. Every rule
//! runs for every candidate, even after an earlier one failed, so the caller always sees the
//! complete set of reasons a move was refused.

use blindchess_types::{
    BlindMove, BlindRules, Color, PieceIdentity, RuleViolation, ValidationResult, ViolationKind,
};

use crate::oracle::{LegalityOracle, DEFAULT_PROMOTION};
use crate::tracker::PieceMoveTracker;

/// Everything a rule may inspect for one candidate.
pub struct RuleContext<'a, O: LegalityOracle> {
    pub oracle: &'a O,
    pub position: &'a O::Position,
    pub tracker: &'a PieceMoveTracker,
    pub rules: &'a BlindRules,
    pub color: Color,
}

pub trait Rule<O: LegalityOracle>: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &RuleContext<'_, O>, candidate: BlindMove) -> Option<RuleViolation>;
}

/// Refuses moves the oracle rejects when the owner is to move.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegalityRule;

impl<O: LegalityOracle> Rule<O> for LegalityRule {
    fn name(&self) -> &'static str {
        "legality"
    }

    fn check(&self, ctx: &RuleContext<'_, O>, candidate: BlindMove) -> Option<RuleViolation> {
        let mut probe = ctx.position.clone();
        let legal = ctx
            .oracle
            .apply_move_as(
                &mut probe,
                ctx.color,
                candidate.from,
                candidate.to,
                DEFAULT_PROMOTION,
            )
            .is_some();
        if legal {
            return None;
        }
        Some(RuleViolation::error(
            ViolationKind::IllegalMove,
            format!("{candidate} is not a legal move for {}", ctx.color),
        ))
    }
}

/// Refuses any move once the owner has queued `max_total_moves`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveLimitRule;

impl<O: LegalityOracle> Rule<O> for MoveLimitRule {
    fn name(&self) -> &'static str {
        "move_limit"
    }

    fn check(&self, ctx: &RuleContext<'_, O>, _candidate: BlindMove) -> Option<RuleViolation> {
        let max = ctx.rules.max_total_moves;
        if ctx.tracker.total_moves() < max as usize {
            return None;
        }
        Some(RuleViolation::error(
            ViolationKind::MoveLimitReached,
            format!("all {max} blind moves already queued"),
        ))
    }
}

/// Refuses moves of a piece that already used its per-piece quota.
#[derive(Clone, Copy, Debug, Default)]
pub struct PieceQuotaRule;

impl<O: LegalityOracle> Rule<O> for PieceQuotaRule {
    fn name(&self) -> &'static str {
        "piece_quota"
    }

    fn check(&self, ctx: &RuleContext<'_, O>, candidate: BlindMove) -> Option<RuleViolation> {
        // An empty or foreign origin square is the legality rule's concern.
        let piece = ctx.oracle.piece_at(ctx.position, candidate.from)?;
        if piece.color != ctx.color || ctx.tracker.can_move(piece, candidate.from) {
            return None;
        }
        let identity = ctx.tracker.resolve(piece, candidate.from);
        Some(RuleViolation::error(
            ViolationKind::PieceExhausted,
            format!(
                "{identity} already moved {} times (max={})",
                ctx.tracker.moves_of(&identity),
                ctx.rules.max_moves_per_piece
            ),
        ))
    }
}

pub struct RuleEngine<O: LegalityOracle> {
    color: Color,
    config: BlindRules,
    rules: Vec<Box<dyn Rule<O>>>,
    tracker: PieceMoveTracker,
}

impl<O: LegalityOracle> RuleEngine<O> {
    /// Standard pipeline: legality, then total-move limit, then per-piece quota.
    pub fn new(color: Color, config: BlindRules) -> Self {
        Self::with_rules(
            color,
            config,
            vec![
                Box::new(LegalityRule),
                Box::new(MoveLimitRule),
                Box::new(PieceQuotaRule),
            ],
        )
    }

    pub fn with_rules(color: Color, config: BlindRules, rules: Vec<Box<dyn Rule<O>>>) -> Self {
        Self {
            color,
            config,
            rules,
            tracker: PieceMoveTracker::new(config.max_moves_per_piece),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn tracker(&self) -> &PieceMoveTracker {
        &self.tracker
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn validate(
        &self,
        oracle: &O,
        position: &O::Position,
        candidate: BlindMove,
    ) -> ValidationResult {
        let ctx = RuleContext {
            oracle,
            position,
            tracker: &self.tracker,
            rules: &self.config,
            color: self.color,
        };
        let mut result = ValidationResult::default();
        for rule in &self.rules {
            if let Some(violation) = rule.check(&ctx, candidate) {
                result.push(violation);
            }
        }
        result
    }

    /// Record an accepted move. `position` is the board before the move.
    pub fn process_move(
        &mut self,
        oracle: &O,
        position: &O::Position,
        mv: BlindMove,
        move_number: u8,
    ) -> Option<PieceIdentity> {
        let piece = oracle.piece_at(position, mv.from)?;
        Some(self.tracker.record_move(piece, mv.from, mv.to, move_number))
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ShakmatyOracle;

    fn mv(from: &str, to: &str) -> BlindMove {
        BlindMove::parse(from, to).unwrap()
    }

    #[test]
    fn test_standard_pipeline_order() {
        let engine = RuleEngine::<ShakmatyOracle>::new(Color::White, BlindRules::default());
        assert_eq!(
            engine.rule_names(),
            vec!["legality", "move_limit", "piece_quota"]
        );
    }

    #[test]
    fn test_legal_opening_move_passes() {
        let oracle = ShakmatyOracle;
        let pos = oracle.starting_position().unwrap();
        let engine = RuleEngine::new(Color::White, BlindRules::default());
        let result = engine.validate(&oracle, &pos, mv("e2", "e4"));
        assert!(result.is_valid());
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_black_is_judged_as_side_to_move() {
        let oracle = ShakmatyOracle;
        let pos = oracle.starting_position().unwrap();
        let engine = RuleEngine::new(Color::Black, BlindRules::default());
        assert!(engine.validate(&oracle, &pos, mv("e7", "e5")).is_valid());
        // Moving the opponent's piece is illegal for the owner.
        let result = engine.validate(&oracle, &pos, mv("e2", "e4"));
        assert!(result.has(ViolationKind::IllegalMove));
    }

    #[test]
    fn test_illegal_move_rejected() {
        let oracle = ShakmatyOracle;
        let pos = oracle.starting_position().unwrap();
        let engine = RuleEngine::new(Color::White, BlindRules::default());
        let result = engine.validate(&oracle, &pos, mv("e2", "e5"));
        assert!(!result.is_valid());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].kind, ViolationKind::IllegalMove);
    }

    #[test]
    fn test_all_violations_collected() {
        let oracle = ShakmatyOracle;
        let pos = oracle.starting_position().unwrap();
        let config = BlindRules {
            max_total_moves: 1,
            max_moves_per_piece: 1,
        };
        let mut engine = RuleEngine::new(Color::White, config);
        // Knight already hopped once and the single-move budget is spent: the next knight
        // hop reports both the limit and the quota.
        engine.process_move(&oracle, &pos, mv("g1", "f3"), 1);
        let mut after = pos.clone();
        oracle
            .apply_move(
                &mut after,
                "g1".parse().unwrap(),
                "f3".parse().unwrap(),
                DEFAULT_PROMOTION,
            )
            .unwrap();

        let result = engine.validate(&oracle, &after, mv("f3", "g5"));
        assert!(!result.is_valid());
        assert!(result.has(ViolationKind::MoveLimitReached));
        assert!(result.has(ViolationKind::PieceExhausted));
        assert!(!result.has(ViolationKind::IllegalMove));
        assert!(result.message().contains("white-knight-g1"));
    }

    #[test]
    fn test_process_move_ignores_empty_square() {
        let oracle = ShakmatyOracle;
        let pos = oracle.starting_position().unwrap();
        let mut engine = RuleEngine::new(Color::White, BlindRules::default());
        assert!(engine
            .process_move(&oracle, &pos, mv("e4", "e5"), 1)
            .is_none());
        assert_eq!(engine.tracker().total_moves(), 0);
    }

    struct NoKingMoves;

    impl<O: LegalityOracle> Rule<O> for NoKingMoves {
        fn name(&self) -> &'static str {
            "no_king_moves"
        }

        fn check(&self, ctx: &RuleContext<'_, O>, candidate: BlindMove) -> Option<RuleViolation> {
            let piece = ctx.oracle.piece_at(ctx.position, candidate.from)?;
            (piece.kind == blindchess_types::PieceKind::King).then(|| {
                RuleViolation::warning(ViolationKind::IllegalMove, "king moves are discouraged")
            })
        }
    }

    #[test]
    fn test_custom_pipeline_warning_keeps_move_valid() {
        let oracle = ShakmatyOracle;
        let mut pos = oracle.starting_position().unwrap();
        oracle
            .apply_move(
                &mut pos,
                "e2".parse().unwrap(),
                "e4".parse().unwrap(),
                DEFAULT_PROMOTION,
            )
            .unwrap();
        let engine = RuleEngine::with_rules(
            Color::White,
            BlindRules::default(),
            vec![Box::new(LegalityRule), Box::new(NoKingMoves)],
        );
        let result = engine.validate(&oracle, &pos, mv("e1", "e2"));
        assert!(result.is_valid());
        assert_eq!(result.violations.len(), 1);
    }
}
