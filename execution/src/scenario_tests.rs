//! End-to-end blind games driven through the phase state machine.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use blindchess_types::{
        BlindMove, BlindRules, Checkmate, Color, GamePhase, ReconciliationResult, RewardConfig,
        ViolationKind,
    };
    use commonware_codec::Encode;
    use proptest::prelude::*;

    use crate::game::{BlindGame, GameConfig, GameError, GameEvent, Notification};
    use crate::oracle::ShakmatyOracle;
    use crate::preview::BlindPreview;
    use crate::simulator::Reconciler;

    const DEADLINE: u64 = 60_000;

    fn mv(from: &str, to: &str) -> BlindMove {
        BlindMove::parse(from, to).unwrap()
    }

    fn seated_game() -> BlindGame<ShakmatyOracle> {
        let mut game = BlindGame::new(7, ShakmatyOracle, GameConfig::default()).unwrap();
        game.join("white-player", 0).unwrap();
        game.join("black-player", 0).unwrap();
        game
    }

    fn queue(game: &mut BlindGame<ShakmatyOracle>, color: Color, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            game.submit_blind_move(color, mv(from, to), 1).unwrap();
        }
    }

    fn revealed(events: &[GameEvent]) -> &ReconciliationResult {
        let mut results = events.iter().filter_map(|event| match event {
            GameEvent::Revealed { result, .. } => Some(result),
            _ => None,
        });
        let result = results.next().expect("reveal event");
        assert!(results.next().is_none(), "exactly one reveal");
        result
    }

    fn phases(events: &[GameEvent]) -> Vec<GamePhase> {
        events
            .iter()
            .filter_map(|event| match event {
                GameEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_join_starts_blind_phase() {
        let mut game = BlindGame::new(1, ShakmatyOracle, GameConfig::default()).unwrap();
        let (color, events) = game.join("alice", 500).unwrap();
        assert_eq!(color, Color::White);
        assert!(events.is_empty());
        assert_eq!(game.current_phase(), GamePhase::Waiting);
        assert!(matches!(
            game.submit_blind_move(Color::White, mv("e2", "e4"), 600),
            Err(GameError::WrongPhase {
                phase: GamePhase::Waiting
            })
        ));

        let (color, events) = game.join("bob", 1_000).unwrap();
        assert_eq!(color, Color::Black);
        assert_eq!(
            events,
            vec![GameEvent::PhaseChanged {
                game_id: 1,
                from: GamePhase::Waiting,
                to: GamePhase::Blind,
                phase_ends_at_ms: Some(1_000 + DEADLINE),
            }]
        );
        assert_eq!(game.join("carol", 1_000), Err(GameError::TableFull));
        assert_eq!(game.join("alice", 1_000).unwrap(), (Color::White, Vec::new()));
    }

    #[test]
    fn test_alternation_through_full_lifecycle() {
        let mut game = seated_game();
        queue(&mut game, Color::White, &[("e2", "e4")]);
        queue(&mut game, Color::Black, &[("e7", "e5")]);

        let events = game.submit_sequence(Color::White, 2).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::SequenceSubmitted {
                game_id: 7,
                color: Color::White,
                moves: 1,
            }]
        );
        let events = game.submit_sequence(Color::Black, 3).unwrap();
        assert_eq!(
            phases(&events),
            vec![GamePhase::Reveal, GamePhase::AnimatedReveal]
        );
        let result = revealed(&events);
        let labels: Vec<_> = result
            .move_log
            .iter()
            .map(|item| (item.player, item.label.as_str(), item.is_invalid))
            .collect();
        assert_eq!(
            labels,
            vec![(Color::White, "e4", false), (Color::Black, "e5", false)]
        );
        assert_eq!(game.phase_ends_at_ms(), Some(3 + 2 * 800));

        assert!(game.tick(3 + 2 * 800 - 1).unwrap().is_empty());
        let events = game.tick(3 + 2 * 800).unwrap();
        assert_eq!(phases(&events), vec![GamePhase::Live]);

        let live = game.live().unwrap();
        assert_eq!(
            live.fen,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        assert_eq!(live.clocks_ms, [300_000, 300_000]);
        assert_eq!(live.started_at_ms, 3 + 2 * 800);
    }

    #[test]
    fn test_illegal_move_refused_interactively() {
        let mut game = seated_game();
        match game.submit_blind_move(Color::White, mv("e2", "e5"), 1) {
            Err(GameError::Rejected(result)) => {
                assert!(result.has(ViolationKind::IllegalMove));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(game.sequence(Color::White).is_empty());
    }

    #[test]
    fn test_collision_penalty_transfers() {
        let mut game = seated_game();
        queue(&mut game, Color::White, &[("e2", "e4"), ("e4", "e5")]);
        queue(&mut game, Color::Black, &[("e7", "e5")]);
        game.submit_sequence(Color::White, 2).unwrap();
        let events = game.submit_sequence(Color::Black, 3).unwrap();

        let result = revealed(&events);
        assert_eq!(result.move_log.len(), 3);
        assert!(result.move_log[2].is_invalid);
        assert_eq!(result.move_log[2].label, "e4-e5");
        // White: 2 - 5 clamps to 0 and the 3 shortfall comes off black's 2 + 10.
        assert_eq!(result.white_reward, 0);
        assert_eq!(result.black_reward, 9);
        assert_eq!(result.remaining_pot, 171);

        let settled = events.iter().find_map(|event| match event {
            GameEvent::Settled { settlement, .. } => Some(*settlement),
            _ => None,
        });
        assert_eq!(settled, Some(result.settlement()));
    }

    #[test]
    fn test_deadline_auto_submits_and_forces_turn() {
        let mut game = seated_game();
        queue(&mut game, Color::Black, &[("e7", "e5")]);
        game.submit_sequence(Color::Black, 2).unwrap();

        assert!(game.tick(DEADLINE - 1).unwrap().is_empty());
        let events = game.tick(DEADLINE).unwrap();
        let result = revealed(&events);
        assert_eq!(result.move_log.len(), 1);
        assert_eq!(result.move_log[0].player, Color::Black);
        assert_eq!(result.move_log[0].label, "e5");
        assert!(result.move_log[0].is_forced);
        assert!(game.sequence(Color::White).is_submitted());

        let events = game
            .handle(Notification::PlaybackFinished, DEADLINE + 10)
            .unwrap();
        assert_eq!(phases(&events), vec![GamePhase::Live]);
        assert!(game.live().unwrap().fen.contains(" w "));
    }

    #[test]
    fn test_empty_game_goes_straight_to_live() {
        let mut game = seated_game();
        let events = game.tick(DEADLINE).unwrap();
        assert_eq!(
            phases(&events),
            vec![GamePhase::Reveal, GamePhase::AnimatedReveal, GamePhase::Live]
        );
        let result = revealed(&events);
        assert!(result.move_log.is_empty());
        assert_eq!(result.remaining_pot, 180);
        assert_eq!(
            game.live().unwrap().fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_live_keeps_checked_side_to_move() {
        let mut game = seated_game();
        queue(
            &mut game,
            Color::White,
            &[("e2", "e4"), ("f1", "c4"), ("c4", "f7"), ("d2", "d3")],
        );
        game.submit_sequence(Color::White, 2).unwrap();
        let events = game.tick(DEADLINE).unwrap();

        let result = revealed(&events);
        let labels: Vec<_> = result
            .move_log
            .iter()
            .map(|item| (item.label.as_str(), item.is_invalid, item.is_forced))
            .collect();
        assert_eq!(
            labels,
            vec![
                ("e4", false, false),
                ("Bc4", false, true),
                ("Bxf7+", false, true),
                ("d3+", false, true),
            ]
        );
        assert_eq!(result.white_reward, 2 + 2 + 5 + 2);
        assert_eq!(result.black_reward, 0);

        // White to move would leave the black king en prise, so black answers the check.
        game.handle(Notification::PlaybackFinished, DEADLINE + 1)
            .unwrap();
        let live = game.live().unwrap();
        assert_eq!(live.fen, result.final_position);
        assert!(live.fen.contains(" b "));
    }

    #[test]
    fn test_checkmate_completes_game() {
        let mut game = seated_game();
        queue(
            &mut game,
            Color::White,
            &[("f2", "f3"), ("g2", "g4"), ("a2", "a3"), ("b2", "b3"), ("c2", "c3")],
        );
        queue(
            &mut game,
            Color::Black,
            &[("e7", "e5"), ("d8", "h4"), ("a7", "a6"), ("b7", "b6"), ("c7", "c6")],
        );
        game.submit_sequence(Color::Black, 2).unwrap();
        let events = game.submit_sequence(Color::White, 3).unwrap();

        let result = revealed(&events);
        assert_eq!(result.move_log.len(), 4);
        assert_eq!(
            result.checkmate,
            Some(Checkmate {
                winner: Color::Black
            })
        );
        assert_eq!(result.black_reward, 200 - 20);
        assert_eq!(result.white_reward, 0);
        assert_eq!(result.remaining_pot, 0);
        assert!(result
            .move_log
            .iter()
            .all(|item| !["a6", "b6", "c6", "c3", "b3", "a3"].contains(&item.label.as_str())));

        let events = game.handle(Notification::PlaybackFinished, 4).unwrap();
        assert_eq!(phases(&events), vec![GamePhase::Complete]);
        assert!(game.live().is_none());
        assert!(game.tick(u64::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_frozen_sequence_rejects_edits() {
        let mut game = seated_game();
        queue(&mut game, Color::White, &[("d2", "d4")]);
        game.submit_sequence(Color::White, 2).unwrap();

        let frozen = Err(GameError::AlreadySubmitted {
            color: Color::White,
        });
        assert_eq!(
            game.submit_blind_move(Color::White, mv("c2", "c4"), 3)
                .map(|_| ()),
            frozen.clone()
        );
        assert_eq!(game.undo_last_blind_move(Color::White, 3).map(|_| ()), frozen);
        assert_eq!(
            game.reset_blind_sequence(Color::White, 3),
            Err(GameError::AlreadySubmitted {
                color: Color::White
            })
        );
        assert_eq!(game.sequence(Color::White).moves(), &[mv("d2", "d4")]);
        assert_eq!(
            game.submit_sequence(Color::White, 4),
            Err(GameError::AlreadySubmitted {
                color: Color::White
            })
        );
        // A late echo of the submission is a quiet no-op.
        assert!(game
            .handle(
                Notification::SequenceSubmitted {
                    color: Color::White
                },
                5
            )
            .unwrap()
            .is_empty());
        assert_eq!(game.current_phase(), GamePhase::Blind);
    }

    #[test]
    fn test_edits_refused_after_deadline() {
        let mut game = seated_game();
        assert_eq!(
            game.submit_blind_move(Color::White, mv("e2", "e4"), DEADLINE)
                .map(|_| ()),
            Err(GameError::WrongPhase {
                phase: GamePhase::Blind
            })
        );
    }

    #[test]
    fn test_undo_and_reset_rebuild_quota() {
        let mut game = seated_game();
        queue(&mut game, Color::White, &[("g1", "f3"), ("f3", "g5")]);
        match game.submit_blind_move(Color::White, mv("g5", "f3"), 1) {
            Err(GameError::Rejected(result)) => {
                assert!(result.has(ViolationKind::PieceExhausted));
            }
            other => panic!("expected quota rejection, got {other:?}"),
        }

        assert_eq!(
            game.undo_last_blind_move(Color::White, 2).unwrap(),
            Some(mv("f3", "g5"))
        );
        let record = game
            .submit_blind_move(Color::White, mv("f3", "e5"), 3)
            .unwrap();
        assert_eq!(record.san_label, "Ne5");
        assert_eq!(record.move_number, 2);

        game.reset_blind_sequence(Color::White, 4).unwrap();
        assert!(game.sequence(Color::White).is_empty());
        assert!(game.preview(Color::White).records().is_empty());
        assert_eq!(game.preview(Color::White).engine().tracker().total_moves(), 0);
        assert_eq!(game.undo_last_blind_move(Color::White, 5).unwrap(), None);
    }

    #[test]
    fn test_submission_order_does_not_matter() {
        let white = [("e2", "e4"), ("g1", "f3"), ("f1", "c4")];
        let black = [("d7", "d5"), ("c8", "g4")];

        let mut first = seated_game();
        queue(&mut first, Color::White, &white);
        queue(&mut first, Color::Black, &black);
        first.submit_sequence(Color::White, 10).unwrap();
        first.submit_sequence(Color::Black, 50_000).unwrap();

        let mut second = seated_game();
        queue(&mut second, Color::Black, &black);
        queue(&mut second, Color::White, &white);
        second.submit_sequence(Color::Black, 20).unwrap();
        second.submit_sequence(Color::White, 30).unwrap();

        assert_eq!(
            first.result().unwrap().encode(),
            second.result().unwrap().encode()
        );
    }

    const WHITE_POOL: &[(&str, &str)] = &[
        ("e2", "e4"),
        ("e2", "e3"),
        ("d2", "d4"),
        ("g1", "f3"),
        ("f3", "e5"),
        ("f3", "g5"),
        ("b1", "c3"),
        ("c3", "d5"),
        ("f1", "c4"),
        ("c4", "f7"),
        ("d1", "h5"),
        ("h5", "f7"),
        ("e1", "g1"),
        ("e2", "e5"),
        ("f2", "f3"),
        ("g2", "g4"),
    ];

    const BLACK_POOL: &[(&str, &str)] = &[
        ("e7", "e5"),
        ("e7", "e6"),
        ("d7", "d5"),
        ("g8", "f6"),
        ("f6", "e4"),
        ("b8", "c6"),
        ("c6", "d4"),
        ("f8", "c5"),
        ("d8", "h4"),
        ("c5", "f2"),
        ("e8", "g8"),
        ("e7", "e4"),
        ("d5", "d4"),
    ];

    /// Up to 7 picks from `pool`, repeats and impossible moves included.
    fn arb_sequence(
        pool: &'static [(&'static str, &'static str)],
    ) -> impl Strategy<Value = Vec<BlindMove>> {
        prop::collection::vec(0..pool.len(), 0..8).prop_map(move |picks| {
            picks
                .into_iter()
                .map(|i| mv(pool[i].0, pool[i].1))
                .collect()
        })
    }

    proptest! {
        /// Property: reconciliation is a pure function of both sequences and the fee,
        /// and rewards never create or destroy pot.
        #[test]
        fn prop_reconcile_deterministic_and_conserved(
            white in arb_sequence(WHITE_POOL),
            black in arb_sequence(BLACK_POOL),
            entry_fee in 0u64..10_000,
        ) {
            let oracle = ShakmatyOracle;
            let reconciler = Reconciler::new(&oracle, BlindRules::default(), RewardConfig::default());
            let first = reconciler.reconcile(&white, &black, entry_fee).unwrap().result;
            let second = reconciler.reconcile(&white, &black, entry_fee).unwrap().result;
            prop_assert_eq!(first.encode(), second.encode());

            prop_assert_eq!(first.total_pot, entry_fee * 2);
            prop_assert_eq!(
                first.white_reward + first.black_reward + first.remaining_pot + first.commission,
                first.total_pot
            );
            if let Some(Checkmate { winner }) = first.checkmate {
                prop_assert_eq!(first.reward_for(winner), first.total_pot - first.commission);
                prop_assert_eq!(first.reward_for(!winner), 0);
                prop_assert_eq!(first.remaining_pot, 0);
            }
            prop_assert!(first.moves_by(Color::White) <= 5);
            prop_assert!(first.moves_by(Color::Black) <= 5);
            for (i, item) in first.move_log.iter().enumerate() {
                prop_assert_eq!(item.ply as usize, i + 1);
            }
        }

        /// Property: whatever is thrown at a preview, no identity exceeds its quota and the
        /// accepted total never exceeds the move limit.
        #[test]
        fn prop_preview_quota_never_exceeded(candidates in arb_sequence(WHITE_POOL)) {
            let oracle = ShakmatyOracle;
            let rules = BlindRules::default();
            let mut preview = BlindPreview::new(&oracle, Color::White, rules).unwrap();
            for candidate in candidates {
                let _ = preview.try_push(&oracle, candidate);
            }

            let tracker = preview.engine().tracker();
            prop_assert!(tracker.total_moves() <= rules.max_total_moves as usize);
            prop_assert_eq!(tracker.total_moves(), preview.records().len());
            let mut per_piece = BTreeMap::new();
            for tracked in tracker.history() {
                *per_piece.entry(tracked.identity).or_insert(0u8) += 1;
            }
            for (identity, count) in per_piece {
                prop_assert!(
                    count <= rules.max_moves_per_piece,
                    "{} moved {} times",
                    identity,
                    count
                );
            }
        }
    }
}
