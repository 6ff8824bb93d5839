//! Randomized playouts checking make/unmake and incremental hashing.

use chess_engine::{generate_moves, FixedHistory, GenType, GrowableHistory, Position};
use proptest::prelude::*;

const STARTS: [&str; 4] = [
    chess_core::Fen::STARTPOS,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
];

/// Everything `undo_move` must restore.
fn snapshot<H: chess_engine::StateStack>(position: &Position<H>) -> (String, u64, usize) {
    (position.to_fen(), position.hash(), position.history().len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn playout_round_trips(start in 0..STARTS.len(), picks in prop::collection::vec(any::<usize>(), 1..40)) {
        let mut position: Position<GrowableHistory> = Position::from_fen(STARTS[start]).unwrap();
        let mut trail = Vec::new();

        for pick in picks {
            let moves = generate_moves(&position, GenType::All);
            if moves.is_empty() {
                break;
            }
            let mv = moves[pick % moves.len()];
            let before = snapshot(&position);

            position.do_move(mv);
            position.update();
            prop_assert_eq!(position.hash(), position.compute_hash());

            let reparsed: Position<FixedHistory> = Position::from_fen(&position.to_fen()).unwrap();
            prop_assert_eq!(reparsed.hash(), position.hash());

            // Every reply must also unmake cleanly.
            let after = snapshot(&position);
            for &reply in generate_moves(&position, GenType::All).iter() {
                position.do_move(reply);
                position.undo_move();
                prop_assert_eq!(&snapshot(&position), &after);
            }
            position.update();

            trail.push((mv, before));
        }

        while let Some((mv, before)) = trail.pop() {
            prop_assert_eq!(position.last_move(), Some(mv));
            position.undo_move();
            prop_assert_eq!(&snapshot(&position), &before);
            prop_assert_eq!(position.hash(), position.compute_hash());
        }
    }

    #[test]
    fn forced_moves_are_a_subset(start in 0..STARTS.len(), picks in prop::collection::vec(any::<usize>(), 0..30)) {
        let mut position: Position<FixedHistory> = Position::from_fen(STARTS[start]).unwrap();
        for pick in picks {
            let all = generate_moves(&position, GenType::All);
            let forced = generate_moves(&position, GenType::Forced);
            for &mv in forced.iter() {
                prop_assert!(all.contains(mv));
            }
            if position.is_check() {
                prop_assert_eq!(all.len(), forced.len());
            }
            if all.is_empty() {
                break;
            }
            position.do_move(all[pick % all.len()]);
            position.update();
        }
    }
}
