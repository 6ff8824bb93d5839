//! Search results against an unpruned reference, incremental evaluation
//! against scratch evaluation, and the worker's request handling.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use chess_engine::{generate_moves, FixedHistory, GenType, Position, StateStack};
use chess_search::{Engine, EngineConfig, Evaluation, SearchError, Searcher, DRAW, INF, MATE};
use proptest::prelude::*;

/// Plain minimax over the same tree the searcher walks: full width to
/// `depth`, then every forced line.
fn minimax<H: StateStack>(
    position: &mut Position<H>,
    eval: &mut Evaluation,
    depth: u8,
    root_len: usize,
) -> i32 {
    let ply = position.history().len() - root_len;
    if position.is_draw() {
        return DRAW;
    }
    if depth == 0 {
        return quiesce(position, eval, root_len);
    }
    position.update();
    let moves = generate_moves(position, GenType::All);
    if moves.is_empty() {
        return if position.is_check() { -MATE + ply as i32 } else { DRAW };
    }
    let mut best = -INF;
    for &mv in moves.iter() {
        position.do_move(mv);
        eval.update(position, mv);
        best = best.max(-minimax(position, eval, depth - 1, root_len));
        position.undo_move();
        eval.rollback();
    }
    best
}

fn quiesce<H: StateStack>(
    position: &mut Position<H>,
    eval: &mut Evaluation,
    root_len: usize,
) -> i32 {
    let ply = position.history().len() - root_len;
    if position.is_draw() {
        return DRAW;
    }
    let stand_pat = eval.score();
    if ply >= FixedHistory::PLY_CEILING - 1 {
        return stand_pat;
    }
    position.update();
    let in_check = position.is_check();
    let mut best = if in_check { -INF } else { stand_pat };
    let moves = generate_moves(position, GenType::Forced);
    if moves.is_empty() {
        return if in_check { -MATE + ply as i32 } else { best };
    }
    for &mv in moves.iter() {
        position.do_move(mv);
        eval.update(position, mv);
        best = best.max(-quiesce(position, eval, root_len));
        position.undo_move();
        eval.rollback();
    }
    best
}

fn reference_score(fen: &str, depth: u8) -> i32 {
    let mut position: Position<FixedHistory> = Position::from_fen(fen).unwrap();
    let mut eval = Evaluation::new();
    eval.init(&position);
    let root_len = position.history().len();
    position.update();
    let mut best = -INF;
    for &mv in generate_moves(&position, GenType::All).iter() {
        position.do_move(mv);
        eval.update(&position, mv);
        best = best.max(-minimax(&mut position, &mut eval, depth - 1, root_len));
        position.undo_move();
        eval.rollback();
    }
    best
}

fn search_score(fen: &str, depth: u8) -> i32 {
    let mut position: Position<FixedHistory> = Position::from_fen(fen).unwrap();
    // No table: cached scores would make the result depend on search order.
    Searcher::new(depth, 0).search(&mut position).score
}

#[test]
fn alpha_beta_matches_minimax() {
    let cases = [
        (chess_core::Fen::STARTPOS, 3),
        ("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3", 2),
        ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 3),
        ("8/2k5/8/3p4/8/2K1P3/8/8 w - - 0 1", 4),
        ("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 3),
    ];
    for (fen, depth) in cases {
        assert_eq!(search_score(fen, depth), reference_score(fen, depth), "{fen}");
    }
}

#[test]
fn table_does_not_change_the_best_move_for_a_forced_mate() {
    let fen = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
    for tt_mb in [0, 1, 16] {
        let mut position: Position<FixedHistory> = Position::from_fen(fen).unwrap();
        let report = Searcher::new(4, tt_mb).search(&mut position);
        assert_eq!(report.best_move.unwrap().to_uci(), "a1a8");
        assert_eq!(report.score, MATE - 1);
    }
}

#[test]
fn searcher_reuses_its_table_across_searches() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut searcher = Searcher::new(3, 4);
    let mut position: Position<FixedHistory> = Position::from_fen(fen).unwrap();
    let cold = searcher.search(&mut position);
    let warm = searcher.search(&mut position);
    assert!(warm.nodes <= cold.nodes);
    assert_eq!(position.to_fen(), fen);

    searcher.clear();
    assert_eq!(searcher.search(&mut position).nodes, cold.nodes);
}

#[test]
fn rejected_request_leaves_the_pending_one_alone() {
    let mut engine = Engine::new(EngineConfig {
        max_depth: 2,
        tt_size_mb: 1,
    })
    .unwrap();
    engine.set_position("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();

    let (report_tx, report_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    engine
        .start_worker(move |report| {
            report_tx.send(report).unwrap();
            // Hold the request open until the test lets go.
            gate_rx.recv().unwrap();
        })
        .unwrap();

    assert!(engine.find_best_move());
    assert!(engine.is_searching());
    assert!(!engine.find_best_move());
    assert!(matches!(
        engine.set_position(chess_core::Fen::STARTPOS),
        Err(SearchError::Busy)
    ));
    assert!(matches!(engine.set_max_depth(5), Err(SearchError::Busy)));
    assert!(matches!(engine.set_tt_size(2), Err(SearchError::Busy)));

    let first = report_rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert_eq!(first.best_move.unwrap().to_uci(), "a1a8");
    assert!(engine.is_searching());

    gate_tx.send(()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(30);
    while engine.is_searching() {
        assert!(Instant::now() < deadline, "worker never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(report_rx.try_recv().is_err());

    // The worker is idle again and accepts a new root.
    engine.set_position("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    gate_tx.send(()).unwrap();
    assert!(engine.find_best_move());
    let second = report_rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert_eq!(second.best_move, None);
    assert_eq!(second.score, -MATE);

    engine.stop();
    assert!(!engine.is_searching());
    assert!(report_rx.try_recv().is_err());
}

#[test]
fn search_sees_game_repetitions() {
    let mut game = chess_engine::Game::new();
    for uci in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"] {
        game.do_move_uci(uci).unwrap();
    }
    // f6g8 repeats the start position a third time.
    let mut position = game.search_position();
    let report = Searcher::new(1, 0).search(&mut position);
    assert!(report.best_move.is_some());

    let mut position = game.search_position();
    position.update();
    let repeat = generate_moves(&position, GenType::All)
        .iter()
        .copied()
        .find(|m| m.to_uci() == "f6g8")
        .unwrap();
    position.do_move(repeat);
    assert!(position.is_draw());
}

const STARTS: [&str; 3] = [
    chess_core::Fen::STARTPOS,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn incremental_eval_matches_scratch(
        start in 0..STARTS.len(),
        picks in prop::collection::vec(any::<usize>(), 1..60),
    ) {
        let mut position: Position<FixedHistory> = Position::from_fen(STARTS[start]).unwrap();
        let mut eval = Evaluation::new();
        eval.init(&position);
        let mut scores = vec![eval.score()];

        for pick in picks {
            position.update();
            let moves = generate_moves(&position, GenType::All);
            if moves.is_empty() || position.history().len() >= FixedHistory::PLY_CEILING {
                break;
            }
            let mv = moves[pick % moves.len()];
            position.do_move(mv);
            eval.update(&position, mv);

            let mut scratch = Evaluation::new();
            scratch.init(&position);
            prop_assert_eq!(eval.score(), scratch.score());
            prop_assert_eq!(eval.phase(), scratch.phase());
            scores.push(eval.score());
        }

        scores.pop();
        while let Some(expected) = scores.pop() {
            position.undo_move();
            eval.rollback();
            prop_assert_eq!(eval.score(), expected);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn shallow_search_matches_minimax(
        start in 0..STARTS.len(),
        picks in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let mut position: Position<FixedHistory> = Position::from_fen(STARTS[start]).unwrap();
        for pick in picks {
            position.update();
            let moves = generate_moves(&position, GenType::All);
            if moves.is_empty() {
                break;
            }
            position.do_move(moves[pick % moves.len()]);
        }
        position.update();
        prop_assume!(!generate_moves(&position, GenType::All).is_empty());

        let fen = position.to_fen();
        prop_assert_eq!(search_score(&fen, 2), reference_score(&fen, 2));
    }
}
