//! Iterative-deepening alpha-beta search.
//!
//! [`Searcher::search`] deepens one ply at a time up to the configured depth,
//! reusing the previous pass's best move to order the next. Interior nodes run
//! a fail-soft negamax backed by the transposition table; the horizon is
//! resolved by a quiescence search over forced moves.

use std::time::{Duration, Instant};

use chess_core::{Move, MoveFlag};
use chess_engine::{generate_moves, FixedHistory, GenType, Position, StateStack};
use tracing::{debug, info};

use crate::eval::Evaluation;
use crate::picker::MovePicker;
use crate::tt::{Bound, TranspositionTable};

/// Larger than any score a search can return.
pub const INF: i32 = 32_000;

/// Score for being mated at the root; mate in `n` plies scores `MATE - n`.
pub const MATE: i32 = 30_000;

/// Scores at least this large (in absolute value) announce a forced mate.
pub const MATE_BOUND: i32 = MATE - FixedHistory::PLY_CEILING as i32;

pub const DRAW: i32 = 0;

/// Deepest ply the search may reach, quiescence included.
const MAX_PLY: usize = FixedHistory::PLY_CEILING - 1;

/// Outcome of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    /// `None` when the root has no legal move.
    pub best_move: Option<Move>,
    /// Score of `best_move` for the side to move at the root.
    pub score: i32,
    /// Last fully completed iteration.
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
}

impl SearchReport {
    /// Plies to the announced mate, if the score is a mate score. Negative
    /// when the side to move is being mated.
    pub fn mate_in(&self) -> Option<i32> {
        if self.score >= MATE_BOUND {
            Some(MATE - self.score)
        } else if self.score <= -MATE_BOUND {
            Some(-(MATE + self.score))
        } else {
            None
        }
    }
}

/// Stores mate scores relative to the node instead of the root, so that a
/// cached mate stays correct when reached at another ply.
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

/// Single-threaded search state: evaluation, transposition table and killer
/// moves, reused from one search to the next.
pub struct Searcher {
    tt: TranspositionTable,
    eval: Evaluation,
    killers: Vec<[Option<Move>; 2]>,
    max_depth: u8,
    nodes: u64,
    root_len: usize,
}

impl Searcher {
    /// Creates a searcher with a `tt_size_mb` megabyte table. `max_depth`
    /// must already be validated.
    pub fn new(max_depth: u8, tt_size_mb: usize) -> Self {
        Searcher {
            tt: TranspositionTable::new(tt_size_mb),
            eval: Evaluation::new(),
            killers: vec![[None; 2]; MAX_PLY + 1],
            max_depth,
            nodes: 0,
            root_len: 0,
        }
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, depth: u8) {
        self.max_depth = depth;
    }

    /// Reallocates the transposition table, dropping its contents.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt.resize(mb * 1024 * 1024);
    }

    /// Forgets everything learned in earlier searches.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.killers.fill([None; 2]);
    }

    /// Searches `position` to the configured depth. The position is restored
    /// before returning.
    pub fn search<H: StateStack>(&mut self, position: &mut Position<H>) -> SearchReport {
        let start = Instant::now();
        self.nodes = 0;
        self.killers.fill([None; 2]);
        self.root_len = position.history().len();

        position.update();
        self.eval.init(position);

        let moves = generate_moves(position, GenType::All);
        let mut report = SearchReport {
            best_move: None,
            score: if position.is_check() { -MATE } else { DRAW },
            depth: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
        };
        if moves.is_empty() {
            info!(score = report.score, "no legal moves at the root");
            report.elapsed = start.elapsed();
            return report;
        }

        let hinted = self.tt.probe(position.hash(), 0, -INF, INF).mv;
        let mut picker = MovePicker::new(&moves, position, hinted, [None; 2]);

        self.eval.push();
        for depth in 1..=self.max_depth {
            let mut alpha = -INF;
            let mut best = None;

            while let Some(mv) = picker.next() {
                position.do_move(mv);
                self.eval.update(position, mv);
                let score = -self.negamax(position, depth - 1, -INF, -alpha);
                position.undo_move();
                self.eval.rollback();

                if best.is_none() || score > alpha {
                    alpha = score;
                    best = Some(mv);
                }
            }

            report.best_move = best;
            report.score = alpha;
            report.depth = depth;
            debug!(
                depth,
                score = alpha,
                nodes = self.nodes,
                best = %best.unwrap_or(Move::NULL),
                "iteration complete"
            );

            if let Some(mv) = best {
                picker.update(mv);
                self.tt.store(position.hash(), alpha, Some(mv), depth, Bound::Exact);
            }
        }
        self.eval.pop();
        position.update();

        report.nodes = self.nodes;
        report.elapsed = start.elapsed();
        info!(
            best = %report.best_move.unwrap_or(Move::NULL),
            score = report.score,
            depth = report.depth,
            nodes = report.nodes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "search finished"
        );
        report
    }

    fn ply<H: StateStack>(&self, position: &Position<H>) -> usize {
        position.history().len() - self.root_len
    }

    fn negamax<H: StateStack>(
        &mut self,
        position: &mut Position<H>,
        depth: u8,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        self.nodes += 1;
        let ply = self.ply(position);
        if position.is_draw() {
            return DRAW;
        }

        let hash = position.hash();
        let probe = self.tt.probe(
            hash,
            depth,
            score_to_tt(alpha, ply),
            score_to_tt(beta, ply),
        );
        if let Some(score) = probe.score {
            return score_from_tt(score, ply);
        }

        if depth == 0 {
            return self.qsearch(position, alpha, beta);
        }

        position.update();
        let moves = generate_moves(position, GenType::All);
        if moves.is_empty() {
            return if position.is_check() {
                -MATE + ply as i32
            } else {
                DRAW
            };
        }

        let original_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move = None;
        let mut picker = MovePicker::new(&moves, position, probe.mv, self.killers[ply]);

        while let Some(mv) = picker.next() {
            let quiet = position.piece_at(mv.to()).is_none()
                && !mv.flag().is_promotion()
                && mv.flag() != MoveFlag::EnPassant;

            position.do_move(mv);
            self.eval.update(position, mv);
            let score = -self.negamax(position, depth - 1, -beta, -alpha);
            position.undo_move();
            self.eval.rollback();

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        if quiet {
                            self.remember_killer(ply, mv);
                        }
                        let stored = score_to_tt(best_score, ply);
                        self.tt.store(hash, stored, best_move, depth, Bound::Lower);
                        return best_score;
                    }
                }
            }
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.tt
            .store(hash, score_to_tt(best_score, ply), best_move, depth, bound);
        best_score
    }

    fn qsearch<H: StateStack>(
        &mut self,
        position: &mut Position<H>,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        self.nodes += 1;
        let ply = self.ply(position);
        if position.is_draw() {
            return DRAW;
        }

        let stand_pat = self.eval.score();
        if ply >= MAX_PLY {
            return stand_pat;
        }

        position.update();
        let in_check = position.is_check();
        // In check every evasion is generated, so standing pat would hide mates.
        let mut best = if in_check { -INF } else { stand_pat };
        if best >= beta {
            return best;
        }
        alpha = alpha.max(best);

        let moves = generate_moves(position, GenType::Forced);
        if moves.is_empty() {
            return if in_check { -MATE + ply as i32 } else { best };
        }

        let mut picker = MovePicker::new(&moves, position, None, [None; 2]);
        while let Some(mv) = picker.next() {
            position.do_move(mv);
            self.eval.update(position, mv);
            let score = -self.qsearch(position, -beta, -alpha);
            position.undo_move();
            self.eval.rollback();

            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }
        best
    }

    fn remember_killer(&mut self, ply: usize, mv: Move) {
        let slots = &mut self.killers[ply];
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }
}
