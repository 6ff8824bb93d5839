//! Move ordering.
//!
//! Every move gets a score when the picker is built and [`MovePicker::next`]
//! hands out the best remaining one. Most nodes cut off after a few moves, so
//! a lazy selection beats sorting the whole list up front.

use chess_core::{Color, Move, MoveFlag, Piece, Square};
use chess_engine::{Bitboard, MoveList, Position, StateStack};

/// Score that puts a move ahead of everything else.
const FIRST: i32 = 1_000_000;
/// Bonus for a quiet move that caused a cutoff at the same ply.
const KILLER_BONUS: i32 = 500;
/// Captures are scaled so that winning captures outrank killers.
const CAPTURE_SCALE: i32 = 9;

#[derive(Debug, Clone, Copy)]
struct ScoredMove {
    mv: Move,
    /// Score ignoring any preferred move.
    base: i32,
    score: i32,
}

/// Best-first selector over one node's moves.
pub struct MovePicker {
    moves: [ScoredMove; MoveList::MAX_MOVES],
    len: usize,
    cursor: usize,
}

impl MovePicker {
    /// Scores `moves` for `position`. `preferred` (the transposition table
    /// move) is always picked first.
    pub fn new<H: StateStack>(
        moves: &MoveList,
        position: &Position<H>,
        preferred: Option<Move>,
        killers: [Option<Move>; 2],
    ) -> Self {
        let blank = ScoredMove {
            mv: Move::NULL,
            base: 0,
            score: 0,
        };
        let mut picker = MovePicker {
            moves: [blank; MoveList::MAX_MOVES],
            len: moves.len(),
            cursor: 0,
        };
        for (slot, &mv) in picker.moves.iter_mut().zip(moves.iter()) {
            let base = base_score(position, mv, &killers);
            let score = if Some(mv) == preferred { FIRST } else { base };
            *slot = ScoredMove { mv, base, score };
        }
        picker
    }

    /// Removes and returns the highest-scored remaining move.
    pub fn next(&mut self) -> Option<Move> {
        if self.cursor == self.len {
            return None;
        }
        let mut best = self.cursor;
        for i in self.cursor + 1..self.len {
            if self.moves[i].score > self.moves[best].score {
                best = i;
            }
        }
        self.moves.swap(self.cursor, best);
        self.cursor += 1;
        Some(self.moves[self.cursor - 1].mv)
    }

    /// Rewinds the picker and makes `best` the first move, for the next
    /// iterative-deepening pass over the same node.
    pub fn update(&mut self, best: Move) {
        self.cursor = 0;
        for entry in &mut self.moves[..self.len] {
            entry.score = if entry.mv == best { FIRST } else { entry.base };
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn base_score<H: StateStack>(
    position: &Position<H>,
    mv: Move,
    killers: &[Option<Move>; 2],
) -> i32 {
    if mv.flag() == MoveFlag::EnPassant || position.piece_at(mv.to()).is_some() {
        return CAPTURE_SCALE * static_exchange(position, mv);
    }
    if killers.contains(&Some(mv)) {
        return KILLER_BONUS;
    }
    0
}

/// Net material result of the capture sequence `mv` starts on its target
/// square, both sides always recapturing with their least valuable piece and
/// free to stop when continuing would lose material.
pub fn static_exchange<H: StateStack>(position: &Position<H>, mv: Move) -> i32 {
    let (from, target) = (mv.from(), mv.to());
    let mover = position.side_to_move();
    let mut occupied = position.occupied() ^ Bitboard::from_square(from);

    let first_victim = if mv.flag() == MoveFlag::EnPassant {
        let victim = Square::from_coords(target.file(), from.rank())
            .expect("en passant victim is on the board");
        occupied ^= Bitboard::from_square(victim);
        Piece::Pawn
    } else {
        match position.piece_at(target) {
            Some((piece, _)) => piece,
            None => return 0,
        }
    };
    let Some((mut on_target, _)) = position.piece_at(from) else {
        return 0;
    };

    let mut gain = [0i32; 32];
    gain[0] = first_victim.exchange_value();
    let mut depth = 1;
    let mut side = mover;

    while depth < gain.len() {
        side = side.opposite();
        let attackers = position.attackers_to(target, occupied) & occupied;
        let Some((piece, sq)) = least_valuable_attacker(position, attackers, side) else {
            break;
        };
        // A king may only take last.
        if piece == Piece::King {
            let defenders = attackers & position.occupancy(side.opposite());
            if defenders.any() {
                break;
            }
        }
        gain[depth] = on_target.exchange_value() - gain[depth - 1];
        occupied ^= Bitboard::from_square(sq);
        on_target = piece;
        depth += 1;
    }

    for d in (1..depth).rev() {
        gain[d - 1] = -(-gain[d - 1]).max(gain[d]);
    }
    gain[0]
}

const ATTACKER_ORDER: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

fn least_valuable_attacker<H: StateStack>(
    position: &Position<H>,
    attackers: Bitboard,
    side: Color,
) -> Option<(Piece, Square)> {
    ATTACKER_ORDER.iter().find_map(|&piece| {
        (attackers & position.pieces(side, piece))
            .lsb()
            .map(|sq| (piece, sq))
    })
}
