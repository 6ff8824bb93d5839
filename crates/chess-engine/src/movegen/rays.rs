//! Sliding-piece attacks by ray scanning, plus the between/line tables used
//! for pin and check-evasion masks.

use crate::Bitboard;
use chess_core::Square;
use std::sync::OnceLock;

/// Ray directions as (file, rank) steps. The first four walk towards higher
/// square indices, the last four towards lower ones.
const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 0),
    (1, 1),
    (-1, 1),
    (0, -1),
    (-1, 0),
    (-1, -1),
    (1, -1),
];

const ORTHOGONAL: [usize; 4] = [0, 1, 4, 5];
const DIAGONAL: [usize; 4] = [2, 3, 6, 7];

/// `RAYS[dir][sq]`: every square reachable from `sq` along `dir` on an empty
/// board, excluding `sq` itself.
const RAYS: [[Bitboard; 64]; 8] = compute_rays();

const fn compute_rays() -> [[Bitboard; 64]; 8] {
    let mut rays = [[Bitboard::EMPTY; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let mut sq = 0;
        while sq < 64 {
            let mut f = (sq % 8) as i8 + DIRECTIONS[dir].0;
            let mut r = (sq / 8) as i8 + DIRECTIONS[dir].1;
            let mut bits = 0u64;
            while f >= 0 && f < 8 && r >= 0 && r < 8 {
                bits |= 1u64 << ((r * 8 + f) as u32);
                f += DIRECTIONS[dir].0;
                r += DIRECTIONS[dir].1;
            }
            rays[dir][sq] = Bitboard(bits);
            sq += 1;
        }
        dir += 1;
    }
    rays
}

#[inline]
fn ray_attacks(sq: Square, dir: usize, occupied: Bitboard) -> Bitboard {
    let ray = RAYS[dir][sq.index() as usize];
    let blockers = ray & occupied;
    let first = if dir < 4 { blockers.lsb() } else { blockers.msb() };
    match first {
        Some(blocker) => ray ^ RAYS[dir][blocker.index() as usize],
        None => ray,
    }
}

/// Rook attacks from `sq` given the occupancy; the first blocker on each ray
/// is included.
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    ORTHOGONAL
        .iter()
        .fold(Bitboard::EMPTY, |acc, &dir| acc | ray_attacks(sq, dir, occupied))
}

/// Bishop attacks from `sq` given the occupancy.
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    DIAGONAL
        .iter()
        .fold(Bitboard::EMPTY, |acc, &dir| acc | ray_attacks(sq, dir, occupied))
}

struct LineTables {
    between: Vec<Bitboard>,
    line: Vec<Bitboard>,
}

static LINE_TABLES: OnceLock<LineTables> = OnceLock::new();

fn line_tables() -> &'static LineTables {
    LINE_TABLES.get_or_init(|| {
        let mut between = vec![Bitboard::EMPTY; 64 * 64];
        let mut line = vec![Bitboard::EMPTY; 64 * 64];
        for a in 0..64usize {
            for dir in 0..8usize {
                let back = (dir + 4) % 8;
                let full = RAYS[dir][a] | RAYS[back][a] | Bitboard(1u64 << a);
                for b in RAYS[dir][a] {
                    let b = b.index() as usize;
                    between[a * 64 + b] = RAYS[dir][a] & RAYS[back][b];
                    line[a * 64 + b] = full;
                }
            }
        }
        LineTables { between, line }
    })
}

/// Squares strictly between `a` and `b` when they share a rank, file or
/// diagonal; empty otherwise.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard {
    line_tables().between[a.index() as usize * 64 + b.index() as usize]
}

/// The whole board line through `a` and `b`, both included, when they are
/// aligned; empty otherwise.
#[inline]
pub fn line(a: Square, b: Square) -> Bitboard {
    line_tables().line[a.index() as usize * 64 + b.index() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn set(squares: &[&str]) -> Bitboard {
        squares
            .iter()
            .fold(Bitboard::EMPTY, |acc, s| acc | Bitboard::from_square(sq(s)))
    }

    #[test]
    fn empty_board_mobility() {
        assert_eq!(rook_attacks(sq("d4"), Bitboard::EMPTY).count(), 14);
        assert_eq!(bishop_attacks(sq("d4"), Bitboard::EMPTY).count(), 13);
    }

    #[test]
    fn blockers_stop_rays() {
        let occupied = set(&["d6", "b4", "d2", "g4"]);
        let attacks = rook_attacks(sq("d4"), occupied);
        assert_eq!(
            attacks,
            set(&["d5", "d6", "c4", "b4", "d3", "d2", "e4", "f4", "g4"])
        );

        let occupied = set(&["f6", "b2"]);
        let attacks = bishop_attacks(sq("d4"), occupied);
        assert!(attacks.contains(sq("f6")));
        assert!(!attacks.contains(sq("g7")));
        assert!(attacks.contains(sq("b2")));
        assert!(!attacks.contains(Square::A1));
        assert!(attacks.contains(sq("a7")));
        assert!(attacks.contains(Square::G1));
    }

    #[test]
    fn between_squares() {
        assert_eq!(between(Square::A1, sq("a4")), set(&["a2", "a3"]));
        assert_eq!(between(sq("a4"), Square::A1), set(&["a2", "a3"]));
        assert_eq!(between(sq("c1"), sq("f4")), set(&["d2", "e3"]));
        assert!(between(Square::E1, Square::F1).is_empty());
        assert!(between(Square::A1, sq("b3")).is_empty());
    }

    #[test]
    fn lines_through_aligned_squares() {
        let diagonal = line(sq("c3"), sq("e5"));
        assert_eq!(diagonal.count(), 8);
        assert!(diagonal.contains(Square::A1) && diagonal.contains(Square::H8));
        assert!(line(Square::A1, sq("b3")).is_empty());
        assert_eq!(line(Square::E1, Square::E8), line(Square::E8, sq("e4")));
    }
}
