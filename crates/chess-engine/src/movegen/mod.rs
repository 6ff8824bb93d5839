//! Legal move generation.
//!
//! Generation reads the attack information cached on the position by
//! [`Position::update`]: the enemy attack map keeps the king off attacked
//! squares, the evasion mask restricts other pieces while in check, and pinned
//! pieces may only move along the line through their king. No generated move
//! needs a legality test afterwards.

mod attacks;
pub mod perft;
mod rays;

use crate::history::StateStack;
use crate::position::en_passant_victim;
use crate::{Bitboard, Position};
use chess_core::{Move, MoveFlag, Piece, Square};

pub use attacks::{king_attacks, knight_attacks, pawn_attacks};
pub use rays::{between, bishop_attacks, line, rook_attacks};

/// Which moves to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    /// Every legal move.
    All,
    /// Captures (en passant included) and promotions. While in check this is
    /// every legal evasion, so that mate is still seen.
    Forced,
}

/// A list of moves with a fixed maximum capacity.
///
/// Chess positions have at most 218 legal moves, so a fixed-size array avoids
/// heap allocation in the search.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const MAX_MOVES: usize = 256;

    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; Self::MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        self.moves[self.len] = m;
        self.len += 1;
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    pub fn contains(&self, m: Move) -> bool {
        self.as_slice().contains(&m)
    }

    fn push_promotions(&mut self, from: Square, to: Square) {
        for flag in MoveFlag::PROMOTIONS {
            self.push(Move::new(from, to, flag));
        }
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Generates legal moves for the side to move.
///
/// The position's attack information must be current.
pub fn generate_moves<H: StateStack>(position: &Position<H>, gen: GenType) -> MoveList {
    let mut moves = MoveList::new();
    let us = position.side_to_move();
    let them = us.opposite();
    let king = position.king_square(us);
    let own = position.occupancy(us);
    let enemies = position.occupancy(them);
    let occupied = position.occupied();
    let in_check = position.checkers().any();
    let captures_only = gen == GenType::Forced && !in_check;

    let mut king_targets = king_attacks(king) & !own & !position.enemy_attacks();
    if captures_only {
        king_targets &= enemies;
    }
    for to in king_targets {
        moves.push(Move::new(king, to, MoveFlag::Quiet));
    }

    if position.checkers().more_than_one() {
        return moves;
    }

    let mut targets = position.evasion_mask() & !own;
    if captures_only {
        targets &= enemies;
    }
    let pinned = position.pinned();

    for from in position.pieces(us, Piece::Knight) & !pinned {
        for to in knight_attacks(from) & targets {
            moves.push(Move::new(from, to, MoveFlag::Quiet));
        }
    }

    let queens = position.pieces(us, Piece::Queen);
    let diagonal = position.pieces(us, Piece::Bishop) | queens;
    let orthogonal = position.pieces(us, Piece::Rook) | queens;
    for (sliders, attacks) in [
        (diagonal, bishop_attacks as fn(Square, Bitboard) -> Bitboard),
        (orthogonal, rook_attacks as fn(Square, Bitboard) -> Bitboard),
    ] {
        for from in sliders {
            let mut reach = attacks(from, occupied) & targets;
            if pinned.contains(from) {
                reach &= line(king, from);
            }
            for to in reach {
                moves.push(Move::new(from, to, MoveFlag::Quiet));
            }
        }
    }

    generate_pawn_moves(position, captures_only, &mut moves);

    if !in_check && !captures_only {
        generate_castling_moves(position, &mut moves);
    }

    moves
}

fn generate_pawn_moves<H: StateStack>(
    position: &Position<H>,
    captures_only: bool,
    moves: &mut MoveList,
) {
    let us = position.side_to_move();
    let them = us.opposite();
    let king = position.king_square(us);
    let enemies = position.occupancy(them);
    let occupied = position.occupied();
    let evasion = position.evasion_mask();
    let pinned = position.pinned();

    for from in position.pieces(us, Piece::Pawn) {
        let allowed = if pinned.contains(from) {
            evasion & line(king, from)
        } else {
            evasion
        };

        let one = from.offset(us.forward());
        if !occupied.contains(one) {
            if allowed.contains(one) {
                if one.rank() == us.promotion_rank() {
                    moves.push_promotions(from, one);
                } else if !captures_only {
                    moves.push(Move::new(from, one, MoveFlag::Quiet));
                }
            }
            if !captures_only && from.rank() == us.double_push_rank() {
                let two = one.offset(us.forward());
                if !occupied.contains(two) && allowed.contains(two) {
                    moves.push(Move::new(from, two, MoveFlag::DoublePush));
                }
            }
        }

        for to in pawn_attacks(from, us) & enemies & allowed {
            if to.rank() == us.promotion_rank() {
                moves.push_promotions(from, to);
            } else {
                moves.push(Move::new(from, to, MoveFlag::Quiet));
            }
        }

        if let Some(target) = position.en_passant() {
            if pawn_attacks(from, us).contains(target)
                && en_passant_is_legal(position, from, target)
            {
                moves.push(Move::new(from, target, MoveFlag::EnPassant));
            }
        }
    }
}

/// En passant removes two pieces from one rank, which pin detection cannot
/// see, so the resulting occupancy is checked against the enemy sliders.
fn en_passant_is_legal<H: StateStack>(
    position: &Position<H>,
    from: Square,
    target: Square,
) -> bool {
    let us = position.side_to_move();
    let them = us.opposite();
    let victim = en_passant_victim(target, us);
    let evasion = position.evasion_mask();
    if !evasion.contains(target) && !evasion.contains(victim) {
        return false;
    }

    let king = position.king_square(us);
    let occupied = (position.occupied()
        ^ Bitboard::from_square(from)
        ^ Bitboard::from_square(victim))
        | Bitboard::from_square(target);
    let queens = position.pieces(them, Piece::Queen);
    let rooks = position.pieces(them, Piece::Rook) | queens;
    let bishops = position.pieces(them, Piece::Bishop) | queens;
    (rook_attacks(king, occupied) & rooks).is_empty()
        && (bishop_attacks(king, occupied) & bishops).is_empty()
}

fn generate_castling_moves<H: StateStack>(position: &Position<H>, moves: &mut MoveList) {
    let us = position.side_to_move();
    let rights = position.castling();
    let king = position.king_square(us);
    let occupied = position.occupied();
    let attacked = position.enemy_attacks();
    let (king_rook, queen_rook) = match us {
        chess_core::Color::White => (Square::H1, Square::A1),
        chess_core::Color::Black => (Square::H8, Square::A8),
    };

    if rights.king_side(us) {
        let path = Bitboard::from_square(king.offset(1)) | Bitboard::from_square(king.offset(2));
        if (between(king, king_rook) & occupied).is_empty() && (path & attacked).is_empty() {
            moves.push(Move::new(king, king.offset(2), MoveFlag::CastleKingSide));
        }
    }

    if rights.queen_side(us) {
        let path = Bitboard::from_square(king.offset(-1)) | Bitboard::from_square(king.offset(-2));
        if (between(king, queen_rook) & occupied).is_empty() && (path & attacked).is_empty() {
            moves.push(Move::new(king, king.offset(-2), MoveFlag::CastleQueenSide));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::GrowableHistory;

    fn position(fen: &str) -> Position<GrowableHistory> {
        Position::from_fen(fen).unwrap()
    }

    fn ucis(moves: &MoveList) -> Vec<String> {
        let mut out: Vec<String> = moves.iter().map(|m| m.to_uci()).collect();
        out.sort();
        out
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let moves = generate_moves(&position(chess_core::Fen::STARTPOS), GenType::All);
        assert_eq!(moves.len(), 20);
        let double_pushes = moves.iter().filter(|m| m.flag() == MoveFlag::DoublePush).count();
        assert_eq!(double_pushes, 8);
    }

    #[test]
    fn pinned_piece_stays_on_its_line() {
        // The e2 rook is pinned by the e8 rook and may only slide on the e-file.
        let pos = position("k3r3/8/8/8/8/8/4R3/4K3 w - - 0 1");
        let rook_moves: Vec<String> = generate_moves(&pos, GenType::All)
            .iter()
            .filter(|m| m.from() == Square::from_algebraic("e2").unwrap())
            .map(|m| m.to_uci())
            .collect();
        assert_eq!(rook_moves.len(), 6);
        assert!(rook_moves.iter().all(|m| m.starts_with("e2e")));
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Rook on the e-file and knight on d3 both check; the a1 rook cannot help.
        let pos = position("4r2k/8/8/8/8/3n4/8/R3K3 w Q - 0 1");
        assert_eq!(pos.checkers().count(), 2);
        let moves = ucis(&generate_moves(&pos, GenType::All));
        assert_eq!(moves, vec!["e1d1", "e1d2", "e1f1"]);
    }

    #[test]
    fn check_evasions_block_capture_or_step_aside() {
        // Rook on e8 checks; the bishop blocks on e3 or the king steps aside.
        let pos = position("4r2k/8/8/8/8/8/3B4/4K3 w - - 0 1");
        assert!(pos.is_check());
        let moves = ucis(&generate_moves(&pos, GenType::All));
        assert!(moves.contains(&"d2e3".to_string()));
        assert!(moves.contains(&"e1f2".to_string()));
        assert!(!moves.contains(&"d2c3".to_string()));
        assert!(!moves.contains(&"e1e2".to_string()));
    }

    #[test]
    fn castling_needs_empty_and_safe_path() {
        let pos = position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = ucis(&generate_moves(&pos, GenType::All));
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        // The f8 rook attacks f1, so king side castling is out.
        let pos = position("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1");
        let moves = ucis(&generate_moves(&pos, GenType::All));
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        // b1 is only crossed by the rook, so an attack there does not matter.
        let pos = position("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        let moves = ucis(&generate_moves(&pos, GenType::All));
        assert!(moves.contains(&"e1c1".to_string()));
    }

    #[test]
    fn en_passant_discovered_check_is_illegal() {
        // Capturing on d6 would empty the fifth rank between the king and rook.
        let pos = position("4k3/8/8/K2pP2r/8/8/8/8 w - d6 0 1");
        let moves = generate_moves(&pos, GenType::All);
        assert!(moves.iter().all(|m| m.flag() != MoveFlag::EnPassant));

        let pos = position("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let moves = generate_moves(&pos, GenType::All);
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::EnPassant));
    }

    #[test]
    fn en_passant_captures_a_checking_pawn() {
        // The d5 pawn just double pushed and checks the e4 king.
        let pos = position("4k3/8/8/3pP3/4K3/8/8/8 w - d6 0 1");
        assert!(pos.is_check());
        let moves = generate_moves(&pos, GenType::All);
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::EnPassant));
    }

    #[test]
    fn forced_moves_are_captures_and_promotions() {
        let pos = position("4k3/1P6/8/3p4/4P3/8/8/4K2R w - - 0 1");
        let forced = ucis(&generate_moves(&pos, GenType::Forced));
        assert_eq!(
            forced,
            vec!["b7b8b", "b7b8n", "b7b8q", "b7b8r", "e4d5"]
        );
    }

    #[test]
    fn forced_moves_in_check_are_all_evasions() {
        let pos = position("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        let all = generate_moves(&pos, GenType::All);
        let forced = generate_moves(&pos, GenType::Forced);
        assert_eq!(ucis(&all), ucis(&forced));
        assert_eq!(ucis(&forced), vec!["e1d2", "e1e2", "e1f2"]);
    }

    #[test]
    fn promotions_come_in_fours() {
        let pos = position("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let moves = generate_moves(&pos, GenType::All);
        let promotions = moves.iter().filter(|m| m.flag().is_promotion()).count();
        assert_eq!(promotions, 8);
    }
}
