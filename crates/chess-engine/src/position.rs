//! Mutable board with reversible move application.

use std::fmt;

use chess_core::{CastlingRights, Color, Fen, FenError, Move, MoveFlag, Piece, Square};

use crate::history::{FixedHistory, GrowableHistory, State, StateStack};
use crate::movegen::{
    between, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::zobrist::ZOBRIST;
use crate::Bitboard;

/// Castling rights that survive a move touching each square.
const CASTLING_MASK: [u8; 64] = castling_mask();

const fn castling_mask() -> [u8; 64] {
    let mut mask = [0b1111u8; 64];
    mask[Square::A1.index() as usize] = !CastlingRights::WHITE_QUEEN_SIDE;
    mask[Square::H1.index() as usize] = !CastlingRights::WHITE_KING_SIDE;
    mask[Square::E1.index() as usize] =
        !(CastlingRights::WHITE_KING_SIDE | CastlingRights::WHITE_QUEEN_SIDE);
    mask[Square::A8.index() as usize] = !CastlingRights::BLACK_QUEEN_SIDE;
    mask[Square::H8.index() as usize] = !CastlingRights::BLACK_KING_SIDE;
    mask[Square::E8.index() as usize] =
        !(CastlingRights::BLACK_KING_SIDE | CastlingRights::BLACK_QUEEN_SIDE);
    mask
}

/// Rook origin and destination for a castling move landing the king on `king_to`.
#[inline]
pub fn castling_rook(king_to: Square, flag: MoveFlag) -> (Square, Square) {
    match flag {
        MoveFlag::CastleKingSide => (king_to.offset(1), king_to.offset(-1)),
        _ => (king_to.offset(-2), king_to.offset(1)),
    }
}

/// Square of the pawn removed by an en passant capture onto `to`.
#[inline]
pub(crate) fn en_passant_victim(to: Square, mover: Color) -> Square {
    to.offset(-mover.forward())
}

/// A chess position.
///
/// Pieces are stored both as per-color, per-kind bitboards and as a square
/// mailbox. Everything that `undo_move` needs lives in the state history `H`.
///
/// The attack fields (`enemy_attacks`, `checkers`, `evasion_mask`, `pinned`)
/// are derived: [`Position::update`] must run after every `do_move` or
/// `undo_move` before generating moves or asking [`Position::is_check`].
///
/// Positions are not `Clone`; [`Position::fork`] makes the one explicit copy a
/// search needs.
pub struct Position<H: StateStack = GrowableHistory> {
    pieces: [[Bitboard; Piece::COUNT]; 2],
    occupancy: [Bitboard; 2],
    all: Bitboard,
    board: [Option<(Piece, Color)>; 64],
    side_to_move: Color,
    fullmove_number: u32,
    history: H,

    enemy_attacks: Bitboard,
    checkers: Bitboard,
    evasion_mask: Bitboard,
    pinned: Bitboard,
    fresh: bool,
}

impl<H: StateStack> Position<H> {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::from_fen(Fen::STARTPOS).expect("STARTPOS is valid")
    }

    /// Builds a position from FEN and computes its attack information.
    ///
    /// Castling rights whose king or rook is not on its home square are
    /// dropped.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fen = Fen::parse(fen)?;

        let mut position = Position {
            pieces: [[Bitboard::EMPTY; Piece::COUNT]; 2],
            occupancy: [Bitboard::EMPTY; 2],
            all: Bitboard::EMPTY,
            board: [None; 64],
            side_to_move: fen.side_to_move,
            fullmove_number: fen.fullmove_number,
            history: H::from_states(&[State::default()]),
            enemy_attacks: Bitboard::EMPTY,
            checkers: Bitboard::EMPTY,
            evasion_mask: Bitboard::FULL,
            pinned: Bitboard::EMPTY,
            fresh: false,
        };
        for sq in Square::all() {
            if let Some((piece, color)) = fen.board[sq.index() as usize] {
                position.put_piece(color, piece, sq);
            }
        }

        if let Some(target) = fen.en_passant {
            let us = fen.side_to_move;
            let victim = en_passant_victim(target, us);
            if position.board[victim.index() as usize] != Some((Piece::Pawn, us.opposite()))
                || position.board[target.index() as usize].is_some()
            {
                return Err(FenError::InvalidEnPassantSquare(target.to_algebraic()));
            }
        }

        let castling = position.sanitize_castling(fen.castling);
        {
            let root = position.history.top_mut();
            root.castling = castling;
            root.en_passant = fen.en_passant;
            root.halfmove_clock = fen.halfmove_clock;
        }
        let hash = position.compute_hash();
        position.history.top_mut().hash = hash;

        let them = position.side_to_move.opposite();
        let their_king = position.king_square(them);
        let attackers = position.attackers_to(their_king, position.all);
        if (attackers & position.occupancy(position.side_to_move)).any() {
            return Err(FenError::OpponentInCheck);
        }

        position.update();
        Ok(position)
    }

    fn sanitize_castling(&self, rights: CastlingRights) -> CastlingRights {
        let mut bits = rights.bits();
        let home = [
            (CastlingRights::WHITE_KING_SIDE, Color::White, Square::E1, Square::H1),
            (CastlingRights::WHITE_QUEEN_SIDE, Color::White, Square::E1, Square::A1),
            (CastlingRights::BLACK_KING_SIDE, Color::Black, Square::E8, Square::H8),
            (CastlingRights::BLACK_QUEEN_SIDE, Color::Black, Square::E8, Square::A8),
        ];
        for (flag, color, king, rook) in home {
            let king_home = self.board[king.index() as usize] == Some((Piece::King, color));
            let rook_home = self.board[rook.index() as usize] == Some((Piece::Rook, color));
            if !(king_home && rook_home) {
                bits &= !flag;
            }
        }
        CastlingRights::new(bits)
    }

    /// Six-field FEN for the current position.
    pub fn to_fen(&self) -> String {
        let state = self.history.top();
        Fen {
            board: self.board,
            side_to_move: self.side_to_move,
            castling: state.castling,
            en_passant: state.en_passant,
            halfmove_clock: state.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
        .to_string()
    }

    /// Copies the board into a position with a different history store.
    ///
    /// Only the reversible tail of the history is carried over (at most
    /// [`FixedHistory::SEED_LIMIT`] states), which is all that repetition and
    /// 50-move detection look at.
    pub fn fork<H2: StateStack>(&self) -> Position<H2> {
        let states = self.history.states();
        let tail = (self.history.top().halfmove_clock as usize + 1)
            .min(states.len())
            .min(FixedHistory::SEED_LIMIT);
        Position {
            pieces: self.pieces,
            occupancy: self.occupancy,
            all: self.all,
            board: self.board,
            side_to_move: self.side_to_move,
            fullmove_number: self.fullmove_number,
            history: H2::from_states(&states[states.len() - tail..]),
            enemy_attacks: self.enemy_attacks,
            checkers: self.checkers,
            evasion_mask: self.evasion_mask,
            pinned: self.pinned,
            fresh: self.fresh,
        }
    }

    #[inline]
    fn put_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bb;
        self.occupancy[color.index()] |= bb;
        self.all |= bb;
        self.board[sq.index() as usize] = Some((piece, color));
    }

    #[inline]
    fn remove_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bb = !Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] &= bb;
        self.occupancy[color.index()] &= bb;
        self.all &= bb;
        self.board[sq.index() as usize] = None;
    }

    /// Applies a legal move.
    ///
    /// `mv` must come from move generation for this exact position. Passing
    /// anything else corrupts the position.
    pub fn do_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = us.opposite();
        let (from, to, flag) = (mv.from(), mv.to(), mv.flag());
        let (piece, owner) = self.board[from.index() as usize]
            .expect("do_move called with an empty origin square");
        debug_assert_eq!(owner, us, "do_move called with an opponent piece");

        let prev = *self.history.top();
        let mut hash = prev.hash ^ ZOBRIST.side();
        if let Some(target) = prev.en_passant {
            hash ^= ZOBRIST.en_passant(target);
        }

        let captured = match flag {
            MoveFlag::EnPassant => {
                let victim = en_passant_victim(to, us);
                self.remove_piece(them, Piece::Pawn, victim);
                hash ^= ZOBRIST.piece(them, Piece::Pawn, victim);
                Some(Piece::Pawn)
            }
            _ => match self.board[to.index() as usize] {
                Some((victim, _)) => {
                    self.remove_piece(them, victim, to);
                    hash ^= ZOBRIST.piece(them, victim, to);
                    Some(victim)
                }
                None => None,
            },
        };

        let placed = flag.promotion_piece().unwrap_or(piece);
        self.remove_piece(us, piece, from);
        self.put_piece(us, placed, to);
        hash ^= ZOBRIST.piece(us, piece, from) ^ ZOBRIST.piece(us, placed, to);

        if flag.is_castling() {
            let (rook_from, rook_to) = castling_rook(to, flag);
            self.remove_piece(us, Piece::Rook, rook_from);
            self.put_piece(us, Piece::Rook, rook_to);
            hash ^= ZOBRIST.piece(us, Piece::Rook, rook_from)
                ^ ZOBRIST.piece(us, Piece::Rook, rook_to);
        }

        let castling = prev
            .castling
            .restrict(CASTLING_MASK[from.index() as usize] & CASTLING_MASK[to.index() as usize]);
        hash ^= ZOBRIST.castling(prev.castling) ^ ZOBRIST.castling(castling);

        let en_passant = match flag {
            MoveFlag::DoublePush => {
                let target = from.offset(us.forward());
                hash ^= ZOBRIST.en_passant(target);
                Some(target)
            }
            _ => None,
        };

        let halfmove_clock = if piece == Piece::Pawn || captured.is_some() {
            0
        } else {
            prev.halfmove_clock.saturating_add(1)
        };

        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = them;
        self.fresh = false;

        let state = self.history.create();
        state.hash = hash;
        state.castling = castling;
        state.halfmove_clock = halfmove_clock;
        state.move_played = Some(mv);
        state.en_passant = en_passant;
        state.captured = captured;
    }

    /// Reverts the most recent `do_move`.
    ///
    /// # Panics
    /// When no move has been made since the root.
    pub fn undo_move(&mut self) {
        let state = *self.history.top();
        let mv = state
            .move_played
            .expect("undo_move called on the root state");
        self.history.rollback();

        let us = self.side_to_move.opposite();
        let them = self.side_to_move;
        let (from, to, flag) = (mv.from(), mv.to(), mv.flag());
        let (placed, _) = self.board[to.index() as usize]
            .expect("moved piece missing from its destination");
        let piece = if flag.is_promotion() { Piece::Pawn } else { placed };

        self.remove_piece(us, placed, to);
        self.put_piece(us, piece, from);

        if flag.is_castling() {
            let (rook_from, rook_to) = castling_rook(to, flag);
            self.remove_piece(us, Piece::Rook, rook_to);
            self.put_piece(us, Piece::Rook, rook_from);
        }

        if let Some(victim) = state.captured {
            let sq = match flag {
                MoveFlag::EnPassant => en_passant_victim(to, us),
                _ => to,
            };
            self.put_piece(them, victim, sq);
        }

        if us == Color::Black {
            self.fullmove_number -= 1;
        }
        self.side_to_move = us;
        self.fresh = false;
    }

    /// Recomputes, for the side to move, the squares the opponent attacks,
    /// the pieces giving check and the mask of squares that resolve a check.
    ///
    /// The own king is removed from the occupancy so that squares behind it
    /// on a checking ray count as attacked.
    pub fn compute_enemy_attackers(&mut self) {
        let us = self.side_to_move;
        let them = us.opposite();
        let king = self.king_square(us);
        let occupied = self.all ^ Bitboard::from_square(king);

        let mut attacks = Bitboard::EMPTY;
        for sq in self.pieces(them, Piece::Pawn) {
            attacks |= pawn_attacks(sq, them);
        }
        for sq in self.pieces(them, Piece::Knight) {
            attacks |= knight_attacks(sq);
        }
        for sq in self.pieces(them, Piece::Bishop) | self.pieces(them, Piece::Queen) {
            attacks |= bishop_attacks(sq, occupied);
        }
        for sq in self.pieces(them, Piece::Rook) | self.pieces(them, Piece::Queen) {
            attacks |= rook_attacks(sq, occupied);
        }
        attacks |= king_attacks(self.king_square(them));
        self.enemy_attacks = attacks;

        self.checkers = self.attackers_to(king, self.all) & self.occupancy(them);
        self.evasion_mask = match self.checkers.count() {
            0 => Bitboard::FULL,
            1 => match self.checkers.lsb() {
                Some(checker) => self.checkers | between(king, checker),
                None => Bitboard::FULL,
            },
            _ => Bitboard::EMPTY,
        };
    }

    /// Recomputes the own pieces pinned to the king by an enemy slider.
    pub fn compute_pins_from_sliders(&mut self) {
        let us = self.side_to_move;
        let them = us.opposite();
        let king = self.king_square(us);
        let queens = self.pieces(them, Piece::Queen);
        let rooks = self.pieces(them, Piece::Rook) | queens;
        let bishops = self.pieces(them, Piece::Bishop) | queens;
        let snipers = (rook_attacks(king, Bitboard::EMPTY) & rooks)
            | (bishop_attacks(king, Bitboard::EMPTY) & bishops);

        let mut pinned = Bitboard::EMPTY;
        for sniper in snipers {
            let blockers = between(king, sniper) & self.all;
            if blockers.any() && !blockers.more_than_one() {
                pinned |= blockers & self.occupancy(us);
            }
        }
        self.pinned = pinned;
    }

    /// Runs both attack computations.
    pub fn update(&mut self) {
        self.compute_enemy_attackers();
        self.compute_pins_from_sliders();
        self.fresh = true;
    }

    /// True when the side to move is in check.
    pub fn is_check(&self) -> bool {
        debug_assert!(self.fresh, "is_check on a position without update()");
        self.checkers.any()
    }

    /// True on a draw by the 50-move rule or threefold repetition.
    pub fn is_draw(&self) -> bool {
        self.history.top().halfmove_clock >= 100 || self.history.repetition()
    }

    /// True when neither side has mating material: bare kings, or a single
    /// knight or bishop against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = [Piece::Pawn, Piece::Rook, Piece::Queen]
            .iter()
            .any(|&p| (self.pieces[0][p.index()] | self.pieces[1][p.index()]).any());
        if heavy {
            return false;
        }
        let minors = [Piece::Knight, Piece::Bishop]
            .iter()
            .map(|&p| (self.pieces[0][p.index()] | self.pieces[1][p.index()]).count())
            .sum::<u32>();
        minors <= 1
    }

    /// Pieces of both colors attacking `sq` given the occupancy `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let both = |piece: Piece| self.pieces[0][piece.index()] | self.pieces[1][piece.index()];
        let queens = both(Piece::Queen);
        (pawn_attacks(sq, Color::White) & self.pieces(Color::Black, Piece::Pawn))
            | (pawn_attacks(sq, Color::Black) & self.pieces(Color::White, Piece::Pawn))
            | (knight_attacks(sq) & both(Piece::Knight))
            | (king_attacks(sq) & both(Piece::King))
            | (bishop_attacks(sq, occupied) & (both(Piece::Bishop) | queens))
            | (rook_attacks(sq, occupied) & (both(Piece::Rook) | queens))
    }

    /// Zobrist hash computed from scratch.
    pub fn compute_hash(&self) -> u64 {
        let state = self.history.top();
        let mut hash = ZOBRIST.castling(state.castling);
        for sq in Square::all() {
            if let Some((piece, color)) = self.board[sq.index() as usize] {
                hash ^= ZOBRIST.piece(color, piece, sq);
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= ZOBRIST.side();
        }
        if let Some(target) = state.en_passant {
            hash ^= ZOBRIST.en_passant(target);
        }
        hash
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.board[sq.index() as usize]
    }

    #[inline]
    pub fn pieces(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[inline]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupancy[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.all
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces(color, Piece::King)
            .lsb()
            .expect("every legal position has a king of each color")
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.history.top().hash
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.history.top().castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.history.top().en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.history.top().halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Piece removed by the last move, if any.
    #[inline]
    pub fn captured(&self) -> Option<Piece> {
        self.history.top().captured
    }

    #[inline]
    pub fn last_move(&self) -> Option<Move> {
        self.history.top().move_played
    }

    #[inline]
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Squares attacked by the side not to move.
    #[inline]
    pub fn enemy_attacks(&self) -> Bitboard {
        debug_assert!(self.fresh);
        self.enemy_attacks
    }

    #[inline]
    pub fn checkers(&self) -> Bitboard {
        debug_assert!(self.fresh);
        self.checkers
    }

    /// Destination mask for non-king moves: everything when not in check,
    /// the checker and the squares between it and the king in single check,
    /// nothing in double check.
    #[inline]
    pub fn evasion_mask(&self) -> Bitboard {
        debug_assert!(self.fresh);
        self.evasion_mask
    }

    #[inline]
    pub fn pinned(&self) -> Bitboard {
        debug_assert!(self.fresh);
        self.pinned
    }
}

impl<H: StateStack> fmt::Debug for Position<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{generate_moves, GenType};

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn find(position: &Position, uci: &str) -> Move {
        generate_moves(position, GenType::All)
            .iter()
            .copied()
            .find(|m| m.to_uci() == uci)
            .unwrap_or_else(|| panic!("{uci} is not legal in {position:?}"))
    }

    fn play(position: &mut Position, uci: &str) {
        let mv = find(position, uci);
        position.do_move(mv);
        position.update();
    }

    #[test]
    fn startpos_roundtrip() {
        let position = Position::<GrowableHistory>::startpos();
        assert_eq!(position.to_fen(), Fen::STARTPOS);
        assert_eq!(position.occupied().count(), 32);
        assert_eq!(position.piece_at(Square::E1), Some((Piece::King, Color::White)));
        assert_eq!(position.hash(), position.compute_hash());
    }

    #[test]
    fn rejects_unplayable_positions() {
        // White to move while Black's king is attacked by the rook.
        assert_eq!(
            Position::<GrowableHistory>::from_fen("4k3/8/8/8/8/8/8/4RK2 w - - 0 1").unwrap_err(),
            FenError::OpponentInCheck
        );
        // No pawn behind the en passant target.
        assert!(matches!(
            Position::<GrowableHistory>::from_fen("4k3/8/8/8/8/8/8/4K3 b - e3 0 1"),
            Err(FenError::InvalidEnPassantSquare(_))
        ));
    }

    #[test]
    fn castling_rights_without_pieces_are_dropped() {
        let position =
            Position::<GrowableHistory>::from_fen("4k3/8/8/8/8/8/8/4K2R w KQkq - 0 1").unwrap();
        assert_eq!(position.castling().to_string(), "K");
    }

    #[test]
    fn double_push_sets_en_passant_and_undo_restores() {
        let mut position = Position::startpos();
        let before = position.to_fen();
        let hash = position.hash();
        play(&mut position, "e2e4");
        assert_eq!(position.en_passant(), Some(sq("e3")));
        assert_eq!(position.side_to_move(), Color::Black);
        assert_eq!(position.hash(), position.compute_hash());
        position.undo_move();
        position.update();
        assert_eq!(position.to_fen(), before);
        assert_eq!(position.hash(), hash);
    }

    #[test]
    fn capture_resets_clock_and_records_victim() {
        let mut position =
            Position::from_fen("4k3/8/8/3p4/4N3/8/8/4K3 w - - 7 30").unwrap();
        play(&mut position, "e4d6");
        assert_eq!(position.halfmove_clock(), 8);
        play(&mut position, "e8e7");
        play(&mut position, "d6f5");
        play(&mut position, "e7e6");
        assert_eq!(position.halfmove_clock(), 11);
        assert_eq!(position.fullmove_number(), 32);

        let mut position =
            Position::from_fen("4k3/8/8/3p4/4N3/8/8/4K3 w - - 7 30").unwrap();
        play(&mut position, "e4c5");
        play(&mut position, "d5d4");
        assert_eq!(position.halfmove_clock(), 0);

        let mut position =
            Position::from_fen("4k3/8/5p2/3p4/4N3/8/8/4K3 w - - 7 30").unwrap();
        play(&mut position, "e4f6");
        assert_eq!(position.captured(), Some(Piece::Pawn));
        assert_eq!(position.halfmove_clock(), 0);
        position.undo_move();
        assert_eq!(position.piece_at(sq("f6")), Some((Piece::Pawn, Color::Black)));
        assert_eq!(position.halfmove_clock(), 7);
    }

    #[test]
    fn castling_moves_the_rook_both_ways() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut position = Position::from_fen(fen).unwrap();
        play(&mut position, "e1g1");
        assert_eq!(position.piece_at(Square::F1), Some((Piece::Rook, Color::White)));
        assert_eq!(position.piece_at(Square::H1), None);
        assert_eq!(position.castling().to_string(), "kq");
        play(&mut position, "e8c8");
        assert_eq!(position.piece_at(Square::D8), Some((Piece::Rook, Color::Black)));
        assert_eq!(position.castling(), CastlingRights::NONE);
        assert_eq!(position.hash(), position.compute_hash());
        position.undo_move();
        position.undo_move();
        position.update();
        assert_eq!(position.to_fen(), fen);
    }

    #[test]
    fn rook_capture_removes_castling_right() {
        let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut position, "a1a8");
        assert_eq!(position.castling().to_string(), "Kk");
        assert_eq!(position.hash(), position.compute_hash());
    }

    #[test]
    fn en_passant_and_promotion_undo() {
        let fen = "4k3/1P6/8/8/3pP3/8/8/4K3 b - e3 0 1";
        let mut position = Position::from_fen(fen).unwrap();
        play(&mut position, "d4e3");
        assert_eq!(position.piece_at(sq("e4")), None);
        assert_eq!(position.captured(), Some(Piece::Pawn));
        play(&mut position, "b7b8n");
        assert_eq!(position.piece_at(sq("b8")), Some((Piece::Knight, Color::White)));
        assert_eq!(position.hash(), position.compute_hash());
        position.undo_move();
        position.undo_move();
        position.update();
        assert_eq!(position.to_fen(), fen);
    }

    #[test]
    fn check_and_pin_detection() {
        // Queen on e7 checks down the e-file, bishop on b4 pins the d2 knight.
        let position =
            Position::<GrowableHistory>::from_fen("4k3/4q3/8/8/1b6/8/3N4/4K3 w - - 0 1").unwrap();
        assert!(position.is_check());
        assert_eq!(position.checkers(), Bitboard::from_square(sq("e7")));
        assert_eq!(position.pinned(), Bitboard::from_square(sq("d2")));
        assert!(position.evasion_mask().contains(sq("e4")));
        assert!(!position.evasion_mask().contains(sq("d4")));
        assert!(position.enemy_attacks().contains(sq("e1")));
        assert!(position.enemy_attacks().contains(sq("c3")));
    }

    #[test]
    fn fifty_move_rule() {
        let mut position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 80").unwrap();
        assert!(!position.is_draw());
        play(&mut position, "a1a2");
        assert!(position.is_draw());
    }

    #[test]
    fn repetition_by_shuffling_knights() {
        let mut position = Position::startpos();
        for _ in 0..2 {
            for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                assert!(!position.is_draw());
                play(&mut position, uci);
            }
        }
        assert!(position.is_draw());
    }

    #[test]
    fn insufficient_material() {
        for (fen, expected) in [
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", true),
            ("4k3/8/8/8/8/8/8/4KB2 w - - 0 1", true),
            ("4k1n1/8/8/8/8/8/8/4K3 w - - 0 1", true),
            ("4k1n1/8/8/8/8/8/8/4KB2 w - - 0 1", false),
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/3RK3 w - - 0 1", false),
        ] {
            let position = Position::<GrowableHistory>::from_fen(fen).unwrap();
            assert_eq!(position.is_insufficient_material(), expected, "{fen}");
        }
    }

    #[test]
    fn fork_keeps_the_reversible_tail() {
        let mut position = Position::startpos();
        for uci in ["e2e4", "e7e5", "g1f3", "b8c6", "f3g1", "c6b8", "g1f3"] {
            play(&mut position, uci);
        }
        let fork: Position<FixedHistory> = position.fork();
        // The last pawn move (e7e5) starts the tail.
        assert_eq!(fork.history().len(), 6);
        assert_eq!(fork.hash(), position.hash());
        assert_eq!(fork.to_fen(), position.to_fen());
    }
}
