//! Packed move values.

use crate::{Piece, Square};
use std::fmt;

/// What a move does besides relocating one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet = 0,
    /// Pawn advances two squares and leaves an en passant target behind.
    DoublePush = 1,
    EnPassant = 2,
    CastleKingSide = 3,
    CastleQueenSide = 4,
    PromoteQueen = 5,
    PromoteRook = 6,
    PromoteBishop = 7,
    PromoteKnight = 8,
}

impl MoveFlag {
    /// Promotion flags, strongest piece first.
    pub const PROMOTIONS: [MoveFlag; 4] = [
        MoveFlag::PromoteQueen,
        MoveFlag::PromoteRook,
        MoveFlag::PromoteBishop,
        MoveFlag::PromoteKnight,
    ];

    const fn from_bits(bits: u8) -> MoveFlag {
        match bits {
            1 => MoveFlag::DoublePush,
            2 => MoveFlag::EnPassant,
            3 => MoveFlag::CastleKingSide,
            4 => MoveFlag::CastleQueenSide,
            5 => MoveFlag::PromoteQueen,
            6 => MoveFlag::PromoteRook,
            7 => MoveFlag::PromoteBishop,
            8 => MoveFlag::PromoteKnight,
            _ => MoveFlag::Quiet,
        }
    }

    /// The piece a pawn turns into, for promotion flags.
    #[inline]
    pub const fn promotion_piece(self) -> Option<Piece> {
        match self {
            MoveFlag::PromoteQueen => Some(Piece::Queen),
            MoveFlag::PromoteRook => Some(Piece::Rook),
            MoveFlag::PromoteBishop => Some(Piece::Bishop),
            MoveFlag::PromoteKnight => Some(Piece::Knight),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.promotion_piece().is_some()
    }

    #[inline]
    pub const fn is_castling(self) -> bool {
        matches!(self, MoveFlag::CastleKingSide | MoveFlag::CastleQueenSide)
    }

    /// Parses a UCI promotion suffix (`q`, `r`, `b`, `n`, either case).
    pub const fn from_promotion_char(c: char) -> Option<MoveFlag> {
        match c.to_ascii_lowercase() {
            'q' => Some(MoveFlag::PromoteQueen),
            'r' => Some(MoveFlag::PromoteRook),
            'b' => Some(MoveFlag::PromoteBishop),
            'n' => Some(MoveFlag::PromoteKnight),
            _ => None,
        }
    }

    const fn promotion_char(self) -> Option<char> {
        match self {
            MoveFlag::PromoteQueen => Some('q'),
            MoveFlag::PromoteRook => Some('r'),
            MoveFlag::PromoteBishop => Some('b'),
            MoveFlag::PromoteKnight => Some('n'),
            _ => None,
        }
    }
}

/// A move: origin, destination and flag packed into 16 bits.
///
/// Layout is `from | to << 6 | flag << 12`. Equality is field-wise because the
/// encoding is canonical.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u16);

impl Move {
    /// Filler for fixed-capacity buffers. Never produced by move generation.
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Self {
        Move((from.index() as u16) | ((to.index() as u16) << 6) | ((flag as u16) << 12))
    }

    #[inline]
    pub const fn from(self) -> Square {
        // SAFETY: masked to 6 bits
        unsafe { Square::from_index_unchecked((self.0 & 0x3F) as u8) }
    }

    #[inline]
    pub const fn to(self) -> Square {
        // SAFETY: masked to 6 bits
        unsafe { Square::from_index_unchecked(((self.0 >> 6) & 0x3F) as u8) }
    }

    #[inline]
    pub const fn flag(self) -> MoveFlag {
        MoveFlag::from_bits((self.0 >> 12) as u8)
    }

    /// Raw 16-bit encoding.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// UCI long algebraic form, e.g. `e2e4` or `e7e8q`.
    pub fn to_uci(self) -> String {
        match self.flag().promotion_char() {
            Some(p) => format!("{}{}{}", self.from(), self.to(), p),
            None => format!("{}{}", self.from(), self.to()),
        }
    }

    /// Splits UCI text into origin, destination and optional promotion flag.
    ///
    /// The remaining flags depend on the position, so resolving the text into
    /// a concrete [`Move`] is left to whoever owns the legal move list.
    pub fn parse_uci(s: &str) -> Option<(Square, Square, Option<MoveFlag>)> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            Some(c) => Some(MoveFlag::from_promotion_char(c)?),
            None => None,
        };
        Some((from, to, promotion))
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({}, {:?})", self.to_uci(), self.flag())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}
