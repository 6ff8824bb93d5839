//! Castling-rights bitmask.

use crate::Color;
use std::fmt;

/// Four castling flags packed into the low nibble of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KING_SIDE: u8 = 0b0001;
    pub const WHITE_QUEEN_SIDE: u8 = 0b0010;
    pub const BLACK_KING_SIDE: u8 = 0b0100;
    pub const BLACK_QUEEN_SIDE: u8 = 0b1000;

    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    pub const fn new(bits: u8) -> Self {
        CastlingRights(bits & 0b1111)
    }

    /// Raw bits, usable as a 0-15 table index.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn king_side(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_KING_SIDE,
            Color::Black => Self::BLACK_KING_SIDE,
        };
        self.0 & flag != 0
    }

    #[inline]
    pub const fn queen_side(self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_QUEEN_SIDE,
            Color::Black => Self::BLACK_QUEEN_SIDE,
        };
        self.0 & flag != 0
    }

    /// Keeps only the flags present in `mask`.
    #[inline]
    pub const fn restrict(self, mask: u8) -> Self {
        CastlingRights(self.0 & mask)
    }

    /// Parses the FEN castling field (`KQkq`, any subset, or `-`).
    pub fn from_fen(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(Self::NONE);
        }
        if field.is_empty() {
            return None;
        }
        let mut bits = 0u8;
        for c in field.chars() {
            bits |= match c {
                'K' => Self::WHITE_KING_SIDE,
                'Q' => Self::WHITE_QUEEN_SIDE,
                'k' => Self::BLACK_KING_SIDE,
                'q' => Self::BLACK_QUEEN_SIDE,
                _ => return None,
            };
        }
        Some(CastlingRights(bits))
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        for (flag, c) in [
            (Self::WHITE_KING_SIDE, 'K'),
            (Self::WHITE_QUEEN_SIDE, 'Q'),
            (Self::BLACK_KING_SIDE, 'k'),
            (Self::BLACK_QUEEN_SIDE, 'q'),
        ] {
            if self.0 & flag != 0 {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
