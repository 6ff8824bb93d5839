//! Piece kinds.

use crate::Color;

/// The six kinds of chess pieces.
///
/// The discriminants index every per-piece table in the workspace (bitboards,
/// Zobrist keys, piece-square tables), so their order is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    King = 0,
    Queen = 1,
    Pawn = 2,
    Knight = 3,
    Bishop = 4,
    Rook = 5,
}

impl Piece {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// All piece kinds in table order.
    pub const ALL: [Piece; 6] = [
        Piece::King,
        Piece::Queen,
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
    ];

    /// Table index (0-5).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Material value in centipawns used by exchange evaluation.
    ///
    /// The king carries a finite value so that a capture sequence ending in a
    /// king capture still resolves to a number.
    #[inline]
    pub const fn exchange_value(self) -> i32 {
        match self {
            Piece::King => 1500,
            Piece::Queen => 1025,
            Piece::Pawn => 82,
            Piece::Knight => 337,
            Piece::Bishop => 365,
            Piece::Rook => 477,
        }
    }

    /// Returns true for bishops, rooks and queens.
    #[inline]
    pub const fn is_slider(self) -> bool {
        matches!(self, Piece::Bishop | Piece::Rook | Piece::Queen)
    }

    /// FEN letter for this piece, uppercase for White.
    pub const fn to_fen_char(self, color: Color) -> char {
        let c = match self {
            Piece::King => 'k',
            Piece::Queen => 'q',
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parses a FEN letter into a colored piece.
    pub const fn from_fen_char(c: char) -> Option<(Piece, Color)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'k' => Piece::King,
            'q' => Piece::Queen,
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            _ => return None,
        };
        Some((piece, color))
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Piece::King => "King",
            Piece::Queen => "Queen",
            Piece::Pawn => "Pawn",
            Piece::Knight => "Knight",
            Piece::Bishop => "Bishop",
            Piece::Rook => "Rook",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_discriminants() {
        for (i, piece) in Piece::ALL.iter().enumerate() {
            assert_eq!(piece.index(), i);
        }
    }

    #[test]
    fn fen_letters_roundtrip() {
        for piece in Piece::ALL {
            for color in Color::BOTH {
                let c = piece.to_fen_char(color);
                assert_eq!(Piece::from_fen_char(c), Some((piece, color)));
            }
        }
        assert_eq!(Piece::Knight.to_fen_char(Color::White), 'N');
        assert_eq!(Piece::from_fen_char('x'), None);
    }

    #[test]
    fn exchange_values_are_ordered() {
        assert!(Piece::Pawn.exchange_value() < Piece::Knight.exchange_value());
        assert!(Piece::Knight.exchange_value() < Piece::Bishop.exchange_value());
        assert!(Piece::Bishop.exchange_value() < Piece::Rook.exchange_value());
        assert!(Piece::Rook.exchange_value() < Piece::Queen.exchange_value());
        assert!(Piece::Queen.exchange_value() < Piece::King.exchange_value());
    }

    #[test]
    fn sliders() {
        assert!(Piece::Queen.is_slider());
        assert!(Piece::Rook.is_slider());
        assert!(!Piece::Knight.is_slider());
        assert!(!Piece::King.is_slider());
    }
}
