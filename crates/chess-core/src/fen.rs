//! FEN (Forsyth-Edwards Notation) parsing and serialization.

use crate::{CastlingRights, Color, Piece, Square};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 4 to 6 parts, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),

    #[error("{color} must have exactly one king, found {count}")]
    KingCount { color: Color, count: usize },

    #[error("the side not to move is in check")]
    OpponentInCheck,
}

/// A parsed FEN record.
///
/// The board is decoded into a square-indexed array; deciding whether the
/// record describes a playable position is left to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    pub board: [Option<(Piece, Color)>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Fen {
    /// The standard starting position.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Largest accepted halfmove clock. Counting continues from here while
    /// moves are played, so the bound keeps the counters far from overflow.
    pub const MAX_HALFMOVE_CLOCK: u32 = 500;

    /// Largest accepted fullmove number.
    pub const MAX_FULLMOVE_NUMBER: u32 = 100_000;

    /// Parses a FEN string.
    ///
    /// The halfmove clock and fullmove number may be omitted, in which case
    /// they default to 0 and 1.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&parts.len()) {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let board = Self::parse_placement(parts[0])?;

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        let castling = CastlingRights::from_fen(parts[2])
            .ok_or_else(|| FenError::InvalidCastlingRights(parts[2].to_string()))?;

        let en_passant = Self::parse_en_passant(parts[3], side_to_move)?;

        let halfmove_clock = match parts.get(4) {
            Some(s) => s
                .parse::<u32>()
                .ok()
                .filter(|n| *n <= Self::MAX_HALFMOVE_CLOCK)
                .ok_or_else(|| FenError::InvalidHalfmoveClock(s.to_string()))?,
            None => 0,
        };

        let fullmove_number = match parts.get(5) {
            Some(s) => s
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=Self::MAX_FULLMOVE_NUMBER).contains(n))
                .ok_or_else(|| FenError::InvalidFullmoveNumber(s.to_string()))?,
            None => 1,
        };

        Ok(Fen {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    fn parse_placement(placement: &str) -> Result<[Option<(Piece, Color)>; 64], FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut board = [None; 64];
        let mut kings = [0usize; 2];

        for (i, text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                    file += skip as u8;
                    continue;
                }
                let (piece, color) = Piece::from_fen_char(c).ok_or_else(|| {
                    FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c,
                        rank + 1
                    ))
                })?;
                let square = Square::from_coords(file, rank).ok_or_else(|| {
                    FenError::InvalidPiecePlacement(format!("rank {} is too long", rank + 1))
                })?;
                if piece == Piece::Pawn && (rank == 0 || rank == 7) {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "pawn on back rank at {}",
                        square
                    )));
                }
                if piece == Piece::King {
                    kings[color.index()] += 1;
                }
                board[square.index() as usize] = Some((piece, color));
                file += 1;
            }
            if file != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} has {} squares, expected 8",
                    rank + 1,
                    file
                )));
            }
        }

        for color in Color::BOTH {
            let count = kings[color.index()];
            if count != 1 {
                return Err(FenError::KingCount { color, count });
            }
        }

        Ok(board)
    }

    fn parse_en_passant(field: &str, side_to_move: Color) -> Result<Option<Square>, FenError> {
        if field == "-" {
            return Ok(None);
        }
        // The target sits behind a pawn that just double pushed.
        let expected_rank = match side_to_move {
            Color::White => 5,
            Color::Black => 2,
        };
        match Square::from_algebraic(field) {
            Some(square) if square.rank() == expected_rank => Ok(Some(square)),
            _ => Err(FenError::InvalidEnPassantSquare(field.to_string())),
        }
    }

    /// Piece placement field for the board.
    pub fn placement(&self) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.board[(rank * 8 + file) as usize] {
                    Some((piece, color)) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let en_passant = match self.en_passant {
            Some(square) => square.to_algebraic(),
            None => "-".to_string(),
        };
        write!(
            f,
            "{} {} {} {} {} {}",
            self.placement(),
            self.side_to_move.to_fen_char(),
            self.castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}
