//! Interactive game management.
//!
//! [`Game`] is the request/response surface for move-input front ends: it
//! seeds a position from FEN, answers which moves start on a square, resolves
//! `(from, to, promotion)` requests against the legal move list, and tracks
//! the result. Requests come from untrusted input, so every failure is a
//! [`GameError`] rather than a panic.

use crate::history::{FixedHistory, GrowableHistory};
use crate::movegen::{generate_moves, GenType};
use crate::{MoveList, Position};
use chess_core::{Color, FenError, Move, MoveFlag, Square};
use serde::Serialize;
use thiserror::Error;

/// Outcome of the game so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameStatus {
    fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameStatus::WhiteWins,
            Color::Black => GameStatus::BlackWins,
        }
    }
}

/// Error type for game operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the game has already finished")]
    GameFinished,

    #[error("no legal move from {from} to {to}")]
    NoMatchingMove { from: Square, to: Square },

    #[error("a promotion piece is required")]
    PromotionRequired,

    #[error("invalid move notation: {0}")]
    InvalidNotation(String),
}

/// A game in progress: the current position, its legal moves and status.
#[derive(Debug)]
pub struct Game {
    position: Position<GrowableHistory>,
    legal: MoveList,
    status: GameStatus,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a game from the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    /// Creates a game from FEN.
    pub fn init(fen: &str) -> Result<Self, FenError> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    fn from_position(position: Position<GrowableHistory>) -> Self {
        let mut game = Game {
            position,
            legal: MoveList::new(),
            status: GameStatus::InProgress,
        };
        game.refresh();
        game
    }

    /// Recomputes the legal moves and the status after the position changed.
    fn refresh(&mut self) {
        self.position.update();
        self.legal = generate_moves(&self.position, GenType::All);
        self.status = if self.legal.is_empty() {
            if self.position.is_check() {
                GameStatus::win_for(self.position.side_to_move().opposite())
            } else {
                GameStatus::Draw
            }
        } else if self.position.is_draw() || self.position.is_insufficient_material() {
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        };
    }

    /// Legal moves starting on `from`.
    pub fn moves_from(&self, from: Square) -> Vec<Move> {
        self.legal.iter().copied().filter(|m| m.from() == from).collect()
    }

    /// Plays the unique legal move from `from` to `to`.
    ///
    /// Promotions need `promotion` to pick the piece; for any other move the
    /// flag is ignored.
    pub fn do_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<MoveFlag>,
    ) -> Result<Move, GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::GameFinished);
        }

        let mut candidates = self
            .legal
            .iter()
            .copied()
            .filter(|m| m.from() == from && m.to() == to)
            .peekable();
        let first = *candidates
            .peek()
            .ok_or(GameError::NoMatchingMove { from, to })?;

        let mv = if first.flag().is_promotion() {
            let wanted = promotion.ok_or(GameError::PromotionRequired)?;
            candidates
                .find(|m| m.flag() == wanted)
                .ok_or(GameError::NoMatchingMove { from, to })?
        } else {
            first
        };

        self.position.do_move(mv);
        self.refresh();
        Ok(mv)
    }

    /// Plays a move given in UCI notation, e.g. `e2e4` or `a7a8q`.
    pub fn do_move_uci(&mut self, text: &str) -> Result<Move, GameError> {
        let (from, to, promotion) =
            Move::parse_uci(text).ok_or_else(|| GameError::InvalidNotation(text.to_string()))?;
        self.do_move(from, to, promotion)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn legal_moves(&self) -> &MoveList {
        &self.legal
    }

    pub fn position(&self) -> &Position<GrowableHistory> {
        &self.position
    }

    /// A copy of the current position for a search worker, carrying the
    /// history needed to recognise repetitions of earlier game positions.
    pub fn search_position(&self) -> Position<FixedHistory> {
        self.position.fork()
    }
}
