//! Core types for chess.
//!
//! This crate provides the value types shared by the engine and search crates:
//! - [`Piece`] and [`Color`] for piece representation
//! - [`Square`] for board coordinates
//! - [`Move`] and [`MoveFlag`] for the packed move encoding
//! - [`CastlingRights`] for the four castling flags
//! - [`Fen`] for FEN parsing and serialization

mod castling;
mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use castling::CastlingRights;
pub use color::Color;
pub use fen::{Fen, FenError};
pub use mov::{Move, MoveFlag};
pub use piece::Piece;
pub use square::Square;
