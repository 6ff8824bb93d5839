//! Bitboard chess position with reversible moves and legal move generation.
//!
//! This crate provides:
//! - [`Bitboard`] - 64-bit square sets
//! - [`Position`] - the board, mutated in place by `do_move`/`undo_move`
//! - [`StateStack`] - per-ply history in fixed ([`FixedHistory`]) and growable
//!   ([`GrowableHistory`]) flavours, with repetition detection
//! - [`generate_moves`] - legal moves, all or forced only
//! - [`Game`] - move-input request handling and game status
//!
//! # Example
//!
//! ```
//! use chess_engine::{generate_moves, GenType, Position};
//!
//! let mut position: Position = Position::startpos();
//! let moves = generate_moves(&position, GenType::All);
//! assert_eq!(moves.len(), 20);
//!
//! let first = moves[0];
//! position.do_move(first);
//! position.update();
//! position.undo_move();
//! position.update();
//! assert_eq!(position.to_fen(), chess_core::Fen::STARTPOS);
//! ```

mod bitboard;
mod game;
pub mod history;
pub mod movegen;
mod position;
mod zobrist;

pub use bitboard::Bitboard;
pub use game::{Game, GameError, GameStatus};
pub use history::{FixedHistory, GrowableHistory, State, StateStack};
pub use movegen::{generate_moves, GenType, MoveList};
pub use position::{castling_rook, Position};
pub use zobrist::ZOBRIST;
