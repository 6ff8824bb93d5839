//! Evaluation and search for the `chess-engine` position.
//!
//! This crate provides:
//! - [`Evaluation`] - PeSTO tapered evaluation, updated incrementally per move
//! - [`TranspositionTable`] - clustered, depth-preferred search cache
//! - [`MovePicker`] - best-first move ordering with static exchange scores
//! - [`Searcher`] - iterative-deepening negamax with quiescence search
//! - [`Engine`] - the searcher on a worker thread, one request at a time
//! - [`EngineConfig`] - TOML-loadable search settings
//!
//! # Example
//!
//! ```
//! use chess_engine::{FixedHistory, Position};
//! use chess_search::Searcher;
//!
//! let mut position: Position<FixedHistory> =
//!     Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
//! let report = Searcher::new(3, 1).search(&mut position);
//! assert_eq!(report.best_move.unwrap().to_uci(), "a1a8");
//! assert_eq!(report.mate_in(), Some(1));
//! ```

mod config;
mod engine;
pub mod eval;
mod picker;
mod search;
pub mod tt;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, SearchError};
pub use eval::Evaluation;
pub use picker::{static_exchange, MovePicker};
pub use search::{SearchReport, Searcher, DRAW, INF, MATE, MATE_BOUND};
pub use tt::{Bound, Probe, TranspositionTable};
