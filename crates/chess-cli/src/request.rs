//! Line-based requests for the interactive play loop.

use chess_core::{Fen, Move, MoveFlag, Square};
use thiserror::Error;

/// Errors produced while parsing a request line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Empty request")]
    Empty,
    #[error("Unknown request '{0}'")]
    Unknown(String),
    #[error("Missing argument for '{0}'")]
    MissingArgument(&'static str),
    #[error("Invalid square '{0}'")]
    InvalidSquare(String),
    #[error("Invalid move '{0}'")]
    InvalidMove(String),
}

/// A request typed at the play prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `init [fen]`: start a new game, from the start position by default.
    Init(String),
    /// `moves <square>`: list the legal moves of the piece on a square.
    MovesFrom(Square),
    /// `move <uci>`: play a move, e.g. `e2e4` or `e7e8q`.
    DoMove {
        from: Square,
        to: Square,
        promotion: Option<MoveFlag>,
    },
    /// `status`: print the game status.
    Status,
    /// `go`: let the engine pick and play a move.
    Go,
    /// `quit`: leave the loop.
    Quit,
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word {
            "" => Err(RequestError::Empty),
            "init" if rest.is_empty() => Ok(Request::Init(Fen::STARTPOS.to_string())),
            "init" => Ok(Request::Init(rest.to_string())),
            "moves" => {
                let arg = required(rest, "moves")?;
                Square::from_algebraic(arg)
                    .map(Request::MovesFrom)
                    .ok_or_else(|| RequestError::InvalidSquare(arg.to_string()))
            }
            "move" => {
                let arg = required(rest, "move")?;
                let (from, to, promotion) = Move::parse_uci(arg)
                    .ok_or_else(|| RequestError::InvalidMove(arg.to_string()))?;
                Ok(Request::DoMove {
                    from,
                    to,
                    promotion,
                })
            }
            "status" => Ok(Request::Status),
            "go" => Ok(Request::Go),
            "quit" | "exit" => Ok(Request::Quit),
            other => Err(RequestError::Unknown(other.to_string())),
        }
    }
}

fn required<'a>(rest: &'a str, request: &'static str) -> Result<&'a str, RequestError> {
    rest.split_whitespace()
        .next()
        .ok_or(RequestError::MissingArgument(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn test_parse_init() {
        assert_eq!(
            Request::parse("init"),
            Ok(Request::Init(Fen::STARTPOS.to_string()))
        );
        assert_eq!(
            Request::parse("  init 8/8/8/8/8/8/8/K6k w - - 0 1 "),
            Ok(Request::Init("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()))
        );
    }

    #[test]
    fn test_parse_moves_and_move() {
        assert_eq!(Request::parse("moves e2"), Ok(Request::MovesFrom(sq("e2"))));
        assert_eq!(
            Request::parse("move e7e8q"),
            Ok(Request::DoMove {
                from: sq("e7"),
                to: sq("e8"),
                promotion: Some(MoveFlag::PromoteQueen),
            })
        );
        assert_eq!(
            Request::parse("move g1f3"),
            Ok(Request::DoMove {
                from: sq("g1"),
                to: sq("f3"),
                promotion: None,
            })
        );
    }

    #[test]
    fn test_parse_simple_requests() {
        assert_eq!(Request::parse("status"), Ok(Request::Status));
        assert_eq!(Request::parse("go"), Ok(Request::Go));
        assert_eq!(Request::parse("quit"), Ok(Request::Quit));
        assert_eq!(Request::parse("exit"), Ok(Request::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Request::parse("   "), Err(RequestError::Empty));
        assert_eq!(
            Request::parse("castle"),
            Err(RequestError::Unknown("castle".to_string()))
        );
        assert_eq!(
            Request::parse("moves"),
            Err(RequestError::MissingArgument("moves"))
        );
        assert_eq!(
            Request::parse("moves z9"),
            Err(RequestError::InvalidSquare("z9".to_string()))
        );
        assert_eq!(
            Request::parse("move e2"),
            Err(RequestError::InvalidMove("e2".to_string()))
        );
    }
}
