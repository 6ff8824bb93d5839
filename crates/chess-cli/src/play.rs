//! Interactive game against the engine.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver};

use anyhow::{bail, Context};
use chess_engine::{Game, GameStatus};
use chess_search::{Engine, EngineConfig, SearchReport};
use tracing::debug;

use crate::request::Request;

/// Whether the loop keeps reading after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A game plus the engine that answers `go`.
pub struct Session {
    game: Game,
    engine: Engine,
    reports: Receiver<SearchReport>,
}

impl Session {
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let mut engine = Engine::new(config)?;
        let (tx, reports) = mpsc::channel();
        engine.start_worker(move |report| {
            // The session may already be gone.
            let _ = tx.send(report);
        })?;
        Ok(Session {
            game: Game::new(),
            engine,
            reports,
        })
    }

    /// Reads requests from `input` until `quit` or end of input.
    ///
    /// Bad requests are answered with an `error:` line; only I/O failures
    /// and a dead search worker end the loop early.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line.context("reading request")?;
            if line.trim().is_empty() {
                continue;
            }
            let flow = match Request::parse(&line) {
                Ok(request) => self.handle(request, out)?,
                Err(e) => {
                    writeln!(out, "error: {e}")?;
                    Flow::Continue
                }
            };
            out.flush()?;
            if flow == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    pub fn handle(&mut self, request: Request, out: &mut impl Write) -> anyhow::Result<Flow> {
        debug!(?request, "handling request");
        match request {
            Request::Init(fen) => match Game::init(&fen) {
                Ok(game) => {
                    self.game = game;
                    writeln!(out, "ok {}", self.game.position().to_fen())?;
                }
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Request::MovesFrom(square) => {
                let moves: Vec<String> = self
                    .game
                    .moves_from(square)
                    .iter()
                    .map(|m| m.to_uci())
                    .collect();
                writeln!(out, "moves {}", moves.join(" "))?;
            }
            Request::DoMove {
                from,
                to,
                promotion,
            } => match self.game.do_move(from, to, promotion) {
                Ok(mv) => writeln!(out, "played {mv} {}", status_name(self.game.status()))?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Request::Status => writeln!(out, "status {}", status_name(self.game.status()))?,
            Request::Go => self.go(out)?,
            Request::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn go(&mut self, out: &mut impl Write) -> anyhow::Result<()> {
        if self.game.status() != GameStatus::InProgress {
            writeln!(out, "error: game is over")?;
            return Ok(());
        }
        self.engine.set_search_position(self.game.search_position())?;
        if !self.engine.find_best_move() {
            bail!("search worker rejected the request");
        }
        let report = self
            .reports
            .recv()
            .context("search worker stopped before reporting")?;
        let Some(best) = report.best_move else {
            bail!("search found no move in a game in progress");
        };

        let mv = self
            .game
            .do_move(best.from(), best.to(), Some(best.flag()))
            .context("engine move was not legal in the game")?;
        writeln!(
            out,
            "bestmove {mv} score {} depth {} nodes {} {}",
            report.score,
            report.depth,
            report.nodes,
            status_name(self.game.status())
        )?;
        Ok(())
    }
}

fn status_name(status: GameStatus) -> &'static str {
    match status {
        GameStatus::InProgress => "in_progress",
        GameStatus::WhiteWins => "white_wins",
        GameStatus::BlackWins => "black_wins",
        GameStatus::Draw => "draw",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(EngineConfig {
            max_depth: 2,
            tt_size_mb: 1,
        })
        .unwrap()
    }

    fn run(session: &mut Session, script: &str) -> Vec<String> {
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_moves_and_status() {
        let mut s = session();
        let lines = run(&mut s, "moves g1\nmove e2e4\nmove e2e4\nstatus\n");
        assert_eq!(lines[0], "moves g1f3 g1h3");
        assert_eq!(lines[1], "played e2e4 in_progress");
        assert!(lines[2].starts_with("error: "));
        assert_eq!(lines[3], "status in_progress");
    }

    #[test]
    fn test_bad_requests_do_not_end_the_loop() {
        let mut s = session();
        let lines = run(&mut s, "fly\ninit not-a-fen\nstatus\n");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("error: "));
        assert!(lines[1].starts_with("error: "));
        assert_eq!(lines[2], "status in_progress");
    }

    #[test]
    fn test_engine_plays_mate() {
        let mut s = session();
        let lines = run(&mut s, "init 6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1\ngo\ngo\nquit\nstatus\n");
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ok 6k1/5ppp/8/8/8/8/8/R5K1 w"));
        assert!(lines[1].starts_with("bestmove a1a8 "), "{}", lines[1]);
        assert!(lines[1].ends_with(" white_wins"));
        assert_eq!(lines[2], "error: game is over");
    }
}
