//! Command-line front end for the chess engine.

mod play;
mod request;

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chess_engine::{movegen::perft, FixedHistory, Position};
use chess_search::{EngineConfig, Searcher};
use clap::{Parser, Subcommand};
use play::Session;

#[derive(Parser)]
#[command(name = "chess")]
#[command(about = "Chess position search, perft and interactive play")]
struct Cli {
    /// TOML file with engine settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Search depth in plies (overrides the config file)
    #[arg(long, global = true)]
    depth: Option<u8>,

    /// Transposition table size in megabytes (overrides the config file)
    #[arg(long = "tt-mb", global = true)]
    tt_mb: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a position and print the best move
    Search {
        /// Position in FEN
        #[arg(default_value = chess_core::Fen::STARTPOS)]
        fen: String,
    },
    /// Count leaf nodes of the legal move tree
    Perft {
        /// Depth in plies
        #[arg(short, long, default_value = "5")]
        depth: u32,
        /// Print the count below each root move
        #[arg(long)]
        divide: bool,
        /// Position in FEN
        #[arg(default_value = chess_core::Fen::STARTPOS)]
        fen: String,
    },
    /// Play interactively on stdin/stdout
    Play,
}

impl Cli {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(mb) = self.tt_mb {
            config.tt_size_mb = mb;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = cli.engine_config()?;
    tracing::debug!(?config, "engine configuration");

    match &cli.command {
        Commands::Search { fen } => {
            let mut position: Position<FixedHistory> = Position::from_fen(fen)?;
            let report = Searcher::new(config.max_depth, config.tt_size_mb).search(&mut position);
            match report.best_move {
                Some(mv) => println!("bestmove {mv}"),
                None => println!("bestmove (none)"),
            }
            match report.mate_in() {
                Some(plies) => println!("mate in {plies} plies"),
                None => println!("score {} cp", report.score),
            }
            println!(
                "depth {} nodes {} time {} ms",
                report.depth,
                report.nodes,
                report.elapsed.as_millis()
            );
        }
        Commands::Perft { depth, divide, fen } => {
            let mut position: Position = Position::from_fen(fen)?;
            let start = std::time::Instant::now();
            // Depth 0 has no root moves to divide.
            let nodes = if *divide && *depth > 0 {
                let counts = perft::perft_divide(&mut position, *depth);
                for (mv, count) in &counts {
                    println!("{mv}: {count}");
                }
                counts.iter().map(|(_, count)| count).sum()
            } else {
                perft::perft(&mut position, *depth)
            };
            let elapsed = start.elapsed();
            println!("nodes {nodes} time {} ms", elapsed.as_millis());
        }
        Commands::Play => {
            let mut session = Session::new(config)?;
            session.run(io::stdin().lock(), &mut io::stdout().lock())?;
        }
    }
    Ok(())
}
