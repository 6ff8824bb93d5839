//! Perft (performance test) for move generator validation.
//!
//! Perft counts the leaf nodes of the legal move tree to a fixed depth. The
//! counts for well-known positions are published, so any mismatch points at a
//! bug in generation or in make/unmake.

use super::{generate_moves, GenType};
use crate::history::StateStack;
use crate::Position;
use chess_core::Move;

/// Counts the leaf nodes at `depth` below `position`.
///
/// Moves are made and unmade in place; the position is left as it was found.
pub fn perft<H: StateStack>(position: &mut Position<H>, depth: u32) -> u64 {
    position.update();
    let nodes = count(position, depth);
    position.update();
    nodes
}

fn count<H: StateStack>(position: &mut Position<H>, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_moves(position, GenType::All);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for &m in &moves {
        position.do_move(m);
        position.update();
        nodes += count(position, depth - 1);
        position.undo_move();
    }
    nodes
}

/// Per-move node counts at `depth`, sorted by UCI text. Comparing against a
/// reference engine's divide output narrows a mismatch down to one move.
///
/// Depth 0 has no root moves to split by and yields an empty list.
pub fn perft_divide<H: StateStack>(position: &mut Position<H>, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    position.update();
    let moves = generate_moves(position, GenType::All);
    let mut results = Vec::with_capacity(moves.len());

    for &m in &moves {
        position.do_move(m);
        position.update();
        let nodes = if depth > 1 { count(position, depth - 1) } else { 1 };
        position.undo_move();
        results.push((m, nodes));
    }
    position.update();

    results.sort_by_key(|(m, _)| m.to_uci());
    results
}
