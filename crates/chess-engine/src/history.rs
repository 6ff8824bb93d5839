//! Per-ply state history.
//!
//! Every `do_move` pushes one [`State`] and every `undo_move` pops one, so the
//! stack is the only record needed to reverse a move and to detect
//! repetitions. Two storage flavours share the [`StateStack`] interface:
//! [`FixedHistory`] for bounded-depth search and [`GrowableHistory`] for a game
//! of unbounded length.

use chess_core::{CastlingRights, Move, Piece, Square};

/// The irreversible part of a position at one ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct State {
    pub hash: u64,
    pub castling: CastlingRights,
    /// Plies since the last capture or pawn move.
    pub halfmove_clock: u32,
    /// The move that produced this state; `None` at the root.
    pub move_played: Option<Move>,
    pub en_passant: Option<Square>,
    pub captured: Option<Piece>,
}

/// Stack of [`State`]s with push/pop discipline.
pub trait StateStack: Clone {
    /// Builds a stack whose entries are `states`, oldest first. `states` must
    /// not be empty.
    fn from_states(states: &[State]) -> Self;

    /// Pushes a new state that copies the hash, castling rights and halfmove
    /// clock forward and clears the per-move fields.
    fn create(&mut self) -> &mut State;

    /// Pops the most recent state and returns the new top.
    ///
    /// # Panics
    /// When only the root state is left.
    fn rollback(&mut self) -> &State;

    /// All states, oldest first.
    fn states(&self) -> &[State];

    fn top_mut(&mut self) -> &mut State;

    fn top(&self) -> &State {
        self.states()
            .last()
            .expect("state history always holds the root state")
    }

    fn len(&self) -> usize {
        self.states().len()
    }

    /// True when the current position occurs for the third time.
    ///
    /// Only positions with the same side to move and no capture or pawn move
    /// in between are compared.
    fn repetition(&self) -> bool {
        let states = self.states();
        let Some((current, earlier)) = states.split_last() else {
            return false;
        };
        let mut seen = 1;
        let mut distance = 0u32;
        for state in earlier.iter().rev() {
            distance += 1;
            if current.halfmove_clock.checked_sub(distance) != Some(state.halfmove_clock) {
                break;
            }
            if distance % 2 == 0 && state.hash == current.hash {
                seen += 1;
                if seen == 3 {
                    return true;
                }
            }
        }
        false
    }
}

fn next_state(top: &State) -> State {
    State {
        hash: top.hash,
        castling: top.castling,
        halfmove_clock: top.halfmove_clock,
        move_played: None,
        en_passant: None,
        captured: None,
    }
}

/// Array-backed history with a hard ply ceiling.
#[derive(Clone)]
pub struct FixedHistory {
    states: Box<[State; FixedHistory::CAPACITY]>,
    len: usize,
}

impl FixedHistory {
    /// Most plies a search may push on top of its seed states.
    pub const PLY_CEILING: usize = 128;

    /// Most states carried over from a game when seeding a search. A 50-move
    /// draw needs 100 reversible plies, plus the state they started from.
    pub const SEED_LIMIT: usize = 101;

    const CAPACITY: usize = Self::SEED_LIMIT + Self::PLY_CEILING;
}

impl StateStack for FixedHistory {
    fn from_states(states: &[State]) -> Self {
        assert!(
            !states.is_empty() && states.len() <= Self::SEED_LIMIT,
            "fixed history seeded with {} states",
            states.len()
        );
        let mut buffer = Box::new([State::default(); Self::CAPACITY]);
        buffer[..states.len()].copy_from_slice(states);
        FixedHistory {
            states: buffer,
            len: states.len(),
        }
    }

    fn create(&mut self) -> &mut State {
        assert!(self.len < Self::CAPACITY, "fixed history overflow");
        self.states[self.len] = next_state(&self.states[self.len - 1]);
        self.len += 1;
        &mut self.states[self.len - 1]
    }

    fn rollback(&mut self) -> &State {
        assert!(self.len > 1, "rollback past the root state");
        self.len -= 1;
        &self.states[self.len - 1]
    }

    fn states(&self) -> &[State] {
        &self.states[..self.len]
    }

    fn top_mut(&mut self) -> &mut State {
        &mut self.states[self.len - 1]
    }
}

/// Vector-backed history for interactive play.
#[derive(Debug, Clone)]
pub struct GrowableHistory {
    states: Vec<State>,
}

impl StateStack for GrowableHistory {
    fn from_states(states: &[State]) -> Self {
        assert!(!states.is_empty(), "history seeded without a root state");
        GrowableHistory {
            states: states.to_vec(),
        }
    }

    fn create(&mut self) -> &mut State {
        let next = next_state(self.top());
        self.states.push(next);
        self.top_mut()
    }

    fn rollback(&mut self) -> &State {
        assert!(self.states.len() > 1, "rollback past the root state");
        self.states.pop();
        self.top()
    }

    fn states(&self) -> &[State] {
        &self.states
    }

    fn top_mut(&mut self) -> &mut State {
        self.states
            .last_mut()
            .expect("state history always holds the root state")
    }
}
