//! Transposition table.
//!
//! Entries live in clusters of [`CLUSTER_SIZE`] slots. A key picks its
//! cluster by its low bits (the cluster count is a power of two) and the full
//! 64-bit key is stored to tell positions sharing a cluster apart.

use chess_core::Move;
use tracing::debug;

pub const CLUSTER_SIZE: usize = 4;

/// How a stored score relates to the true value of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is exact.
    Exact,
    /// The search failed high: the true score is at least this.
    Lower,
    /// The search failed low: the true score is at most this.
    Upper,
}

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    key: u64,
    score: i16,
    mv: Option<Move>,
    depth: u8,
    /// `None` marks an empty slot.
    bound: Option<Bound>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cluster {
    entries: [Entry; CLUSTER_SIZE],
}

/// Result of [`TranspositionTable::probe`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Probe {
    /// A score that can be returned without searching.
    pub score: Option<i32>,
    /// The best move stored for the position, usable for ordering even when
    /// the score is not.
    pub mv: Option<Move>,
}

/// Fixed-size, hash-addressed search cache.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    clusters: Vec<Cluster>,
}

impl TranspositionTable {
    /// Creates a table of at most `mb` megabytes.
    pub fn new(mb: usize) -> Self {
        let mut table = TranspositionTable::default();
        table.resize(mb * 1024 * 1024);
        table
    }

    /// Reallocates the table to the largest power-of-two cluster count that
    /// fits in `bytes`, dropping every entry. Zero bytes disables the table.
    pub fn resize(&mut self, bytes: usize) {
        let fit = bytes / std::mem::size_of::<Cluster>();
        let count = if fit == 0 {
            0
        } else {
            1usize << fit.ilog2()
        };
        self.clusters = vec![Cluster::default(); count];
        debug!(bytes, clusters = count, "transposition table resized");
    }

    /// Empties every slot without reallocating.
    pub fn clear(&mut self) {
        self.clusters.fill(Cluster::default());
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.clusters.len() * CLUSTER_SIZE
    }

    fn cluster_index(&self, key: u64) -> usize {
        (key as usize) & (self.clusters.len() - 1)
    }

    /// Records a search result.
    ///
    /// The slot already holding `key` is overwritten in place; otherwise an
    /// empty slot is used, otherwise the shallowest entry is evicted (the
    /// first one on ties).
    pub fn store(&mut self, key: u64, score: i32, mv: Option<Move>, depth: u8, bound: Bound) {
        if self.clusters.is_empty() {
            return;
        }
        let index = self.cluster_index(key);
        let entries = &mut self.clusters[index].entries;

        let slot = entries
            .iter()
            .position(|e| e.bound.is_some() && e.key == key)
            .or_else(|| entries.iter().position(|e| e.bound.is_none()))
            .unwrap_or_else(|| {
                let mut shallowest = 0;
                for (i, e) in entries.iter().enumerate().skip(1) {
                    if e.depth < entries[shallowest].depth {
                        shallowest = i;
                    }
                }
                shallowest
            });

        entries[slot] = Entry {
            key,
            score: score.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            mv,
            depth,
            bound: Some(bound),
        };
    }

    /// Looks `key` up.
    ///
    /// A score is only returned for an entry searched at least `depth` deep
    /// whose bound settles the `(alpha, beta)` window: exact scores always,
    /// lower bounds at or above `beta`, upper bounds at or below `alpha`.
    pub fn probe(&self, key: u64, depth: u8, alpha: i32, beta: i32) -> Probe {
        if self.clusters.is_empty() {
            return Probe::default();
        }
        let cluster = &self.clusters[self.cluster_index(key)];
        let Some((entry, bound)) = cluster
            .entries
            .iter()
            .find_map(|e| e.bound.filter(|_| e.key == key).map(|b| (e, b)))
        else {
            return Probe::default();
        };

        let stored = entry.score as i32;
        let usable = entry.depth >= depth
            && match bound {
                Bound::Exact => true,
                Bound::Lower => stored >= beta,
                Bound::Upper => stored <= alpha,
            };
        Probe {
            score: usable.then_some(stored),
            mv: entry.mv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{MoveFlag, Square};

    fn mv(from: &str, to: &str) -> Move {
        Move::new(
            Square::from_algebraic(from).unwrap(),
            Square::from_algebraic(to).unwrap(),
            MoveFlag::Quiet,
        )
    }

    #[test]
    fn size_is_a_power_of_two() {
        let mut tt = TranspositionTable::default();
        tt.resize(3 * std::mem::size_of::<Cluster>());
        assert_eq!(tt.capacity(), 2 * CLUSTER_SIZE);
        tt.resize(1024 * 1024);
        assert!(tt.capacity().is_power_of_two());
        tt.resize(0);
        assert_eq!(tt.capacity(), 0);
    }

    #[test]
    fn disabled_table_never_hits() {
        let mut tt = TranspositionTable::new(0);
        tt.store(42, 10, Some(mv("e2", "e4")), 5, Bound::Exact);
        assert_eq!(tt.probe(42, 0, -100, 100), Probe::default());
    }

    #[test]
    fn bounds_decide_usability() {
        let mut tt = TranspositionTable::new(1);
        tt.store(1, 50, Some(mv("e2", "e4")), 4, Bound::Exact);
        tt.store(2, 50, None, 4, Bound::Lower);
        tt.store(3, 50, None, 4, Bound::Upper);

        assert_eq!(tt.probe(1, 4, -100, 100).score, Some(50));
        assert_eq!(tt.probe(1, 5, -100, 100).score, None);
        assert_eq!(tt.probe(1, 5, -100, 100).mv, Some(mv("e2", "e4")));

        assert_eq!(tt.probe(2, 3, 0, 40).score, Some(50));
        assert_eq!(tt.probe(2, 3, 0, 60).score, None);

        assert_eq!(tt.probe(3, 3, 60, 100).score, Some(50));
        assert_eq!(tt.probe(3, 3, 40, 100).score, None);
    }

    #[test]
    fn same_key_is_updated_in_place() {
        let mut tt = TranspositionTable::new(1);
        tt.store(7, 10, None, 8, Bound::Exact);
        tt.store(7, -20, Some(mv("g1", "f3")), 2, Bound::Upper);
        let probe = tt.probe(7, 2, -20, 100);
        assert_eq!(probe.score, Some(-20));
        assert_eq!(probe.mv, Some(mv("g1", "f3")));
    }

    #[test]
    fn shallowest_entry_is_evicted() {
        let mut tt = TranspositionTable::default();
        tt.resize(std::mem::size_of::<Cluster>());
        // One cluster: every key collides.
        for (key, depth) in [(10, 5), (11, 2), (12, 7), (13, 3)] {
            tt.store(key, depth as i32, None, depth, Bound::Exact);
        }
        tt.store(14, 0, None, 9, Bound::Exact);
        assert_eq!(tt.probe(11, 0, 0, 0).score, None);
        for key in [10, 12, 13, 14] {
            assert!(tt.probe(key, 0, 0, 0).score.is_some(), "key {key}");
        }
    }

    #[test]
    fn unmatched_key_never_scores() {
        let mut tt = TranspositionTable::default();
        tt.resize(std::mem::size_of::<Cluster>());
        tt.store(1, 0, Some(mv("a2", "a3")), 1, Bound::Exact);
        assert_eq!(tt.probe(2, 0, -100, 100), Probe::default());
        tt.clear();
        assert_eq!(tt.probe(1, 0, -100, 100), Probe::default());
    }
}
