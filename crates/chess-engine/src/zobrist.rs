//! Zobrist keys.
//!
//! A position hash is the XOR of one key per (color, piece, square) on the
//! board, the side key when Black is to move, one key per castling-rights
//! mask and one key per en passant file. Each `do_move` toggles only the keys
//! of the features it changes.

use chess_core::{CastlingRights, Color, Piece, Square};

/// Zobrist key table, generated at compile time from a fixed seed.
pub struct ZobristKeys {
    pieces: [[[u64; 64]; Piece::COUNT]; 2],
    black_to_move: u64,
    castling: [u64; 16],
    en_passant: [u64; 8],
}

impl ZobristKeys {
    const fn new() -> Self {
        const fn xorshift(mut x: u64) -> u64 {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x
        }

        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[[0u64; 64]; Piece::COUNT]; 2];
        let mut castling = [0u64; 16];
        let mut en_passant = [0u64; 8];

        let mut color = 0;
        while color < 2 {
            let mut piece = 0;
            while piece < Piece::COUNT {
                let mut sq = 0;
                while sq < 64 {
                    state = xorshift(state);
                    pieces[color][piece][sq] = state;
                    sq += 1;
                }
                piece += 1;
            }
            color += 1;
        }

        state = xorshift(state);
        let black_to_move = state;

        // No rights hashes to zero so the start-of-game XOR stays neutral.
        let mut mask = 1;
        while mask < 16 {
            state = xorshift(state);
            castling[mask] = state;
            mask += 1;
        }

        let mut file = 0;
        while file < 8 {
            state = xorshift(state);
            en_passant[file] = state;
            file += 1;
        }

        ZobristKeys {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    #[inline]
    pub fn piece(&self, color: Color, piece: Piece, sq: Square) -> u64 {
        self.pieces[color.index()][piece.index()][sq.index() as usize]
    }

    #[inline]
    pub fn side(&self) -> u64 {
        self.black_to_move
    }

    #[inline]
    pub fn castling(&self, rights: CastlingRights) -> u64 {
        self.castling[rights.bits() as usize]
    }

    /// Key for an en passant target, by its file.
    #[inline]
    pub fn en_passant(&self, target: Square) -> u64 {
        self.en_passant[target.file() as usize]
    }
}

/// Process-wide key table.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();
