//! Zobrist hashing for incremental position identification.
//!
//! Every (piece code, square) pair gets a random 64-bit key, plus one key for
//! the side to move. The position hash is the XOR of all applicable keys,
//! which allows O(1) incremental updates as squares change. Castling rights
//! and the en-passant file are deliberately *not* hashed: the repetition
//! detector compares them separately through the packed extra-info mask, so
//! hash collisions across different rights never go unnoticed.

use crate::engine::types::{Piece, Square};

// ---------------------------------------------------------------------------
// ZobristKeys — immutable singleton
// ---------------------------------------------------------------------------

/// Pre-computed Zobrist random keys (generated once via `OnceLock`).
///
/// The table is indexed by the 4-bit piece code, so the empty-square row is
/// all zeroes and "XOR out old piece, XOR in new piece" works uniformly even
/// when one side of the exchange is an empty square.
pub struct ZobristKeys {
    /// piece\[piece_code\]\[square\] — key for a piece code on a square.
    piece: [[u64; 64]; 16],
    /// XOR this when it is Black's turn to move.
    pub side_to_move: u64,
}

/// Static singleton holding the Zobrist keys (initialised once).
static ZOBRIST: std::sync::OnceLock<ZobristKeys> = std::sync::OnceLock::new();

/// Get a reference to the global Zobrist keys.
pub fn keys() -> &'static ZobristKeys {
    ZOBRIST.get_or_init(ZobristKeys::init)
}

impl ZobristKeys {
    /// Generate all keys with a deterministic PRNG seeded with a fixed value,
    /// so hashes are reproducible across runs and survive snapshot
    /// serialization round-trips.
    fn init() -> Self {
        let mut rng = Xorshift64::new(0x9E37_79B9_7F4A_7C15);

        let mut piece = [[0u64; 64]; 16];
        for (code, row) in piece.iter_mut().enumerate() {
            if code == 0 {
                continue; // empty squares hash to nothing
            }
            for key in row.iter_mut() {
                *key = rng.next_u64();
            }
        }

        let side_to_move = rng.next_u64();

        ZobristKeys {
            piece,
            side_to_move,
        }
    }

    /// Key for a piece on a square. Zero for an empty square, so callers can
    /// XOR unconditionally.
    #[inline]
    pub fn piece_key(&self, piece: Piece, sq: Square) -> u64 {
        self.piece[piece.code() as usize][sq.0 as usize]
    }
}

// ---------------------------------------------------------------------------
// Deterministic PRNG (xorshift64)
// ---------------------------------------------------------------------------

/// Minimal xorshift64 PRNG — deterministic, fast, good distribution.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        // Ensure state is never zero (xorshift zero → always zero).
        Xorshift64 {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
