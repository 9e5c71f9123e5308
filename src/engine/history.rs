//! Packed position history backing the fifty-move and threefold-repetition
//! rules.
//!
//! The board keeps one in-flight packed snapshot that is mutated square by
//! square while a move is applied; committing a ply clones it into the
//! history list together with the position's Zobrist key. Repetition lookups
//! match on the Zobrist key first and then on the full packed snapshot plus
//! extra-info mask, so a hash collision can never produce a false draw.

use crate::engine::types::{Piece, RepeatResult, Square};

// =========================================================================
// PackedBoard
// =========================================================================

/// All 64 squares packed as 4-bit piece codes into four words, plus the
/// extra-info mask (castling rights and en-passant file; see
/// `Board::extra_info`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedBoard {
    cells: [u64; 4],
    extra: u64,
}

impl PackedBoard {
    /// Pack a full board array.
    pub fn from_squares(squares: &[Piece; 64], extra: u64) -> Self {
        let mut packed = PackedBoard {
            cells: [0; 4],
            extra,
        };
        for (i, piece) in squares.iter().enumerate() {
            packed.set(Square(i as u8), *piece);
        }
        packed
    }

    /// Overwrite the 4-bit cell for one square.
    #[inline]
    pub fn set(&mut self, sq: Square, piece: Piece) {
        let cell = (sq.0 >> 4) as usize;
        let shift = (sq.0 & 15) * 4;
        self.cells[cell] &= !(0xF << shift);
        self.cells[cell] |= u64::from(piece.code()) << shift;
    }

    /// Read back the 4-bit code for one square.
    #[inline]
    pub fn code_at(&self, sq: Square) -> u8 {
        let cell = (sq.0 >> 4) as usize;
        let shift = (sq.0 & 15) * 4;
        ((self.cells[cell] >> shift) & 0xF) as u8
    }

    #[inline]
    pub fn extra(&self) -> u64 {
        self.extra
    }
}

// =========================================================================
// MoveHistory
// =========================================================================

/// One committed ply: the packed position after the move, its Zobrist key,
/// and the clock value the ply replaced (restored on unmake).
#[derive(Clone, Debug)]
struct Entry {
    board: PackedBoard,
    zobrist: u64,
    clock_before: u16,
}

/// Append-only position history owned by a `Board`.
///
/// The initial position seeds only the in-flight snapshot; committed entries
/// exist for played plies alone, so "the number of earlier matching
/// snapshots" counts occurrences produced by moves.
#[derive(Clone, Debug, Default)]
pub struct MoveHistory {
    current: PackedBoard,
    entries: Vec<Entry>,
    half_move_clock: u16,
}

impl MoveHistory {
    pub fn new() -> Self {
        MoveHistory::default()
    }

    /// Discard all snapshots and seed the in-flight snapshot from a fresh
    /// board state. `half_move_clock` carries the FEN halfmove field when a
    /// game starts mid-way.
    pub fn reset(&mut self, squares: &[Piece; 64], extra: u64, half_move_clock: u16) {
        self.current = PackedBoard::from_squares(squares, extra);
        self.entries.clear();
        self.half_move_clock = half_move_clock;
    }

    /// Mirror one square change into the in-flight snapshot (called for each
    /// square the move touches, while the move is applied).
    #[inline]
    pub fn update_current(&mut self, sq: Square, piece: Piece) {
        self.current.set(sq, piece);
    }

    /// Update the extra-info mask once the move is fully applied.
    #[inline]
    pub fn set_extra(&mut self, extra: u64) {
        self.current.extra = extra;
    }

    /// Commit the in-flight snapshot as a played ply and report any draw
    /// condition it triggers.
    pub fn add_current(&mut self, zobrist: u64, pawn_move_or_capture: bool) -> RepeatResult {
        let clock_before = self.half_move_clock;
        if pawn_move_or_capture {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock += 1;
        }

        self.entries.push(Entry {
            board: self.current.clone(),
            zobrist,
            clock_before,
        });

        if self.half_move_clock >= 100 {
            return RepeatResult::FiftyRuleRepeat;
        }

        let earlier = self.matching_entries(zobrist, self.entries.len() - 1);
        if earlier >= 2 {
            RepeatResult::ThreeFoldRepeat
        } else {
            RepeatResult::NoRepeat
        }
    }

    /// Discard the most recent committed ply and restore the clock it
    /// replaced. The caller reverts the in-flight snapshot square by square.
    pub fn pop_current(&mut self) {
        let entry = self.entries.pop().expect("pop_current without a committed ply");
        self.half_move_clock = entry.clock_before;
    }

    /// How many committed plies reached the current position.
    pub fn same_board_count(&self, zobrist: u64) -> u32 {
        self.matching_entries(zobrist, self.entries.len()) as u32
    }

    /// Half-moves since the last pawn move or capture.
    #[inline]
    pub fn half_move_clock(&self) -> u16 {
        self.half_move_clock
    }

    /// Number of committed plies.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries before `limit` equal to the current snapshot. The Zobrist key
    /// is a cheap pre-filter; equality requires the packed board and the
    /// extra-info mask to match too.
    fn matching_entries(&self, zobrist: u64, limit: usize) -> usize {
        self.entries[..limit]
            .iter()
            .filter(|e| e.zobrist == zobrist && e.board == self.current)
            .count()
    }
}

// =========================================================================
// Tests
// =========================================================================
