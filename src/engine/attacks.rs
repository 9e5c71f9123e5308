//! Pre-computed movement tables for move generation and attack detection.
//!
//! All tables are initialised once (via `OnceLock`) and live for the lifetime
//! of the process. For every square they hold plain square lists: sliding
//! pieces get one list per ray direction (so the generator can stop a
//! direction at the first blocker), leapers get a single flat list, and pawns
//! get the list of origin squares that capture onto the square.

use crate::engine::types::{Color, Square};
use std::sync::OnceLock;

// =========================================================================
// Public API
// =========================================================================

/// Get a reference to the global movement tables.
pub fn tables() -> &'static MoveTables {
    static TABLES: OnceLock<MoveTables> = OnceLock::new();
    TABLES.get_or_init(MoveTables::init)
}

/// Pre-computed movement tables for every piece type.
pub struct MoveTables {
    /// Diagonal rays, one inner list per direction (bishop, queen).
    bishop_rays: [Vec<Vec<Square>>; 64],
    /// Orthogonal rays, one inner list per direction (rook, queen).
    rook_rays: [Vec<Vec<Square>>; 64],
    /// Diagonal + orthogonal rays (queen), one inner list per direction.
    queen_rays: [Vec<Vec<Square>>; 64],
    /// Knight jump destinations.
    knight: [Vec<Square>; 64],
    /// King step destinations.
    king: [Vec<Square>; 64],
    /// Squares from which a white pawn captures onto the indexed square.
    white_pawn_from: [Vec<Square>; 64],
    /// Squares from which a black pawn captures onto the indexed square.
    black_pawn_from: [Vec<Square>; 64],
}

impl MoveTables {
    /// Diagonal rays from `sq`, grouped per direction.
    #[inline]
    pub fn bishop_rays(&self, sq: Square) -> &[Vec<Square>] {
        &self.bishop_rays[sq.0 as usize]
    }

    /// Orthogonal rays from `sq`, grouped per direction.
    #[inline]
    pub fn rook_rays(&self, sq: Square) -> &[Vec<Square>] {
        &self.rook_rays[sq.0 as usize]
    }

    /// All eight rays from `sq`, grouped per direction.
    #[inline]
    pub fn queen_rays(&self, sq: Square) -> &[Vec<Square>] {
        &self.queen_rays[sq.0 as usize]
    }

    /// Knight jumps from `sq`.
    #[inline]
    pub fn knight_moves(&self, sq: Square) -> &[Square] {
        &self.knight[sq.0 as usize]
    }

    /// King steps from `sq`.
    #[inline]
    pub fn king_moves(&self, sq: Square) -> &[Square] {
        &self.king[sq.0 as usize]
    }

    /// Squares from which a pawn of `color` captures onto `sq`.
    #[inline]
    pub fn pawn_attack_origins(&self, color: Color, sq: Square) -> &[Square] {
        match color {
            Color::White => &self.white_pawn_from[sq.0 as usize],
            Color::Black => &self.black_pawn_from[sq.0 as usize],
        }
    }
}

// =========================================================================
// Initialisation
// =========================================================================

const DIAG_DELTAS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ORTHO_DELTAS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const ALL_DELTAS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
];
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
// White pawns capture from one rank below, black pawns from one rank above.
const WHITE_PAWN_FROM_DELTAS: [(i8, i8); 2] = [(-1, -1), (1, -1)];
const BLACK_PAWN_FROM_DELTAS: [(i8, i8); 2] = [(-1, 1), (1, 1)];

impl MoveTables {
    fn init() -> Self {
        MoveTables {
            bishop_rays: std::array::from_fn(|sq| walk(sq as u8, &DIAG_DELTAS, true)),
            rook_rays: std::array::from_fn(|sq| walk(sq as u8, &ORTHO_DELTAS, true)),
            queen_rays: std::array::from_fn(|sq| walk(sq as u8, &ALL_DELTAS, true)),
            knight: std::array::from_fn(|sq| flatten(walk(sq as u8, &KNIGHT_DELTAS, false))),
            king: std::array::from_fn(|sq| flatten(walk(sq as u8, &ALL_DELTAS, false))),
            white_pawn_from: std::array::from_fn(|sq| {
                flatten(walk(sq as u8, &WHITE_PAWN_FROM_DELTAS, false))
            }),
            black_pawn_from: std::array::from_fn(|sq| {
                flatten(walk(sq as u8, &BLACK_PAWN_FROM_DELTAS, false))
            }),
        }
    }
}

/// Walk from `sq` along each `(Δcol, Δrank)` delta, collecting the squares
/// reached before leaving the 8×8 grid. With `repeat` the delta is applied
/// until the edge (a sliding ray); without it a single step is taken.
/// Directions that immediately leave the board are dropped.
fn walk(sq: u8, deltas: &[(i8, i8)], repeat: bool) -> Vec<Vec<Square>> {
    let col = (sq & 7) as i8;
    let rank = (sq >> 3) as i8;
    let mut directions = Vec::with_capacity(deltas.len());

    for &(dc, dr) in deltas {
        let mut squares = Vec::new();
        let mut c = col + dc;
        let mut r = rank + dr;
        while (0..8).contains(&c) && (0..8).contains(&r) {
            squares.push(Square((r * 8 + c) as u8));
            if !repeat {
                break;
            }
            c += dc;
            r += dr;
        }
        if !squares.is_empty() {
            directions.push(squares);
        }
    }
    directions
}

/// Collapse per-direction single-step lists into one flat leaper list.
fn flatten(directions: Vec<Vec<Square>>) -> Vec<Square> {
    directions.into_iter().flatten().collect()
}

// =========================================================================
// Tests
// =========================================================================
