//! Legal move generation.
//!
//! Pipeline:
//!   1. Walk the precomputed tables for every piece of the moving color,
//!      producing pseudo-legal candidates.
//!   2. Filter each candidate with an in-place probe: put the piece on its
//!      destination, test the king for check, revert. Only non-self-checking
//!      moves survive.
//!
//! The probe mutates the board's square array directly (and restores it
//! before returning), which is why generation takes `&mut Board`. Counts,
//! Zobrist, and history are never touched. Alongside the move list the
//! generator tallies an `AttackPosInfo` for external evaluation.

use crate::engine::attacks;
use crate::engine::board::{Board, CastleSide};
use crate::engine::types::{Color, Move, MoveFlags, MoveKind, Piece, PieceKind, Square};

// =========================================================================
// Public API
// =========================================================================

/// Attack and defence tallies gathered while generating moves. Computed for
/// external evaluation; nothing in this crate consumes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackPosInfo {
    /// Legal candidate moves landing on an enemy piece.
    pub attacked: u32,
    /// Own pieces covered by another piece of the moving side.
    pub defending: u32,
}

/// Generate all legal moves for `color`, together with the attack counters.
///
/// The board is borrowed mutably for the duration of the in-place legality
/// probes but is returned in exactly the state it was given.
pub fn legal_moves(board: &mut Board, color: Color) -> (Vec<Move>, AttackPosInfo) {
    let mut r#gen = Gen {
        board,
        color,
        moves: Vec::with_capacity(64),
        info: AttackPosInfo::default(),
    };
    r#gen.run();
    (r#gen.moves, r#gen.info)
}

// =========================================================================
// Generator
// =========================================================================

struct Gen<'a> {
    board: &'a mut Board,
    color: Color,
    moves: Vec<Move>,
    info: AttackPosInfo,
}

impl Gen<'_> {
    fn run(&mut self) {
        for i in 0..64u8 {
            let from = Square(i);
            let piece = self.board.piece_at(from);
            if !piece.is_color(self.color) {
                continue;
            }
            let t = attacks::tables();
            match piece.kind() {
                PieceKind::Pawn => self.pawn_moves(from),
                PieceKind::Knight => self.leaper_moves(from, t.knight_moves(from)),
                PieceKind::King => self.leaper_moves(from, t.king_moves(from)),
                PieceKind::Bishop => self.ray_moves(from, t.bishop_rays(from)),
                PieceKind::Rook => self.ray_moves(from, t.rook_rays(from)),
                PieceKind::Queen => self.ray_moves(from, t.queen_rays(from)),
                PieceKind::None => unreachable!("is_color rules out empty squares"),
            }
        }
        self.castle_moves();
        self.en_passant_moves();
    }

    // -------------------------------------------------------------------
    // Leapers (knight, king)
    // -------------------------------------------------------------------

    fn leaper_moves(&mut self, from: Square, targets: &[Square]) {
        for &to in targets {
            if self.board.piece_at(to).is_color(self.color) {
                self.info.defending += 1;
            } else {
                self.add_if_not_check(from, to, MoveKind::Normal);
            }
        }
    }

    // -------------------------------------------------------------------
    // Sliders (bishop, rook, queen)
    // -------------------------------------------------------------------

    fn ray_moves(&mut self, from: Square, rays: &[Vec<Square>]) {
        for ray in rays {
            for &to in ray {
                let target = self.board.piece_at(to);
                if target.is_empty() {
                    self.add_if_not_check(from, to, MoveKind::Normal);
                    continue;
                }
                if target.is_color(self.color) {
                    self.info.defending += 1;
                } else {
                    self.add_if_not_check(from, to, MoveKind::Normal);
                }
                break; // first occupied square ends the ray
            }
        }
    }

    // -------------------------------------------------------------------
    // Pawns
    // -------------------------------------------------------------------

    fn pawn_moves(&mut self, from: Square) {
        let (dir, start_rank, promo_rank): (i8, u8, u8) = match self.color {
            Color::White => (8, 1, 7),
            Color::Black => (-8, 6, 0),
        };

        // Advances. Pawns never stand on the back ranks, so one step ahead is
        // always on the board.
        let ahead = Square((from.0 as i8 + dir) as u8);
        if self.board.piece_at(ahead).is_empty() {
            if ahead.rank() == promo_rank {
                self.add_promotions(from, ahead);
            } else {
                self.add_if_not_check(from, ahead, MoveKind::Normal);
            }
            if from.rank() == start_rank {
                let two_ahead = Square((from.0 as i8 + 2 * dir) as u8);
                if self.board.piece_at(two_ahead).is_empty() {
                    self.add_if_not_check(from, two_ahead, MoveKind::Normal);
                }
            }
        }

        // Diagonal captures, constrained to the board's columns.
        let mut capture = |to: Square| {
            let target = self.board.piece_at(to);
            if target.is_empty() {
                return;
            }
            if target.is_color(self.color) {
                self.info.defending += 1;
            } else if to.rank() == promo_rank {
                self.add_promotions(from, to);
            } else {
                self.add_if_not_check(from, to, MoveKind::Normal);
            }
        };
        if from.col() > 0 {
            capture(Square((ahead.0) - 1));
        }
        if from.col() < 7 {
            capture(Square((ahead.0) + 1));
        }
    }

    /// One candidate per promotion piece.
    fn add_promotions(&mut self, from: Square, to: Square) {
        for kind in [
            MoveKind::PromoteQueen,
            MoveKind::PromoteRook,
            MoveKind::PromoteBishop,
            MoveKind::PromoteKnight,
        ] {
            self.add_if_not_check(from, to, kind);
        }
    }

    // -------------------------------------------------------------------
    // Castling
    // -------------------------------------------------------------------

    /// Castle candidates: counters must be untouched, the corridor empty, and
    /// neither the king's origin nor the square it crosses attacked. The
    /// destination square is covered by the self-check probe like any other
    /// king move.
    fn castle_moves(&mut self) {
        let color = self.color;
        let them = !color;
        let base = match color {
            Color::White => 0u8,
            Color::Black => 56u8,
        };
        let king_sq = self.board.king_square(color);

        // Short castle (toward the h-file rook): king e→g.
        if self.board.can_castle(color, CastleSide::King)
            && self.board.piece_at(Square(base + 1)).is_empty()
            && self.board.piece_at(Square(base + 2)).is_empty()
            && !self.board.is_square_attacked(Square(base + 2), them)
            && !self.board.is_square_attacked(Square(base + 3), them)
        {
            self.add_if_not_check(king_sq, Square(base + 1), MoveKind::Castle);
        }

        // Long castle (toward the a-file rook): king e→c.
        if self.board.can_castle(color, CastleSide::Queen)
            && self.board.piece_at(Square(base + 4)).is_empty()
            && self.board.piece_at(Square(base + 5)).is_empty()
            && self.board.piece_at(Square(base + 6)).is_empty()
            && !self.board.is_square_attacked(Square(base + 3), them)
            && !self.board.is_square_attacked(Square(base + 4), them)
        {
            self.add_if_not_check(king_sq, Square(base + 5), MoveKind::Castle);
        }
    }

    // -------------------------------------------------------------------
    // En passant
    // -------------------------------------------------------------------

    fn en_passant_moves(&mut self) {
        let Some(target) = self.board.ep_target() else {
            return;
        };
        // The victim pawn stands in front of the target from the mover's
        // perspective.
        let victim_sq = match self.color {
            Color::White => Square(target.0 - 8),
            Color::Black => Square(target.0 + 8),
        };
        let victim = self.board.piece_at(victim_sq);
        if !victim.is(!self.color, PieceKind::Pawn) {
            return;
        }

        let mut candidates = Vec::with_capacity(2);
        if victim_sq.col() > 0 {
            candidates.push(Square(victim_sq.0 - 1));
        }
        if victim_sq.col() < 7 {
            candidates.push(Square(victim_sq.0 + 1));
        }

        for from in candidates {
            if !self.board.piece_at(from).is(self.color, PieceKind::Pawn) {
                continue;
            }
            // Lift the victim for the probe so a discovered check on the
            // mover's king is seen.
            self.board.raw_set(victim_sq, Piece::EMPTY);
            self.add_if_not_check(from, target, MoveKind::EnPassant);
            self.board.raw_set(victim_sq, victim);
        }
    }

    // -------------------------------------------------------------------
    // Self-check filter
    // -------------------------------------------------------------------

    /// Probe the candidate in place: apply, test the mover's king for check
    /// (at the destination when the king itself moves), revert. The capture
    /// flag is decided on the pre-move board.
    fn add_if_not_check(&mut self, from: Square, to: Square, kind: MoveKind) {
        let moved = self.board.piece_at(from);
        let displaced = self.board.piece_at(to);
        let capture = !displaced.is_empty() || kind == MoveKind::EnPassant;

        self.board.raw_set(to, moved);
        self.board.raw_set(from, Piece::EMPTY);
        let king_sq = if moved.kind() == PieceKind::King {
            to
        } else {
            self.board.king_square(self.color)
        };
        let in_check = self.board.is_check_at(self.color, king_sq);
        self.board.raw_set(from, moved);
        self.board.raw_set(to, displaced);

        if in_check {
            return;
        }
        let flags = if capture {
            self.info.attacked += 1;
            MoveFlags::PIECE_EATEN
        } else {
            MoveFlags::NONE
        };
        self.moves.push(Move::new(from, to, kind, flags, moved));
    }
}

// =========================================================================
// Tests
// =========================================================================
