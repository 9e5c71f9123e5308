//! Mailbox chess position representation.
//!
//! `Board` stores piece placement as a flat 64-entry piece array together
//! with per-piece-code counts, cached king positions, per-rook and per-king
//! move counters (zero ⇒ the castling right is still alive), the en-passant
//! target with its undo stack, an incrementally maintained Zobrist key, and
//! an owned `MoveHistory` for the draw rules.
//!
//! Square layout: h1 = 0, a1 = 7, h8 = 56, a8 = 63 (see `types::Square`).

use crate::engine::attacks;
use crate::engine::history::MoveHistory;
use crate::engine::types::{
    ChessError, Color, Move, MoveKind, Piece, PieceKind, RepeatResult, Square,
};
use crate::engine::zobrist;

/// The classic initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Castle geometry
// ---------------------------------------------------------------------------

/// The two castle corners, named by standard convention: `King` is the short
/// castle toward the h-file rook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastleSide {
    King = 0,
    Queen = 1,
}

/// King home squares, indexed by color.
const KING_HOME: [u8; 2] = [3, 59];
/// Rook home squares, indexed by \[color\]\[castle side\].
const ROOK_HOME: [[u8; 2]; 2] = [[0, 7], [56, 63]];

/// For a king destination square (after castling), return (rook_from,
/// rook_to).
pub(crate) fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to.0 {
        // White short: king e1→g1, rook h1→f1.
        1 => (Square(0), Square(2)),
        // White long: king e1→c1, rook a1→d1.
        5 => (Square(7), Square(4)),
        // Black short: king e8→g8, rook h8→f8.
        57 => (Square(56), Square(58)),
        // Black long: king e8→c8, rook a8→d8.
        61 => (Square(63), Square(60)),
        _ => panic!("invalid castling king destination: {king_to}"),
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A complete chess position plus the history needed for draw detection.
///
/// The board must not be observed while a move is being applied; all
/// operations complete before returning.
#[derive(Clone, Debug)]
pub struct Board {
    /// Piece placement, indexed by square.
    squares: [Piece; 64],
    /// Number of pieces on the board per 4-bit piece code.
    piece_count: [u8; 16],
    /// Cached king squares for O(1) check tests, indexed by color.
    king_pos: [Square; 2],
    /// Times the king has left its home square, indexed by color.
    king_move_count: [u32; 2],
    /// Times each rook has left its home square, \[color\]\[castle side\].
    rook_move_count: [[u32; 2]; 2],
    /// Once a side has castled, castling ceases for good.
    castled: [bool; 2],
    /// Square behind a pawn that just advanced two ranks, or 0 if none.
    ep_target: u8,
    /// Prior `ep_target` values, for unmake.
    ep_stack: Vec<u8>,
    /// Captured piece per applied move (EMPTY for quiet moves), for unmake.
    captured_stack: Vec<Piece>,
    /// Incrementally maintained Zobrist key.
    zobrist: u64,
    side_to_move: Color,
    /// Full-move number (starts at 1, incremented after Black moves).
    fullmove_number: u16,
    history: MoveHistory,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Board {
    /// Standard starting position.
    pub fn new() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting FEN is always valid")
    }

    fn blank() -> Self {
        Board {
            squares: [Piece::EMPTY; 64],
            piece_count: [0; 16],
            king_pos: [Square(0); 2],
            king_move_count: [1; 2],
            rook_move_count: [[1; 2]; 2],
            castled: [false; 2],
            ep_target: 0,
            ep_stack: Vec::new(),
            captured_stack: Vec::new(),
            zobrist: 0,
            side_to_move: Color::White,
            fullmove_number: 1,
            history: MoveHistory::new(),
        }
    }

    /// Parse a FEN string into a `Board`.
    ///
    /// Validates all 6 fields (piece placement, side to move, castling,
    /// en passant, halfmove clock, fullmove number) and ensures exactly one
    /// king per side.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(ChessError::InvalidFen(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        }

        let mut board = Board::blank();

        // ----- Field 1: Piece placement -----
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::InvalidFen(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as u8; // FEN starts from rank 8
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if file > 7 {
                    return Err(ChessError::InvalidFen(format!(
                        "too many squares in rank {}",
                        rank + 1
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid empty count '{ch}' in rank {}",
                            rank + 1
                        )));
                    }
                    file += digit as u8;
                } else if let Some(piece) = Piece::from_char(ch) {
                    let sq = Square::from_file_rank(file, rank);
                    board.squares[sq.0 as usize] = piece;
                    board.piece_count[piece.code() as usize] += 1;
                    if piece.kind() == PieceKind::King {
                        board.king_pos[piece.color().expect("king has a color").index()] = sq;
                    }
                    file += 1;
                } else {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid character '{ch}' in piece placement"
                    )));
                }
            }
            if file != 8 {
                return Err(ChessError::InvalidFen(format!(
                    "rank {} has {} squares instead of 8",
                    rank + 1,
                    file
                )));
            }
        }

        // Validate exactly one king per side.
        for color in [Color::White, Color::Black] {
            let kings = board.piece_count[Piece::new(color, PieceKind::King).code() as usize];
            if kings != 1 {
                return Err(ChessError::InvalidFen(format!(
                    "{color} has {kings} kings (expected 1)"
                )));
            }
        }

        // ----- Field 2: Side to move -----
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid side to move: '{other}'"
                )));
            }
        };

        // ----- Field 3: Castling availability -----
        // Rights live in the move counters: an available right zeroes the
        // matching king and rook counters, a missing one leaves them "moved".
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                let (color, side) = match ch {
                    'K' => (Color::White, CastleSide::King),
                    'Q' => (Color::White, CastleSide::Queen),
                    'k' => (Color::Black, CastleSide::King),
                    'q' => (Color::Black, CastleSide::Queen),
                    _ => {
                        return Err(ChessError::InvalidFen(format!(
                            "invalid castling string: '{}'",
                            fields[2]
                        )));
                    }
                };
                board.king_move_count[color.index()] = 0;
                board.rook_move_count[color.index()][side as usize] = 0;
            }
        }

        // ----- Field 4: En passant target square -----
        if fields[3] != "-" {
            let ep_sq = Square::from_algebraic(fields[3]).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid en passant square: '{}'", fields[3]))
            })?;
            // The target sits behind the double-pushed pawn: rank 3 or 6.
            if ep_sq.rank() != 2 && ep_sq.rank() != 5 {
                return Err(ChessError::InvalidFen(format!(
                    "en passant square {} is not on rank 3 or 6",
                    fields[3]
                )));
            }
            board.ep_target = ep_sq.0;
        }

        // ----- Field 5: Halfmove clock -----
        let halfmove: u16 = fields[4].parse().map_err(|_| {
            ChessError::InvalidFen(format!("invalid halfmove clock: '{}'", fields[4]))
        })?;

        // ----- Field 6: Fullmove number -----
        board.fullmove_number = fields[5].parse().map_err(|_| {
            ChessError::InvalidFen(format!("invalid fullmove number: '{}'", fields[5]))
        })?;
        if board.fullmove_number == 0 {
            return Err(ChessError::InvalidFen(
                "fullmove number must be >= 1".to_string(),
            ));
        }

        board.zobrist = board.compute_zobrist();
        let extra = board.extra_info();
        board.history.reset(&board.squares, extra, halfmove);

        Ok(board)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The piece on a square (EMPTY if none).
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.squares[sq.0 as usize]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn zobrist(&self) -> u64 {
        self.zobrist
    }

    /// Cached king square for a color.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_pos[color.index()]
    }

    /// The en-passant target square, if a double push just happened.
    #[inline]
    pub fn ep_target(&self) -> Option<Square> {
        if self.ep_target == 0 {
            None
        } else {
            Some(Square(self.ep_target))
        }
    }

    /// Number of pieces on the board with the given code.
    #[inline]
    pub fn count(&self, piece: Piece) -> u8 {
        self.piece_count[piece.code() as usize]
    }

    /// Half-moves since the last pawn move or capture.
    #[inline]
    pub fn half_move_clock(&self) -> u16 {
        self.history.half_move_clock()
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// The position history (repetition bookkeeping).
    #[inline]
    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Whether `color` may still castle on `side`: neither the king nor the
    /// matching rook has left its home square, the side has not castled, and
    /// the rook is standing on its corner.
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        !self.castled[color.index()]
            && self.king_move_count[color.index()] == 0
            && self.rook_move_count[color.index()][side as usize] == 0
            && self
                .piece_at(Square(ROOK_HOME[color.index()][side as usize]))
                .is(color, PieceKind::Rook)
    }

    /// Whether this side has already castled.
    #[inline]
    pub fn has_castled(&self, color: Color) -> bool {
        self.castled[color.index()]
    }

    // -----------------------------------------------------------------------
    // Extra-info mask
    // -----------------------------------------------------------------------

    /// Pack castling rights (bits 0-3) and the en-passant file (bits 4-7,
    /// file + 1, 0 = none) into the history extra-info mask.
    pub fn extra_info(&self) -> u64 {
        let mut extra = 0u64;
        if self.can_castle(Color::White, CastleSide::King) {
            extra |= 1;
        }
        if self.can_castle(Color::White, CastleSide::Queen) {
            extra |= 2;
        }
        if self.can_castle(Color::Black, CastleSide::King) {
            extra |= 4;
        }
        if self.can_castle(Color::Black, CastleSide::Queen) {
            extra |= 8;
        }
        if self.ep_target != 0 {
            extra |= (u64::from(Square(self.ep_target).file()) + 1) << 4;
        }
        extra
    }

    /// `extra_info` plus the current repetition count in bits 8 and up.
    pub fn extra_info_with_repetition(&self) -> u64 {
        self.extra_info() | (u64::from(self.history.same_board_count(self.zobrist)) << 8)
    }

    // -----------------------------------------------------------------------
    // Zobrist (full recompute)
    // -----------------------------------------------------------------------

    /// Compute the Zobrist key from scratch (FEN loading / verification).
    pub fn compute_zobrist(&self) -> u64 {
        let zk = zobrist::keys();
        let mut hash = 0u64;
        for i in 0..64u8 {
            hash ^= zk.piece_key(self.squares[i as usize], Square(i));
        }
        if self.side_to_move == Color::Black {
            hash ^= zk.side_to_move;
        }
        hash
    }

    // -----------------------------------------------------------------------
    // Attack detection
    // -----------------------------------------------------------------------

    /// Is `sq` attacked by any piece of color `by`?
    ///
    /// Walks the precomputed tables of the *target* square: sliding rays stop
    /// at the first occupied square per direction, leapers and pawn capture
    /// origins are direct lookups.
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let t = attacks::tables();

        // Diagonals: enemy bishop or queen.
        for ray in t.bishop_rays(sq) {
            for &s in ray {
                let piece = self.piece_at(s);
                if piece.is_empty() {
                    continue;
                }
                if piece.is_color(by)
                    && matches!(piece.kind(), PieceKind::Bishop | PieceKind::Queen)
                {
                    return true;
                }
                break;
            }
        }

        // Orthogonals: enemy rook or queen.
        for ray in t.rook_rays(sq) {
            for &s in ray {
                let piece = self.piece_at(s);
                if piece.is_empty() {
                    continue;
                }
                if piece.is_color(by) && matches!(piece.kind(), PieceKind::Rook | PieceKind::Queen)
                {
                    return true;
                }
                break;
            }
        }

        // Knights.
        for &s in t.knight_moves(sq) {
            if self.piece_at(s).is(by, PieceKind::Knight) {
                return true;
            }
        }

        // Enemy king.
        for &s in t.king_moves(sq) {
            if self.piece_at(s).is(by, PieceKind::King) {
                return true;
            }
        }

        // Pawns: squares from which a pawn of `by` captures onto `sq`.
        for &s in t.pawn_attack_origins(by, sq) {
            if self.piece_at(s).is(by, PieceKind::Pawn) {
                return true;
            }
        }

        false
    }

    /// Is the king of `color` currently in check?
    #[inline]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_pos[color.index()], !color)
    }

    /// Check test against an explicit king square (used while probing a king
    /// move, where the cached king position is stale on purpose).
    #[inline]
    pub(crate) fn is_check_at(&self, color: Color, king_sq: Square) -> bool {
        self.is_square_attacked(king_sq, !color)
    }

    /// Raw square write for the generator's in-place probe. Bypasses counts,
    /// Zobrist, and history — the caller must restore the exact prior state.
    #[inline]
    pub(crate) fn raw_set(&mut self, sq: Square, piece: Piece) {
        self.squares[sq.0 as usize] = piece;
    }

    // -----------------------------------------------------------------------
    // Square mutation (full bookkeeping)
    // -----------------------------------------------------------------------

    /// Overwrite one square, maintaining piece counts, the Zobrist key, and
    /// the in-flight history snapshot.
    fn set_square(&mut self, sq: Square, piece: Piece) {
        let zk = zobrist::keys();
        let old = self.squares[sq.0 as usize];
        if !old.is_empty() {
            self.piece_count[old.code() as usize] -= 1;
        }
        if !piece.is_empty() {
            self.piece_count[piece.code() as usize] += 1;
        }
        self.zobrist ^= zk.piece_key(old, sq) ^ zk.piece_key(piece, sq);
        self.squares[sq.0 as usize] = piece;
        self.history.update_current(sq, piece);
    }

    // -----------------------------------------------------------------------
    // Make / unmake
    // -----------------------------------------------------------------------

    /// Apply a move. The move must come from the generator (or be otherwise
    /// legal); applying an illegal move is a programmer error.
    ///
    /// Returns the draw condition the resulting position triggers, if any.
    pub fn do_move(&mut self, mv: Move) -> RepeatResult {
        let us = self.side_to_move;
        let moved = self.piece_at(mv.from);
        debug_assert!(moved.is_color(us), "no {us} piece on {}", mv.from);

        self.ep_stack.push(self.ep_target);
        // Pre-move state decides the fifty-move event; the destination must
        // not be read back after the mutation.
        let pawn_or_capture = moved.kind() == PieceKind::Pawn
            || !self.piece_at(mv.to).is_empty()
            || mv.kind == MoveKind::EnPassant;
        self.ep_target = 0;

        match mv.kind {
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(mv.to);
                let rook = self.piece_at(rook_from);
                self.set_square(mv.from, Piece::EMPTY);
                self.set_square(mv.to, moved);
                self.set_square(rook_from, Piece::EMPTY);
                self.set_square(rook_to, rook);
                self.castled[us.index()] = true;
                self.king_pos[us.index()] = mv.to;
                self.captured_stack.push(Piece::EMPTY);
            }
            MoveKind::EnPassant => {
                // Victim: same file as the destination, same rank as the
                // origin.
                let victim_sq = Square((mv.to.0 & 7) | (mv.from.0 & 0o70));
                let victim = self.piece_at(victim_sq);
                self.set_square(victim_sq, Piece::EMPTY);
                self.set_square(mv.from, Piece::EMPTY);
                self.set_square(mv.to, moved);
                self.captured_stack.push(victim);
            }
            MoveKind::PromoteQueen
            | MoveKind::PromoteRook
            | MoveKind::PromoteBishop
            | MoveKind::PromoteKnight => {
                let promoted =
                    Piece::new(us, mv.kind.promotion().expect("promotion kind has a piece"));
                let captured = self.piece_at(mv.to);
                self.set_square(mv.from, Piece::EMPTY);
                self.set_square(mv.to, promoted);
                self.captured_stack.push(captured);
            }
            MoveKind::Normal => {
                let captured = self.piece_at(mv.to);
                self.set_square(mv.from, Piece::EMPTY);
                self.set_square(mv.to, moved);
                if moved.kind() == PieceKind::King {
                    self.king_pos[us.index()] = mv.to;
                }
                self.captured_stack.push(captured);
            }
        }

        self.bump_departure_counters(us, mv.from, moved.kind(), 1);

        // Double pawn push leaves an en-passant target behind the pawn.
        if moved.kind() == PieceKind::Pawn && mv.from.0.abs_diff(mv.to.0) == 16 {
            self.ep_target = (mv.from.0 + mv.to.0) / 2;
        }

        self.zobrist ^= zobrist::keys().side_to_move;
        self.side_to_move = !us;
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        let extra = self.extra_info();
        self.history.set_extra(extra);
        self.history.add_current(self.zobrist, pawn_or_capture)
    }

    /// Reverse the most recent `do_move`. Moves must be unmade in strict
    /// LIFO order.
    pub fn undo_move(&mut self, mv: Move) {
        let us = !self.side_to_move;
        let captured = self
            .captured_stack
            .pop()
            .expect("undo_move without matching do_move");
        self.history.pop_current();

        match mv.kind {
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(mv.to);
                let rook = self.piece_at(rook_to);
                let king = self.piece_at(mv.to);
                self.set_square(rook_to, Piece::EMPTY);
                self.set_square(rook_from, rook);
                self.set_square(mv.to, Piece::EMPTY);
                self.set_square(mv.from, king);
                self.castled[us.index()] = false;
                self.king_pos[us.index()] = mv.from;
            }
            MoveKind::EnPassant => {
                let victim_sq = Square((mv.to.0 & 7) | (mv.from.0 & 0o70));
                self.set_square(mv.to, Piece::EMPTY);
                self.set_square(mv.from, mv.piece);
                self.set_square(victim_sq, captured);
            }
            MoveKind::PromoteQueen
            | MoveKind::PromoteRook
            | MoveKind::PromoteBishop
            | MoveKind::PromoteKnight => {
                self.set_square(mv.to, captured);
                self.set_square(mv.from, mv.piece);
            }
            MoveKind::Normal => {
                let moved = self.piece_at(mv.to);
                self.set_square(mv.to, captured);
                self.set_square(mv.from, moved);
                if moved.kind() == PieceKind::King {
                    self.king_pos[us.index()] = mv.from;
                }
            }
        }

        self.bump_departure_counters(us, mv.from, mv.piece.kind(), -1);
        self.ep_target = self
            .ep_stack
            .pop()
            .expect("undo_move without matching do_move");

        self.zobrist ^= zobrist::keys().side_to_move;
        self.side_to_move = us;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        let extra = self.extra_info();
        self.history.set_extra(extra);
    }

    /// Maintain the per-king and per-rook departure counters when a move
    /// leaves a home square (pre-promotion piece kind decides which piece is
    /// departing).
    fn bump_departure_counters(&mut self, color: Color, from: Square, kind: PieceKind, delta: i32) {
        let apply = |counter: &mut u32| {
            *counter = counter.wrapping_add_signed(delta);
        };
        if kind == PieceKind::King && from.0 == KING_HOME[color.index()] {
            apply(&mut self.king_move_count[color.index()]);
        } else if kind == PieceKind::Rook {
            if from.0 == ROOK_HOME[color.index()][CastleSide::King as usize] {
                apply(&mut self.rook_move_count[color.index()][CastleSide::King as usize]);
            } else if from.0 == ROOK_HOME[color.index()][CastleSide::Queen as usize] {
                apply(&mut self.rook_move_count[color.index()][CastleSide::Queen as usize]);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Insufficient material
    // -----------------------------------------------------------------------

    /// Neither side can possibly mate: K vs K, K+minor vs K, or K+B vs K+B
    /// with both bishops on the same square color.
    pub fn has_insufficient_material(&self) -> bool {
        let count = |color: Color, kind: PieceKind| self.count(Piece::new(color, kind)) as u32;

        for color in [Color::White, Color::Black] {
            if count(color, PieceKind::Pawn) > 0
                || count(color, PieceKind::Rook) > 0
                || count(color, PieceKind::Queen) > 0
            {
                return false;
            }
        }

        let w_minor = count(Color::White, PieceKind::Knight) + count(Color::White, PieceKind::Bishop);
        let b_minor = count(Color::Black, PieceKind::Knight) + count(Color::Black, PieceKind::Bishop);

        if w_minor + b_minor <= 1 {
            return true;
        }

        // K+B vs K+B with same-colored bishops.
        if w_minor == 1
            && b_minor == 1
            && count(Color::White, PieceKind::Bishop) == 1
            && count(Color::Black, PieceKind::Bishop) == 1
        {
            let shade = |color: Color| {
                (0..64u8)
                    .find(|&i| self.squares[i as usize].is(color, PieceKind::Bishop))
                    .map(|i| (Square(i).rank() + Square(i).col()) & 1)
            };
            return shade(Color::White) == shade(Color::Black);
        }

        false
    }

    // -----------------------------------------------------------------------
    // FEN generation
    // -----------------------------------------------------------------------

    /// Export the position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_count = 0u8;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq).to_char() {
                    Some(ch) => {
                        if empty_count > 0 {
                            fen.push((b'0' + empty_count) as char);
                            empty_count = 0;
                        }
                        fen.push(ch);
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push((b'0' + empty_count) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        let castling_mark = fen.len();
        if self.can_castle(Color::White, CastleSide::King) {
            fen.push('K');
        }
        if self.can_castle(Color::White, CastleSide::Queen) {
            fen.push('Q');
        }
        if self.can_castle(Color::Black, CastleSide::King) {
            fen.push('k');
        }
        if self.can_castle(Color::Black, CastleSide::Queen) {
            fen.push('q');
        }
        if fen.len() == castling_mark {
            fen.push('-');
        }

        fen.push(' ');
        match self.ep_target() {
            Some(sq) => fen.push_str(&sq.to_algebraic()),
            None => fen.push('-'),
        }

        fen.push(' ');
        fen.push_str(&self.half_move_clock().to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());

        fen
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top), for debugging.
    pub fn board_string(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                s.push(self.piece_at(sq).to_char().unwrap_or('.'));
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::MoveFlags;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn piece(color: Color, kind: PieceKind) -> Piece {
        Piece::new(color, kind)
    }

    fn mv(board: &Board, from: &str, to: &str, kind: MoveKind) -> Move {
        let from = sq(from);
        let capture = !board.piece_at(sq(to)).is_empty() || kind == MoveKind::EnPassant;
        Move::new(
            from,
            sq(to),
            kind,
            if capture {
                MoveFlags::PIECE_EATEN
            } else {
                MoveFlags::NONE
            },
            board.piece_at(from),
        )
    }

    // ===================================================================
    // Starting position
    // ===================================================================

    #[test]
    fn starting_position_fen_round_trip() {
        let board = Board::new();
        assert_eq!(board.to_fen(), STARTING_FEN);
    }

    #[test]
    fn starting_position_basics() {
        let board = Board::new();
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.king_square(Color::White), sq("e1"));
        assert_eq!(board.king_square(Color::Black), sq("e8"));
        assert_eq!(board.ep_target(), None);
        assert_eq!(board.half_move_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
    }

    #[test]
    fn starting_position_piece_counts() {
        let board = Board::new();
        for color in [Color::White, Color::Black] {
            assert_eq!(board.count(piece(color, PieceKind::Pawn)), 8);
            assert_eq!(board.count(piece(color, PieceKind::Knight)), 2);
            assert_eq!(board.count(piece(color, PieceKind::Bishop)), 2);
            assert_eq!(board.count(piece(color, PieceKind::Rook)), 2);
            assert_eq!(board.count(piece(color, PieceKind::Queen)), 1);
            assert_eq!(board.count(piece(color, PieceKind::King)), 1);
        }
    }

    #[test]
    fn starting_position_placement() {
        let board = Board::new();
        assert_eq!(board.piece_at(sq("a1")), piece(Color::White, PieceKind::Rook));
        assert_eq!(board.piece_at(sq("h1")), piece(Color::White, PieceKind::Rook));
        assert_eq!(board.piece_at(sq("d8")), piece(Color::Black, PieceKind::Queen));
        assert_eq!(board.piece_at(sq("e1")), piece(Color::White, PieceKind::King));
        assert!(board.piece_at(sq("e4")).is_empty());
    }

    #[test]
    fn starting_position_castle_rights() {
        let board = Board::new();
        for color in [Color::White, Color::Black] {
            assert!(board.can_castle(color, CastleSide::King));
            assert!(board.can_castle(color, CastleSide::Queen));
            assert!(!board.has_castled(color));
        }
    }

    // ===================================================================
    // FEN parsing & generation
    // ===================================================================

    #[test]
    fn fen_round_trip_after_e4() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
        assert_eq!(board.ep_target(), Some(sq("e3")));
    }

    #[test]
    fn fen_round_trip_kiwipete() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn fen_round_trip_partial_castling() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w Kq - 5 20";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
        assert!(board.can_castle(Color::White, CastleSide::King));
        assert!(!board.can_castle(Color::White, CastleSide::Queen));
        assert!(!board.can_castle(Color::Black, CastleSide::King));
        assert!(board.can_castle(Color::Black, CastleSide::Queen));
    }

    #[test]
    fn fen_errors() {
        // Wrong field count.
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
        // Wrong rank count.
        assert!(Board::from_fen("pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        // Bad piece char.
        assert!(
            Board::from_fen("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err()
        );
        // Bad side.
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err()
        );
        // Bad castling.
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w XY - 0 1").is_err()
        );
        // EP square on wrong rank.
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e4 0 1").is_err()
        );
        // Missing king.
        assert!(
            Board::from_fen("rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1").is_err()
        );
        // Two kings.
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKKBNR w - - 0 1").is_err()
        );
        // Fullmove zero.
        assert!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0").is_err()
        );
    }

    #[test]
    fn fen_halfmove_clock_carried() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 42 30").unwrap();
        assert_eq!(board.half_move_clock(), 42);
        assert_eq!(board.fullmove_number(), 30);
    }

    // ===================================================================
    // Zobrist
    // ===================================================================

    #[test]
    fn zobrist_matches_recompute_after_moves() {
        let mut board = Board::new();
        let moves = [
            ("e2", "e4", MoveKind::Normal),
            ("e7", "e5", MoveKind::Normal),
            ("g1", "f3", MoveKind::Normal),
            ("b8", "c6", MoveKind::Normal),
        ];
        for (from, to, kind) in moves {
            let m = mv(&board, from, to, kind);
            board.do_move(m);
            assert_eq!(board.zobrist(), board.compute_zobrist(), "after {m}");
        }
    }

    #[test]
    fn zobrist_differs_between_positions() {
        let a = Board::new();
        let b =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_ne!(a.zobrist(), b.zobrist());
    }

    // ===================================================================
    // do_move
    // ===================================================================

    #[test]
    fn double_push_sets_ep_target() {
        let mut board = Board::new();
        board.do_move(mv(&board, "e2", "e4", MoveKind::Normal));
        assert_eq!(board.ep_target(), Some(sq("e3")));
        assert_eq!(board.side_to_move(), Color::Black);

        // Any reply clears it.
        board.do_move(mv(&board, "g8", "f6", MoveKind::Normal));
        assert_eq!(board.ep_target(), None);
    }

    #[test]
    fn single_push_does_not_set_ep_target() {
        let mut board = Board::new();
        board.do_move(mv(&board, "e2", "e3", MoveKind::Normal));
        assert_eq!(board.ep_target(), None);
    }

    #[test]
    fn capture_updates_counts() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .unwrap();
        board.do_move(mv(&board, "e4", "d5", MoveKind::Normal));
        assert_eq!(board.count(piece(Color::Black, PieceKind::Pawn)), 7);
        assert_eq!(board.piece_at(sq("d5")), piece(Color::White, PieceKind::Pawn));
        assert_eq!(board.half_move_clock(), 0);
    }

    #[test]
    fn castle_short_moves_rook() {
        let mut board =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        board.do_move(mv(&board, "e1", "g1", MoveKind::Castle));
        assert_eq!(board.piece_at(sq("g1")), piece(Color::White, PieceKind::King));
        assert_eq!(board.piece_at(sq("f1")), piece(Color::White, PieceKind::Rook));
        assert!(board.piece_at(sq("e1")).is_empty());
        assert!(board.piece_at(sq("h1")).is_empty());
        assert!(board.has_castled(Color::White));
        assert!(!board.can_castle(Color::White, CastleSide::Queen));
        assert_eq!(board.king_square(Color::White), sq("g1"));
    }

    #[test]
    fn castle_long_moves_rook() {
        let mut board =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1").unwrap();
        board.do_move(mv(&board, "e8", "c8", MoveKind::Castle));
        assert_eq!(board.piece_at(sq("c8")), piece(Color::Black, PieceKind::King));
        assert_eq!(board.piece_at(sq("d8")), piece(Color::Black, PieceKind::Rook));
        assert!(board.piece_at(sq("a8")).is_empty());
        assert!(board.has_castled(Color::Black));
    }

    #[test]
    fn rook_departure_kills_castle_right() {
        let mut board =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        board.do_move(mv(&board, "h1", "g1", MoveKind::Normal));
        assert!(!board.can_castle(Color::White, CastleSide::King));
        assert!(board.can_castle(Color::White, CastleSide::Queen));
    }

    #[test]
    fn king_departure_kills_both_rights() {
        let mut board =
            Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        board.do_move(mv(&board, "e1", "f1", MoveKind::Normal));
        assert!(!board.can_castle(Color::White, CastleSide::King));
        assert!(!board.can_castle(Color::White, CastleSide::Queen));
        // Black is unaffected.
        assert!(board.can_castle(Color::Black, CastleSide::King));
    }

    #[test]
    fn en_passant_removes_victim() {
        // After 1. e4 d5 2. e5 f5: white may capture exf6 en passant.
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        board.do_move(mv(&board, "e5", "f6", MoveKind::EnPassant));
        assert_eq!(board.piece_at(sq("f6")), piece(Color::White, PieceKind::Pawn));
        assert!(board.piece_at(sq("f5")).is_empty(), "victim not removed");
        assert!(board.piece_at(sq("e5")).is_empty());
        assert_eq!(board.count(piece(Color::Black, PieceKind::Pawn)), 7);
    }

    #[test]
    fn promotion_swaps_piece_kind() {
        let mut board = Board::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        board.do_move(mv(&board, "a7", "a8", MoveKind::PromoteQueen));
        assert_eq!(board.piece_at(sq("a8")), piece(Color::White, PieceKind::Queen));
        assert_eq!(board.count(piece(Color::White, PieceKind::Pawn)), 0);
        assert_eq!(board.count(piece(Color::White, PieceKind::Queen)), 1);
    }

    #[test]
    fn underpromotion_to_knight() {
        let mut board = Board::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
        board.do_move(mv(&board, "a7", "a8", MoveKind::PromoteKnight));
        assert_eq!(
            board.piece_at(sq("a8")),
            piece(Color::White, PieceKind::Knight)
        );
    }

    // ===================================================================
    // undo_move
    // ===================================================================

    fn assert_round_trip(fen: &str, from: &str, to: &str, kind: MoveKind) {
        let mut board = Board::from_fen(fen).unwrap();
        let zobrist = board.zobrist();
        let extra = board.extra_info();
        let m = mv(&board, from, to, kind);
        board.do_move(m);
        board.undo_move(m);
        assert_eq!(board.to_fen(), fen, "FEN after undo of {m}");
        assert_eq!(board.zobrist(), zobrist, "zobrist after undo of {m}");
        assert_eq!(board.extra_info(), extra, "extra after undo of {m}");
    }

    #[test]
    fn undo_quiet_move() {
        assert_round_trip(STARTING_FEN, "g1", "f3", MoveKind::Normal);
    }

    #[test]
    fn undo_double_push() {
        assert_round_trip(STARTING_FEN, "e2", "e4", MoveKind::Normal);
    }

    #[test]
    fn undo_capture() {
        assert_round_trip(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            "e4",
            "d5",
            MoveKind::Normal,
        );
    }

    #[test]
    fn undo_castle() {
        assert_round_trip(
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1",
            "e1",
            "g1",
            MoveKind::Castle,
        );
    }

    #[test]
    fn undo_en_passant() {
        assert_round_trip(
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "e5",
            "f6",
            MoveKind::EnPassant,
        );
    }

    #[test]
    fn undo_promotion_capture() {
        assert_round_trip("1n6/P7/8/8/8/8/8/k6K w - - 0 1", "a7", "b8", MoveKind::PromoteQueen);
    }

    // ===================================================================
    // Attack detection
    // ===================================================================

    #[test]
    fn rook_attacks_along_file_until_blocked() {
        let board = Board::from_fen("4k3/8/8/4r3/8/4P3/8/4K3 w - - 0 1").unwrap();
        // Black rook on e5 attacks e3 (through empty e4)…
        assert!(board.is_square_attacked(sq("e3"), Color::Black));
        // …but not e2: the pawn on e3 blocks.
        assert!(!board.is_square_attacked(sq("e2"), Color::Black));
    }

    #[test]
    fn knight_and_pawn_attacks() {
        let board =
            Board::from_fen("4k3/8/8/3p4/8/4N3/8/4K3 w - - 0 1").unwrap();
        assert!(board.is_square_attacked(sq("d5"), Color::White)); // knight e3
        assert!(board.is_square_attacked(sq("c4"), Color::Black)); // pawn d5
        assert!(board.is_square_attacked(sq("e4"), Color::Black));
        assert!(!board.is_square_attacked(sq("d4"), Color::Black));
    }

    #[test]
    fn check_detection() {
        let board = Board::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
        assert!(board.is_in_check(Color::White));
        assert!(!board.is_in_check(Color::Black));
    }

    // ===================================================================
    // Draw conditions through do_move
    // ===================================================================

    #[test]
    fn threefold_reported_on_ninth_knight_shuffle_ply() {
        let mut board = Board::new();
        let shuffle = [
            ("g1", "f3"),
            ("g8", "f6"),
            ("f3", "g1"),
            ("f6", "g8"),
        ];
        let mut results = Vec::new();
        for _ in 0..2 {
            for (from, to) in shuffle {
                results.push(board.do_move(mv(&board, from, to, MoveKind::Normal)));
            }
        }
        results.push(board.do_move(mv(&board, "g1", "f3", MoveKind::Normal)));
        assert!(
            results[..8].iter().all(|r| *r == RepeatResult::NoRepeat),
            "premature repeat report: {results:?}"
        );
        assert_eq!(results[8], RepeatResult::ThreeFoldRepeat);
    }

    #[test]
    fn fifty_move_rule_reported() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 98 70").unwrap();
        assert_eq!(
            board.do_move(mv(&board, "h1", "h2", MoveKind::Normal)),
            RepeatResult::NoRepeat
        );
        assert_eq!(
            board.do_move(mv(&board, "e8", "e7", MoveKind::Normal)),
            RepeatResult::FiftyRuleRepeat
        );
    }

    // ===================================================================
    // Extra info
    // ===================================================================

    #[test]
    fn extra_info_castling_bits() {
        let board = Board::new();
        assert_eq!(board.extra_info() & 0xF, 0b1111);

        let board = Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w Kq - 0 1").unwrap();
        assert_eq!(board.extra_info() & 0xF, 0b1001);
    }

    #[test]
    fn extra_info_ep_file() {
        let board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!((board.extra_info() >> 4) & 0xF, 4 + 1); // file e = 4
    }

    #[test]
    fn extra_info_with_repetition_counts() {
        let mut board = Board::new();
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        for (from, to) in shuffle {
            board.do_move(mv(&board, from, to, MoveKind::Normal));
        }
        // The starting placement has recurred once through played moves.
        assert_eq!(board.extra_info_with_repetition() >> 8, 1);
        assert_eq!(board.extra_info(), board.extra_info_with_repetition() & 0xFF);
    }

    // ===================================================================
    // Insufficient material
    // ===================================================================

    #[test]
    fn insufficient_material_cases() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",      // K vs K
            "4k3/8/8/8/8/8/8/4KB2 w - - 0 1",     // K+B vs K
            "4k3/8/8/8/8/8/8/4KN2 w - - 0 1",     // K+N vs K
            "4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1",   // same-shade bishops
        ] {
            assert!(
                Board::from_fen(fen).unwrap().has_insufficient_material(),
                "{fen}"
            );
        }
    }

    #[test]
    fn sufficient_material_cases() {
        for fen in [
            STARTING_FEN,
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",    // pawn
            "2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1",  // opposite-shade bishops
            "4k3/8/8/8/8/8/8/3KNN2 w - - 0 1",    // two knights
        ] {
            assert!(
                !Board::from_fen(fen).unwrap().has_insufficient_material(),
                "{fen}"
            );
        }
    }

    // ===================================================================
    // Display
    // ===================================================================

    #[test]
    fn board_string_layout() {
        let board = Board::new();
        let s = board.board_string();
        assert!(s.starts_with("8 r n b q k b n r"));
        assert!(s.ends_with("a b c d e f g h"));
    }
}
