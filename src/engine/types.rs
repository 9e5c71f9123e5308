use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceKind
// ---------------------------------------------------------------------------

/// The six piece kinds plus the empty-square marker.
///
/// The discriminants are the low three bits of the packed piece encoding and
/// therefore appear verbatim in the packed history snapshots and the binary
/// move format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    None = 0,
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceKind {
    /// The six real piece kinds in encoding order.
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<PieceKind> {
        match code {
            0 => Some(PieceKind::None),
            1 => Some(PieceKind::Pawn),
            2 => Some(PieceKind::Knight),
            3 => Some(PieceKind::Bishop),
            4 => Some(PieceKind::Rook),
            5 => Some(PieceKind::Queen),
            6 => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Uppercase SAN letter ('P' for pawns, which SAN itself omits).
    pub fn letter(self) -> Option<char> {
        match self {
            PieceKind::None => None,
            PieceKind::Pawn => Some('P'),
            PieceKind::Knight => Some('N'),
            PieceKind::Bishop => Some('B'),
            PieceKind::Rook => Some('R'),
            PieceKind::Queen => Some('Q'),
            PieceKind::King => Some('K'),
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceKind::None => write!(f, "none"),
            PieceKind::Pawn => write!(f, "pawn"),
            PieceKind::Knight => write!(f, "knight"),
            PieceKind::Bishop => write!(f, "bishop"),
            PieceKind::Rook => write!(f, "rook"),
            PieceKind::Queen => write!(f, "queen"),
            PieceKind::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Piece — kind + color packed into one byte
// ---------------------------------------------------------------------------

/// A piece as stored in the board array: low 3 bits = kind (0 = empty),
/// bit 3 = Black. The numeric codes are externally observable through the
/// packed history snapshots and the binary move list format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece(u8);

impl Piece {
    pub const EMPTY: Piece = Piece(0);

    const BLACK_BIT: u8 = 8;

    #[inline]
    pub fn new(color: Color, kind: PieceKind) -> Self {
        debug_assert!(kind != PieceKind::None);
        match color {
            Color::White => Piece(kind.code()),
            Color::Black => Piece(kind.code() | Self::BLACK_BIT),
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 & 7 == 0
    }

    #[inline]
    pub fn kind(self) -> PieceKind {
        PieceKind::from_code(self.0 & 7).expect("3-bit kind codes are always valid")
    }

    /// Color of the piece, or `None` for an empty square.
    #[inline]
    pub fn color(self) -> Option<Color> {
        if self.is_empty() {
            None
        } else if self.0 & Self::BLACK_BIT != 0 {
            Some(Color::Black)
        } else {
            Some(Color::White)
        }
    }

    /// Whether this is a non-empty piece of the given color.
    #[inline]
    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    #[inline]
    pub fn is(self, color: Color, kind: PieceKind) -> bool {
        self == Piece::new(color, kind)
    }

    /// Raw 4-bit code as persisted in snapshots and binary move lists.
    #[inline]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Decode a persisted 4-bit code. Codes 7 and 15 have no meaning.
    pub fn from_code(code: u8) -> Option<Piece> {
        if code < 16 && code & 7 != 7 {
            Some(Piece(code))
        } else {
            None
        }
    }

    /// FEN character (uppercase = white), or `None` for an empty square.
    pub fn to_char(self) -> Option<char> {
        let c = match self.kind() {
            PieceKind::None => return None,
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match self.color() {
            Some(Color::White) => Some(c.to_ascii_uppercase()),
            _ => Some(c),
        }
    }

    /// Parse a FEN piece character.
    pub fn from_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Piece::new(color, kind))
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the board (0..63).
///
/// The layout is rank-major with mirrored columns: bits 0-2 hold the column
/// (0 = file 'h' … 7 = file 'a'), bits 3-5 hold the rank (0 = rank 1).
/// So h1 = 0, a1 = 7, h8 = 56, a8 = 63.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square(pub u8);

impl Square {
    pub const NUM: usize = 64;

    #[inline]
    pub fn new(index: u8) -> Self {
        debug_assert!(index < 64, "Square index out of range: {index}");
        Square(index)
    }

    /// Stored column: 0 = file 'h' … 7 = file 'a'.
    #[inline]
    pub fn col(self) -> u8 {
        self.0 & 7
    }

    /// Rank index: 0 = rank 1 … 7 = rank 8.
    #[inline]
    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Algebraic file index: 0 = file 'a' … 7 = file 'h'.
    #[inline]
    pub fn file(self) -> u8 {
        7 - self.col()
    }

    /// Build a square from an algebraic file index (a = 0) and a rank.
    #[inline]
    pub fn from_file_rank(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + (7 - file))
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square::from_file_rank(file, rank))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// ---------------------------------------------------------------------------
// MoveKind & MoveFlags
// ---------------------------------------------------------------------------

/// What kind of move this is. The discriminants appear in the binary move
/// list format and in the `MoveType` attribute of the XML form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MoveKind {
    Normal = 0,
    PromoteQueen = 1,
    PromoteRook = 2,
    PromoteBishop = 3,
    PromoteKnight = 4,
    Castle = 5,
    EnPassant = 6,
}

impl MoveKind {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<MoveKind> {
        match code {
            0 => Some(MoveKind::Normal),
            1 => Some(MoveKind::PromoteQueen),
            2 => Some(MoveKind::PromoteRook),
            3 => Some(MoveKind::PromoteBishop),
            4 => Some(MoveKind::PromoteKnight),
            5 => Some(MoveKind::Castle),
            6 => Some(MoveKind::EnPassant),
            _ => None,
        }
    }

    /// The piece kind a promotion produces, or `None` for non-promotions.
    pub fn promotion(self) -> Option<PieceKind> {
        match self {
            MoveKind::PromoteQueen => Some(PieceKind::Queen),
            MoveKind::PromoteRook => Some(PieceKind::Rook),
            MoveKind::PromoteBishop => Some(PieceKind::Bishop),
            MoveKind::PromoteKnight => Some(PieceKind::Knight),
            _ => None,
        }
    }

    #[inline]
    pub fn is_promotion(self) -> bool {
        self.promotion().is_some()
    }
}

/// Flag bits carried alongside the move kind. Bit 4 marks a capture; the
/// combined `kind | flags` byte is the persisted `MoveType` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFlags(pub u8);

impl MoveFlags {
    pub const NONE: MoveFlags = MoveFlags(0);
    pub const PIECE_EATEN: MoveFlags = MoveFlags(16);

    #[inline]
    pub fn is_capture(self) -> bool {
        self.0 & Self::PIECE_EATEN.0 != 0
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        MoveFlags(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A concrete move: origin, destination, kind, flags, and the piece that
/// stood on the origin square before the move (pre-promotion, for display
/// and persistence).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
    pub flags: MoveFlags,
    pub piece: Piece,
}

impl Move {
    pub fn new(from: Square, to: Square, kind: MoveKind, flags: MoveFlags, piece: Piece) -> Self {
        Move {
            from,
            to,
            kind,
            flags,
            piece,
        }
    }

    /// The persisted `MoveType` byte: kind code plus flag bits.
    #[inline]
    pub fn type_code(self) -> u8 {
        self.kind.code() | self.flags.0
    }

    /// Split a persisted `MoveType` byte back into kind and flags.
    pub fn split_type_code(code: u8) -> Option<(MoveKind, MoveFlags)> {
        let kind = MoveKind::from_code(code & 0b0111)?;
        let flags = MoveFlags(code & MoveFlags::PIECE_EATEN.0);
        Some((kind, flags))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.flags.is_capture() { 'x' } else { '-' };
        write!(f, "{}{}{}", self.from, sep, self.to)?;
        if let Some(promo) = self.kind.promotion()
            && let Some(letter) = promo.letter()
        {
            write!(f, "={letter}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RepeatResult
// ---------------------------------------------------------------------------

/// Draw-condition report returned by `Board::do_move`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatResult {
    NoRepeat,
    ThreeFoldRepeat,
    FiftyRuleRepeat,
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors for the chess engine.
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("no legal move matches '{san}': {reason}")]
    IllegalMove { san: String, reason: String },

    #[error("ambiguous move '{san}': {candidates} candidates")]
    AmbiguousMove { san: String, candidates: usize },

    #[error("malformed move list: {0}")]
    MalformedMoveList(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
