//! Streaming PGN analysis backed by a full legal-move chess engine.
//!
//! The crate has two tightly coupled halves:
//!
//! - [`pgn`] — a windowed character source, a PGN lexer, and a game parser
//!   that assembles tag sections and move text into [`pgn::ParsedGame`]
//!   records, recovering from malformed games so large files keep parsing.
//! - [`engine`] — a mailbox [`engine::Board`] with precomputed movement
//!   tables, legal move generation, make/unmake, Zobrist hashing, and the
//!   fifty-move and threefold-repetition rules. SAN move text is resolved
//!   by asking the engine which legal moves match.
//!
//! ```no_run
//! use chess_pgn::pgn;
//!
//! let input = std::fs::File::open("games.pgn")?;
//! let (games, stats) = pgn::parse_reader(input)?;
//! for game in &games {
//!     println!("{} moves, result {}", game.moves.len(), game.result);
//! }
//! println!("skipped {}, truncated {}", stats.skipped, stats.truncated);
//! # Ok::<(), chess_pgn::pgn::PgnError>(())
//! ```

pub mod engine;
pub mod pgn;

pub use engine::board::{Board, STARTING_FEN};
pub use engine::game::MovePosStack;
pub use engine::types::{
    ChessError, Color, Move, MoveFlags, MoveKind, Piece, PieceKind, RepeatResult, Square,
};
pub use pgn::{GameResult, ParseStats, ParsedGame, PgnError, parse_reader, parse_str};
