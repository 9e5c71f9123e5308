//! Streaming PGN analysis.
//!
//! The pipeline is `CharSource` (chunked windowed reader) → `Lexer` (typed
//! tokens) → `PgnParser` (game records with moves resolved against the
//! engine). Malformed games are recovered locally by skipping to the next
//! termination marker so the rest of the file stays parseable.

pub mod lexer;
pub mod parser;
pub mod source;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseStats, ParsedGame, PgnParser, parse_reader, parse_str};
pub use source::CharSource;

use crate::engine::types::{ChessError, Square};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// GameResult
// ---------------------------------------------------------------------------

/// Game termination marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    /// Parse a PGN termination symbol.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "1-0" => Some(GameResult::WhiteWins),
            "0-1" => Some(GameResult::BlackWins),
            "1/2-1/2" => Some(GameResult::Draw),
            "*" => Some(GameResult::Ongoing),
            _ => None,
        }
    }

    /// The PGN termination symbol.
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Ongoing => "*",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PgnError
// ---------------------------------------------------------------------------

/// Errors surfaced by the PGN pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("lexical error at byte {offset}: {message}")]
    Lexical { offset: u64, message: String },

    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: u64, message: String },

    #[error(transparent)]
    Chess(#[from] ChessError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Square helper
// ---------------------------------------------------------------------------

/// Parse a two-character PGN square like `"e4"` into a board square.
pub fn square_from_pgn(s: &str) -> Option<Square> {
    Square::from_algebraic(s)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_result_round_trip() {
        for result in [
            GameResult::WhiteWins,
            GameResult::BlackWins,
            GameResult::Draw,
            GameResult::Ongoing,
        ] {
            assert_eq!(GameResult::from_token(result.as_str()), Some(result));
        }
        assert_eq!(GameResult::from_token("2-0"), None);
    }

    #[test]
    fn square_from_pgn_is_inverse_of_algebraic() {
        for i in 0..64u8 {
            let sq = Square(i);
            assert_eq!(square_from_pgn(&sq.to_algebraic()), Some(sq));
        }
    }

    #[test]
    fn square_from_pgn_rejects_malformed() {
        for bad in ["", "e", "e99", "i1", "4e"] {
            assert_eq!(square_from_pgn(bad), None);
        }
    }
}
