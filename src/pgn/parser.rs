//! PGN game assembly: tags, FEN setup, and move-text replay.
//!
//! Each game is parsed as an optional tag section (`[Name "Value"]` triples)
//! followed by move text ending at a termination symbol. Move numbers, dots,
//! and NAGs are discarded; every remaining symbol is SAN, resolved against a
//! board that replays the game as it is read. Consecutive games start from a
//! fresh board; a `FEN` tag reinitializes it.
//!
//! Recovery policy: a lexical, syntax, or FEN error abandons the current
//! game and skips ahead to the next termination symbol so later games in the
//! same file still parse (`skipped` counts these). A SAN that resolves to
//! zero or several legal moves marks the game `truncated`: the moves so far
//! are kept and the rest of the game is discarded.

use crate::engine::board::Board;
use crate::engine::san;
use crate::engine::types::Move;
use crate::pgn::lexer::{Lexer, Token, TokenKind};
use crate::pgn::source::CharSource;
use crate::pgn::{GameResult, PgnError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

// =========================================================================
// ParsedGame & ParseStats
// =========================================================================

/// One fully assembled game record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParsedGame {
    /// Tag pairs in file order (last wins on duplicates).
    pub tags: HashMap<String, String>,
    /// The `FEN` tag value, when the game starts from a custom position.
    pub starting_fen: Option<String>,
    /// Concrete moves, SAN already resolved against the engine.
    pub moves: Vec<Move>,
    /// The termination symbol that closed the game.
    pub result: GameResult,
    /// True when an unresolvable SAN cut the move list short.
    pub truncated: bool,
}

/// Counters accumulated over one parsing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Games returned to the caller.
    pub games: u32,
    /// Games abandoned by error recovery.
    pub skipped: u32,
    /// Games returned with a truncated move list.
    pub truncated: u32,
}

// =========================================================================
// PgnParser
// =========================================================================

/// Streaming game parser over a borrowed `CharSource`.
pub struct PgnParser<'s> {
    lexer: Lexer<'s>,
    ignore_move_list_if_fen: bool,
    stats: ParseStats,
}

impl<'s> PgnParser<'s> {
    pub fn new(source: &'s mut CharSource) -> Self {
        PgnParser {
            lexer: Lexer::new(source),
            ignore_move_list_if_fen: false,
            stats: ParseStats::default(),
        }
    }

    /// Skip move replay for games carrying a `FEN` tag — callers that only
    /// want tags plus the position can save the engine work.
    pub fn ignore_move_list_if_fen(mut self, ignore: bool) -> Self {
        self.ignore_move_list_if_fen = ignore;
        self
    }

    /// Counters for the run so far.
    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Parse the next game, or `None` at end of input.
    ///
    /// Only I/O failures surface as errors; malformed games are recovered by
    /// skipping to the next termination symbol and counted in `stats`.
    pub fn next_game(&mut self) -> Result<Option<ParsedGame>, PgnError> {
        loop {
            match self.parse_one() {
                Ok(None) => return Ok(None),
                Ok(Some(game)) => {
                    self.stats.games += 1;
                    if game.truncated {
                        self.stats.truncated += 1;
                    }
                    debug!(
                        moves = game.moves.len(),
                        tags = game.tags.len(),
                        result = %game.result,
                        "parsed game"
                    );
                    // Old input is no longer needed once a game closes.
                    self.lexer.source_mut().flush_old_chunks();
                    return Ok(Some(game));
                }
                Err(PgnError::Io(err)) => return Err(err.into()),
                Err(err) => {
                    warn!(error = %err, "abandoning malformed game");
                    self.stats.skipped += 1;
                    self.skip_to_termination();
                }
            }
        }
    }

    // -------------------------------------------------------------------
    // Single-game assembly
    // -------------------------------------------------------------------

    fn parse_one(&mut self) -> Result<Option<ParsedGame>, PgnError> {
        let mut tags = HashMap::new();
        let mut starting_fen = None;

        // ----- Tag section -----
        loop {
            let token = self.lexer.get_token()?;
            match token.kind {
                TokenKind::Eof => {
                    if tags.is_empty() {
                        return Ok(None);
                    }
                    // A tag block cut off by EOF still closes as a game.
                    return Ok(Some(ParsedGame {
                        tags,
                        starting_fen,
                        ..ParsedGame::default()
                    }));
                }
                TokenKind::OpenBracket => {
                    let (name, value) = self.tag_pair()?;
                    if name == "FEN" {
                        starting_fen = Some(value.clone());
                    }
                    tags.insert(name, value);
                }
                _ => {
                    self.lexer.push_token(token);
                    break;
                }
            }
        }

        // ----- Board setup -----
        let mut board = match &starting_fen {
            Some(fen) => Board::from_fen(fen)?,
            None => Board::new(),
        };
        let replay = !(self.ignore_move_list_if_fen && starting_fen.is_some());

        // ----- Move section -----
        let mut moves: Vec<Move> = Vec::new();
        let mut result = GameResult::Ongoing;
        let mut truncated = false;
        loop {
            let token = self.lexer.get_token()?;
            match token.kind {
                TokenKind::Eof => break, // EOF closes the current game
                TokenKind::Termination(r) => {
                    result = r;
                    break;
                }
                // Move numbers and annotation glyphs carry no move content.
                TokenKind::Integer(_) | TokenKind::Dot | TokenKind::Nag(_) => {}
                // A new tag block without a termination: close this game and
                // let the next call re-read the bracket.
                TokenKind::OpenBracket => {
                    self.lexer.push_token(token);
                    break;
                }
                TokenKind::Symbol(ref san_text) => {
                    if !replay || truncated {
                        continue;
                    }
                    match san::find_move(&mut board, san_text) {
                        Ok(mv) => {
                            board.do_move(mv);
                            moves.push(mv);
                        }
                        Err(err) => {
                            warn!(
                                san = %san_text,
                                error = %err,
                                ply = moves.len() + 1,
                                "unresolvable move, truncating game"
                            );
                            truncated = true;
                        }
                    }
                }
                _ => return Err(self.unexpected(&token, "move text")),
            }
        }

        Ok(Some(ParsedGame {
            tags,
            starting_fen,
            moves,
            result,
            truncated,
        }))
    }

    /// Parse the `Symbol String ]` remainder of a tag pair.
    fn tag_pair(&mut self) -> Result<(String, String), PgnError> {
        let token = self.lexer.get_token()?;
        let name = match token.kind {
            TokenKind::Symbol(name) => name,
            _ => return Err(self.unexpected(&token, "tag name")),
        };

        let token = self.lexer.get_token()?;
        let value = match token.kind {
            TokenKind::String(value) => value,
            _ => return Err(self.unexpected(&token, "tag value")),
        };

        let token = self.lexer.get_token()?;
        if token.kind != TokenKind::CloseBracket {
            return Err(self.unexpected(&token, "']'"));
        }

        Ok((name, value))
    }

    /// Discard tokens up to and including the next termination symbol (or
    /// EOF). Lexical errors during the skip are swallowed; every one of them
    /// has already consumed at least one character, so the skip advances.
    fn skip_to_termination(&mut self) {
        loop {
            match self.lexer.get_token() {
                Ok(Token {
                    kind: TokenKind::Termination(_) | TokenKind::Eof,
                    ..
                }) => return,
                Ok(_) => {}
                Err(_) => {}
            }
        }
    }

    fn unexpected(&self, token: &Token, expected: &str) -> PgnError {
        let text = self.lexer.source().slice(token.start, token.len);
        PgnError::Syntax {
            offset: token.start,
            message: format!("expected {expected}, found '{text}'"),
        }
    }
}

// =========================================================================
// Convenience entry points
// =========================================================================

/// Parse every game from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<(Vec<ParsedGame>, ParseStats), PgnError> {
    let mut source = CharSource::new(reader)?;
    let mut parser = PgnParser::new(&mut source);
    let mut games = Vec::new();
    while let Some(game) = parser.next_game()? {
        games.push(game);
    }
    Ok((games, parser.stats()))
}

/// Parse every game from an in-memory string.
pub fn parse_str(text: &str) -> Result<(Vec<ParsedGame>, ParseStats), PgnError> {
    parse_reader(text.as_bytes())
}

// =========================================================================
// Tests
// =========================================================================
