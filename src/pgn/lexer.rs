//! Token recognition over a `CharSource`.
//!
//! The lexer produces tokens on demand and supports one pushed-back token.
//! Brace comments, parenthesized variations (nested), and comment lines are
//! consumed below the token layer — the parser never sees them. A run of
//! dots collapses into a single `Dot` token so `1.` and `1...` scan alike.

use crate::pgn::source::{CharSource, EOF_CHAR};
use crate::pgn::{GameResult, PgnError};

// =========================================================================
// Token
// =========================================================================

/// Token categories with their decoded payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// An unsigned number (move numbers, mostly).
    Integer(u32),
    /// A quoted string with escapes resolved.
    String(String),
    /// A SAN move or tag name.
    Symbol(String),
    /// One or more consecutive dots.
    Dot,
    /// Numeric Annotation Glyph (`$7`).
    Nag(u16),
    OpenBracket,
    CloseBracket,
    /// One of `1-0`, `0-1`, `1/2-1/2`, `*`.
    Termination(GameResult),
    /// A token starting with a stray dash.
    Unknown(String),
    Eof,
}

/// A token plus the byte range it was scanned from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Absolute byte offset of the first character.
    pub start: u64,
    /// Scanned length in bytes.
    pub len: usize,
}

// =========================================================================
// Lexer
// =========================================================================

/// Tokenizer over a borrowed `CharSource` (never owned, so the parser can
/// keep slicing the raw input for error context).
pub struct Lexer<'s> {
    src: &'s mut CharSource,
    pushed: Option<Token>,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s mut CharSource) -> Self {
        Lexer { src, pushed: None }
    }

    /// The underlying source, for slicing and offset queries.
    pub fn source(&self) -> &CharSource {
        self.src
    }

    pub fn source_mut(&mut self) -> &mut CharSource {
        self.src
    }

    /// Store a token for replay. At most one token may be pushed back before
    /// the next `get_token`; a second push is a programmer error.
    pub fn push_token(&mut self, token: Token) {
        assert!(
            self.pushed.is_none(),
            "push_token called twice without a get_token"
        );
        self.pushed = Some(token);
    }

    /// Produce the next token.
    pub fn get_token(&mut self) -> Result<Token, PgnError> {
        if let Some(token) = self.pushed.take() {
            return Ok(token);
        }

        loop {
            self.skip_filler();
            let start = self.src.pos();
            let c = self.src.get();
            let kind = match c {
                EOF_CHAR => TokenKind::Eof,
                b'"' => self.string_token(start)?,
                b'.' => {
                    while self.src.peek() == b'.' {
                        self.src.get();
                    }
                    TokenKind::Dot
                }
                b'$' => self.nag_token(start)?,
                b'[' => TokenKind::OpenBracket,
                b']' => TokenKind::CloseBracket,
                b'{' => {
                    self.skip_brace_comment(start)?;
                    continue;
                }
                b'(' => {
                    self.skip_variation(start)?;
                    continue;
                }
                b'*' => TokenKind::Termination(GameResult::Ongoing),
                b'-' => {
                    let text = self.symbol_text(c);
                    TokenKind::Unknown(text)
                }
                c if c.is_ascii_alphanumeric() => self.symbol_token(c, start)?,
                other => {
                    return Err(PgnError::Lexical {
                        offset: start,
                        message: format!("unexpected character '{}'", other as char),
                    });
                }
            };
            let len = (self.src.pos() - start) as usize;
            return Ok(Token { kind, start, len });
        }
    }

    // -------------------------------------------------------------------
    // Filler: whitespace and comment lines
    // -------------------------------------------------------------------

    /// Skip whitespace, `;` comments (to end of line), and `%` escape lines
    /// (only when the `%` starts a line). Handled between tokens, so neither
    /// can fire inside a quoted string.
    fn skip_filler(&mut self) {
        loop {
            match self.src.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.src.get();
                }
                b';' => self.skip_line(),
                b'%' if self.src.is_first_in_line() => self.skip_line(),
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        loop {
            let c = self.src.get();
            if c == EOF_CHAR || c == b'\n' {
                return;
            }
        }
    }

    // -------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------

    /// Scan a quoted string. `\"` unescapes to `"`; any other `\x` yields the
    /// literal `x`. A bare carriage return or EOF inside the string is an
    /// error.
    fn string_token(&mut self, start: u64) -> Result<TokenKind, PgnError> {
        let mut bytes = Vec::new();
        loop {
            match self.src.get() {
                EOF_CHAR => {
                    return Err(PgnError::Lexical {
                        offset: start,
                        message: "unterminated string".into(),
                    });
                }
                b'\r' => {
                    return Err(PgnError::Lexical {
                        offset: start,
                        message: "no newline allowed inside string".into(),
                    });
                }
                b'"' => break,
                b'\\' => match self.src.get() {
                    EOF_CHAR => {
                        return Err(PgnError::Lexical {
                            offset: start,
                            message: "unterminated string".into(),
                        });
                    }
                    escaped => bytes.push(escaped),
                },
                c => bytes.push(c),
            }
        }
        Ok(TokenKind::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }

    // -------------------------------------------------------------------
    // NAGs
    // -------------------------------------------------------------------

    fn nag_token(&mut self, start: u64) -> Result<TokenKind, PgnError> {
        let mut digits = String::new();
        while self.src.peek().is_ascii_digit() {
            digits.push(self.src.get() as char);
        }
        let value = digits.parse().map_err(|_| PgnError::Lexical {
            offset: start,
            message: if digits.is_empty() {
                "invalid NAG: expected digits after '$'".into()
            } else {
                format!("invalid NAG value '{digits}'")
            },
        })?;
        Ok(TokenKind::Nag(value))
    }

    // -------------------------------------------------------------------
    // Symbols
    // -------------------------------------------------------------------

    /// Consume the symbol continuation after `first` and classify the result:
    /// all digits ⇒ Integer, a termination literal ⇒ Termination, any other
    /// symbol containing `/` is an error, otherwise Symbol.
    fn symbol_token(&mut self, first: u8, start: u64) -> Result<TokenKind, PgnError> {
        let text = self.symbol_text(first);
        let all_digits = text.bytes().all(|b| b.is_ascii_digit());

        if all_digits {
            let value = text.parse().map_err(|_| PgnError::Lexical {
                offset: start,
                message: format!("integer out of range: '{text}'"),
            })?;
            return Ok(TokenKind::Integer(value));
        }
        if let Some(result) = GameResult::from_token(&text) {
            return Ok(TokenKind::Termination(result));
        }
        if text.contains('/') {
            return Err(PgnError::Lexical {
                offset: start,
                message: format!("unexpected '/' in symbol '{text}'"),
            });
        }
        Ok(TokenKind::Symbol(text))
    }

    /// The raw symbol continuation: alphanumerics plus `_ + # = : - /`.
    fn symbol_text(&mut self, first: u8) -> String {
        let mut text = String::new();
        text.push(first as char);
        loop {
            let c = self.src.peek();
            if c.is_ascii_alphanumeric()
                || matches!(c, b'_' | b'+' | b'#' | b'=' | b':' | b'-' | b'/')
            {
                self.src.get();
                text.push(c as char);
            } else {
                return text;
            }
        }
    }

    // -------------------------------------------------------------------
    // Comments and variations
    // -------------------------------------------------------------------

    /// Consume a `{...}` comment (no nesting; the first `}` ends it).
    fn skip_brace_comment(&mut self, start: u64) -> Result<(), PgnError> {
        loop {
            match self.src.get() {
                EOF_CHAR => {
                    return Err(PgnError::Lexical {
                        offset: start,
                        message: "unterminated comment".into(),
                    });
                }
                b'}' => return Ok(()),
                _ => {}
            }
        }
    }

    /// Consume a `(...)` variation, tracking nesting depth and skipping any
    /// `{...}` comments inside (a parenthesis inside a comment must not
    /// count toward the balance).
    fn skip_variation(&mut self, start: u64) -> Result<(), PgnError> {
        let mut depth = 1u32;
        loop {
            match self.src.get() {
                EOF_CHAR => {
                    return Err(PgnError::Lexical {
                        offset: start,
                        message: "unterminated variation".into(),
                    });
                }
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'{' => self.skip_brace_comment(start)?,
                _ => {}
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
