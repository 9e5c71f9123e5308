//! Ordered record of completed moves with an undo/redo cursor.
//!
//! `MovePosStack` is an external record: navigating the cursor backward and
//! forward never touches a board. Pushing a move while the cursor sits before
//! the tail discards the redo branch, like any editor history.
//!
//! Two persistence shapes are provided for outside collaborators: an XML
//! `MoveList` element and a little-endian binary form (move count, cursor,
//! then four bytes `{piece, start, end, type}` per move).

use crate::engine::types::{ChessError, Move, Piece, Square};
use std::io::{self, Read, Write};

// =========================================================================
// MovePosStack
// =========================================================================

/// Completed moves plus a cursor into them (-1 = before the first move).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovePosStack {
    moves: Vec<Move>,
    cursor: isize,
}

impl MovePosStack {
    pub fn new() -> Self {
        MovePosStack {
            moves: Vec::new(),
            cursor: -1,
        }
    }

    /// Record a move at the cursor. Any redo tail beyond the cursor is
    /// discarded first.
    pub fn push(&mut self, mv: Move) {
        self.moves.truncate((self.cursor + 1) as usize);
        self.moves.push(mv);
        self.cursor = self.moves.len() as isize - 1;
    }

    /// Step the cursor back, returning the move that was backed over.
    pub fn move_back(&mut self) -> Option<Move> {
        if self.cursor < 0 {
            return None;
        }
        let mv = self.moves[self.cursor as usize];
        self.cursor -= 1;
        Some(mv)
    }

    /// Step the cursor forward, returning the move stepped onto.
    pub fn move_forward(&mut self) -> Option<Move> {
        if self.cursor + 1 >= self.moves.len() as isize {
            return None;
        }
        self.cursor += 1;
        Some(self.moves[self.cursor as usize])
    }

    /// The move under the cursor.
    pub fn current(&self) -> Option<&Move> {
        if self.cursor < 0 {
            None
        } else {
            self.moves.get(self.cursor as usize)
        }
    }

    /// Cursor position (-1 when before the first move).
    #[inline]
    pub fn position_in_list(&self) -> isize {
        self.cursor
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// All recorded moves, redo tail included.
    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }

    // -------------------------------------------------------------------
    // XML persistence
    // -------------------------------------------------------------------

    /// Serialize as a `MoveList` XML element.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(64 + self.moves.len() * 80);
        xml.push_str(&format!(
            "<MoveList PositionInList=\"{}\">\n",
            self.cursor
        ));
        for mv in &self.moves {
            xml.push_str(&format!(
                "  <Move OriginalPiece=\"{}\" StartingPosition=\"{}\" \
                 EndingPosition=\"{}\" MoveType=\"{}\"/>\n",
                mv.piece.code(),
                mv.from.0,
                mv.to.0,
                mv.type_code(),
            ));
        }
        xml.push_str("</MoveList>\n");
        xml
    }

    /// Parse the `MoveList` XML element written by `to_xml`.
    pub fn from_xml(xml: &str) -> Result<Self, ChessError> {
        let malformed = |msg: &str| ChessError::MalformedMoveList(msg.to_string());

        let list_tag = xml
            .find("<MoveList")
            .ok_or_else(|| malformed("missing MoveList element"))?;
        let cursor: isize = xml_attr(&xml[list_tag..], "PositionInList")
            .ok_or_else(|| malformed("missing PositionInList attribute"))?
            .parse()
            .map_err(|_| malformed("invalid PositionInList attribute"))?;

        let mut moves = Vec::new();
        let mut rest = &xml[list_tag..];
        while let Some(pos) = rest.find("<Move ") {
            let tag = &rest[pos..];
            let end = tag
                .find("/>")
                .ok_or_else(|| malformed("unterminated Move element"))?;
            let tag = &tag[..end];

            let number = |name: &str| -> Result<u8, ChessError> {
                xml_attr(tag, name)
                    .ok_or_else(|| malformed(&format!("missing {name} attribute")))?
                    .parse()
                    .map_err(|_| malformed(&format!("invalid {name} attribute")))
            };

            moves.push(decode_move(
                number("OriginalPiece")?,
                number("StartingPosition")?,
                number("EndingPosition")?,
                number("MoveType")?,
            )?);
            rest = &rest[pos + end..];
        }

        if cursor < -1 || cursor >= moves.len() as isize {
            return Err(malformed("cursor out of range"));
        }
        Ok(MovePosStack { moves, cursor })
    }

    // -------------------------------------------------------------------
    // Binary persistence
    // -------------------------------------------------------------------

    /// Write the little-endian binary form: u32 move count, i32 cursor, then
    /// `{piece, start, end, type}` per move.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&(self.moves.len() as u32).to_le_bytes())?;
        writer.write_all(&(self.cursor as i32).to_le_bytes())?;
        for mv in &self.moves {
            writer.write_all(&[mv.piece.code(), mv.from.0, mv.to.0, mv.type_code()])?;
        }
        Ok(())
    }

    /// Read the binary form written by `write_to`.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let bad = |msg: &str| io::Error::new(io::ErrorKind::InvalidData, msg.to_string());

        let mut word = [0u8; 4];
        reader.read_exact(&mut word)?;
        let count = u32::from_le_bytes(word) as usize;
        reader.read_exact(&mut word)?;
        let cursor = i32::from_le_bytes(word) as isize;

        let mut moves = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            let mut raw = [0u8; 4];
            reader.read_exact(&mut raw)?;
            moves.push(
                decode_move(raw[0], raw[1], raw[2], raw[3])
                    .map_err(|e| bad(&e.to_string()))?,
            );
        }

        if cursor < -1 || cursor >= count as isize {
            return Err(bad("cursor out of range"));
        }
        Ok(MovePosStack { moves, cursor })
    }
}

// -------------------------------------------------------------------------
// Decoding helpers
// -------------------------------------------------------------------------

/// Extract a `name="value"` attribute from an XML tag slice.
fn xml_attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!("{name}=\"");
    let start = tag.find(&pattern)? + pattern.len();
    let end = tag[start..].find('"')?;
    Some(&tag[start..start + end])
}

fn decode_move(piece: u8, start: u8, end: u8, type_code: u8) -> Result<Move, ChessError> {
    let malformed = |msg: String| ChessError::MalformedMoveList(msg);

    let piece = Piece::from_code(piece)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| malformed(format!("invalid piece code {piece}")))?;
    if start > 63 || end > 63 {
        return Err(malformed(format!("square out of range: {start}-{end}")));
    }
    let (kind, flags) = Move::split_type_code(type_code)
        .ok_or_else(|| malformed(format!("invalid move type {type_code}")))?;
    Ok(Move::new(Square(start), Square(end), kind, flags, piece))
}

// =========================================================================
// Tests
// =========================================================================
