//! Chunked, windowed character source for the PGN lexer.
//!
//! The whole input is read eagerly into fixed-size chunks so the parser can
//! refer back to any retained byte range (e.g. to quote context in an
//! error). Chunks older than the previous one may be flushed to cap memory
//! on very large inputs; a `slice` into a flushed region yields an empty
//! string. The reader hands out one byte at a time with single-byte
//! push-back and tracks the start-of-line flag that gates escape lines.

use std::io::{self, Read};

/// Fixed chunk size: 1 MiB.
pub const CHUNK_SIZE: usize = 1 << 20;

/// Returned by `slice` for zero-length requests.
pub const EMPTY_SLICE: &str = "<empty>";

/// The end-of-input sentinel byte.
pub const EOF_CHAR: u8 = 0;

/// Windowed random-access reader over a byte stream.
pub struct CharSource {
    /// Filled chunks; flushed ones become `None`.
    chunks: Vec<Option<Box<[u8]>>>,
    chunk_size: usize,
    /// Total input length in bytes.
    total_len: u64,
    /// Absolute offset of the next unread byte.
    pos: u64,
    /// Guard for the single-byte push-back contract.
    pushed_back: bool,
    /// True when the next byte starts a line (see `get`).
    first_in_line: bool,
}

impl CharSource {
    /// Read the entire stream into chunks. A UTF-8 byte-order mark at the
    /// very start is skipped. An empty input yields a single empty chunk.
    pub fn new<R: Read>(reader: R) -> io::Result<Self> {
        Self::with_chunk_size(reader, CHUNK_SIZE)
    }

    pub(crate) fn with_chunk_size<R: Read>(mut reader: R, chunk_size: usize) -> io::Result<Self> {
        assert!(chunk_size > 0);
        let mut chunks = Vec::new();
        let mut total_len = 0u64;

        loop {
            let mut chunk = vec![0u8; chunk_size];
            let mut filled = 0;
            // Fill the chunk until it is full or the stream ends.
            while filled < chunk_size {
                let n = reader.read(&mut chunk[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            chunk.truncate(filled);
            total_len += filled as u64;
            let done = filled < chunk_size;
            if filled > 0 || chunks.is_empty() {
                chunks.push(Some(chunk.into_boxed_slice()));
            }
            if done {
                break;
            }
        }

        let mut source = CharSource {
            chunks,
            chunk_size,
            total_len,
            pos: 0,
            pushed_back: false,
            first_in_line: true,
        };

        // Tolerate a UTF-8 byte-order mark.
        if source.byte_at(0) == 0xEF && source.byte_at(1) == 0xBB && source.byte_at(2) == 0xBF {
            source.pos = 3;
        }

        Ok(source)
    }

    /// Absolute offset of the next unread byte.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Whether the next byte to be consumed starts a line. True at the start
    /// of input and immediately after `\r`; a `\n` leaves it unchanged; any
    /// other consumed byte clears it.
    #[inline]
    pub fn is_first_in_line(&self) -> bool {
        self.first_in_line
    }

    /// The next byte without consuming it (`EOF_CHAR` at end of input).
    #[inline]
    pub fn peek(&self) -> u8 {
        self.byte_at(self.pos)
    }

    /// Consume and return one byte (`EOF_CHAR` at end of input).
    pub fn get(&mut self) -> u8 {
        self.pushed_back = false;
        let c = self.byte_at(self.pos);
        if c == EOF_CHAR && self.pos >= self.total_len {
            return EOF_CHAR;
        }
        self.pos += 1;
        match c {
            b'\r' => self.first_in_line = true,
            b'\n' => {}
            _ => self.first_in_line = false,
        }
        c
    }

    /// Un-consume the most recent byte. At most ONE byte may be pushed back
    /// before the next `get`; a second push is a programmer error.
    pub fn push_back(&mut self) {
        assert!(!self.pushed_back, "push_back called twice without a get");
        assert!(self.pos > 0, "push_back before the first byte");
        self.pushed_back = true;
        self.pos -= 1;
    }

    /// The characters at `[start, start + length)`, crossing at most one
    /// chunk boundary. Zero-length requests yield the `"<empty>"` sentinel;
    /// requests into flushed chunks yield an empty string.
    pub fn slice(&self, start: u64, length: usize) -> String {
        if length == 0 {
            return EMPTY_SLICE.to_string();
        }
        debug_assert!(length <= self.chunk_size, "slice longer than a chunk");

        let end = (start + length as u64).min(self.total_len);
        let mut bytes = Vec::with_capacity(length);
        for offset in start..end {
            let chunk = (offset / self.chunk_size as u64) as usize;
            match self.chunks.get(chunk) {
                Some(Some(data)) => bytes.push(data[(offset % self.chunk_size as u64) as usize]),
                _ => return String::new(), // flushed or out of range
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Free every chunk preceding the one before the current read position.
    /// Afterwards, `slice` must not be asked for ranges older than the
    /// retention window.
    pub fn flush_old_chunks(&mut self) {
        let current = (self.pos / self.chunk_size as u64) as usize;
        for chunk in self.chunks.iter_mut().take(current.saturating_sub(1)) {
            *chunk = None;
        }
    }

    fn byte_at(&self, offset: u64) -> u8 {
        if offset >= self.total_len {
            return EOF_CHAR;
        }
        let chunk = (offset / self.chunk_size as u64) as usize;
        let data = self.chunks[chunk]
            .as_ref()
            .expect("read into a flushed chunk");
        data[(offset % self.chunk_size as u64) as usize]
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> CharSource {
        CharSource::new(text.as_bytes()).unwrap()
    }

    // -------------------------------------------------------------------
    // Basic reading
    // -------------------------------------------------------------------

    #[test]
    fn empty_input_is_one_empty_chunk() {
        let src = source("");
        assert_eq!(src.chunks.len(), 1);
        assert_eq!(src.peek(), EOF_CHAR);
        assert_eq!(src.pos(), 0);
    }

    #[test]
    fn get_and_peek() {
        let mut src = source("ab");
        assert_eq!(src.peek(), b'a');
        assert_eq!(src.get(), b'a');
        assert_eq!(src.pos(), 1);
        assert_eq!(src.get(), b'b');
        assert_eq!(src.get(), EOF_CHAR);
        assert_eq!(src.get(), EOF_CHAR); // stays at EOF
        assert_eq!(src.pos(), 2);
    }

    #[test]
    fn input_spanning_chunks() {
        let text = "abcdefghij";
        let mut src = CharSource::with_chunk_size(text.as_bytes(), 4).unwrap();
        assert_eq!(src.chunks.len(), 3);
        let collected: String = std::iter::from_fn(|| {
            let c = src.get();
            (c != EOF_CHAR).then_some(c as char)
        })
        .collect();
        assert_eq!(collected, text);
    }

    // -------------------------------------------------------------------
    // Push-back
    // -------------------------------------------------------------------

    #[test]
    fn push_back_replays_byte() {
        let mut src = source("xy");
        assert_eq!(src.get(), b'x');
        src.push_back();
        assert_eq!(src.get(), b'x');
        assert_eq!(src.get(), b'y');
    }

    #[test]
    #[should_panic(expected = "push_back called twice")]
    fn double_push_back_panics() {
        let mut src = source("xy");
        src.get();
        src.get();
        src.push_back();
        src.push_back();
    }

    // -------------------------------------------------------------------
    // Start-of-line flag
    // -------------------------------------------------------------------

    #[test]
    fn first_in_line_at_start() {
        let src = source("abc");
        assert!(src.is_first_in_line());
    }

    #[test]
    fn first_in_line_follows_carriage_return() {
        let mut src = source("a\r\nb");
        src.get(); // 'a'
        assert!(!src.is_first_in_line());
        src.get(); // '\r'
        assert!(src.is_first_in_line());
        src.get(); // '\n' leaves the flag untouched
        assert!(src.is_first_in_line());
        src.get(); // 'b'
        assert!(!src.is_first_in_line());
    }

    #[test]
    fn bare_newline_does_not_set_flag() {
        let mut src = source("a\nb");
        src.get(); // 'a'
        src.get(); // '\n' — flag stays false
        assert!(!src.is_first_in_line());
    }

    // -------------------------------------------------------------------
    // Slices
    // -------------------------------------------------------------------

    #[test]
    fn slice_within_chunk() {
        let src = source("hello world");
        assert_eq!(src.slice(6, 5), "world");
    }

    #[test]
    fn slice_across_chunk_boundary() {
        let src = CharSource::with_chunk_size("abcdefgh".as_bytes(), 4).unwrap();
        assert_eq!(src.slice(2, 4), "cdef");
    }

    #[test]
    fn slice_zero_length_sentinel() {
        let src = source("abc");
        assert_eq!(src.slice(0, 0), EMPTY_SLICE);
    }

    #[test]
    fn slice_clamped_at_eof() {
        let src = source("abc");
        assert_eq!(src.slice(1, 100), "bc");
    }

    // -------------------------------------------------------------------
    // Flushing
    // -------------------------------------------------------------------

    #[test]
    fn flush_keeps_recent_window() {
        let mut src = CharSource::with_chunk_size("abcdefghijkl".as_bytes(), 4).unwrap();
        // Read into the third chunk (offset 9).
        for _ in 0..9 {
            src.get();
        }
        src.flush_old_chunks();
        // Chunk 0 is gone, chunks 1 and 2 remain.
        assert_eq!(src.slice(0, 2), "");
        assert_eq!(src.slice(4, 2), "ef");
        assert_eq!(src.slice(8, 2), "ij");
    }

    // -------------------------------------------------------------------
    // Byte-order mark
    // -------------------------------------------------------------------

    #[test]
    fn utf8_bom_is_skipped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"abc");
        let mut src = CharSource::new(bytes.as_slice()).unwrap();
        assert_eq!(src.get(), b'a');
    }
}
