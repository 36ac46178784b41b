//! String scanner used by the tag filter parser.

/// A position-tracked view into a string.
///
/// Positions and lengths are byte offsets relative to the cursor. Everything the parser looks
/// for is ASCII, so a byte offset always lands on a char boundary once it was produced by one of
/// the `find_*` methods.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    /// Byte position of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Character offset of the cursor, for error reporting.
    pub fn char_position(&self) -> usize {
        self.char_offset_of(self.pos)
    }

    /// Character offset of the byte position `pos + offset`.
    pub fn char_position_at(&self, offset: usize) -> usize {
        self.char_offset_of((self.pos + offset).min(self.input.len()))
    }

    fn char_offset_of(&self, byte_pos: usize) -> usize {
        self.input[..byte_pos].chars().count()
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Whether `pos + offset` lies at or beyond the end of the input.
    pub fn is_at_end_after(&self, offset: usize) -> bool {
        self.pos + offset >= self.input.len()
    }

    pub fn next_is(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    pub fn next_is_char(&self, c: char) -> bool {
        self.rest().starts_with(c)
    }

    pub fn next_is_and_advance(&mut self, literal: &str) -> bool {
        if self.next_is(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Byte at `offset` from the cursor.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `len` bytes and returns them.
    pub fn advance_by(&mut self, len: usize) -> &'a str {
        let end = (self.pos + len).min(self.input.len());
        let consumed = &self.input[self.pos..end];
        self.pos = end;
        consumed
    }

    pub fn retreat_by(&mut self, len: usize) {
        self.pos = self.pos.saturating_sub(len);
    }

    /// Offset of the next occurrence of `literal` at or after `from`, or the remaining length
    /// if there is none.
    pub fn find_next(&self, literal: &str, from: usize) -> usize {
        let rest = self.rest();
        if from > rest.len() {
            return rest.len();
        }
        rest[from..]
            .find(literal)
            .map_or(rest.len(), |idx| idx + from)
    }

    /// Offset of the next whitespace character, or the remaining length.
    pub fn find_next_whitespace(&self) -> usize {
        let rest = self.rest();
        rest.char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map_or(rest.len(), |(idx, _)| idx)
    }

    /// Consumes any whitespace and returns how many bytes were skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
        skipped
    }
}
