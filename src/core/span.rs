//! Span - offset and length into the tokenizer buffer
//!
//! Zero-copy reference to a portion of decoded input. Used for element
//! names, attribute names/values, and text content while a token is live.

/// A span referencing a portion of a decoded text buffer.
///
/// Spans always start and end next to an ASCII delimiter (or at a buffer
/// edge), so slicing a `str` with one never splits a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the buffer
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Create a span covering `start..end`
    #[inline]
    pub fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u32, end.saturating_sub(start) as u32)
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    /// Extract the text this span covers; out-of-range spans yield ""
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        let start = self.offset as usize;
        let end = self.end() as usize;
        input.get(start..end).unwrap_or("")
    }
}
