//! SIMD-accelerated XML scanning using memchr
//!
//! Uses memchr crate for fast byte searching with SIMD acceleration:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)
//!
//! The scanner works over a buffer that may end in the middle of a token.
//! Lookahead helpers therefore distinguish "does not match" from "cannot
//! tell yet" so the tokenizer can wait for the next chunk.

use memchr::{memchr, memmem};

/// Result of comparing the remaining input against a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// The literal is fully present at the current position
    Match,
    /// The input diverges from the literal
    Mismatch,
    /// The input ends while still agreeing with the literal
    Partial,
}

/// Scanner for XML delimiter detection
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned at `pos`
    #[inline]
    pub fn at(input: &'a [u8], pos: usize) -> Self {
        Scanner { input, pos }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace characters, returning how many were skipped
    #[inline]
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Compare the input at the current position against `literal`
    pub fn prefix(&self, literal: &[u8]) -> Prefix {
        let rest = &self.input[self.pos.min(self.input.len())..];
        if rest.len() >= literal.len() {
            if rest.starts_with(literal) {
                Prefix::Match
            } else {
                Prefix::Mismatch
            }
        } else if literal.starts_with(rest) {
            Prefix::Partial
        } else {
            Prefix::Mismatch
        }
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find the next occurrence of a multi-byte literal
    #[inline]
    pub fn find_seq(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Find tag end while handling quotes properly
    ///
    /// Returns `Ok(Some(pos))` for the first `>` outside quotes, `Ok(None)`
    /// when the buffer ends first, and `Err(pos)` on a `<` that can only be
    /// a syntax error (tags never contain one, quoted or not).
    pub fn find_tag_end_quoted(&self) -> Result<Option<usize>, usize> {
        let mut pos = self.pos;
        let mut quote: Option<u8> = None;

        while pos < self.input.len() {
            let b = self.input[pos];
            match (quote, b) {
                (_, b'<') => return Err(pos),
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (Some(q), _) if q == b => quote = None,
                (None, b'>') => return Ok(Some(pos)),
                _ => {}
            }
            pos += 1;
        }
        Ok(None)
    }

    /// Read an XML name, returning its byte range
    pub fn read_name(&mut self) -> Option<(usize, usize)> {
        let start = self.pos;
        let first = *self.input.get(start)?;
        if !is_name_start_char(first) {
            return None;
        }
        self.pos += 1;

        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }

        Some((start, self.pos))
    }
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
/// Allows ASCII alphanumeric, punctuation, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

/// XML `S` production
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if a string is a complete XML name
pub fn is_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.split_first() {
        Some((&first, rest)) => is_name_start_char(first) && rest.iter().all(|&b| is_name_char(b)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_states() {
        let scanner = Scanner::at(b"<!-", 0);
        assert_eq!(scanner.prefix(b"<!--"), Prefix::Partial);
        assert_eq!(scanner.prefix(b"<![CDATA["), Prefix::Mismatch);

        let scanner = Scanner::at(b"<!-- x -->", 0);
        assert_eq!(scanner.prefix(b"<!--"), Prefix::Match);
    }

    #[test]
    fn test_find_tag_end_quoted() {
        let scanner = Scanner::at(b"<a attr=\">test\">content", 1);
        assert_eq!(scanner.find_tag_end_quoted(), Ok(Some(15)));
    }

    #[test]
    fn test_find_tag_end_needs_more() {
        let scanner = Scanner::at(b"<a attr=\"x", 1);
        assert_eq!(scanner.find_tag_end_quoted(), Ok(None));
    }

    #[test]
    fn test_find_tag_end_rejects_lt() {
        let scanner = Scanner::at(b"<a x=\"<\">", 1);
        assert_eq!(scanner.find_tag_end_quoted(), Err(6));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::at(b"element-name>", 0);
        assert_eq!(scanner.read_name(), Some((0, 12)));
        assert_eq!(scanner.position(), 12);
    }

    #[test]
    fn test_skip_whitespace() {
        let mut scanner = Scanner::at(b"  \t\n hello", 0);
        assert_eq!(scanner.skip_whitespace(), 5);
        assert_eq!(scanner.position(), 5);
    }

    #[test]
    fn test_is_name() {
        assert!(is_name("svg:rect"));
        assert!(is_name("_x1"));
        assert!(!is_name("1x"));
        assert!(!is_name(""));
    }
}
