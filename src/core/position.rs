//! Line/column tracking over decoded text

use memchr::memchr2;

/// A 1-based line and column, columns counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u64,
    pub column: u64,
    /// Last character seen was a CR, so a leading LF belongs to it
    after_cr: bool,
}

impl Position {
    /// Line 1, column 1
    pub const fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            after_cr: false,
        }
    }

    /// Move past `text`. CRLF, lone CR and LF each end one line.
    pub fn advance(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let mut pos = 0;

        if self.after_cr && bytes.first() == Some(&b'\n') {
            pos = 1;
        }
        if !bytes.is_empty() {
            self.after_cr = false;
        }

        while let Some(i) = memchr2(b'\n', b'\r', &bytes[pos..]) {
            let at = pos + i;
            self.line += 1;
            self.column = 1;
            pos = at + 1;
            if bytes[at] == b'\r' {
                match bytes.get(pos) {
                    Some(b'\n') => pos += 1,
                    Some(_) => {}
                    None => self.after_cr = true,
                }
            }
        }
        self.column += count_chars(&text[pos..]);
    }

    /// Position reached after `text`, starting from here
    pub fn advanced(mut self, text: &str) -> Self {
        self.advance(text);
        self
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

#[inline]
fn count_chars(text: &str) -> u64 {
    // Count UTF-8 lead bytes
    text.as_bytes().iter().filter(|&&b| (b & 0xC0) != 0x80).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_count_characters() {
        let pos = Position::start().advanced("<é>");
        assert_eq!((pos.line, pos.column), (1, 4));
    }

    #[test]
    fn test_line_endings() {
        let pos = Position::start().advanced("a\nb\r\nc\rd");
        assert_eq!((pos.line, pos.column), (4, 2));
    }

    #[test]
    fn test_crlf_split_across_calls() {
        let mut pos = Position::start();
        pos.advance("a\r");
        pos.advance("\nb");
        assert_eq!((pos.line, pos.column), (2, 2));
    }
}
