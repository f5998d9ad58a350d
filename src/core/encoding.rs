//! XML Encoding Detection and Conversion
//!
//! Handles detection of UTF-16 and declared single-byte encodings based on
//! BOM and XML declaration, and converts everything to UTF-8 for the
//! tokenizer. Conversion is incremental: bytes of a character split across
//! two chunks are carried over to the next call.

use memchr::{memchr, memmem};

use super::error::SyntaxErrorCode;

/// Longest prefix inspected for an XML declaration before giving up on it
const MAX_SNIFF: usize = 1024;

/// Detected document encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEncoding {
    Utf8,
    /// Declared US-ASCII: any byte above 0x7F is an error
    Ascii,
    Utf16Le,
    Utf16Be,
    Latin1,
}

impl XmlEncoding {
    /// Detect encoding from byte order mark or initial bytes.
    ///
    /// Returns the encoding and the number of BOM bytes to skip.
    pub fn detect(input: &[u8]) -> (Self, usize) {
        match input {
            [0xEF, 0xBB, 0xBF, ..] => (XmlEncoding::Utf8, 3),
            [0xFF, 0xFE, ..] => (XmlEncoding::Utf16Le, 2),
            [0xFE, 0xFF, ..] => (XmlEncoding::Utf16Be, 2),
            // No BOM - check for UTF-16 pattern (< followed by null or null followed by <)
            [0x00, b'<', ..] => (XmlEncoding::Utf16Be, 0),
            [b'<', 0x00, ..] => (XmlEncoding::Utf16Le, 0),
            _ => (XmlEncoding::Utf8, 0),
        }
    }

    /// Map an encoding label from an XML declaration
    pub fn from_label(label: &[u8]) -> Option<Self> {
        let label = std::str::from_utf8(label).ok()?.to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Some(XmlEncoding::Utf8),
            "us-ascii" | "ascii" => Some(XmlEncoding::Ascii),
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" => {
                Some(XmlEncoding::Latin1)
            }
            "utf-16" | "utf-16le" | "utf-16be" => Some(XmlEncoding::Utf16Le),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Mode {
    /// Collecting the first bytes until the encoding can be decided
    Sniffing(Vec<u8>),
    Decoding(XmlEncoding),
}

/// Incremental byte-to-UTF-8 decoder
#[derive(Debug)]
pub struct Decoder {
    mode: Mode,
    /// Bytes of an incomplete character from the previous chunk
    carry: Vec<u8>,
    /// UTF-16 high surrogate waiting for its partner
    pending_high: Option<u16>,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            mode: Mode::Sniffing(Vec::with_capacity(64)),
            carry: Vec::with_capacity(4),
            pending_high: None,
        }
    }

    /// The encoding in use, once decided
    pub fn encoding(&self) -> Option<XmlEncoding> {
        match self.mode {
            Mode::Decoding(encoding) => Some(encoding),
            Mode::Sniffing(_) => None,
        }
    }

    /// Decode a chunk, appending UTF-8 text to `out`
    pub fn decode(&mut self, input: &[u8], out: &mut String) -> Result<(), SyntaxErrorCode> {
        match &mut self.mode {
            Mode::Decoding(encoding) => {
                let encoding = *encoding;
                self.push(encoding, input, out)
            }
            Mode::Sniffing(head) => {
                head.extend_from_slice(input);
                match sniff(head, false)? {
                    Some(decided) => self.start(decided, out),
                    None => Ok(()),
                }
            }
        }
    }

    /// Flush at end of input; a truncated character is an error
    pub fn finish(&mut self, out: &mut String) -> Result<(), SyntaxErrorCode> {
        if let Mode::Sniffing(head) = &self.mode {
            if let Some(decided) = sniff(head, true)? {
                self.start(decided, out)?;
            }
        }
        if !self.carry.is_empty() || self.pending_high.is_some() {
            return Err(SyntaxErrorCode::InvalidEncoding);
        }
        Ok(())
    }

    fn start(&mut self, (encoding, skip): (XmlEncoding, usize), out: &mut String) -> Result<(), SyntaxErrorCode> {
        let head = match std::mem::replace(&mut self.mode, Mode::Decoding(encoding)) {
            Mode::Sniffing(head) => head,
            Mode::Decoding(_) => Vec::new(),
        };
        log::trace!("document encoding {:?}", encoding);
        self.push(encoding, head.get(skip..).unwrap_or(&[]), out)
    }

    fn push(&mut self, encoding: XmlEncoding, input: &[u8], out: &mut String) -> Result<(), SyntaxErrorCode> {
        match encoding {
            XmlEncoding::Utf8 => self.push_utf8(input, out),
            XmlEncoding::Ascii => {
                let valid = input.iter().position(|b| !b.is_ascii()).unwrap_or(input.len());
                out.extend(input[..valid].iter().map(|&b| b as char));
                if valid < input.len() {
                    return Err(SyntaxErrorCode::InvalidEncoding);
                }
                Ok(())
            }
            XmlEncoding::Latin1 => {
                out.extend(input.iter().map(|&b| b as char));
                Ok(())
            }
            XmlEncoding::Utf16Le => self.push_utf16(input, out, u16::from_le_bytes),
            XmlEncoding::Utf16Be => self.push_utf16(input, out, u16::from_be_bytes),
        }
    }

    fn push_utf8(&mut self, mut input: &[u8], out: &mut String) -> Result<(), SyntaxErrorCode> {
        if !self.carry.is_empty() {
            let need = utf8_sequence_len(self.carry[0]);
            let take = need.saturating_sub(self.carry.len()).min(input.len());
            self.carry.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.carry.len() < need {
                return Ok(());
            }
            let ch = std::str::from_utf8(&self.carry).map_err(|_| SyntaxErrorCode::InvalidEncoding)?;
            out.push_str(ch);
            self.carry.clear();
        }

        match std::str::from_utf8(input) {
            Ok(text) => {
                out.push_str(text);
                Ok(())
            }
            Err(e) => {
                let (valid, rest) = input.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).map_err(|_| SyntaxErrorCode::InvalidEncoding)?);
                match e.error_len() {
                    Some(_) => Err(SyntaxErrorCode::InvalidEncoding),
                    None => {
                        self.carry.extend_from_slice(rest);
                        Ok(())
                    }
                }
            }
        }
    }

    fn push_utf16(
        &mut self,
        input: &[u8],
        out: &mut String,
        unit: fn([u8; 2]) -> u16,
    ) -> Result<(), SyntaxErrorCode> {
        let mut bytes = input;
        if let Some(&first) = self.carry.first() {
            let Some((&second, rest)) = bytes.split_first() else {
                return Ok(());
            };
            self.carry.clear();
            self.push_unit(unit([first, second]), out)?;
            bytes = rest;
        }

        let mut pairs = bytes.chunks_exact(2);
        for pair in &mut pairs {
            self.push_unit(unit([pair[0], pair[1]]), out)?;
        }
        self.carry.extend_from_slice(pairs.remainder());
        Ok(())
    }

    fn push_unit(&mut self, unit: u16, out: &mut String) -> Result<(), SyntaxErrorCode> {
        let code = match (self.pending_high.take(), unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00)
            }
            (Some(_), _) | (None, 0xDC00..=0xDFFF) => return Err(SyntaxErrorCode::InvalidEncoding),
            (None, 0xD800..=0xDBFF) => {
                self.pending_high = Some(unit);
                return Ok(());
            }
            (None, _) => u32::from(unit),
        };
        let ch = char::from_u32(code).ok_or(SyntaxErrorCode::InvalidEncoding)?;
        out.push(ch);
        Ok(())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decide the encoding from the collected head, or ask for more bytes.
fn sniff(head: &[u8], is_final: bool) -> Result<Option<(XmlEncoding, usize)>, SyntaxErrorCode> {
    if head.len() < 4 && !is_final {
        return Ok(None);
    }

    let (detected, skip) = XmlEncoding::detect(head);
    if detected != XmlEncoding::Utf8 {
        return Ok(Some((detected, skip)));
    }

    let body = &head[skip..];
    const DECL: &[u8] = b"<?xml";
    if body.len() < DECL.len() {
        if DECL.starts_with(body) && !is_final {
            return Ok(None);
        }
        return Ok(Some((XmlEncoding::Utf8, skip)));
    }
    if !body.starts_with(DECL) {
        return Ok(Some((XmlEncoding::Utf8, skip)));
    }

    let Some(end) = memchr(b'>', body) else {
        if is_final || body.len() > MAX_SNIFF {
            return Ok(Some((XmlEncoding::Utf8, skip)));
        }
        return Ok(None);
    };

    match declared_encoding(&body[..end]) {
        None => Ok(Some((XmlEncoding::Utf8, skip))),
        Some(label) => match XmlEncoding::from_label(label) {
            None => Err(SyntaxErrorCode::UnknownEncoding),
            // A UTF-16 label on a byte-oriented document cannot be honoured
            Some(XmlEncoding::Utf16Le | XmlEncoding::Utf16Be) => Err(SyntaxErrorCode::IncorrectEncoding),
            Some(XmlEncoding::Latin1) if skip > 0 => Err(SyntaxErrorCode::IncorrectEncoding),
            Some(encoding) => Ok(Some((encoding, skip))),
        },
    }
}

/// Extract the `encoding` pseudo-attribute value from an XML declaration
fn declared_encoding(decl: &[u8]) -> Option<&[u8]> {
    let at = memmem::find(decl, b"encoding")?;
    let rest = &decl[at + b"encoding".len()..];
    let rest = trim_start(rest);
    let rest = trim_start(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let close = memchr(quote, rest)?;
    Some(&rest[..close])
}

fn trim_start(input: &[u8]) -> &[u8] {
    let skip = input.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &input[skip..]
}

fn utf8_sequence_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}
