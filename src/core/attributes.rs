//! XML Attribute Parsing
//!
//! Scans the attribute region of a start tag into a flat array of spans.
//! Values that need no rewriting point straight into the tokenizer buffer;
//! values with references or whitespace to normalize are decoded into a
//! shared scratch string and point there instead.

use super::dtd::DtdDeclarations;
use super::entities::{decode_into, needs_decode, validate_chars, Context};
use super::error::{SyntaxError, SyntaxErrorCode};
use super::scanner::Scanner;
use super::span::Span;

/// One attribute of the current start tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    /// Name span into the tokenizer buffer
    pub name: Span,
    /// Value span, into the scratch string when `decoded` is set
    pub value: Span,
    pub decoded: bool,
}

impl RawAttribute {
    #[inline]
    pub fn name<'a>(&self, source: &'a str) -> &'a str {
        self.name.slice(source)
    }

    #[inline]
    pub fn value<'a>(&self, source: &'a str, scratch: &'a str) -> &'a str {
        if self.decoded {
            self.value.slice(scratch)
        } else {
            self.value.slice(source)
        }
    }
}

/// Parse the attributes in `source[from..to]`.
///
/// The region starts right after the element name and ends before `>` (or
/// `/>`). `attrs` and `scratch` are cleared and refilled.
pub fn parse_attributes(
    source: &str,
    from: usize,
    to: usize,
    dtd: &DtdDeclarations,
    attrs: &mut Vec<RawAttribute>,
    scratch: &mut String,
) -> Result<(), SyntaxError> {
    attrs.clear();
    scratch.clear();

    let bytes = &source.as_bytes()[..to];
    let mut scanner = Scanner::at(bytes, from);
    let invalid = |pos: usize| SyntaxError::new(SyntaxErrorCode::InvalidToken, pos);

    loop {
        let skipped = scanner.skip_whitespace();
        if scanner.is_eof() {
            return Ok(());
        }
        // Attributes are separated from the name and from each other
        if skipped == 0 {
            return Err(invalid(scanner.position()));
        }

        let (name_start, name_end) = scanner.read_name().ok_or_else(|| invalid(scanner.position()))?;
        scanner.skip_whitespace();
        if scanner.peek() != Some(b'=') {
            return Err(invalid(scanner.position()));
        }
        scanner.advance(1);
        scanner.skip_whitespace();

        let quote = match scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(invalid(scanner.position())),
        };
        scanner.advance(1);
        let value_start = scanner.position();
        let value_end = scanner.find_byte(quote).ok_or_else(|| invalid(value_start))?;

        let raw = &source[value_start..value_end];
        validate_chars(raw, value_start)?;

        let name = &source[name_start..name_end];
        if attrs.iter().any(|a| a.name(source) == name) {
            return Err(SyntaxError::new(SyntaxErrorCode::DuplicateAttribute, name_start).with_detail(name));
        }

        let (value, decoded) = if needs_decode(raw, Context::Attribute) {
            let start = scratch.len();
            decode_into(raw, value_start, Context::Attribute, dtd, scratch)?;
            (Span::from_range(start, scratch.len()), true)
        } else {
            (Span::from_range(value_start, value_end), false)
        };

        attrs.push(RawAttribute {
            name: Span::from_range(name_start, name_end),
            value,
            decoded,
        });
        scanner.set_position(value_end + 1);
    }
}
