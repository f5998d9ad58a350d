//! XML Entity Decoding
//!
//! Handles decoding of XML references in text and attribute values:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - General entities declared in the DOCTYPE internal subset
//!
//! Decoding also applies end-of-line normalization (CRLF and CR become LF)
//! and, for attribute values, whitespace normalization. Callers check
//! `needs_decode` first so plain runs stay zero-copy.

use memchr::{memchr, memchr2};

use super::dtd::DtdDeclarations;
use super::error::{SyntaxError, SyntaxErrorCode};
use super::scanner::is_name;

/// Upper bound on text produced by expanding declared entities in one run
const MAX_EXPANSION: usize = 8 << 20;

/// Where the text being decoded appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Content,
    Attribute,
}

/// Whether `raw` needs any rewriting before delivery
#[inline]
pub fn needs_decode(raw: &str, context: Context) -> bool {
    let bytes = raw.as_bytes();
    match context {
        Context::Content => memchr2(b'&', b'\r', bytes).is_some(),
        Context::Attribute => bytes.iter().any(|&b| matches!(b, b'&' | b'\r' | b'\n' | b'\t')),
    }
}

/// Normalize line endings only (CDATA, comments, PIs)
pub fn normalize_newlines(raw: &str, out: &mut String) {
    let bytes = raw.as_bytes();
    let mut pos = 0;
    while let Some(cr) = memchr(b'\r', &bytes[pos..]) {
        out.push_str(&raw[pos..pos + cr]);
        out.push('\n');
        pos += cr + 1;
        if bytes.get(pos) == Some(&b'\n') {
            pos += 1;
        }
    }
    out.push_str(&raw[pos..]);
}

/// Decode `raw` (which starts at buffer offset `base`) into `out`
pub fn decode_into(
    raw: &str,
    base: usize,
    context: Context,
    dtd: &DtdDeclarations,
    out: &mut String,
) -> Result<(), SyntaxError> {
    let mut expander = Expander {
        dtd,
        context,
        active: Vec::new(),
        expanded: 0,
    };
    expander.run(raw, Origin::Document(base), out)
}

/// Where errors inside a run are reported
#[derive(Debug, Clone, Copy)]
enum Origin {
    /// Text straight from the buffer, starting at this offset
    Document(usize),
    /// Replacement text of an entity referenced at this offset
    Entity(usize),
}

impl Origin {
    fn at(self, pos: usize) -> usize {
        match self {
            Origin::Document(base) => base + pos,
            Origin::Entity(at) => at,
        }
    }
}

struct Expander<'d> {
    dtd: &'d DtdDeclarations,
    context: Context,
    /// Entities currently being expanded, innermost last
    active: Vec<&'d str>,
    expanded: usize,
}

impl<'d> Expander<'d> {
    fn run(&mut self, raw: &str, origin: Origin, out: &mut String) -> Result<(), SyntaxError> {
        let bytes = raw.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            let Some(hit) = memchr2(b'&', b'\r', &bytes[pos..]).map(|i| pos + i) else {
                self.push_plain(&raw[pos..], out);
                break;
            };
            self.push_plain(&raw[pos..hit], out);

            if bytes[hit] == b'\r' {
                out.push(self.newline());
                pos = hit + 1;
                if bytes.get(pos) == Some(&b'\n') {
                    pos += 1;
                }
                continue;
            }

            let Some(semi) = memchr(b';', &bytes[hit..]).map(|i| hit + i) else {
                return Err(SyntaxError::new(SyntaxErrorCode::InvalidToken, origin.at(hit)));
            };
            let name = &raw[hit + 1..semi];
            self.reference(name, origin.at(hit), out)?;
            pos = semi + 1;
        }
        Ok(())
    }

    fn reference(&mut self, name: &str, at: usize, out: &mut String) -> Result<(), SyntaxError> {
        if let Some(number) = name.strip_prefix('#') {
            let ch = decode_char_ref(number).ok_or_else(|| SyntaxError::new(SyntaxErrorCode::BadCharRef, at))?;
            out.push(ch);
            return Ok(());
        }

        if let Some(ch) = predefined(name) {
            out.push(ch);
            return Ok(());
        }

        if !is_name(name) {
            return Err(SyntaxError::new(SyntaxErrorCode::InvalidToken, at));
        }

        let dtd = self.dtd;
        let Some((declared, value)) = dtd.entity(name) else {
            if let Some((_, system_id)) = dtd.external_id(name) {
                log::debug!("skipping reference to external entity &{}; ({})", name, system_id);
                return Ok(());
            }
            if dtd.has_external_subset() {
                // May be declared in the external subset, which is never read
                log::debug!("skipping reference to undeclared entity &{};", name);
                return Ok(());
            }
            return Err(SyntaxError::new(SyntaxErrorCode::UndefinedEntity, at).with_detail(format!("&{};", name)));
        };

        if self.active.contains(&declared) {
            return Err(SyntaxError::new(SyntaxErrorCode::RecursiveEntityRef, at).with_detail(format!("&{};", name)));
        }
        if self.context == Context::Attribute && value.contains('<') {
            return Err(SyntaxError::new(SyntaxErrorCode::InvalidToken, at).with_detail(format!("'<' in &{};", name)));
        }

        self.expanded += value.len();
        if self.expanded > MAX_EXPANSION {
            return Err(SyntaxError::new(SyntaxErrorCode::EntityExpansionLimit, at));
        }

        self.active.push(declared);
        let result = self.run(value, Origin::Entity(at), out);
        self.active.pop();
        result
    }

    fn push_plain(&self, segment: &str, out: &mut String) {
        match self.context {
            Context::Content => out.push_str(segment),
            Context::Attribute => out.extend(segment.chars().map(|c| match c {
                '\t' | '\n' => ' ',
                c => c,
            })),
        }
    }

    fn newline(&self) -> char {
        match self.context {
            Context::Content => '\n',
            Context::Attribute => ' ',
        }
    }
}

/// Decode one of the five predefined entities
#[inline]
fn predefined(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Decode the digits of a character reference (after `&#`)
pub fn decode_char_ref(number: &str) -> Option<char> {
    let codepoint = match number.strip_prefix('x') {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => u32::from_str_radix(hex, 16).ok()?,
        Some(_) => return None,
        None if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) => number.parse::<u32>().ok()?,
        None => return None,
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Find the first character XML forbids, returning its byte offset
///
/// Input is already valid UTF-8, so only C0 controls and the two
/// non-characters U+FFFE/U+FFFF (EF BF BE / EF BF BF) need checking.
pub fn find_invalid_char(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b < 0x20 && !matches!(b, 0x09 | 0x0A | 0x0D) {
            return Some(pos);
        }
        if b == 0xEF && bytes.get(pos + 1) == Some(&0xBF) && matches!(bytes.get(pos + 2), Some(0xBE | 0xBF)) {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

/// Validate characters of `text` starting at buffer offset `base`
#[inline]
pub fn validate_chars(text: &str, base: usize) -> Result<(), SyntaxError> {
    match find_invalid_char(text) {
        Some(pos) => Err(SyntaxError::new(SyntaxErrorCode::InvalidToken, base + pos)),
        None => Ok(()),
    }
}
