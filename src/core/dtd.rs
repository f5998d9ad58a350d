//! DOCTYPE Declaration Store
//!
//! The tokenizer does not validate against a DTD. It only reads the
//! DOCTYPE far enough to learn the general entities declared in the
//! internal subset and whether an external subset exists, which together
//! decide how entity references in content are resolved.

use std::collections::HashMap;

use memchr::{memchr, memmem};

use super::error::{SyntaxError, SyntaxErrorCode};
use super::scanner::{Prefix, Scanner};

#[derive(Debug, Clone)]
pub struct EntityDecl {
    /// Replacement text for internal entities
    pub value: Option<String>,
    /// For external entities
    pub system_id: Option<String>,
    /// For external entities
    pub public_id: Option<String>,
}

/// Collected DOCTYPE facts
#[derive(Debug, Default)]
pub struct DtdDeclarations {
    /// Name given after `<!DOCTYPE`
    pub root_name: Option<String>,
    /// General entities: name -> definition
    entities: HashMap<String, EntityDecl>,
    /// Whether the DOCTYPE names an external subset
    external_subset: bool,
}

impl DtdDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an internal entity declaration. First declaration wins.
    #[cfg(test)]
    pub fn add_entity(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(
            name.into(),
            EntityDecl {
                value: Some(value.into()),
                system_id: None,
                public_id: None,
            },
        );
    }

    fn insert(&mut self, name: String, decl: EntityDecl) {
        self.entities.entry(name).or_insert(decl);
    }

    /// Look up an internal entity, returning the stored name and its replacement text
    pub fn entity(&self, name: &str) -> Option<(&str, &str)> {
        let (key, decl) = self.entities.get_key_value(name)?;
        decl.value.as_deref().map(|value| (key.as_str(), value))
    }

    /// (public id, system id) of an external entity, which is never loaded
    pub fn external_id(&self, name: &str) -> Option<(Option<&str>, &str)> {
        let decl = self.entities.get(name)?;
        let system_id = decl.system_id.as_deref()?;
        Some((decl.public_id.as_deref(), system_id))
    }

    pub fn has_external_subset(&self) -> bool {
        self.external_subset
    }

    /// Parse the body of a DOCTYPE declaration.
    ///
    /// `body` is the text between `<!DOCTYPE` and the closing `>`, found at
    /// buffer offset `base`.
    pub fn parse(body: &str, base: usize) -> Result<Self, SyntaxError> {
        let bytes = body.as_bytes();
        let mut scanner = Scanner::at(bytes, 0);
        let mut dtd = DtdDeclarations::new();
        let syntax = |pos: usize| SyntaxError::new(SyntaxErrorCode::Syntax, base + pos);

        if scanner.skip_whitespace() == 0 {
            return Err(syntax(scanner.position()));
        }
        let (start, end) = scanner.read_name().ok_or_else(|| syntax(scanner.position()))?;
        dtd.root_name = Some(body[start..end].to_string());
        scanner.skip_whitespace();

        if scanner.peek().is_some_and(|b| b != b'[') {
            external_id(&mut scanner, body).map_err(syntax)?;
            dtd.external_subset = true;
            scanner.skip_whitespace();
        }

        if scanner.peek() == Some(b'[') {
            scanner.advance(1);
            dtd.parse_subset(&mut scanner, body).map_err(syntax)?;
            scanner.skip_whitespace();
        }

        if !scanner.is_eof() {
            return Err(syntax(scanner.position()));
        }
        Ok(dtd)
    }

    fn parse_subset(&mut self, scanner: &mut Scanner<'_>, body: &str) -> Result<(), usize> {
        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                Some(b']') => {
                    scanner.advance(1);
                    return Ok(());
                }
                Some(b'%') => {
                    // Parameter entity reference; contents are not read.
                    let semi = scanner.find_byte(b';').ok_or(scanner.position())?;
                    scanner.set_position(semi + 1);
                }
                Some(b'<') => {
                    if scanner.prefix(b"<!--") == Prefix::Match {
                        let end = scanner.find_seq(b"-->").ok_or(scanner.position())?;
                        scanner.set_position(end + 3);
                    } else if scanner.prefix(b"<!ENTITY") == Prefix::Match {
                        scanner.advance(b"<!ENTITY".len());
                        self.parse_entity(scanner, body)?;
                    } else {
                        skip_markup_decl(scanner)?;
                    }
                }
                _ => return Err(scanner.position()),
            }
        }
    }

    fn parse_entity(&mut self, scanner: &mut Scanner<'_>, body: &str) -> Result<(), usize> {
        if scanner.skip_whitespace() == 0 {
            return Err(scanner.position());
        }
        let parameter = scanner.peek() == Some(b'%');
        if parameter {
            scanner.advance(1);
            if scanner.skip_whitespace() == 0 {
                return Err(scanner.position());
            }
        }

        let (start, end) = scanner.read_name().ok_or(scanner.position())?;
        let name = body[start..end].to_string();
        if scanner.skip_whitespace() == 0 {
            return Err(scanner.position());
        }

        let decl = match scanner.peek() {
            Some(b'"') | Some(b'\'') => EntityDecl {
                value: Some(quoted(scanner, body)?.to_string()),
                system_id: None,
                public_id: None,
            },
            _ => {
                let (public_id, system_id) = external_id(scanner, body)?;
                EntityDecl {
                    value: None,
                    system_id: Some(system_id.to_string()),
                    public_id: public_id.map(str::to_string),
                }
            }
        };

        // NDATA and anything else up to '>' carries nothing we use
        skip_markup_decl(scanner)?;
        if !parameter {
            self.insert(name, decl);
        }
        Ok(())
    }
}

/// Parse `SYSTEM "sys"` or `PUBLIC "pub" "sys"`, returning (public, system)
fn external_id<'b>(scanner: &mut Scanner<'_>, body: &'b str) -> Result<(Option<&'b str>, &'b str), usize> {
    if scanner.prefix(b"SYSTEM") == Prefix::Match {
        scanner.advance(6);
        scanner.skip_whitespace();
        Ok((None, quoted(scanner, body)?))
    } else if scanner.prefix(b"PUBLIC") == Prefix::Match {
        scanner.advance(6);
        scanner.skip_whitespace();
        let public_id = quoted(scanner, body)?;
        scanner.skip_whitespace();
        Ok((Some(public_id), quoted(scanner, body)?))
    } else {
        Err(scanner.position())
    }
}

/// Read a quoted literal, returning its contents
fn quoted<'b>(scanner: &mut Scanner<'_>, body: &'b str) -> Result<&'b str, usize> {
    let quote = scanner.peek().filter(|&q| q == b'"' || q == b'\'').ok_or(scanner.position())?;
    scanner.advance(1);
    let start = scanner.position();
    let end = scanner.find_byte(quote).ok_or(start)?;
    scanner.set_position(end + 1);
    Ok(&body[start..end])
}

/// Skip to just past the `>` ending the current declaration
fn skip_markup_decl(scanner: &mut Scanner<'_>) -> Result<(), usize> {
    let mut quote: Option<u8> = None;
    while let Some(b) = scanner.peek() {
        scanner.advance(1);
        match (quote, b) {
            (None, b'"') | (None, b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return Ok(()),
            _ => {}
        }
    }
    Err(scanner.position())
}

/// Find the `>` that closes a DOCTYPE starting its scan at `from`.
///
/// Quotes, comments and the bracketed internal subset are skipped.
/// Returns `None` when the buffer ends first.
pub fn find_doctype_end(input: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    let mut in_subset = false;

    while pos < input.len() {
        match input[pos] {
            b'"' | b'\'' => {
                let close = memchr(input[pos], &input[pos + 1..])?;
                pos += close + 2;
                continue;
            }
            b'<' if in_subset && input[pos..].starts_with(b"<!--") => {
                let close = memmem::find(&input[pos + 4..], b"-->")?;
                pos += close + 7;
                continue;
            }
            b'[' => in_subset = true,
            b']' => in_subset = false,
            b'>' if !in_subset => return Some(pos),
            _ => {}
        }
        pos += 1;
    }
    None
}
