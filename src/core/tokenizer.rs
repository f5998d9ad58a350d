//! Incremental XML Tokenizer
//!
//! A push tokenizer. Bytes arrive in chunks of any size, are decoded to
//! UTF-8 and appended to an internal buffer, and every token complete in the
//! buffer is checked for well-formedness and reported to a [`ScanHandler`].
//! A token cut off by a chunk boundary stays buffered until more input
//! arrives, so the events a handler sees never depend on how the input was
//! split.
//!
//! Consumed input is dropped from the front of the buffer after each chunk;
//! the line/column of the buffer start is carried forward so error offsets
//! can still be turned into document positions.

use memchr::{memchr, memmem};

use super::attributes::{parse_attributes, RawAttribute};
use super::dtd::{find_doctype_end, DtdDeclarations};
use super::encoding::{Decoder, XmlEncoding};
use super::entities::{decode_into, needs_decode, normalize_newlines, validate_chars, Context};
use super::error::{SyntaxError, SyntaxErrorCode};
use super::position::Position;
use super::scanner::{is_name_start_char, is_whitespace, Prefix, Scanner};
use crate::sax::AttributeView;

/// Receiver for tokenizer events.
///
/// Every `&str` handed out borrows tokenizer memory and is only valid for
/// the duration of the call.
pub trait ScanHandler {
    /// Opening tag. A self-closing tag is followed by `end_element` at once.
    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>);

    /// Closing tag
    fn end_element(&mut self, name: &str);

    /// Character data, with references decoded and line endings normalized.
    /// CDATA sections arrive here too.
    fn text(&mut self, text: &str);

    /// Processing instruction other than the XML declaration
    fn processing_instruction(&mut self, target: &str, data: &str);

    /// Comment body (optional, default does nothing)
    fn comment(&mut self, _text: &str) {}
}

/// Where in the document grammar the tokenizer is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the root element
    Prolog,
    /// Inside the root element
    Content,
    /// After the root element closed
    Epilog,
}

/// Outcome of trying to consume one token
enum Step {
    /// Token handled; scanning resumes at this offset
    Consumed(usize),
    /// Token incomplete in the buffer
    NeedMore,
}

/// Incremental, well-formedness checking XML tokenizer
pub struct Tokenizer {
    /// Decoded text not yet consumed (plus the token in progress)
    buffer: String,
    decoder: Decoder,
    state: EngineState,
}

struct EngineState {
    /// Next unconsumed offset in the buffer
    pos: usize,
    phase: Phase,
    /// Whether anything at all has been consumed
    started: bool,
    /// Names of open elements, concatenated
    open_names: String,
    /// Start offset of each open element's name in `open_names`
    open: Vec<usize>,
    /// Attributes of the current start tag
    attrs: Vec<RawAttribute>,
    /// Decoded attribute values of the current start tag
    scratch: String,
    /// Decoded text, comment or PI data
    text: String,
    dtd: DtdDeclarations,
    saw_doctype: bool,
    /// Document position of buffer offset 0
    base: Position,
    /// Offset where the search for the `<` ending a text run resumes
    text_scan: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Tokenizer {
            buffer: String::with_capacity(32 * 1024),
            decoder: Decoder::new(),
            state: EngineState {
                pos: 0,
                phase: Phase::Prolog,
                started: false,
                open_names: String::with_capacity(256),
                open: Vec::with_capacity(32),
                attrs: Vec::with_capacity(8),
                scratch: String::new(),
                text: String::new(),
                dtd: DtdDeclarations::new(),
                saw_doctype: false,
                base: Position::start(),
                text_scan: 0,
            },
        }
    }

    /// Current grammar phase
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.state.open.len()
    }

    /// Document encoding, once detected
    pub fn encoding(&self) -> Option<XmlEncoding> {
        self.decoder.encoding()
    }

    /// Feed the next chunk, reporting every token it completes.
    pub fn feed<H: ScanHandler>(&mut self, bytes: &[u8], handler: &mut H) -> Result<(), SyntaxError> {
        let decoded = self.decoder.decode(bytes, &mut self.buffer);
        // Tokens decoded before a bad byte are still reported
        self.state.scan(&self.buffer, handler)?;
        decoded.map_err(|code| SyntaxError::new(code, self.buffer.len()))?;
        self.compact();
        Ok(())
    }

    /// Signal end of input: flush the decoder and reject unfinished structure.
    pub fn finish<H: ScanHandler>(&mut self, handler: &mut H) -> Result<(), SyntaxError> {
        let decoded = self.decoder.finish(&mut self.buffer);
        self.state.scan(&self.buffer, handler)?;
        decoded.map_err(|code| SyntaxError::new(code, self.buffer.len()))?;
        self.state.check_complete(&self.buffer)
    }

    /// Document position of a buffer offset (as carried by a `SyntaxError`)
    pub fn location_of(&self, offset: usize) -> Position {
        let end = offset.min(self.buffer.len());
        let prefix = self.buffer.get(..end).unwrap_or(&self.buffer);
        self.state.base.advanced(prefix)
    }

    /// Document position just past all input decoded so far
    pub fn end_position(&self) -> Position {
        self.location_of(self.buffer.len())
    }

    fn compact(&mut self) {
        let consumed = self.state.pos;
        if consumed == 0 || !self.buffer.is_char_boundary(consumed) {
            return;
        }
        self.state.base.advance(&self.buffer[..consumed]);
        self.buffer.drain(..consumed);
        self.state.pos = 0;
        self.state.text_scan = self.state.text_scan.saturating_sub(consumed);
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn invalid(offset: usize) -> SyntaxError {
    SyntaxError::new(SyntaxErrorCode::InvalidToken, offset)
}

impl EngineState {
    fn scan<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<(), SyntaxError> {
        let bytes = buf.as_bytes();
        while self.pos < bytes.len() {
            let step = if bytes[self.pos] == b'<' {
                self.markup(buf, handler)?
            } else {
                self.chars(buf, handler)?
            };
            match step {
                Step::Consumed(next) => {
                    self.pos = next;
                    self.started = true;
                }
                Step::NeedMore => break,
            }
        }
        Ok(())
    }

    /// Error code for markup that is only allowed inside the root element
    fn outside_root(&self) -> SyntaxErrorCode {
        match self.phase {
            Phase::Epilog => SyntaxErrorCode::JunkAfterDocElement,
            _ => SyntaxErrorCode::Syntax,
        }
    }

    fn chars<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let bytes = buf.as_bytes();
        let start = self.pos;

        if self.phase != Phase::Content {
            // Only whitespace may appear outside the root element
            let end = start + bytes[start..].iter().take_while(|&&b| is_whitespace(b)).count();
            if end < bytes.len() && bytes[end] != b'<' {
                return Err(SyntaxError::new(self.outside_root(), end));
            }
            return Ok(Step::Consumed(end));
        }

        let from = self.text_scan.max(start);
        let Some(end) = memchr(b'<', &bytes[from..]).map(|i| from + i) else {
            self.text_scan = bytes.len();
            return Ok(Step::NeedMore);
        };
        self.text_scan = 0;

        let raw = &buf[start..end];
        validate_chars(raw, start)?;
        if let Some(i) = memmem::find(raw.as_bytes(), b"]]>") {
            return Err(invalid(start + i));
        }
        if needs_decode(raw, Context::Content) {
            self.text.clear();
            decode_into(raw, start, Context::Content, &self.dtd, &mut self.text)?;
            if !self.text.is_empty() {
                handler.text(&self.text);
            }
        } else {
            handler.text(raw);
        }
        Ok(Step::Consumed(end))
    }

    fn markup<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let start = self.pos;
        let Some(&next) = buf.as_bytes().get(start + 1) else {
            return Ok(Step::NeedMore);
        };

        match next {
            b'/' => self.end_tag(buf, handler),
            b'?' => self.processing_instruction(buf, handler),
            b'!' => self.declaration(buf, handler),
            b if is_name_start_char(b) => self.start_tag(buf, handler),
            _ => Err(invalid(start + 1)),
        }
    }

    fn start_tag<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let bytes = buf.as_bytes();
        let start = self.pos;
        let mut scanner = Scanner::at(bytes, start + 1);

        let end = match scanner.find_tag_end_quoted() {
            Ok(Some(end)) => end,
            Ok(None) => return Ok(Step::NeedMore),
            Err(lt) => return Err(invalid(lt)),
        };
        if self.phase == Phase::Epilog {
            return Err(SyntaxError::new(SyntaxErrorCode::JunkAfterDocElement, start));
        }

        let (name_start, name_end) = scanner.read_name().ok_or_else(|| invalid(start + 1))?;
        let empty = end > name_end && bytes[end - 1] == b'/';
        let attrs_end = if empty { end - 1 } else { end };
        parse_attributes(buf, name_end, attrs_end, &self.dtd, &mut self.attrs, &mut self.scratch)?;

        let name = &buf[name_start..name_end];
        let view = AttributeView::new(buf, &self.scratch, &self.attrs);
        handler.start_element(name, &view);

        if empty {
            handler.end_element(name);
        } else {
            self.open.push(self.open_names.len());
            self.open_names.push_str(name);
        }
        self.phase = if self.open.is_empty() { Phase::Epilog } else { Phase::Content };
        Ok(Step::Consumed(end + 1))
    }

    fn end_tag<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let bytes = buf.as_bytes();
        let start = self.pos;
        let Some(end) = memchr(b'>', &bytes[start + 2..]).map(|i| start + 2 + i) else {
            return Ok(Step::NeedMore);
        };
        let Some(&open_start) = self.open.last() else {
            return Err(SyntaxError::new(self.outside_root(), start));
        };

        let mut scanner = Scanner::at(&bytes[..end], start + 2);
        let (name_start, name_end) = scanner.read_name().ok_or_else(|| invalid(start + 2))?;
        scanner.skip_whitespace();
        if !scanner.is_eof() {
            return Err(invalid(scanner.position()));
        }

        let name = &buf[name_start..name_end];
        let expected = &self.open_names[open_start..];
        if name != expected {
            return Err(SyntaxError::new(SyntaxErrorCode::TagMismatch, start)
                .with_detail(format!("expected </{}>, found </{}>", expected, name)));
        }

        self.open.pop();
        self.open_names.truncate(open_start);
        handler.end_element(name);
        if self.open.is_empty() {
            self.phase = Phase::Epilog;
        }
        Ok(Step::Consumed(end + 1))
    }

    fn processing_instruction<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let bytes = buf.as_bytes();
        let start = self.pos;
        let Some(close) = memmem::find(&bytes[start + 2..], b"?>").map(|i| start + 2 + i) else {
            return Ok(Step::NeedMore);
        };

        let mut scanner = Scanner::at(&bytes[..close], start + 2);
        let (target_start, target_end) = scanner.read_name().ok_or_else(|| invalid(start + 2))?;
        if scanner.skip_whitespace() == 0 && !scanner.is_eof() {
            return Err(invalid(scanner.position()));
        }
        let target = &buf[target_start..target_end];
        let data_start = scanner.position();
        let data = &buf[data_start..close];

        if target.eq_ignore_ascii_case("xml") {
            if target != "xml" {
                return Err(invalid(target_start));
            }
            if self.started {
                return Err(SyntaxError::new(SyntaxErrorCode::MisplacedXmlPi, start));
            }
            check_xml_declaration(data).map_err(|at| SyntaxError::new(SyntaxErrorCode::Syntax, data_start + at))?;
            return Ok(Step::Consumed(close + 2));
        }

        validate_chars(data, data_start)?;
        if data.contains('\r') {
            self.text.clear();
            normalize_newlines(data, &mut self.text);
            handler.processing_instruction(target, &self.text);
        } else {
            handler.processing_instruction(target, data);
        }
        Ok(Step::Consumed(close + 2))
    }

    /// `<!` markup: comment, CDATA section or DOCTYPE
    fn declaration<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let scanner = Scanner::at(buf.as_bytes(), self.pos);

        match scanner.prefix(b"<!--") {
            Prefix::Match => return self.comment(buf, handler),
            Prefix::Partial => return Ok(Step::NeedMore),
            Prefix::Mismatch => {}
        }
        match scanner.prefix(b"<![CDATA[") {
            Prefix::Match => return self.cdata(buf, handler),
            Prefix::Partial => return Ok(Step::NeedMore),
            Prefix::Mismatch => {}
        }
        match scanner.prefix(b"<!DOCTYPE") {
            Prefix::Match => self.doctype(buf),
            Prefix::Partial => Ok(Step::NeedMore),
            Prefix::Mismatch => Err(invalid(self.pos + 2)),
        }
    }

    fn comment<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let bytes = buf.as_bytes();
        let body_start = self.pos + 4;
        let Some(dashes) = memmem::find(&bytes[body_start..], b"--").map(|i| body_start + i) else {
            return Ok(Step::NeedMore);
        };
        // "--" may only appear as part of the closing "-->"
        match bytes.get(dashes + 2) {
            None => return Ok(Step::NeedMore),
            Some(b'>') => {}
            Some(_) => return Err(invalid(dashes)),
        }

        let body = &buf[body_start..dashes];
        validate_chars(body, body_start)?;
        if body.contains('\r') {
            self.text.clear();
            normalize_newlines(body, &mut self.text);
            handler.comment(&self.text);
        } else {
            handler.comment(body);
        }
        Ok(Step::Consumed(dashes + 3))
    }

    fn cdata<H: ScanHandler>(&mut self, buf: &str, handler: &mut H) -> Result<Step, SyntaxError> {
        let start = self.pos;
        if self.phase != Phase::Content {
            return Err(SyntaxError::new(self.outside_root(), start));
        }

        let body_start = start + b"<![CDATA[".len();
        let Some(close) = memmem::find(&buf.as_bytes()[body_start..], b"]]>").map(|i| body_start + i) else {
            return Ok(Step::NeedMore);
        };

        let body = &buf[body_start..close];
        validate_chars(body, body_start)?;
        if body.contains('\r') {
            self.text.clear();
            normalize_newlines(body, &mut self.text);
            handler.text(&self.text);
        } else if !body.is_empty() {
            handler.text(body);
        }
        Ok(Step::Consumed(close + 3))
    }

    fn doctype(&mut self, buf: &str) -> Result<Step, SyntaxError> {
        let start = self.pos;
        if self.phase != Phase::Prolog || self.saw_doctype {
            return Err(SyntaxError::new(self.outside_root(), start));
        }

        let body_start = start + b"<!DOCTYPE".len();
        let Some(end) = find_doctype_end(buf.as_bytes(), body_start) else {
            return Ok(Step::NeedMore);
        };
        self.dtd = DtdDeclarations::parse(&buf[body_start..end], body_start)?;
        self.saw_doctype = true;
        log::trace!(
            "DOCTYPE {} (external subset: {})",
            self.dtd.root_name.as_deref().unwrap_or(""),
            self.dtd.has_external_subset()
        );
        Ok(Step::Consumed(end + 1))
    }

    fn check_complete(&self, buf: &str) -> Result<(), SyntaxError> {
        let bytes = buf.as_bytes();
        if bytes.get(self.pos) == Some(&b'<') {
            let code = if bytes[self.pos..].starts_with(b"<![CDATA[") {
                SyntaxErrorCode::UnclosedCdata
            } else {
                SyntaxErrorCode::UnclosedToken
            };
            return Err(SyntaxError::new(code, self.pos));
        }

        match self.phase {
            Phase::Prolog => Err(SyntaxError::new(SyntaxErrorCode::NoElements, buf.len())),
            Phase::Content => {
                let innermost = self.open.last().map_or("", |&at| &self.open_names[at..]);
                Err(SyntaxError::new(SyntaxErrorCode::UnclosedElement, buf.len()).with_detail(format!("<{}>", innermost)))
            }
            Phase::Epilog => Ok(()),
        }
    }
}

/// Check the pseudo-attributes of an XML declaration.
///
/// `version` is required and comes first; `encoding` and `standalone` may
/// follow in that order. Returns the offset of the first problem.
fn check_xml_declaration(data: &str) -> Result<(), usize> {
    const NAMES: [&str; 3] = ["version", "encoding", "standalone"];

    let mut scanner = Scanner::at(data.as_bytes(), 0);
    let mut next_allowed = 0;

    loop {
        let skipped = scanner.skip_whitespace();
        if scanner.is_eof() {
            break;
        }
        if next_allowed > 0 && skipped == 0 {
            return Err(scanner.position());
        }

        let at = scanner.position();
        let (name_start, name_end) = scanner.read_name().ok_or(at)?;
        let name = &data[name_start..name_end];
        let index = NAMES.iter().position(|&n| n == name).ok_or(at)?;
        if index < next_allowed || (next_allowed == 0 && index != 0) {
            return Err(at);
        }
        next_allowed = index + 1;

        scanner.skip_whitespace();
        if scanner.peek() != Some(b'=') {
            return Err(scanner.position());
        }
        scanner.advance(1);
        scanner.skip_whitespace();
        let quote = match scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(scanner.position()),
        };
        scanner.advance(1);
        let value_start = scanner.position();
        let value_end = scanner.find_byte(quote).ok_or(value_start)?;
        let value = &data[value_start..value_end];

        let valid = match name {
            "version" => value
                .strip_prefix("1.")
                .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())),
            "standalone" => value == "yes" || value == "no",
            _ => !value.is_empty(),
        };
        if !valid {
            return Err(value_start);
        }
        scanner.set_position(value_end + 1);
    }

    if next_allowed == 0 {
        return Err(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sax::Attributes;

    /// Records events as compact strings
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ScanHandler for Recorder {
        fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
            let attrs: Vec<String> = attrs.iter().map(|(n, v)| format!("{}={}", n, v)).collect();
            self.events.push(format!("start {} [{}]", name, attrs.join(",")));
        }

        fn end_element(&mut self, name: &str) {
            self.events.push(format!("end {}", name));
        }

        fn text(&mut self, text: &str) {
            self.events.push(format!("text {:?}", text));
        }

        fn processing_instruction(&mut self, target: &str, data: &str) {
            self.events.push(format!("pi {} {:?}", target, data));
        }

        fn comment(&mut self, text: &str) {
            self.events.push(format!("comment {:?}", text));
        }
    }

    fn run_chunks(chunks: &[&[u8]]) -> (Vec<String>, Result<(), SyntaxError>, Tokenizer) {
        let mut tokenizer = Tokenizer::new();
        let mut recorder = Recorder::default();
        let mut result = Ok(());
        for chunk in chunks {
            result = tokenizer.feed(chunk, &mut recorder);
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            result = tokenizer.finish(&mut recorder);
        }
        (recorder.events, result, tokenizer)
    }

    fn run(input: &str) -> (Vec<String>, Result<(), SyntaxError>) {
        let (events, result, _) = run_chunks(&[input.as_bytes()]);
        (events, result)
    }

    fn error_code(input: &str) -> SyntaxErrorCode {
        run(input).1.unwrap_err().code
    }

    #[test]
    fn test_simple_document() {
        let (events, result) = run("<root><item id=\"1\">A</item><item id=\"2\"/></root>");
        result.unwrap();
        assert_eq!(
            events,
            vec![
                "start root []",
                "start item [id=1]",
                "text \"A\"",
                "end item",
                "start item [id=2]",
                "end item",
                "end root",
            ]
        );
    }

    #[test]
    fn test_byte_at_a_time_matches_whole() {
        let input = "<?xml version=\"1.0\"?>\r\n<!DOCTYPE r [<!ENTITY e \"ent\">]>\
                     <r a='x&amp;y'><!-- c --><?p d?><![CDATA[<raw>]]>t&e;&#x41;\r\n</r>";
        let (whole, result, _) = run_chunks(&[input.as_bytes()]);
        result.unwrap();

        let bytes: Vec<&[u8]> = input.as_bytes().chunks(1).collect();
        let (split, result, _) = run_chunks(&bytes);
        result.unwrap();
        assert_eq!(whole, split);
        assert_eq!(
            whole,
            vec![
                "start r [a=x&y]",
                "comment \" c \"",
                "pi p \"d\"",
                "text \"<raw>\"",
                "text \"tentA\\n\"",
                "end r",
            ]
        );
    }

    #[test]
    fn test_tag_mismatch() {
        let (events, result) = run("<a><b></a>");
        let err = result.unwrap_err();
        assert_eq!(err.code, SyntaxErrorCode::TagMismatch);
        assert_eq!(err.offset, 6);
        assert_eq!(events, vec!["start a []", "start b []"]);
    }

    #[test]
    fn test_well_formedness_errors() {
        assert_eq!(error_code("<a x='1' x='2'/>"), SyntaxErrorCode::DuplicateAttribute);
        assert_eq!(error_code("<a/><b/>"), SyntaxErrorCode::JunkAfterDocElement);
        assert_eq!(error_code("<a/>text"), SyntaxErrorCode::JunkAfterDocElement);
        assert_eq!(error_code("text<a/>"), SyntaxErrorCode::Syntax);
        assert_eq!(error_code("<a>]]></a>"), SyntaxErrorCode::InvalidToken);
        assert_eq!(error_code("<a><!-- a -- b --></a>"), SyntaxErrorCode::InvalidToken);
        assert_eq!(error_code(" <?xml version='1.0'?><a/>"), SyntaxErrorCode::MisplacedXmlPi);
        assert_eq!(error_code("<?XML version='1.0'?><a/>"), SyntaxErrorCode::InvalidToken);
        assert_eq!(error_code("<?xml encoding='utf-8'?><a/>"), SyntaxErrorCode::Syntax);
        assert_eq!(error_code("<a/><!DOCTYPE a>"), SyntaxErrorCode::JunkAfterDocElement);
        assert_eq!(error_code("<a>&nope;</a>"), SyntaxErrorCode::UndefinedEntity);
        assert_eq!(error_code("<a>\u{1}</a>"), SyntaxErrorCode::InvalidToken);
        assert_eq!(error_code("<a x='<'/>"), SyntaxErrorCode::InvalidToken);
        assert_eq!(error_code("<1a/>"), SyntaxErrorCode::InvalidToken);
    }

    #[test]
    fn test_premature_end() {
        assert_eq!(error_code(""), SyntaxErrorCode::NoElements);
        assert_eq!(error_code("  <!-- only -->  "), SyntaxErrorCode::NoElements);
        assert_eq!(error_code("<a><b>"), SyntaxErrorCode::UnclosedElement);
        assert_eq!(error_code("<a>text"), SyntaxErrorCode::UnclosedElement);
        assert_eq!(error_code("<a><b x='1"), SyntaxErrorCode::UnclosedToken);
        assert_eq!(error_code("<a><![CDATA[x"), SyntaxErrorCode::UnclosedCdata);
    }

    #[test]
    fn test_epilog_comments_and_pis() {
        let (events, result) = run("<a/>\n<!-- done -->\n<?end?>\n");
        result.unwrap();
        assert_eq!(events, vec!["start a []", "end a", "comment \" done \"", "pi end \"\""]);
    }

    #[test]
    fn test_external_subset_skips_unknown_entities() {
        let (events, result) = run("<!DOCTYPE a SYSTEM \"a.dtd\"><a>x&ext;y</a>");
        result.unwrap();
        assert_eq!(events[1], "text \"xy\"");
    }

    #[test]
    fn test_utf16_document() {
        let text = "<r>é</r>";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (events, result, tokenizer) = run_chunks(&[&bytes[..3], &bytes[3..]]);
        result.unwrap();
        assert_eq!(events, vec!["start r []", "text \"é\"", "end r"]);
        assert_eq!(tokenizer.encoding(), Some(XmlEncoding::Utf16Le));
    }

    #[test]
    fn test_error_location_survives_compaction() {
        let (_, result, tokenizer) = run_chunks(&[b"<a>\n  <b>\n", b"  </c>"]);
        let err = result.unwrap_err();
        assert_eq!(err.code, SyntaxErrorCode::TagMismatch);
        let at = tokenizer.location_of(err.offset);
        assert_eq!((at.line, at.column), (3, 3));
    }

    #[test]
    fn test_invalid_utf8_reports_preceding_events() {
        let (events, result, _) = run_chunks(&[b"<a><b/>\xFF</a>"]);
        assert_eq!(result.unwrap_err().code, SyntaxErrorCode::InvalidEncoding);
        assert_eq!(events, vec!["start a []", "start b []", "end b"]);
    }

    #[test]
    fn test_xml_declaration_checks() {
        assert_eq!(check_xml_declaration("version=\"1.0\" encoding='UTF-8' standalone='yes'"), Ok(()));
        assert_eq!(check_xml_declaration("version='1.0' "), Ok(()));
        assert!(check_xml_declaration("").is_err());
        assert!(check_xml_declaration("version='2.0'").is_err());
        assert!(check_xml_declaration("version='1.0' standalone='yes' encoding='x'").is_err());
        assert!(check_xml_declaration("version='1.0'encoding='x'").is_err());
    }
}
