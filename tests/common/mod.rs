#![allow(dead_code)]

use std::fmt::Write as _;
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use xmlfeed::{ingest_from_stream, AttributeView, Attributes, EventCollector, IngestOptions, ParseError, SaxEvent, Visitor};

/// Events of `input` read through a plain stream in `chunk_size` pieces
pub fn events_of(input: &[u8], chunk_size: usize) -> Result<Vec<SaxEvent>, ParseError> {
    let mut collector = EventCollector::new();
    let mut reader = input;
    ingest_from_stream(
        &mut reader,
        &mut collector,
        "test.xml",
        IngestOptions::new().with_chunk_size(chunk_size),
    )?;
    Ok(collector.into_events())
}

pub fn start(name: &str, attrs: &[(&str, &str)]) -> SaxEvent {
    SaxEvent::StartElement {
        name: name.to_string(),
        attributes: attrs.iter().copied().collect(),
    }
}

pub fn end(name: &str) -> SaxEvent {
    SaxEvent::EndElement { name: name.to_string() }
}

pub fn data(text: &str) -> SaxEvent {
    SaxEvent::Data(text.to_string())
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Checks that end tags close start tags in LIFO order
#[derive(Default)]
pub struct StackChecker {
    pub stack: Vec<String>,
    pub max_depth: usize,
    pub elements: usize,
    pub mismatches: Vec<String>,
}

impl Visitor for StackChecker {
    fn start_element(&mut self, name: &str, _attrs: &AttributeView<'_>) {
        self.stack.push(name.to_string());
        self.elements += 1;
        self.max_depth = self.max_depth.max(self.stack.len());
    }

    fn end_element(&mut self, name: &str) {
        match self.stack.pop() {
            Some(open) if open == name => {}
            other => self.mismatches.push(format!("{:?} closed by {}", other, name)),
        }
    }
}

/// Keeps a snapshot of every element's attributes
#[derive(Default)]
pub struct SnapshotKeeper {
    pub kept: Vec<(String, xmlfeed::AttributeSnapshot)>,
    /// (name, value) pairs read straight from the view during the callback
    pub seen: Vec<Vec<(String, String)>>,
}

impl Visitor for SnapshotKeeper {
    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
        self.seen.push(attrs.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect());
        self.kept.push((name.to_string(), attrs.to_snapshot()));
    }
}

/// Small deterministic generator (64-bit LCG)
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed.wrapping_mul(6364136223846793005).wrapping_add(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// A well-formed document of at least `min_len` bytes mixing nesting,
/// attributes, references, CDATA, comments, PIs and multi-byte text.
pub fn generate_document(min_len: usize, seed: u64) -> String {
    let mut rng = Lcg::new(seed);
    let mut doc = String::with_capacity(min_len + 1024);
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    doc.push_str("<!DOCTYPE catalog [\n  <!ENTITY vendor \"Acme &amp; Sons\">\n]>\n");
    doc.push_str("<catalog generated=\"yes\">\n");

    let mut open: Vec<&str> = Vec::new();
    let mut counter = 0u64;
    while doc.len() < min_len || !open.is_empty() {
        let closing = doc.len() >= min_len;
        match rng.below(9) {
            _ if closing => {
                if let Some(name) = open.pop() {
                    let _ = write!(doc, "</{}>", name);
                }
            }
            0 | 1 if open.len() < 12 => {
                let name = ["section", "group", "ns:part"][rng.below(3) as usize];
                let _ = write!(doc, "<{} depth=\"{}\" key='k{}'>", name, open.len(), counter);
                open.push(name);
            }
            2 => {
                if let Some(name) = open.pop() {
                    let _ = write!(doc, "</{}>\r\n", name);
                }
            }
            3 => {
                let _ = write!(
                    doc,
                    "<item id=\"{}\" price=\"{}.{:02}\" note=\"a&lt;b &#x263A;\"/>",
                    counter,
                    rng.below(1000),
                    rng.below(100)
                );
            }
            4 => {
                let _ = write!(doc, "<name>Widget {} from &vendor; – größe ✓</name>", counter);
            }
            5 => doc.push_str("<![CDATA[raw <markup> & stuff]]>"),
            6 => {
                let _ = write!(doc, "<!-- comment {} -->", counter);
            }
            7 => {
                let _ = write!(doc, "<?audit seq=\"{}\"?>", counter);
            }
            _ => doc.push_str("\n  plain text line\n"),
        }
        counter += 1;
    }

    doc.push_str("</catalog>\n");
    doc
}
