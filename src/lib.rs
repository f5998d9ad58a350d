//! xmlfeed - streaming XML ingestion
//!
//! Turns a byte source (plain or gzip-compressed) into an ordered stream of
//! parse events delivered synchronously to a [`Visitor`].
//!
//! Layers:
//! - Sources: chunked byte suppliers (`PlainSource`, `CompressedSource`)
//! - Tokenizer: incremental push tokenizer with well-formedness checks
//! - Dispatcher: drives the tokenizer and calls the visitor
//! - Attributes: borrowed `AttributeView` or owned `AttributeSnapshot`
//!
//! ```no_run
//! use xmlfeed::{ingest_from_path, AttributeView, Attributes, IngestOptions, Visitor};
//!
//! struct Counter(usize);
//!
//! impl Visitor for Counter {
//!     fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
//!         if name == "item" && attrs.has_attribute("id") {
//!             self.0 += 1;
//!         }
//!     }
//! }
//!
//! let mut counter = Counter(0);
//! ingest_from_path("feed.xml.gz", &mut counter, IngestOptions::default())?;
//! println!("{} items", counter.0);
//! # Ok::<(), xmlfeed::ParseError>(())
//! ```

mod core;
pub mod error;
pub mod ingest;
pub mod reader;
pub mod sax;

pub use crate::core::{Phase, Position, ScanHandler, SyntaxError, SyntaxErrorCode, Tokenizer};
pub use error::{ErrorKind, Location, ParseError};
pub use ingest::{
    ingest_from_path, ingest_from_stream, DispatchState, Dispatcher, IngestOptions, Progress,
};
pub use reader::{CompressedSource, PlainSource, Source, DEFAULT_CHUNK_SIZE};
pub use sax::{parse_sax, AttributeSnapshot, AttributeView, Attributes, EventCollector, SaxEvent, Visitor};
