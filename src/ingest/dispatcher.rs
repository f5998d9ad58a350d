//! Event Dispatcher
//!
//! Drives the tokenizer across chunk boundaries and forwards its events to
//! a [`Visitor`] as they happen. A dispatcher is single-use:
//!
//! ```text
//! Idle --feed/finish--> Parsing --finish ok--> Finished
//!                          |
//!                          +-- any error -----> Failed
//! ```
//!
//! Feeding a Finished or Failed dispatcher is an error.

use std::io;
use std::path::{Path, PathBuf};

use super::{IngestOptions, Progress};
use crate::core::{ScanHandler, SyntaxError, Tokenizer};
use crate::error::{Location, ParseError};
use crate::reader::Source;
use crate::sax::{AttributeView, Visitor};

/// Lifecycle of a [`Dispatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing fed yet
    Idle,
    Parsing,
    Finished,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Finished | DispatchState::Failed)
    }
}

/// Forwards tokenizer events to the visitor, counting them
struct Forward<'v, V: ?Sized> {
    visitor: &'v mut V,
    events: u64,
}

impl<V: Visitor + ?Sized> ScanHandler for Forward<'_, V> {
    #[inline]
    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
        self.events += 1;
        self.visitor.start_element(name, attrs);
    }

    #[inline]
    fn end_element(&mut self, name: &str) {
        self.events += 1;
        self.visitor.end_element(name);
    }

    #[inline]
    fn text(&mut self, text: &str) {
        self.events += 1;
        self.visitor.data(text);
    }

    #[inline]
    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.events += 1;
        self.visitor.pi(target, data);
    }

    #[inline]
    fn comment(&mut self, text: &str) {
        self.events += 1;
        self.visitor.comment(text);
    }
}

/// Push-side driver: chunks in, visitor calls out
pub struct Dispatcher {
    path: PathBuf,
    tokenizer: Tokenizer,
    state: DispatchState,
    chunks: u64,
    bytes: u64,
    events: u64,
}

impl Dispatcher {
    /// Create an idle dispatcher; `path` labels error locations
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Dispatcher {
            path: path.into(),
            tokenizer: Tokenizer::new(),
            state: DispatchState::Idle,
            chunks: 0,
            bytes: 0,
            events: 0,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chunks fed so far
    pub fn chunks_fed(&self) -> u64 {
        self.chunks
    }

    /// Bytes fed so far (after decompression)
    pub fn bytes_fed(&self) -> u64 {
        self.bytes
    }

    /// Visitor calls made so far, not counting `start_xml` / `end_xml`
    pub fn events_dispatched(&self) -> u64 {
        self.events
    }

    /// Location just past all input decoded so far
    pub fn location(&self) -> Location {
        Location::at(self.path.clone(), self.tokenizer.end_position())
    }

    /// Feed one chunk, forwarding every event it completes.
    ///
    /// The first call fires `start_xml`.
    pub fn feed<V: Visitor + ?Sized>(&mut self, chunk: &[u8], visitor: &mut V) -> Result<(), ParseError> {
        self.begin(visitor)?;

        let mut forward = Forward {
            visitor: &mut *visitor,
            events: 0,
        };
        let result = self.tokenizer.feed(chunk, &mut forward);
        self.events += forward.events;
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
        log::trace!(
            "chunk {}: {} bytes, {} events, depth {}",
            self.chunks,
            chunk.len(),
            forward.events,
            self.tokenizer.depth()
        );

        result.map_err(|err| self.fail(&err))
    }

    /// Signal end of input. On success fires `end_xml` and the dispatcher
    /// is Finished.
    pub fn finish<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<(), ParseError> {
        self.begin(visitor)?;

        let mut forward = Forward {
            visitor: &mut *visitor,
            events: 0,
        };
        let result = self.tokenizer.finish(&mut forward);
        self.events += forward.events;
        result.map_err(|err| self.fail(&err))?;

        self.state = DispatchState::Finished;
        visitor.end_xml();
        log::debug!(
            "finished {}: {} bytes in {} chunks, {} events",
            self.path.display(),
            self.bytes,
            self.chunks,
            self.events
        );
        Ok(())
    }

    /// Pull every chunk from `source` and finish. The source is closed on
    /// every path out.
    pub fn run<S, V>(mut self, mut source: S, visitor: &mut V, mut options: IngestOptions<'_>) -> Result<(), ParseError>
    where
        S: Source,
        V: Visitor + ?Sized,
    {
        log::debug!(
            "ingesting {} from {} source (chunk size {})",
            self.path.display(),
            source.describe(),
            options.chunk_size()
        );
        let result = self.drive(&mut source, visitor, &mut options);
        source.close();
        result
    }

    fn drive<S, V>(&mut self, source: &mut S, visitor: &mut V, options: &mut IngestOptions<'_>) -> Result<(), ParseError>
    where
        S: Source,
        V: Visitor + ?Sized,
    {
        self.begin(visitor)?;

        let interval = options.progress_interval();
        let mut buf = vec![0u8; options.chunk_size()];
        let mut percent = 0;
        loop {
            let read = source.read_chunk(&mut buf).map_err(|e| self.read_failed(e))?;
            if read == 0 {
                break;
            }
            self.feed(&buf[..read], visitor)?;

            if self.chunks % interval != 0 {
                continue;
            }
            let Some(progress) = options.progress_mut() else {
                continue;
            };
            // Without a known total the last percentage is repeated
            if let Some(total) = source.len_hint() {
                percent = percent_of(source.bytes_consumed(), total);
            }
            log::debug!("{}: {}%", self.path.display(), percent);
            if progress(percent) == Progress::Stop {
                log::warn!("{}: parse aborted by progress callback at {}%", self.path.display(), percent);
                self.state = DispatchState::Failed;
                return Err(ParseError::aborted(self.location()));
            }
        }

        self.finish(visitor)
    }

    fn begin<V: Visitor + ?Sized>(&mut self, visitor: &mut V) -> Result<(), ParseError> {
        match self.state {
            DispatchState::Idle => {
                visitor.start_xml();
                self.state = DispatchState::Parsing;
                Ok(())
            }
            DispatchState::Parsing => Ok(()),
            DispatchState::Finished | DispatchState::Failed => Err(ParseError::finished(self.location())),
        }
    }

    fn fail(&mut self, err: &SyntaxError) -> ParseError {
        self.state = DispatchState::Failed;
        let location = Location::at(self.path.clone(), self.tokenizer.location_of(err.offset));
        log::debug!("{}: {}", location, err);
        ParseError::syntax(err, location)
    }

    fn read_failed(&mut self, err: io::Error) -> ParseError {
        self.state = DispatchState::Failed;
        ParseError::read(self.location(), err)
    }
}

/// Completion percentage, clamped to 0..=100
fn percent_of(consumed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let consumed = u128::from(consumed.min(total));
    (consumed * 100 / u128::from(total)) as u8
}
