//! Ingestion Entry Points
//!
//! `ingest_from_path` opens (and owns) a file, gunzipping it when needed;
//! `ingest_from_stream` reads a stream the caller already opened. Both run
//! the same [`Dispatcher`] loop and report failures as [`ParseError`].

pub mod dispatcher;

use std::fmt;
use std::io::Read;
use std::path::Path;

pub use dispatcher::{DispatchState, Dispatcher};

use crate::error::ParseError;
use crate::reader::{CompressedSource, PlainSource, DEFAULT_CHUNK_SIZE};
use crate::sax::Visitor;

/// Default number of chunks between progress reports
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 400;

/// Returned by a progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// Abort the parse with an `Aborted` error
    Stop,
}

type ProgressFn<'p> = Box<dyn FnMut(u8) -> Progress + 'p>;

/// Per-call ingestion settings
pub struct IngestOptions<'p> {
    chunk_size: usize,
    progress_interval: u64,
    progress: Option<ProgressFn<'p>>,
    len_hint: Option<u64>,
}

impl<'p> IngestOptions<'p> {
    pub fn new() -> Self {
        IngestOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            progress: None,
            len_hint: None,
        }
    }

    /// Bytes requested from the source per read (at least 1)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Chunks between progress reports (at least 1)
    pub fn with_progress_interval(mut self, chunks: u64) -> Self {
        self.progress_interval = chunks.max(1);
        self
    }

    /// Callback receiving a completion percentage in `0..=100`, called every
    /// `progress_interval` chunks. Returning [`Progress::Stop`] aborts.
    ///
    /// When the total length is unknown the percentage stays at 0.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(u8) -> Progress + 'p,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Total length of a stream passed to [`ingest_from_stream`]. Files
    /// opened by [`ingest_from_path`] use their own size instead.
    pub fn with_len_hint(mut self, len: u64) -> Self {
        self.len_hint = Some(len);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn progress_interval(&self) -> u64 {
        self.progress_interval
    }

    pub fn len_hint(&self) -> Option<u64> {
        self.len_hint
    }

    pub(crate) fn progress_mut(&mut self) -> Option<&mut ProgressFn<'p>> {
        self.progress.as_mut()
    }
}

impl Default for IngestOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IngestOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestOptions")
            .field("chunk_size", &self.chunk_size)
            .field("progress_interval", &self.progress_interval)
            .field("progress", &self.progress.is_some())
            .field("len_hint", &self.len_hint)
            .finish()
    }
}

/// Parse the file at `path`, which may be gzip-compressed.
pub fn ingest_from_path<V>(path: impl AsRef<Path>, visitor: &mut V, options: IngestOptions<'_>) -> Result<(), ParseError>
where
    V: Visitor + ?Sized,
{
    let path = path.as_ref();
    let source = CompressedSource::open(path).map_err(|e| ParseError::open(path, e))?;
    Dispatcher::new(path).run(source, visitor, options)
}

/// Parse an already-open stream. `path_for_errors` only labels error
/// locations; the stream is not closed.
pub fn ingest_from_stream<R, V>(
    stream: &mut R,
    visitor: &mut V,
    path_for_errors: impl AsRef<Path>,
    options: IngestOptions<'_>,
) -> Result<(), ParseError>
where
    R: Read + ?Sized,
    V: Visitor + ?Sized,
{
    let source = match options.len_hint() {
        Some(len) => PlainSource::new(stream).with_len_hint(len),
        None => PlainSource::new(stream),
    };
    Dispatcher::new(path_for_errors.as_ref()).run(source, visitor, options)
}
