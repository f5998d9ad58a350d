//! Error Wrapper
//!
//! Every failure surfaced by this crate is a [`ParseError`]: a kind, a
//! human-readable message and the document location it refers to, plus the
//! underlying I/O error when there is one.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::{Position, SyntaxError};

/// Broad category of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source could not be opened
    Open,
    /// Reading from the source failed mid-stream
    Read,
    /// The markup is not well-formed
    Malformed,
    /// Input ended with structure still open
    Incomplete,
    /// The progress callback asked to stop
    Aborted,
    /// Input was fed to a dispatcher that has already finished or failed
    Finished,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Open => "open",
            ErrorKind::Read => "read",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Incomplete => "incomplete",
            ErrorKind::Aborted => "aborted",
            ErrorKind::Finished => "finished",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path plus 1-based line and column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: u64,
    pub column: u64,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: u64, column: u64) -> Self {
        Location {
            path: path.into(),
            line,
            column,
        }
    }

    /// Line 1, column 1 of `path`
    pub fn start_of(path: impl Into<PathBuf>) -> Self {
        Self::new(path, 1, 1)
    }

    pub fn at(path: impl Into<PathBuf>, position: Position) -> Self {
        Self::new(path, position.line, position.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

/// The error type of every ingestion operation
#[derive(Debug, Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
    location: Location,
    #[source]
    source: Option<io::Error>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: Location) -> Self {
        ParseError {
            kind,
            message: message.into(),
            location,
            source: None,
        }
    }

    /// The source at `path` could not be opened
    pub fn open(path: impl Into<PathBuf>, err: io::Error) -> Self {
        ParseError {
            kind: ErrorKind::Open,
            message: format!("cannot open: {}", err),
            location: Location::start_of(path),
            source: Some(err),
        }
    }

    /// Reading failed after `location` had been reached
    pub fn read(location: Location, err: io::Error) -> Self {
        ParseError {
            kind: ErrorKind::Read,
            message: format!("read failed: {}", err),
            location,
            source: Some(err),
        }
    }

    /// The tokenizer rejected the input
    pub fn syntax(err: &SyntaxError, location: Location) -> Self {
        Self::new(err.code.kind(), err.describe(), location)
    }

    pub fn aborted(location: Location) -> Self {
        Self::new(ErrorKind::Aborted, "parse aborted by progress callback", location)
    }

    pub fn finished(location: Location) -> Self {
        Self::new(ErrorKind::Finished, "parser already finished", location)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn path(&self) -> &Path {
        &self.location.path
    }

    pub fn line(&self) -> u64 {
        self.location.line
    }

    pub fn column(&self) -> u64 {
        self.location.column
    }

    /// The underlying I/O error for `Open` and `Read` failures
    pub fn io_error(&self) -> Option<&io::Error> {
        self.source.as_ref()
    }
}
