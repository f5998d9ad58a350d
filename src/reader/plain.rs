//! Plain Source
//!
//! Reads from any stream implementing `Read`. The stream is borrowed: the
//! caller opened it and the caller closes it.

use std::io::{self, Read};

use super::{read_retrying, Source};

/// Source over a caller-owned stream
pub struct PlainSource<'r, R: Read + ?Sized> {
    reader: &'r mut R,
    consumed: u64,
    eof: bool,
    len_hint: Option<u64>,
}

impl<'r, R: Read + ?Sized> PlainSource<'r, R> {
    /// Create a new plain source
    pub fn new(reader: &'r mut R) -> Self {
        PlainSource {
            reader,
            consumed: 0,
            eof: false,
            len_hint: None,
        }
    }

    /// Declare the stream's total length so progress can be reported
    pub fn with_len_hint(mut self, len: u64) -> Self {
        self.len_hint = Some(len);
        self
    }
}

impl<R: Read + ?Sized> Source for PlainSource<'_, R> {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }
        let read = read_retrying(self.reader, buf)?;
        if read == 0 {
            self.eof = true;
        }
        self.consumed += read as u64;
        Ok(read)
    }

    fn is_at_end(&self) -> bool {
        self.eof
    }

    fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    fn len_hint(&self) -> Option<u64> {
        self.len_hint
    }

    fn describe(&self) -> &'static str {
        "plain"
    }
}
