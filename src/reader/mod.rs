//! Byte Sources
//!
//! The dispatcher pulls input through the [`Source`] trait, so one driving
//! loop serves every backend:
//! - `PlainSource`: borrows a caller-opened `Read` stream, never closes it
//! - `CompressedSource`: opens and owns a file, gunzipping it when it
//!   starts with the gzip magic

pub mod gzip;
pub mod plain;

use std::io::{self, Read};

pub use gzip::CompressedSource;
pub use plain::PlainSource;

/// Default chunk size for both source variants
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// A chunked byte supplier
pub trait Source {
    /// Read the next chunk into `buf`, returning the number of bytes
    /// written. Only a return of 0 means end of input.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Whether a read has already returned 0
    fn is_at_end(&self) -> bool;

    /// Raw bytes taken from the underlying handle so far (before any
    /// decompression)
    fn bytes_consumed(&self) -> u64;

    /// Total raw length, when known up front
    fn len_hint(&self) -> Option<u64> {
        None
    }

    /// Release the underlying handle. Safe to call more than once.
    fn close(&mut self) {}

    /// Short label for logs
    fn describe(&self) -> &'static str;
}

impl<S: Source + ?Sized> Source for &mut S {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_chunk(buf)
    }

    fn is_at_end(&self) -> bool {
        (**self).is_at_end()
    }

    fn bytes_consumed(&self) -> u64 {
        (**self).bytes_consumed()
    }

    fn len_hint(&self) -> Option<u64> {
        (**self).len_hint()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn describe(&self) -> &'static str {
        (**self).describe()
    }
}

/// `Read::read`, retried while it reports `Interrupted`
pub(crate) fn read_retrying<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
