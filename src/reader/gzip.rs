//! Compressed Source
//!
//! Opens a file and owns the handle. A file starting with the gzip magic
//! (`1f 8b`) is decompressed transparently, including multi-member
//! archives; anything else is read as-is.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::bufread::MultiGzDecoder;

use super::{read_retrying, Source, DEFAULT_CHUNK_SIZE};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Counts the raw bytes pulled through a reader
struct Counted<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.count += read as u64;
        Ok(read)
    }
}

type Raw = BufReader<Counted<File>>;

enum Inner {
    Gzip(MultiGzDecoder<Raw>),
    Plain(Raw),
}

impl Inner {
    fn raw(&self) -> &Raw {
        match self {
            Inner::Gzip(decoder) => decoder.get_ref(),
            Inner::Plain(raw) => raw,
        }
    }
}

/// File source with transparent gzip decompression
pub struct CompressedSource {
    path: PathBuf,
    /// `None` once closed
    inner: Option<Inner>,
    file_len: Option<u64>,
    /// Raw bytes consumed when the handle was closed
    consumed_at_close: u64,
    eof: bool,
}

impl CompressedSource {
    /// Open `path`, sniffing for the gzip magic
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata().ok().map(|m| m.len());

        let mut raw = BufReader::with_capacity(DEFAULT_CHUNK_SIZE, Counted { inner: file, count: 0 });
        let gzip = loop {
            match raw.fill_buf() {
                Ok(head) => break head.starts_with(&GZIP_MAGIC),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        log::debug!(
            "opened {} ({}, {} bytes)",
            path.display(),
            if gzip { "gzip" } else { "raw" },
            file_len.map_or_else(|| "unknown".to_string(), |len| len.to_string())
        );

        let inner = if gzip {
            Inner::Gzip(MultiGzDecoder::new(raw))
        } else {
            Inner::Plain(raw)
        };

        Ok(CompressedSource {
            path: path.to_path_buf(),
            inner: Some(inner),
            file_len,
            consumed_at_close: 0,
            eof: false,
        })
    }

    /// Path this source was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file is being gunzipped
    pub fn is_compressed(&self) -> bool {
        matches!(self.inner, Some(Inner::Gzip(_)))
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Source for CompressedSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = match &mut self.inner {
            Some(Inner::Gzip(decoder)) => read_retrying(decoder, buf)?,
            Some(Inner::Plain(raw)) => read_retrying(raw, buf)?,
            None => 0,
        };
        if read == 0 {
            self.eof = true;
        }
        Ok(read)
    }

    fn is_at_end(&self) -> bool {
        self.eof
    }

    fn bytes_consumed(&self) -> u64 {
        match &self.inner {
            // Bytes still sitting in the BufReader are not consumed yet
            Some(inner) => {
                let raw = inner.raw();
                raw.get_ref().count.saturating_sub(raw.buffer().len() as u64)
            }
            None => self.consumed_at_close,
        }
    }

    fn len_hint(&self) -> Option<u64> {
        self.file_len
    }

    fn close(&mut self) {
        if self.inner.is_some() {
            self.consumed_at_close = self.bytes_consumed();
            self.inner = None;
            log::debug!("closed {}", self.path.display());
        }
    }

    fn describe(&self) -> &'static str {
        if self.is_compressed() {
            "gzip"
        } else {
            "file"
        }
    }
}

impl Drop for CompressedSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn read_all(source: &mut CompressedSource) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let read = source.read_chunk(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            out.extend_from_slice(&buf[..read]);
        }
        out
    }

    #[test]
    fn test_gzip_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<doc>compressed</doc>").unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();

        let mut source = CompressedSource::open(file.path()).unwrap();
        assert!(source.is_compressed());
        assert_eq!(read_all(&mut source), b"<doc>compressed</doc>");
        assert!(source.is_at_end());
        assert_eq!(Some(source.bytes_consumed()), source.len_hint());
    }

    #[test]
    fn test_raw_file_passthrough() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<doc>plain</doc>").unwrap();

        let mut source = CompressedSource::open(file.path()).unwrap();
        assert!(!source.is_compressed());
        assert_eq!(source.describe(), "file");
        assert_eq!(read_all(&mut source), b"<doc>plain</doc>");
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<a/>").unwrap();

        let mut source = CompressedSource::open(file.path()).unwrap();
        source.close();
        source.close();
        assert!(source.is_closed());
        let mut buf = [0u8; 4];
        assert_eq!(source.read_chunk(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_missing_file() {
        let err = CompressedSource::open("/definitely/not/here.xml").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
