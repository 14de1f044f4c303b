//! Streaming line reader
//!
//! Reads text files line-by-line with transparent gzip decompression.
//! Lines keep their original terminators so that surviving lines can be
//! written back exactly as they were read. Invalid UTF-8 is replaced with
//! U+FFFD rather than aborting the read.

use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Buffer size for file readers
const BUFFER_SIZE: usize = 64 * 1024;

/// Open an input file for buffered reading, decompressing `.gz` files.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if is_gzip(path) {
        debug!("Opening gzip-compressed input: {:?}", path);
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            GzDecoder::new(file),
        )))
    } else {
        debug!("Opening plain input: {:?}", path);
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Whether a path names a gzip-compressed file
pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("gz")
}

/// Streaming reader yielding raw lines, terminators included
pub struct LineReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    bytes_read: u64,
}

impl LineReader<Box<dyn BufRead>> {
    /// Open a file, auto-detecting gzip compression
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(open_input(path)?))
    }
}

impl<R: BufRead> LineReader<R> {
    /// Create a new line reader from any buffered source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
            line_number: 0,
            bytes_read: 0,
        }
    }

    /// Get the number of lines read so far
    pub fn lines_processed(&self) -> usize {
        self.line_number
    }

    /// Get the number of (decompressed) bytes read so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(n) => {
                self.bytes_read += n as u64;
                self.line_number += 1;
                // A newline byte never occurs inside a multi-byte UTF-8
                // sequence, so per-line lossy decoding matches whole-file
                // decoding.
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(Error::Io(e))),
        }
    }
}

/// Read an entire input (decompressing `.gz`) as lossy UTF-8 text.
pub fn read_to_string_lossy<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut reader = open_input(path)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
