//! Output directory writer
//!
//! Output files mirror input base names. Names ending in `.gz` are
//! gzip-compressed so the output stays readable by the same tooling as the
//! input. A discarding directory supports dry runs without touching disk.

use crate::lines::is_gzip;
use crate::{Error, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Target directory for deduplicated output
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: Option<PathBuf>,
}

impl OutputDir {
    /// Create the directory (recursively) if absent.
    ///
    /// Failure here is fatal for a run: nothing could be written.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|source| Error::OutputDir {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Writing output to {:?}", path);
        Ok(Self {
            root: Some(path.to_path_buf()),
        })
    }

    /// An output directory that discards everything written to it
    pub fn discard() -> Self {
        Self { root: None }
    }

    /// Whether writes are discarded
    pub fn is_discard(&self) -> bool {
        self.root.is_none()
    }

    /// Directory path, if writes are kept
    pub fn path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Destination path for an output name
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(name))
    }

    /// Create (truncating) an output file
    pub fn create_file(&self, name: &str) -> Result<OutputFile> {
        let Some(path) = self.path_for(name) else {
            return Ok(OutputFile {
                sink: Sink::Discard(io::sink()),
            });
        };

        let writer = BufWriter::new(File::create(&path)?);
        let sink = if is_gzip(&path) {
            Sink::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            Sink::Plain(writer)
        };
        debug!("Created output file {:?}", path);
        Ok(OutputFile { sink })
    }

    /// Write a whole document under `name`
    pub fn write_document(&self, name: &str, text: &str) -> Result<()> {
        let mut file = self.create_file(name)?;
        file.write_all(text.as_bytes())?;
        file.finish()
    }
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Discard(io::Sink),
}

/// A single output file; call [`OutputFile::finish`] to flush it
pub struct OutputFile {
    sink: Sink,
}

impl OutputFile {
    /// Flush buffered data and, for gzip output, write the trailer
    pub fn finish(self) -> Result<()> {
        match self.sink {
            Sink::Plain(mut w) => w.flush()?,
            Sink::Gzip(encoder) => encoder.finish()?.flush()?,
            Sink::Discard(_) => {}
        }
        Ok(())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.sink {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
            Sink::Discard(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
            Sink::Discard(w) => w.flush(),
        }
    }
}
