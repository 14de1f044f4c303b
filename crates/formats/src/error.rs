//! Error types for corpus I/O

use std::path::PathBuf;
use thiserror::Error;

/// Corpus I/O errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Cannot create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for corpus I/O operations
pub type Result<T> = std::result::Result<T, Error>;
