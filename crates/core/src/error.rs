//! Error types for the core deduplication engine

use thiserror::Error;

/// Core deduplication errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Format(#[from] corpusdedup_formats::Error),

    #[error(transparent)]
    Filter(#[from] corpusdedup_filters::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
