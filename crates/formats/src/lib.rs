//! Corpus I/O for text deduplication
//!
//! This crate provides lossy UTF-8 document loading, streaming line
//! readers that preserve original line terminators, and output
//! directories that mirror input base names.

pub mod document;
pub mod error;
pub mod lines;
pub mod paths;
pub mod writer;

pub use document::SourceDocument;
pub use error::{Error, Result};
pub use lines::{open_input, LineReader};
pub use paths::{base_name, base_name_collisions, expand_inputs};
pub use writer::{OutputDir, OutputFile};
