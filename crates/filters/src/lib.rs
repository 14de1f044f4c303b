//! Text filters for near-duplicate detection
//!
//! This crate provides the canonical text normalization and the word
//! n-gram shingling that MinHash signatures are computed over.

pub mod error;
pub mod shingles;
pub mod text_preprocessing;

pub use error::{Error, Result};
pub use shingles::{ShingleExtractor, ShingleSet};
pub use text_preprocessing::TextNormalizer;
