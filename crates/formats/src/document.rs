//! Source document representation

use crate::lines::read_to_string_lossy;
use crate::paths::base_name;
use crate::Result;
use std::path::{Path, PathBuf};

/// A single input document: its stable name and its original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Base file name, used as the output name
    pub name: String,
    /// Path the document was loaded from
    pub path: PathBuf,
    /// Original, unmodified text
    pub text: String,
}

impl SourceDocument {
    /// Create a new document
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            text: text.into(),
        }
    }

    /// Load a document from disk, decoding invalid UTF-8 lossily
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = base_name(path)?;
        let text = read_to_string_lossy(path)?;
        Ok(Self::new(name, path, text))
    }

    /// Size of the original text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the original text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
