//! Per-file failure records
//!
//! A failure on one input never aborts a run: it is logged, recorded here
//! and the file is skipped.

use std::fmt;
use std::path::PathBuf;

/// Stage of a run at which a file failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Exact-line pass 1
    Count,
    /// Exact-line pass 2
    Filter,
    /// Near-duplicate document loading
    Load,
    /// Near-duplicate output writing
    Write,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Count => "count",
            FailureStage::Filter => "filter",
            FailureStage::Load => "load",
            FailureStage::Write => "write",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file that was skipped because of an I/O failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, stage: FailureStage, error: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            stage,
            message: error.to_string(),
        }
    }
}
