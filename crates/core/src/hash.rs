//! Hashing utilities for deduplication
//!
//! SeaHash has a fixed algorithm definition and no per-process seed, so
//! fingerprints and shingle hashes are identical across runs and platforms.

use seahash::hash;

/// Content fingerprint of a trimmed line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineFingerprint(pub u64);

impl LineFingerprint {
    /// Fingerprint a raw line; surrounding whitespace (including the
    /// terminator) does not contribute.
    pub fn of(line: &str) -> Self {
        Self(hash_string(line.trim()))
    }
}

/// Compute a 64-bit hash of the given bytes
pub fn compute_hash(data: &[u8]) -> u64 {
    hash(data)
}

/// Compute a hash from a string
pub fn hash_string(s: &str) -> u64 {
    compute_hash(s.as_bytes())
}
