//! Corpus-wide line occurrence counting
//!
//! The first pass of exact-line deduplication records every line
//! fingerprint; the second pass asks whether a fingerprint was seen
//! exactly once. Two counters are provided:
//!
//! - [`ExactLineCounts`]: a fingerprint → count table. Memory grows with
//!   the number of distinct lines in the corpus.
//! - [`ApproximateLineCounts`]: a pair of Bloom filters ("seen once",
//!   "seen twice") with fixed memory. A false positive in the second
//!   filter reports a unique line as a duplicate; unique lines are never
//!   kept twice.

use crate::hash::LineFingerprint;
use ahash::AHashMap;
use bloomfilter::Bloom;
use tracing::info;

/// False positive rate for the approximate counter's filters
const BLOOM_FP_RATE: f64 = 0.01;

/// Occurrence table consulted by exact-line deduplication
pub trait LineCounter {
    /// Record one occurrence of a line
    fn record(&mut self, fingerprint: LineFingerprint);

    /// Whether the line occurred exactly once across the corpus
    fn is_unique(&self, fingerprint: LineFingerprint) -> bool;

    /// Number of distinct fingerprints, if the counter tracks it
    fn distinct(&self) -> Option<usize>;
}

/// Exact fingerprint → occurrence count table
#[derive(Debug, Default)]
pub struct ExactLineCounts {
    counts: AHashMap<LineFingerprint, u32>,
}

impl ExactLineCounts {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Occurrence count of a fingerprint
    pub fn count(&self, fingerprint: LineFingerprint) -> u32 {
        self.counts.get(&fingerprint).copied().unwrap_or(0)
    }
}

impl LineCounter for ExactLineCounts {
    fn record(&mut self, fingerprint: LineFingerprint) {
        let count = self.counts.entry(fingerprint).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn is_unique(&self, fingerprint: LineFingerprint) -> bool {
        self.count(fingerprint) == 1
    }

    fn distinct(&self) -> Option<usize> {
        Some(self.counts.len())
    }
}

/// Fixed-memory counter built from two Bloom filters
pub struct ApproximateLineCounts {
    /// Fingerprints seen at least once
    seen: Bloom<LineFingerprint>,
    /// Fingerprints seen at least twice
    repeated: Bloom<LineFingerprint>,
}

impl ApproximateLineCounts {
    /// Create a counter sized for `expected_lines` distinct lines
    pub fn with_capacity(expected_lines: usize) -> Self {
        let capacity = expected_lines.max(1);
        info!(
            "Creating approximate line counter for {} lines at {}% false positive rate",
            capacity,
            BLOOM_FP_RATE * 100.0
        );
        Self {
            seen: Bloom::new_for_fp_rate(capacity, BLOOM_FP_RATE),
            repeated: Bloom::new_for_fp_rate(capacity, BLOOM_FP_RATE),
        }
    }

    /// Memory used by both filters in bytes
    pub fn memory_usage(&self) -> usize {
        ((self.seen.number_of_bits() + self.repeated.number_of_bits()) / 8) as usize
    }
}

impl LineCounter for ApproximateLineCounts {
    fn record(&mut self, fingerprint: LineFingerprint) {
        if self.seen.check_and_set(&fingerprint) {
            self.repeated.set(&fingerprint);
        }
    }

    fn is_unique(&self, fingerprint: LineFingerprint) -> bool {
        !self.repeated.check(&fingerprint)
    }

    fn distinct(&self) -> Option<usize> {
        None
    }
}
