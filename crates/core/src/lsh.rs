//! LSH banding over MinHash signatures
//!
//! A signature of `H` rows is cut into `num_bands` contiguous bands of
//! `rows_per_band = H / num_bands` rows; trailing rows that do not fill a
//! band are ignored. Documents whose signatures agree on every row of some
//! band land in the same bucket and every pair in a bucket becomes a
//! candidate.
//!
//! More rows per band demand more sketch agreement (fewer false positives,
//! lower recall); more bands give a pair more chances to collide (higher
//! recall, more false positives). Candidates are a superset to be verified,
//! not a verdict.

use crate::minhash::MinHashSignature;
use crate::{Error, Result};
use ahash::AHashMap;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Deduplicated, unordered candidate pairs stored as `(smaller, larger)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePairs {
    pairs: BTreeSet<(usize, usize)>,
    /// Buckets (across all bands) holding two or more documents
    pub colliding_buckets: usize,
}

impl CandidatePairs {
    /// Add a pair in canonical order; self-pairs are ignored
    pub fn insert(&mut self, a: usize, b: usize) -> bool {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => self.pairs.insert((a, b)),
            std::cmp::Ordering::Greater => self.pairs.insert((b, a)),
            std::cmp::Ordering::Equal => false,
        }
    }

    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&(a.min(b), a.max(b)))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in ascending order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs.iter().copied()
    }
}

/// Groups signatures into band buckets and emits candidate pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LshBander {
    num_bands: usize,
    rows_per_band: usize,
}

impl LshBander {
    /// Create a bander with explicit band geometry
    pub fn new(num_bands: usize, rows_per_band: usize) -> Result<Self> {
        if num_bands == 0 || rows_per_band == 0 {
            return Err(Error::InvalidConfig(format!(
                "LSH needs at least one band of one row (got {} bands x {} rows)",
                num_bands, rows_per_band
            )));
        }
        Ok(Self {
            num_bands,
            rows_per_band,
        })
    }

    /// Split `hash_count` signature rows into `band_count` bands
    pub fn for_signature_len(hash_count: usize, band_count: usize) -> Result<Self> {
        if band_count == 0 {
            return Err(Error::InvalidConfig("band count must be at least 1".to_string()));
        }
        if band_count > hash_count {
            return Err(Error::InvalidConfig(format!(
                "band count {} exceeds hash count {}",
                band_count, hash_count
            )));
        }

        let bander = Self::new(band_count, hash_count / band_count)?;
        let unused = bander.unused_rows(hash_count);
        if unused > 0 {
            warn!(
                "hash count {} is not divisible by band count {}; the last {} signature rows are unused",
                hash_count, band_count, unused
            );
        }
        info!(
            "Creating LSH bander with {} bands, {} rows per band",
            bander.num_bands, bander.rows_per_band
        );
        Ok(bander)
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Signature rows consulted by banding
    pub fn rows_used(&self) -> usize {
        self.num_bands * self.rows_per_band
    }

    /// Trailing rows of a `hash_count` signature that no band covers
    pub fn unused_rows(&self, hash_count: usize) -> usize {
        hash_count.saturating_sub(self.rows_used())
    }

    /// Probability that a pair with Jaccard similarity `s` becomes a
    /// candidate: `1 − (1 − s^r)^b`.
    pub fn candidate_probability(&self, similarity: f64) -> f64 {
        let band_match = similarity.powi(self.rows_per_band as i32);
        1.0 - (1.0 - band_match).powi(self.num_bands as i32)
    }

    /// Collect candidate pairs over a slice of signatures
    pub fn candidate_pairs(&self, signatures: &[MinHashSignature]) -> CandidatePairs {
        self.candidate_pairs_by(signatures.len(), |idx| &signatures[idx])
    }

    /// Collect candidate pairs over `count` documents, reading each
    /// signature through `signature_of`.
    ///
    /// Buckets are keyed by the exact band slice and rebuilt for each band.
    /// Signatures too short to cover every band are skipped.
    pub fn candidate_pairs_by<'a, F>(&self, count: usize, signature_of: F) -> CandidatePairs
    where
        F: Fn(usize) -> &'a MinHashSignature,
    {
        let mut candidates = CandidatePairs::default();
        let rows_used = self.rows_used();

        let eligible: Vec<(usize, &'a MinHashSignature)> = (0..count)
            .map(|idx| (idx, signature_of(idx)))
            .filter(|(idx, signature)| {
                let ok = signature.num_hashes() >= rows_used;
                if !ok {
                    warn!(
                        "Signature {} has {} rows but banding needs {}; skipping",
                        idx,
                        signature.num_hashes(),
                        rows_used
                    );
                }
                ok
            })
            .collect();

        for band_idx in 0..self.num_bands {
            let start = band_idx * self.rows_per_band;
            let end = start + self.rows_per_band;

            let mut buckets: AHashMap<&'a [u64], Vec<usize>> = AHashMap::new();
            for &(doc_idx, signature) in &eligible {
                buckets
                    .entry(signature.band(start, end))
                    .or_default()
                    .push(doc_idx);
            }

            let mut colliding = 0;
            for members in buckets.values().filter(|members| members.len() > 1) {
                colliding += 1;
                for (i, &a) in members.iter().enumerate() {
                    for &b in &members[i + 1..] {
                        candidates.insert(a, b);
                    }
                }
            }
            candidates.colliding_buckets += colliding;

            debug!(
                "Band {}: {} buckets, {} with collisions",
                band_idx,
                buckets.len(),
                colliding
            );
        }

        info!(
            "LSH banding produced {} candidate pairs from {} colliding buckets",
            candidates.len(),
            candidates.colliding_buckets
        );

        candidates
    }
}
