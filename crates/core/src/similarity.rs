//! Exact Jaccard verification of LSH candidates

use crate::lsh::CandidatePairs;
use crate::{Error, Result};
use corpusdedup_filters::ShingleSet;
use tracing::{debug, info};

/// Jaccard similarity `|A ∩ B| / |A ∪ B|` of two shingle sets.
///
/// Two empty sets are identical (1.0); an empty and a non-empty set share
/// nothing (0.0).
pub fn jaccard_similarity(a: &ShingleSet, b: &ShingleSet) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|s| large.contains(*s)).count();
    let union = a.len() + b.len() - intersection;

    intersection as f64 / union as f64
}

/// A candidate pair confirmed as near-duplicate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifiedEdge {
    pub a: usize,
    pub b: usize,
    pub similarity: f64,
}

/// Keeps candidate pairs whose exact similarity exceeds a threshold
#[derive(Debug, Clone, Copy)]
pub struct CandidateVerifier {
    threshold: f64,
}

impl CandidateVerifier {
    pub fn new(threshold: f64) -> Result<Self> {
        if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidConfig(format!(
                "jaccard threshold must be within [0.0, 1.0], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strict comparison: a similarity equal to the threshold is not a duplicate
    #[inline]
    pub fn is_duplicate(&self, similarity: f64) -> bool {
        similarity > self.threshold
    }

    /// Compute exact similarity for every candidate and keep the edges above
    /// the threshold, in candidate order.
    pub fn verify<'a, F>(&self, candidates: &CandidatePairs, shingles_of: F) -> Vec<VerifiedEdge>
    where
        F: Fn(usize) -> &'a ShingleSet,
    {
        let mut edges = Vec::new();

        for (a, b) in candidates.iter() {
            let similarity = jaccard_similarity(shingles_of(a), shingles_of(b));
            if self.is_duplicate(similarity) {
                debug!("Pair ({}, {}) verified at similarity {:.4}", a, b, similarity);
                edges.push(VerifiedEdge { a, b, similarity });
            }
        }

        info!(
            "Verified {} of {} candidate pairs above threshold {}",
            edges.len(),
            candidates.len(),
            self.threshold
        );

        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> ShingleSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_jaccard_basic() {
        let a = set(&["a", "b", "c"]);
        let b = set(&["b", "c", "d"]);
        assert_eq!(jaccard_similarity(&a, &b), 0.5);
        assert_eq!(jaccard_similarity(&b, &a), 0.5);
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_jaccard_disjoint() {
        assert_eq!(jaccard_similarity(&set(&["a"]), &set(&["b"])), 0.0);
    }

    #[test]
    fn test_jaccard_empty_sets() {
        let empty = ShingleSet::default();
        assert_eq!(jaccard_similarity(&empty, &empty), 1.0);
        assert_eq!(jaccard_similarity(&empty, &set(&["a"])), 0.0);
        assert_eq!(jaccard_similarity(&set(&["a"]), &empty), 0.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let verifier = CandidateVerifier::new(0.5).unwrap();
        assert!(!verifier.is_duplicate(0.5));
        assert!(verifier.is_duplicate(0.5000001));
        assert!(!verifier.is_duplicate(0.3));
    }

    #[test]
    fn test_threshold_one_never_matches() {
        let verifier = CandidateVerifier::new(1.0).unwrap();
        assert!(!verifier.is_duplicate(1.0));
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(CandidateVerifier::new(-0.1).is_err());
        assert!(CandidateVerifier::new(1.1).is_err());
        assert!(CandidateVerifier::new(f64::NAN).is_err());
        assert!(CandidateVerifier::new(0.0).is_ok());
    }

    #[test]
    fn test_verify_keeps_edges_above_threshold() {
        let sets = vec![
            set(&["a", "b", "c"]),
            set(&["a", "b", "d"]),
            set(&["a", "b", "c", "d"]),
        ];
        let mut candidates = CandidatePairs::default();
        candidates.insert(0, 1);
        candidates.insert(0, 2);
        candidates.insert(1, 2);

        let verifier = CandidateVerifier::new(0.5).unwrap();
        let edges = verifier.verify(&candidates, |idx| &sets[idx]);

        // (0, 1) sits exactly at 0.5 and is dropped
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].a, edges[0].b), (0, 2));
        assert_eq!(edges[0].similarity, 0.75);
        assert_eq!((edges[1].a, edges[1].b), (1, 2));
    }
}
