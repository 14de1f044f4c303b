//! MinHash signatures for near-duplicate detection
//!
//! Each of `H` hash functions has the affine form `(a·x + b) mod p` over
//! the Mersenne prime `p = 2^61 − 1`. The coefficients are drawn once from
//! a ChaCha20 generator seeded with an explicit seed and owned by the
//! signer, so the same seed always yields the same signatures and
//! independent signers in one process cannot interfere.
//!
//! Shingles are mapped to integers with SeaHash, which is stable across
//! processes and platforms. The minimum over a set does not depend on
//! iteration order, so hash-set ordering never leaks into signatures.

use crate::hash::hash_string;
use corpusdedup_filters::ShingleSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

/// Modulus of the affine hash functions (2^61 − 1)
pub const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// Signature component for documents without shingles.
///
/// Real components are always `< MERSENNE_PRIME`, so an empty document can
/// only share a band with another empty document.
pub const EMPTY_SLOT: u64 = u64::MAX;

/// Default seed for coefficient generation
pub const DEFAULT_SEED: u64 = 42;

/// Affine hash coefficients `(a, b)`, one pair per hash function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCoefficients {
    pairs: Vec<(u64, u64)>,
}

impl HashCoefficients {
    /// Draw `num_hashes` coefficient pairs uniformly from `[1, p)`
    pub fn generate(num_hashes: usize, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let pairs = (0..num_hashes)
            .map(|_| {
                let a = rng.gen_range(1..MERSENNE_PRIME);
                let b = rng.gen_range(1..MERSENNE_PRIME);
                (a, b)
            })
            .collect();
        Self { pairs }
    }

    /// Use explicit coefficient pairs
    pub fn from_pairs(pairs: Vec<(u64, u64)>) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(u64, u64)] {
        &self.pairs
    }
}

/// Apply `(a·x + b) mod p` without overflow
#[inline]
fn affine_hash(a: u64, b: u64, x: u64) -> u64 {
    let x = x % MERSENNE_PRIME;
    ((a as u128 * x as u128 + b as u128) % MERSENNE_PRIME as u128) as u64
}

/// MinHash signature for a document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinHashSignature {
    /// One minimum per hash function
    pub values: Vec<u64>,
}

impl MinHashSignature {
    /// Create a new MinHash signature
    pub fn new(values: Vec<u64>) -> Self {
        Self { values }
    }

    /// Sentinel signature for a document with no shingles
    pub fn empty(num_hashes: usize) -> Self {
        Self::new(vec![EMPTY_SLOT; num_hashes])
    }

    /// Get the number of hash functions used
    pub fn num_hashes(&self) -> usize {
        self.values.len()
    }

    /// Whether this is the empty-document sentinel
    pub fn is_empty_sentinel(&self) -> bool {
        self.values.iter().all(|&v| v == EMPTY_SLOT)
    }

    /// Signature rows `start..end`
    pub fn band(&self, start: usize, end: usize) -> &[u64] {
        &self.values[start..end]
    }

    /// Fraction of agreeing components, an estimate of Jaccard similarity.
    ///
    /// Returns 0.0 for signatures of different lengths.
    pub fn estimated_jaccard(&self, other: &MinHashSignature) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }

        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();

        matches as f64 / self.values.len() as f64
    }
}

/// MinHash signer owning its hash coefficients
#[derive(Debug, Clone)]
pub struct MinHasher {
    coefficients: HashCoefficients,
}

impl MinHasher {
    /// Create a signer with `num_hashes` functions drawn from `seed`
    pub fn new(num_hashes: usize, seed: u64) -> Self {
        info!(
            "Created MinHasher with {} hash functions (seed {})",
            num_hashes, seed
        );
        Self::with_coefficients(HashCoefficients::generate(num_hashes, seed))
    }

    /// Create a signer from explicit coefficients
    pub fn with_coefficients(coefficients: HashCoefficients) -> Self {
        Self { coefficients }
    }

    /// Signature length
    pub fn num_hashes(&self) -> usize {
        self.coefficients.len()
    }

    pub fn coefficients(&self) -> &HashCoefficients {
        &self.coefficients
    }

    /// Compute the signature of a shingle set
    pub fn sign(&self, shingles: &ShingleSet) -> MinHashSignature {
        self.sign_hashes(shingles.iter().map(|s| hash_string(s)))
    }

    /// Compute a signature from pre-hashed shingles.
    ///
    /// An empty input yields the [`EMPTY_SLOT`] sentinel signature.
    pub fn sign_hashes<I>(&self, shingle_hashes: I) -> MinHashSignature
    where
        I: IntoIterator<Item = u64>,
    {
        let mut values = vec![EMPTY_SLOT; self.num_hashes()];
        let mut shingle_count = 0usize;

        for shingle_hash in shingle_hashes {
            shingle_count += 1;
            for (slot, &(a, b)) in values.iter_mut().zip(self.coefficients.pairs()) {
                let hash_value = affine_hash(a, b, shingle_hash);
                if hash_value < *slot {
                    *slot = hash_value;
                }
            }
        }

        debug!("Generated MinHash signature over {} shingles", shingle_count);

        MinHashSignature::new(values)
    }
}
