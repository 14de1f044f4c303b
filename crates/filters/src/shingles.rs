//! Word n-gram shingling
//!
//! Shingles are contiguous windows of `n` whitespace-separated words,
//! serialized with single spaces. Documents are compared as *sets* of
//! shingles, so duplicates collapse and order is irrelevant.

use crate::{Error, Result};
use ahash::AHashSet;

/// Set of word n-grams extracted from one document
pub type ShingleSet = AHashSet<String>;

/// Extracts word n-gram shingle sets from normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShingleExtractor {
    ngram_size: usize,
}

impl ShingleExtractor {
    /// Create an extractor for windows of `ngram_size` words
    pub fn new(ngram_size: usize) -> Result<Self> {
        if ngram_size == 0 {
            return Err(Error::InvalidConfig(
                "ngram size must be at least 1".to_string(),
            ));
        }
        Ok(Self { ngram_size })
    }

    /// Window size in words
    pub fn ngram_size(&self) -> usize {
        self.ngram_size
    }

    /// Extract the shingle set of `text`.
    ///
    /// Returns an empty set when the text has fewer than `ngram_size` words.
    pub fn extract(&self, text: &str) -> ShingleSet {
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.len() < self.ngram_size {
            return ShingleSet::default();
        }

        words
            .windows(self.ngram_size)
            .map(|window| window.join(" "))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> ShingleSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bigrams() {
        let extractor = ShingleExtractor::new(2).unwrap();
        assert_eq!(
            extractor.extract("the cat sat"),
            set(&["the cat", "cat sat"])
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let extractor = ShingleExtractor::new(1).unwrap();
        assert_eq!(extractor.extract("a b a b a"), set(&["a", "b"]));
    }

    #[test]
    fn test_exact_length() {
        let extractor = ShingleExtractor::new(3).unwrap();
        assert_eq!(extractor.extract("one two three"), set(&["one two three"]));
    }

    #[test]
    fn test_too_short_is_empty() {
        let extractor = ShingleExtractor::new(3).unwrap();
        assert!(extractor.extract("one two").is_empty());
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   ").is_empty());
    }

    #[test]
    fn test_irregular_whitespace() {
        let extractor = ShingleExtractor::new(2).unwrap();
        assert_eq!(extractor.extract(" a\t b \n"), set(&["a b"]));
    }

    #[test]
    fn test_zero_rejected() {
        assert!(ShingleExtractor::new(0).is_err());
    }
}
