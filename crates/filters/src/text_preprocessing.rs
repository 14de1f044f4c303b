//! Text normalization for near-duplicate detection
//!
//! Maps raw document text to the canonical form that is shingled. The
//! normalized form is only used for comparison; output always carries the
//! original text.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Text normalization configuration
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Apply Unicode canonical decomposition (NFD)
    pub unicode_decompose: bool,
    /// Convert to lowercase
    pub lowercase: bool,
    /// Delete characters that are not whitespace, letters (`L*`), numbers
    /// (`N*`) or `_`. Combining and spacing marks (`M*`) are deleted too.
    pub remove_punctuation: bool,
    /// Collapse each whitespace run into a single space
    pub collapse_whitespace: bool,
}

static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static PUNCTUATION_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_whitespace_regex() -> &'static Regex {
    WHITESPACE_REGEX.get_or_init(|| Regex::new(r"[\s\x1C-\x1F]+").expect("Failed to compile whitespace regex"))
}

// Keeps letters and numbers by general category; spacing marks with
// Other_Alphabetic (Devanagari vowel signs) are deleted.
fn get_punctuation_regex() -> &'static Regex {
    PUNCTUATION_REGEX.get_or_init(|| {
        Regex::new(r"[^\s\x1C-\x1F\p{L}\p{N}_]+").expect("Failed to compile punctuation regex")
    })
}

impl TextNormalizer {
    /// Create a new text normalizer with custom settings
    pub fn new(
        unicode_decompose: bool,
        lowercase: bool,
        remove_punctuation: bool,
        collapse_whitespace: bool,
    ) -> Self {
        Self {
            unicode_decompose,
            lowercase,
            remove_punctuation,
            collapse_whitespace,
        }
    }

    /// Canonical form used for shingling: every step enabled
    pub fn canonical() -> Self {
        Self::new(true, true, true, true)
    }

    /// Normalize text according to configuration
    ///
    /// Applies transformations in the following order:
    /// 1. Unicode canonical decomposition (if enabled)
    /// 2. Lowercase conversion (if enabled)
    /// 3. Punctuation removal (if enabled)
    /// 4. Whitespace collapsing (if enabled)
    ///
    /// Combining marks split off by decomposition are not alphanumeric, so
    /// with both 1 and 3 enabled accents are stripped (`café` → `cafe`).
    pub fn normalize(&self, text: &str) -> String {
        let mut buffer = String::with_capacity(text.len());
        self.normalize_into(text, &mut buffer);
        buffer
    }

    /// Normalize text into a reusable buffer
    pub fn normalize_into(&self, text: &str, buffer: &mut String) {
        buffer.clear();

        if self.unicode_decompose {
            buffer.extend(text.nfd());
        } else {
            buffer.push_str(text);
        }

        if self.lowercase {
            *buffer = buffer.to_lowercase();
        }

        if self.remove_punctuation {
            let stripped = get_punctuation_regex().replace_all(buffer, "").into_owned();
            *buffer = stripped;
        }

        if self.collapse_whitespace {
            let collapsed = get_whitespace_regex()
                .replace_all(buffer, " ")
                .into_owned();
            *buffer = collapsed;
        }
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::canonical()
    }
}
