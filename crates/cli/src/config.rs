//! Configuration file support for deduplication runs
//!
//! A config file may carry a `near_dups` section, an `exact_lines`
//! section, or both. Every field is optional in the file; command-line
//! flags override file values and the merged result must supply every
//! required near-duplicate option.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use corpusdedup_core::{ClusterPolicy, NearDupConfig, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level config file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DedupConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub near_dups: Option<NearDupSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_lines: Option<ExactLineSettings>,
}

impl DedupConfigFile {
    /// Load configuration from a file (YAML or TOML)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        match extension {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            _ => Err(anyhow::anyhow!(
                "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
                extension
            )),
        }
    }
}

/// Cluster selection policy as spelled on the command line and in files
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyArg {
    /// Connected components: similarity chains collapse to one survivor
    Transitive,
    /// Only documents directly similar to a kept document are removed
    Greedy,
}

impl From<PolicyArg> for ClusterPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Transitive => ClusterPolicy::Transitive,
            PolicyArg::Greedy => ClusterPolicy::Greedy,
        }
    }
}

/// Near-duplicate options, any of which may be absent from one source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearDupSettings {
    pub hash_count: Option<usize>,
    pub band_count: Option<usize>,
    pub ngram_size: Option<usize>,
    pub jaccard_threshold: Option<f64>,
    pub seed: Option<u64>,
    pub policy: Option<PolicyArg>,
}

impl NearDupSettings {
    /// Layer `overrides` on top of these settings
    pub fn merge(self, overrides: NearDupSettings) -> NearDupSettings {
        NearDupSettings {
            hash_count: overrides.hash_count.or(self.hash_count),
            band_count: overrides.band_count.or(self.band_count),
            ngram_size: overrides.ngram_size.or(self.ngram_size),
            jaccard_threshold: overrides.jaccard_threshold.or(self.jaccard_threshold),
            seed: overrides.seed.or(self.seed),
            policy: overrides.policy.or(self.policy),
        }
    }

    /// Build a validated detector configuration.
    ///
    /// The four sizing options have no defaults; `seed` and `policy` do.
    pub fn into_config(self) -> Result<NearDupConfig> {
        let mut missing = Vec::new();
        if self.hash_count.is_none() {
            missing.push("hash_count (--hash-count)");
        }
        if self.band_count.is_none() {
            missing.push("band_count (--band-count)");
        }
        if self.ngram_size.is_none() {
            missing.push("ngram_size (--ngram-size)");
        }
        if self.jaccard_threshold.is_none() {
            missing.push("jaccard_threshold (--threshold)");
        }

        let (Some(hash_count), Some(band_count), Some(ngram_size), Some(threshold)) =
            (self.hash_count, self.band_count, self.ngram_size, self.jaccard_threshold)
        else {
            bail!("Missing required near-duplicate options: {}", missing.join(", "));
        };

        let config = NearDupConfig::new(hash_count, band_count, ngram_size, threshold)
            .with_seed(self.seed.unwrap_or(DEFAULT_SEED))
            .with_policy(self.policy.map(ClusterPolicy::from).unwrap_or_default());
        config.validate()?;
        Ok(config)
    }
}

/// How pass 1 of exact-line deduplication counts lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountingMode {
    #[default]
    Exact,
    Approximate,
}

/// Exact-line options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExactLineSettings {
    pub counting: Option<CountingMode>,
    /// Capacity hint for approximate counting
    pub expected_lines: Option<usize>,
}

/// Resolved line counting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCounting {
    Exact,
    Approximate { expected_lines: usize },
}

impl ExactLineSettings {
    pub fn merge(self, overrides: ExactLineSettings) -> ExactLineSettings {
        ExactLineSettings {
            counting: overrides.counting.or(self.counting),
            expected_lines: overrides.expected_lines.or(self.expected_lines),
        }
    }

    pub fn resolve(self) -> Result<LineCounting> {
        match self.counting.unwrap_or_default() {
            CountingMode::Exact => Ok(LineCounting::Exact),
            CountingMode::Approximate => match self.expected_lines {
                Some(0) => bail!("expected_lines must be at least 1"),
                Some(expected_lines) => Ok(LineCounting::Approximate { expected_lines }),
                None => bail!("Approximate counting needs expected_lines (--expected-lines)"),
            },
        }
    }
}
