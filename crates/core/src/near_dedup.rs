//! Near-duplicate document detection
//!
//! Pipeline: load → normalize → shingle → MinHash → LSH banding → exact
//! Jaccard verification → cluster selection → write survivors.
//!
//! Per-document preparation runs in parallel on the rayon pool; banding,
//! verification and clustering need the whole corpus and run sequentially
//! afterwards.

use crate::cluster::{ClusterPolicy, ClusterSelection, SimilarityGraph};
use crate::failure::{FailureStage, FileFailure};
use crate::lsh::{CandidatePairs, LshBander};
use crate::minhash::{MinHashSignature, MinHasher, DEFAULT_SEED};
use crate::similarity::{CandidateVerifier, VerifiedEdge};
use crate::{Error, Result};
use corpusdedup_filters::{ShingleExtractor, ShingleSet, TextNormalizer};
use ahash::AHashSet;
use corpusdedup_formats::{base_name_collisions, OutputDir, SourceDocument};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration for near-duplicate detection
#[derive(Debug, Clone, PartialEq)]
pub struct NearDupConfig {
    /// Number of MinHash functions (signature length)
    pub hash_count: usize,
    /// Number of LSH bands
    pub band_count: usize,
    /// Shingle size in words
    pub ngram_size: usize,
    /// Pairs must be strictly more similar than this to be duplicates
    pub jaccard_threshold: f64,
    /// Seed for the MinHash coefficients
    pub seed: u64,
    pub policy: ClusterPolicy,
}

impl NearDupConfig {
    /// Create a configuration with the default seed and transitive clustering
    pub fn new(hash_count: usize, band_count: usize, ngram_size: usize, jaccard_threshold: f64) -> Self {
        Self {
            hash_count,
            band_count,
            ngram_size,
            jaccard_threshold,
            seed: DEFAULT_SEED,
            policy: ClusterPolicy::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_policy(mut self, policy: ClusterPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rows per LSH band; trailing `hash_count % band_count` rows are unused
    pub fn rows_per_band(&self) -> usize {
        if self.band_count == 0 {
            0
        } else {
            self.hash_count / self.band_count
        }
    }

    /// Check option ranges
    pub fn validate(&self) -> Result<()> {
        if self.hash_count == 0 {
            return Err(Error::InvalidConfig("hash count must be at least 1".to_string()));
        }
        if self.band_count == 0 {
            return Err(Error::InvalidConfig("band count must be at least 1".to_string()));
        }
        if self.band_count > self.hash_count {
            return Err(Error::InvalidConfig(format!(
                "band count {} exceeds hash count {}: bands would have zero rows",
                self.band_count, self.hash_count
            )));
        }
        if self.ngram_size == 0 {
            return Err(Error::InvalidConfig("ngram size must be at least 1".to_string()));
        }
        if self.jaccard_threshold.is_nan() || !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(Error::InvalidConfig(format!(
                "jaccard threshold must be within [0.0, 1.0], got {}",
                self.jaccard_threshold
            )));
        }
        Ok(())
    }
}

/// A prepared document ready for banding and verification
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    /// Original, unmodified text
    pub text: String,
    pub shingles: ShingleSet,
    pub signature: MinHashSignature,
}

/// Stage of a near-duplicate run, reported to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NearDupStage {
    Load,
    Prepare,
    Band,
    Verify,
    Cluster,
    Write,
}

impl NearDupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NearDupStage::Load => "load",
            NearDupStage::Prepare => "prepare",
            NearDupStage::Band => "band",
            NearDupStage::Verify => "verify",
            NearDupStage::Cluster => "cluster",
            NearDupStage::Write => "write",
        }
    }
}

/// Statistics for a near-duplicate run
#[derive(Debug, Clone, Default)]
pub struct NearDupStats {
    pub documents_loaded: usize,
    pub load_failures: usize,
    /// Documents with fewer words than the shingle size
    pub empty_documents: usize,
    pub candidate_pairs: usize,
    pub verified_pairs: usize,
    pub clusters: usize,
    pub documents_removed: usize,
    /// Distinct output files written
    pub documents_written: usize,
    /// Survivors whose output was replaced by a later survivor of the same name
    pub documents_overwritten: usize,
    pub write_failures: usize,
    pub failures: Vec<FileFailure>,
}

impl NearDupStats {
    /// Verified pairs as a percentage of LSH candidates
    pub fn lsh_precision(&self) -> f64 {
        if self.candidate_pairs == 0 {
            0.0
        } else {
            (self.verified_pairs as f64 / self.candidate_pairs as f64) * 100.0
        }
    }

    /// Removed documents as a percentage of loaded documents
    pub fn removal_rate(&self) -> f64 {
        if self.documents_loaded == 0 {
            0.0
        } else {
            (self.documents_removed as f64 / self.documents_loaded as f64) * 100.0
        }
    }
}

/// A verified edge between two named documents
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSummary {
    pub a: String,
    pub b: String,
    pub similarity: f64,
}

/// One duplicate cluster by document name
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub kept: String,
    pub removed: Vec<String>,
    /// Verified edges between members of the cluster
    pub edges: Vec<EdgeSummary>,
}

/// Outcome of a near-duplicate run
#[derive(Debug, Clone, Default)]
pub struct NearDupReport {
    pub stats: NearDupStats,
    pub clusters: Vec<ClusterSummary>,
    /// Names of removed documents in index order
    pub removed: Vec<String>,
}

/// Outcome of writing surviving documents
#[derive(Debug, Clone, Default)]
pub struct WriteOutcome {
    pub written: usize,
    pub overwritten: usize,
    pub failures: Vec<FileFailure>,
}

/// Corpus-wide detection result over prepared documents
#[derive(Debug, Clone)]
pub struct Detection {
    pub candidates: CandidatePairs,
    pub edges: Vec<VerifiedEdge>,
    pub selection: ClusterSelection,
}

impl Detection {
    /// Name each cluster and its verified internal edges
    pub fn summarize(&self, documents: &[Document]) -> Vec<ClusterSummary> {
        self.selection
            .clusters
            .iter()
            .map(|cluster| {
                let edges = self
                    .edges
                    .iter()
                    .filter(|e| {
                        cluster.members.binary_search(&e.a).is_ok()
                            && cluster.members.binary_search(&e.b).is_ok()
                    })
                    .map(|e| EdgeSummary {
                        a: documents[e.a].name.clone(),
                        b: documents[e.b].name.clone(),
                        similarity: e.similarity,
                    })
                    .collect();

                ClusterSummary {
                    kept: documents[cluster.representative].name.clone(),
                    removed: cluster
                        .removed()
                        .iter()
                        .map(|&idx| documents[idx].name.clone())
                        .collect(),
                    edges,
                }
            })
            .collect()
    }
}

/// Near-duplicate detector built from a validated configuration
pub struct NearDuplicateDetector {
    config: NearDupConfig,
    normalizer: TextNormalizer,
    shingler: ShingleExtractor,
    hasher: MinHasher,
    bander: LshBander,
    verifier: CandidateVerifier,
}

impl NearDuplicateDetector {
    pub fn new(config: NearDupConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Creating NearDuplicateDetector: {} hashes, {} bands, {}-gram shingles, threshold {}, {} clustering",
            config.hash_count, config.band_count, config.ngram_size, config.jaccard_threshold, config.policy
        );

        Ok(Self {
            normalizer: TextNormalizer::canonical(),
            shingler: ShingleExtractor::new(config.ngram_size)?,
            hasher: MinHasher::new(config.hash_count, config.seed),
            bander: LshBander::for_signature_len(config.hash_count, config.band_count)?,
            verifier: CandidateVerifier::new(config.jaccard_threshold)?,
            config,
        })
    }

    pub fn config(&self) -> &NearDupConfig {
        &self.config
    }

    /// Normalize, shingle and sign one document
    pub fn prepare(&self, source: SourceDocument) -> Document {
        let normalized = self.normalizer.normalize(&source.text);
        let shingles = self.shingler.extract(&normalized);
        let signature = self.hasher.sign(&shingles);

        if shingles.is_empty() {
            debug!(
                "{} has fewer than {} words after normalization",
                source.name,
                self.shingler.ngram_size()
            );
        }

        Document {
            name: source.name,
            path: source.path,
            text: source.text,
            shingles,
            signature,
        }
    }

    /// Prepare every document in parallel, keeping input order
    pub fn prepare_all(&self, sources: Vec<SourceDocument>) -> Vec<Document> {
        sources
            .into_par_iter()
            .map(|source| self.prepare(source))
            .collect()
    }

    /// Load inputs, skipping unreadable files
    pub fn load_corpus(&self, inputs: &[PathBuf]) -> (Vec<SourceDocument>, Vec<FileFailure>) {
        base_name_collisions(inputs);

        let mut documents = Vec::with_capacity(inputs.len());
        let mut failures = Vec::new();

        for path in inputs {
            match SourceDocument::load(path) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    warn!("Error reading {:?}: {}", path, e);
                    failures.push(FileFailure::new(path, FailureStage::Load, &e));
                }
            }
        }

        info!("Loaded {} of {} documents", documents.len(), inputs.len());
        (documents, failures)
    }

    /// Band, verify and cluster prepared documents
    pub fn detect(&self, documents: &[Document]) -> Detection {
        self.detect_with_progress(documents, |_| {})
    }

    fn detect_with_progress<F>(&self, documents: &[Document], mut on_stage: F) -> Detection
    where
        F: FnMut(NearDupStage),
    {
        let candidates = self
            .bander
            .candidate_pairs_by(documents.len(), |idx| &documents[idx].signature);
        on_stage(NearDupStage::Band);

        let edges = self
            .verifier
            .verify(&candidates, |idx| &documents[idx].shingles);
        on_stage(NearDupStage::Verify);

        let graph = SimilarityGraph::from_edges(documents.len(), edges);
        let selection = graph.select(self.config.policy);
        let edges = graph.into_edges();
        on_stage(NearDupStage::Cluster);

        Detection {
            candidates,
            edges,
            selection,
        }
    }

    /// Write the original text of every surviving document.
    ///
    /// Survivors sharing a name write to the same file; the later one wins.
    pub fn write_survivors(
        &self,
        documents: &[Document],
        selection: &ClusterSelection,
        output: &OutputDir,
    ) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();
        let mut names: AHashSet<&str> = AHashSet::new();

        for (idx, doc) in documents.iter().enumerate() {
            if selection.is_removed(idx) {
                continue;
            }
            match output.write_document(&doc.name, &doc.text) {
                Ok(()) => {
                    if !names.insert(doc.name.as_str()) {
                        debug!("{} from {:?} replaced an earlier output", doc.name, doc.path);
                        outcome.overwritten += 1;
                    }
                }
                Err(e) => {
                    warn!("Error writing {} from {:?}: {}", doc.name, doc.path, e);
                    outcome.failures.push(FileFailure::new(&doc.path, FailureStage::Write, &e));
                }
            }
        }

        outcome.written = names.len();
        outcome
    }

    /// Run the full pipeline over `inputs`
    pub fn run(&self, inputs: &[PathBuf], output: &OutputDir) -> NearDupReport {
        self.run_with_progress(inputs, output, |_| {})
    }

    /// Run the full pipeline, calling `on_stage` as each stage completes
    pub fn run_with_progress<F>(&self, inputs: &[PathBuf], output: &OutputDir, mut on_stage: F) -> NearDupReport
    where
        F: FnMut(NearDupStage),
    {
        let mut stats = NearDupStats::default();

        let (sources, load_failures) = self.load_corpus(inputs);
        stats.documents_loaded = sources.len();
        stats.load_failures = load_failures.len();
        stats.failures.extend(load_failures);
        on_stage(NearDupStage::Load);

        let documents = self.prepare_all(sources);
        stats.empty_documents = documents.iter().filter(|d| d.shingles.is_empty()).count();
        on_stage(NearDupStage::Prepare);

        let detection = self.detect_with_progress(&documents, &mut on_stage);
        stats.candidate_pairs = detection.candidates.len();
        stats.verified_pairs = detection.edges.len();
        stats.clusters = detection.selection.clusters.len();
        stats.documents_removed = detection.selection.removed.len();

        let outcome = self.write_survivors(&documents, &detection.selection, output);
        stats.documents_written = outcome.written;
        stats.documents_overwritten = outcome.overwritten;
        stats.write_failures = outcome.failures.len();
        stats.failures.extend(outcome.failures);
        on_stage(NearDupStage::Write);

        info!(
            "Near-duplicate dedup complete: removed {} of {} documents in {} clusters",
            stats.documents_removed, stats.documents_loaded, stats.clusters
        );

        let clusters = detection.summarize(&documents);
        let removed = detection
            .selection
            .removed
            .iter()
            .map(|&idx| documents[idx].name.clone())
            .collect();

        NearDupReport {
            stats,
            clusters,
            removed,
        }
    }
}

/// Remove near-duplicate documents from `inputs`, writing survivors to
/// `output_dir`.
///
/// Fails on invalid configuration or if the output directory cannot be
/// created; per-file failures are reported in the returned statistics.
pub fn near_duplicate_dedup<P: AsRef<Path>>(
    inputs: &[PathBuf],
    output_dir: P,
    config: NearDupConfig,
) -> Result<NearDupReport> {
    let detector = NearDuplicateDetector::new(config)?;
    let output = OutputDir::create(output_dir)?;
    Ok(detector.run(inputs, &output))
}
