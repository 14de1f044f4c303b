//! Core deduplication logic for text corpora
//!
//! This crate provides corpus-wide exact-line deduplication and
//! MinHash/LSH near-duplicate document detection.

pub mod cluster;
pub mod error;
pub mod exact_dedup;
pub mod failure;
pub mod hash;
pub mod line_counter;
pub mod lsh;
pub mod minhash;
pub mod near_dedup;
pub mod similarity;

pub use cluster::{Cluster, ClusterPolicy, ClusterSelection, SimilarityGraph};
pub use error::{Error, Result};
pub use exact_dedup::{exact_line_dedup, ExactLineDeduplicator, LineDedupStats, LinePass};
pub use failure::{FailureStage, FileFailure};
pub use line_counter::{ApproximateLineCounts, ExactLineCounts, LineCounter};
pub use lsh::{CandidatePairs, LshBander};
pub use minhash::{HashCoefficients, MinHashSignature, MinHasher, DEFAULT_SEED};
pub use near_dedup::{
    near_duplicate_dedup, ClusterSummary, NearDupConfig, NearDupReport, NearDupStage, NearDupStats,
    NearDuplicateDetector, WriteOutcome,
};
pub use similarity::{jaccard_similarity, CandidateVerifier, VerifiedEdge};
