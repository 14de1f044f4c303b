use corpusdedup_core::{
    exact_line_dedup, jaccard_similarity, near_duplicate_dedup, ClusterPolicy, ExactLineDeduplicator, LshBander,
    MinHasher, NearDupConfig, NearDuplicateDetector, DEFAULT_SEED,
};
use corpusdedup_filters::{ShingleExtractor, ShingleSet, TextNormalizer};
use corpusdedup_formats::OutputDir;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_inputs(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

fn set(items: &[&str]) -> ShingleSet {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn exact_lines_are_unique_across_the_corpus() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let inputs = write_inputs(
        input.path(),
        &[("first.txt", "a\nb\na\n\n   \n"), ("second.txt", "c\nb\n")],
    );

    let stats = exact_line_dedup(&inputs, output.path()).unwrap();

    assert_eq!(fs::read_to_string(output.path().join("first.txt")).unwrap(), "");
    assert_eq!(fs::read_to_string(output.path().join("second.txt")).unwrap(), "c\n");
    assert_eq!(stats.blank_lines, 2);
    assert!(stats.failures.is_empty());
}

#[test]
fn exact_lines_keep_original_formatting() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let inputs = write_inputs(
        input.path(),
        &[("doc.txt", "  indented line\r\nshared\nlast line without newline"), ("other.txt", "shared  \n")],
    );

    exact_line_dedup(&inputs, output.path()).unwrap();

    assert_eq!(
        fs::read_to_string(output.path().join("doc.txt")).unwrap(),
        "  indented line\r\nlast line without newline"
    );
    assert_eq!(fs::read_to_string(output.path().join("other.txt")).unwrap(), "");
}

#[test]
fn exact_line_dedup_is_idempotent() {
    let input = tempdir().unwrap();
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let inputs = write_inputs(
        input.path(),
        &[
            ("one.txt", "header\nalpha\nshared\n\nbeta\n"),
            ("two.txt", "header\ngamma\nshared\ndelta\n"),
        ],
    );

    exact_line_dedup(&inputs, first.path()).unwrap();
    let once: Vec<PathBuf> = ["one.txt", "two.txt"].iter().map(|n| first.path().join(n)).collect();
    let stats = exact_line_dedup(&once, second.path()).unwrap();

    for name in ["one.txt", "two.txt"] {
        assert_eq!(
            fs::read_to_string(first.path().join(name)).unwrap(),
            fs::read_to_string(second.path().join(name)).unwrap()
        );
    }
    assert_eq!(stats.duplicate_lines, 0);
    assert_eq!(stats.blank_lines, 0);
}

#[test]
fn exact_lines_read_and_write_gzip() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let gz_path = input.path().join("packed.txt.gz");
    let mut encoder = flate2::write::GzEncoder::new(fs::File::create(&gz_path).unwrap(), flate2::Compression::default());
    encoder.write_all(b"kept\nrepeat\n").unwrap();
    encoder.finish().unwrap();
    let mut inputs = write_inputs(input.path(), &[("plain.txt", "repeat\n")]);
    inputs.insert(0, gz_path);

    let stats = exact_line_dedup(&inputs, output.path()).unwrap();

    let reader = corpusdedup_formats::LineReader::open(output.path().join("packed.txt.gz")).unwrap();
    let lines: Vec<String> = reader.map(|l| l.unwrap()).collect();
    assert_eq!(lines, vec!["kept\n".to_string()]);
    assert_eq!(stats.lines_kept, 1);
}

#[test]
fn approximate_counting_matches_exact_on_small_corpus() {
    let input = tempdir().unwrap();
    let inputs = write_inputs(
        input.path(),
        &[("a.txt", "one\ntwo\nthree\n"), ("b.txt", "two\nfour\n")],
    );

    let exact = ExactLineDeduplicator::new().run(&inputs, &OutputDir::discard());
    let approx = ExactLineDeduplicator::approximate(1_000).run(&inputs, &OutputDir::discard());

    assert_eq!(exact.lines_kept, 3);
    assert_eq!(approx.lines_kept, exact.lines_kept);
    assert_eq!(approx.distinct_lines, None);
}

#[test]
fn identical_documents_have_identical_signatures() {
    let text = "Byte identical documents must always sign the same way";
    let extractor = ShingleExtractor::new(3).unwrap();
    let normalizer = TextNormalizer::canonical();

    let first = MinHasher::new(128, DEFAULT_SEED).sign(&extractor.extract(&normalizer.normalize(text)));
    let second = MinHasher::new(128, DEFAULT_SEED).sign(&extractor.extract(&normalizer.normalize(text)));

    assert_eq!(first, second);
}

#[test]
fn jaccard_boundary_cases() {
    let empty = ShingleSet::default();
    let abc = set(&["a", "b", "c"]);

    assert_eq!(jaccard_similarity(&empty, &empty), 1.0);
    assert_eq!(jaccard_similarity(&empty, &abc), 0.0);
    assert_eq!(jaccard_similarity(&abc, &set(&["x", "y"])), 0.0);
    assert_eq!(jaccard_similarity(&abc, &abc.clone()), 1.0);
}

#[test]
fn banding_pairs_documents_sharing_every_shingle() {
    let hasher = MinHasher::new(4, DEFAULT_SEED);
    let bander = LshBander::for_signature_len(4, 2).unwrap();
    let shared = set(&["the cat", "cat sat", "sat down"]);
    let other = set(&["blue whale", "whale song"]);

    let signatures = vec![hasher.sign(&shared), hasher.sign(&shared.clone()), hasher.sign(&other)];
    let candidates = bander.candidate_pairs(&signatures);

    assert!(candidates.contains(0, 1));
    assert!(!candidates.contains(0, 2));
    assert!(!candidates.contains(1, 2));
}

#[test]
fn threshold_equal_similarity_is_kept() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let inputs = write_inputs(input.path(), &[("p.txt", "a b c"), ("q.txt", "a b d")]);

    let report = near_duplicate_dedup(&inputs, output.path(), NearDupConfig::new(64, 64, 1, 0.5)).unwrap();

    assert!(report.removed.is_empty());
    assert!(output.path().join("p.txt").exists());
    assert!(output.path().join("q.txt").exists());
}

#[test]
fn chained_similarity_collapses_to_one_survivor() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    // A~B and B~C above 0.5, A and C well below it
    let inputs = write_inputs(
        input.path(),
        &[
            ("a.txt", "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10"),
            ("b.txt", "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10 v1 v2 v3 v4 v5"),
            ("c.txt", "w6 w7 w8 w9 w10 v1 v2 v3 v4 v5"),
        ],
    );

    let report = near_duplicate_dedup(&inputs, output.path(), NearDupConfig::new(128, 128, 1, 0.5)).unwrap();

    assert_eq!(report.stats.documents_removed, 2);
    assert_eq!(report.stats.documents_written, 1);
    assert!(output.path().join("a.txt").exists());
    assert_eq!(report.clusters.len(), 1);
    assert_eq!(report.clusters[0].kept, "a.txt");
    assert_eq!(report.clusters[0].removed, vec!["b.txt".to_string(), "c.txt".to_string()]);
    assert_eq!(report.clusters[0].edges.len(), 2);
}

#[test]
fn greedy_policy_requires_direct_similarity() {
    let input = tempdir().unwrap();
    let inputs = write_inputs(
        input.path(),
        &[
            ("a.txt", "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10"),
            ("b.txt", "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10 v1 v2 v3 v4 v5"),
            ("c.txt", "w6 w7 w8 w9 w10 v1 v2 v3 v4 v5"),
        ],
    );
    let config = NearDupConfig::new(128, 128, 1, 0.5).with_policy(ClusterPolicy::Greedy);

    let report = NearDuplicateDetector::new(config).unwrap().run(&inputs, &OutputDir::discard());

    assert_eq!(report.removed, vec!["b.txt".to_string()]);
}

#[test]
fn survivors_keep_original_text() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let original = "  Mixed CASE text, with punctuation!\r\nAnd a second line.\n";
    let inputs = write_inputs(
        input.path(),
        &[
            ("orig.txt", original),
            ("copy.txt", "mixed case text with punctuation and a second line"),
        ],
    );

    let report = near_duplicate_dedup(&inputs, output.path(), NearDupConfig::new(64, 16, 2, 0.9)).unwrap();

    assert_eq!(report.removed, vec!["copy.txt".to_string()]);
    assert_eq!(fs::read_to_string(output.path().join("orig.txt")).unwrap(), original);
}

#[test]
fn different_seeds_still_agree_on_exact_duplicates() {
    let input = tempdir().unwrap();
    let inputs = write_inputs(
        input.path(),
        &[("x.txt", "one two three four five six"), ("y.txt", "one two three four five six")],
    );

    for seed in [1, 7, 12345] {
        let config = NearDupConfig::new(32, 8, 2, 0.8).with_seed(seed);
        let report = NearDuplicateDetector::new(config).unwrap().run(&inputs, &OutputDir::discard());
        assert_eq!(report.removed, vec!["y.txt".to_string()]);
    }
}
