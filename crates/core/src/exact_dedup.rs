//! Exact-line deduplication across a corpus
//!
//! Two streaming passes over the input files:
//!
//! 1. Every line's trimmed content is fingerprinted and counted
//!    corpus-wide.
//! 2. Each file is re-read and only non-blank lines whose fingerprint
//!    occurred exactly once are written, in original order and with their
//!    original formatting, to a file of the same name in the output
//!    directory.
//!
//! Global uniqueness cannot be decided in a single streaming pass without
//! holding the whole corpus in memory, hence the second read. Fingerprint
//! collisions make two distinct lines count as duplicates of each other;
//! this is accepted, never reported as an error.
//!
//! Inputs sharing a base name write to the same output file; the later
//! input wins and the statistics only count outputs left on disk.

use crate::failure::{FailureStage, FileFailure};
use crate::hash::LineFingerprint;
use crate::line_counter::{ApproximateLineCounts, ExactLineCounts, LineCounter};
use crate::Result;
use ahash::AHashMap;
use corpusdedup_formats::{base_name, base_name_collisions, LineReader, OutputDir};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which pass of the run a file is being processed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePass {
    Count,
    Filter,
}

/// Line counts for one filtered file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileLineStats {
    pub lines_read: usize,
    pub blank_lines: usize,
    pub duplicate_lines: usize,
    pub lines_kept: usize,
}

/// Statistics for an exact-line deduplication run
#[derive(Debug, Clone, Default)]
pub struct LineDedupStats {
    /// Input files given to the run
    pub files_total: usize,
    /// Output files left on disk
    pub files_written: usize,
    /// Outputs replaced by a later input with the same base name
    pub files_overwritten: usize,
    /// Lines read from inputs whose output was kept
    pub lines_read: usize,
    /// Blank lines dropped
    pub blank_lines: usize,
    /// Non-blank lines dropped because they occur more than once
    pub duplicate_lines: usize,
    /// Lines written to output
    pub lines_kept: usize,
    /// Distinct fingerprints seen in the counting pass (exact counter only)
    pub distinct_lines: Option<usize>,
    /// Files skipped in either pass
    pub failures: Vec<FileFailure>,
}

impl LineDedupStats {
    /// Percentage of read lines that were dropped
    pub fn removal_rate(&self) -> f64 {
        if self.lines_read == 0 {
            0.0
        } else {
            ((self.blank_lines + self.duplicate_lines) as f64 / self.lines_read as f64) * 100.0
        }
    }

    /// Number of files that produced no complete output
    pub fn files_failed(&self) -> usize {
        self.files_total - self.files_written - self.files_overwritten
    }

    fn add(&mut self, file: &FileLineStats) {
        self.lines_read += file.lines_read;
        self.blank_lines += file.blank_lines;
        self.duplicate_lines += file.duplicate_lines;
        self.lines_kept += file.lines_kept;
    }
}

/// Two-pass exact-line deduplicator.
///
/// The occurrence table lives inside the deduplicator, so each run starts
/// from a fresh instance.
pub struct ExactLineDeduplicator<C: LineCounter = ExactLineCounts> {
    counter: C,
}

impl ExactLineDeduplicator<ExactLineCounts> {
    /// Create a deduplicator with an exact occurrence table
    pub fn new() -> Self {
        Self::with_counter(ExactLineCounts::new())
    }
}

impl Default for ExactLineDeduplicator<ExactLineCounts> {
    fn default() -> Self {
        Self::new()
    }
}

impl ExactLineDeduplicator<ApproximateLineCounts> {
    /// Create a fixed-memory deduplicator sized for `expected_lines`
    pub fn approximate(expected_lines: usize) -> Self {
        Self::with_counter(ApproximateLineCounts::with_capacity(expected_lines))
    }
}

impl<C: LineCounter> ExactLineDeduplicator<C> {
    /// Create a deduplicator around a custom counter
    pub fn with_counter(counter: C) -> Self {
        Self { counter }
    }

    /// Borrow the occurrence counter
    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// Pass 1 for one source: record every line. Returns the line count.
    pub fn count_lines<R: BufRead>(&mut self, reader: LineReader<R>) -> Result<usize> {
        let mut lines = 0;
        for line in reader {
            let line = line?;
            self.counter.record(LineFingerprint::of(&line));
            lines += 1;
        }
        Ok(lines)
    }

    /// Pass 2 for one source: write the corpus-unique, non-blank lines.
    pub fn filter_lines<R: BufRead, W: Write>(
        &self,
        reader: LineReader<R>,
        out: &mut W,
    ) -> Result<FileLineStats> {
        let mut stats = FileLineStats::default();

        for line in reader {
            let line = line?;
            stats.lines_read += 1;

            if line.trim().is_empty() {
                stats.blank_lines += 1;
                continue;
            }

            if !self.counter.is_unique(LineFingerprint::of(&line)) {
                stats.duplicate_lines += 1;
                continue;
            }

            out.write_all(line.as_bytes())?;
            stats.lines_kept += 1;
        }

        Ok(stats)
    }

    /// Pass 1 for one file
    pub fn count_file(&mut self, path: &Path) -> Result<usize> {
        let reader = LineReader::open(path)?;
        let lines = self.count_lines(reader)?;
        debug!("Counted {} lines in {:?}", lines, path);
        Ok(lines)
    }

    /// Pass 2 for one file, writing to the same base name under `output`
    pub fn filter_file(&self, path: &Path, output: &OutputDir) -> Result<FileLineStats> {
        let name = base_name(path)?;
        // Open the input first so an unreadable file leaves no empty output
        let reader = LineReader::open(path)?;
        let mut file = output.create_file(&name)?;
        let stats = self.filter_lines(reader, &mut file)?;
        file.finish()?;
        debug!(
            "Filtered {:?}: kept {} of {} lines",
            path, stats.lines_kept, stats.lines_read
        );
        Ok(stats)
    }

    fn filter_named(&self, path: &Path, output: &OutputDir) -> Result<(String, FileLineStats)> {
        let name = base_name(path)?;
        let stats = self.filter_file(path, output)?;
        Ok((name, stats))
    }

    /// Run both passes over `inputs`
    pub fn run(self, inputs: &[PathBuf], output: &OutputDir) -> LineDedupStats {
        self.run_with_progress(inputs, output, |_, _| {})
    }

    /// Run both passes, calling `on_file` after each file of each pass.
    ///
    /// Per-file read or write failures are logged and recorded in the
    /// returned statistics; the remaining files are still processed.
    pub fn run_with_progress<F>(
        mut self,
        inputs: &[PathBuf],
        output: &OutputDir,
        mut on_file: F,
    ) -> LineDedupStats
    where
        F: FnMut(LinePass, &Path),
    {
        let mut stats = LineDedupStats {
            files_total: inputs.len(),
            ..Default::default()
        };

        base_name_collisions(inputs);

        info!("Pass 1: counting lines in {} files", inputs.len());
        for path in inputs {
            if let Err(e) = self.count_file(path) {
                warn!("Error reading {:?}: {}", path, e);
                stats.failures.push(FileFailure::new(path, FailureStage::Count, &e));
            }
            on_file(LinePass::Count, path);
        }
        stats.distinct_lines = self.counter.distinct();

        info!("Pass 2: filtering and writing");
        let mut outputs: AHashMap<String, FileLineStats> = AHashMap::new();
        for path in inputs {
            match self.filter_named(path, output) {
                Ok((name, file_stats)) => {
                    if outputs.insert(name, file_stats).is_some() {
                        debug!("Output for {:?} replaced an earlier input's output", path);
                        stats.files_overwritten += 1;
                    }
                }
                Err(e) => {
                    warn!("Error writing output for {:?}: {}", path, e);
                    stats.failures.push(FileFailure::new(path, FailureStage::Filter, &e));
                }
            }
            on_file(LinePass::Filter, path);
        }

        for file_stats in outputs.values() {
            stats.add(file_stats);
        }
        stats.files_written = outputs.len();

        info!(
            "Exact-line dedup complete: kept {} of {} lines ({} duplicate, {} blank)",
            stats.lines_kept, stats.lines_read, stats.duplicate_lines, stats.blank_lines
        );

        stats
    }
}

/// Deduplicate lines across `inputs` into `output_dir` with an exact table.
///
/// Fails only if the output directory cannot be created.
pub fn exact_line_dedup<P: AsRef<Path>>(inputs: &[PathBuf], output_dir: P) -> Result<LineDedupStats> {
    let output = OutputDir::create(output_dir)?;
    Ok(ExactLineDeduplicator::new().run(inputs, &output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
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

    #[test]
    fn test_in_memory_passes() {
        let mut dedup = ExactLineDeduplicator::new();
        dedup.count_lines(LineReader::new(Cursor::new("x\ny\nx\n"))).unwrap();

        let mut out = Vec::new();
        let stats = dedup
            .filter_lines(LineReader::new(Cursor::new("x\ny\nx\n")), &mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "y\n");
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.duplicate_lines, 2);
        assert_eq!(stats.lines_kept, 1);
    }

    #[test]
    fn test_corpus_wide_uniqueness() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let inputs = write_inputs(input.path(), &[("one.txt", "a\nb\na\n"), ("two.txt", "c\nb\n")]);

        let stats = exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(fs::read_to_string(output.path().join("one.txt")).unwrap(), "");
        assert_eq!(fs::read_to_string(output.path().join("two.txt")).unwrap(), "c\n");
        assert_eq!(stats.lines_read, 5);
        assert_eq!(stats.duplicate_lines, 4);
        assert_eq!(stats.lines_kept, 1);
        assert_eq!(stats.distinct_lines, Some(3));
        assert_eq!(stats.files_written, 2);
    }

    #[test]
    fn test_trimmed_comparison_keeps_original_formatting() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let inputs = write_inputs(
            input.path(),
            &[("a.txt", "  padded line  \r\nunique one\n"), ("b.txt", "padded line\nunique two")],
        );

        exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(fs::read_to_string(output.path().join("a.txt")).unwrap(), "unique one\n");
        // Final line without terminator stays without one
        assert_eq!(fs::read_to_string(output.path().join("b.txt")).unwrap(), "unique two");
    }

    #[test]
    fn test_indentation_preserved() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let inputs = write_inputs(input.path(), &[("code.txt", "fn main() {\n    body();\n}\n")]);

        exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(
            fs::read_to_string(output.path().join("code.txt")).unwrap(),
            "fn main() {\n    body();\n}\n"
        );
    }

    #[test]
    fn test_blank_lines_always_dropped() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let inputs = write_inputs(input.path(), &[("a.txt", "first\n\n   \n\t\nsecond\n")]);

        let stats = exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(
            fs::read_to_string(output.path().join("a.txt")).unwrap(),
            "first\nsecond\n"
        );
        assert_eq!(stats.blank_lines, 3);
    }

    #[test]
    fn test_duplicates_within_one_file() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let inputs = write_inputs(input.path(), &[("a.txt", "x\ny\nx\nz\n")]);

        exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(fs::read_to_string(output.path().join("a.txt")).unwrap(), "y\nz\n");
    }

    #[test]
    fn test_missing_file_does_not_abort() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let mut inputs = write_inputs(input.path(), &[("good.txt", "keep me\n")]);
        inputs.insert(0, input.path().join("missing.txt"));

        let stats = exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(
            fs::read_to_string(output.path().join("good.txt")).unwrap(),
            "keep me\n"
        );
        assert!(!output.path().join("missing.txt").exists());
        assert_eq!(stats.files_total, 2);
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.files_failed(), 1);
        assert_eq!(stats.failures.len(), 2);
        assert_eq!(stats.failures[0].stage, FailureStage::Count);
        assert_eq!(stats.failures[1].stage, FailureStage::Filter);
    }

    #[test]
    fn test_unwritable_output_dir_is_fatal() {
        let input = tempdir().unwrap();
        let blocker = input.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let inputs = write_inputs(input.path(), &[("a.txt", "a\n")]);

        assert!(exact_line_dedup(&inputs, blocker.join("out")).is_err());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let input = tempdir().unwrap();
        let inputs = write_inputs(input.path(), &[("a.txt", "a\nb\na\n")]);

        let stats = ExactLineDeduplicator::new().run(&inputs, &OutputDir::discard());

        assert_eq!(stats.lines_kept, 1);
        assert_eq!(stats.files_written, 1);
    }

    #[test]
    fn test_approximate_counter_run() {
        let input = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let output = OutputDir::create(out_dir.path()).unwrap();
        let inputs = write_inputs(input.path(), &[("one.txt", "a\nb\na\n"), ("two.txt", "c\nb\n")]);

        let stats = ExactLineDeduplicator::approximate(1000).run(&inputs, &output);

        assert_eq!(stats.duplicate_lines, 4);
        assert_eq!(stats.lines_kept, 1);
        assert_eq!(stats.distinct_lines, None);
    }

    #[test]
    fn test_progress_callback() {
        let input = tempdir().unwrap();
        let inputs = write_inputs(input.path(), &[("a.txt", "a\n"), ("b.txt", "b\n")]);

        let mut events = Vec::new();
        ExactLineDeduplicator::new().run_with_progress(&inputs, &OutputDir::discard(), |pass, _| {
            events.push(pass)
        });

        assert_eq!(
            events,
            vec![LinePass::Count, LinePass::Count, LinePass::Filter, LinePass::Filter]
        );
    }

    #[test]
    fn test_same_base_name_later_input_wins() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        fs::create_dir(input.path().join("x")).unwrap();
        fs::create_dir(input.path().join("y")).unwrap();
        let inputs = write_inputs(
            input.path(),
            &[("x/doc.txt", "only in x\nshared\n"), ("y/doc.txt", "shared\nonly in y\n")],
        );

        let stats = exact_line_dedup(&inputs, output.path()).unwrap();

        assert_eq!(
            fs::read_to_string(output.path().join("doc.txt")).unwrap(),
            "only in y\n"
        );
        assert_eq!(stats.files_written, 1);
        assert_eq!(stats.files_overwritten, 1);
        assert_eq!(stats.files_failed(), 0);
        assert_eq!(stats.lines_read, 2);
        assert_eq!(stats.lines_kept, 1);
        assert_eq!(stats.duplicate_lines, 1);
        assert!(stats.failures.is_empty());
    }

    #[test]
    fn test_removal_rate() {
        let stats = LineDedupStats {
            lines_read: 4,
            blank_lines: 1,
            duplicate_lines: 1,
            lines_kept: 2,
            ..Default::default()
        };
        assert_eq!(stats.removal_rate(), 50.0);
        assert_eq!(LineDedupStats::default().removal_rate(), 0.0);
    }
}
