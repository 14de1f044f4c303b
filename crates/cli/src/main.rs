//! corpusdedup CLI
//!
//! Corpus-wide exact-line deduplication and near-duplicate document removal

mod config;
mod progress;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use corpusdedup_core::{
    ExactLineDeduplicator, FileFailure, LineDedupStats, LinePass, NearDupConfig, NearDupReport,
    NearDuplicateDetector,
};
use corpusdedup_formats::{expand_inputs, OutputDir};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{
    CountingMode, DedupConfigFile, ExactLineSettings, LineCounting, NearDupSettings, PolicyArg,
};
use progress::{format_number, print_summary_report, ProgressReporter, Summary};

/// Stages reported by a near-duplicate run
const NEAR_DUP_STAGES: usize = 6;

#[derive(Parser)]
#[command(name = "corpusdedup")]
#[command(version, about = "Exact-line and near-duplicate deduplication for text corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output statistics in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop every line that occurs more than once anywhere in the corpus
    ExactLines {
        /// Input files or directories
        #[arg(required = true, value_name = "INPUTS")]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Config file with an exact_lines section (YAML or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Count lines with fixed-memory Bloom filters instead of an exact table
        #[arg(long)]
        approximate: bool,

        /// Count lines exactly, overriding `counting: approximate` in a config file
        #[arg(long, conflicts_with = "approximate")]
        exact: bool,

        /// Expected number of distinct lines (sizes the approximate counter)
        #[arg(long, requires = "approximate")]
        expected_lines: Option<usize>,

        /// Show statistics without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove near-duplicate documents using MinHash + LSH
    NearDups {
        /// Input files or directories
        #[arg(required = true, value_name = "INPUTS")]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Config file with a near_dups section (YAML or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of MinHash functions
        #[arg(long)]
        hash_count: Option<usize>,

        /// Number of LSH bands (more bands = higher recall, more false positives)
        #[arg(long)]
        band_count: Option<usize>,

        /// Shingle size in words
        #[arg(long)]
        ngram_size: Option<usize>,

        /// Jaccard threshold; pairs must be strictly more similar to be removed
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Seed for the MinHash coefficients
        #[arg(long)]
        seed: Option<u64>,

        /// How similarity chains are clustered
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Write a JSON manifest of duplicate clusters
        #[arg(long)]
        report: Option<PathBuf>,

        /// Show statistics without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.json) // Disable colors if JSON output
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::ExactLines {
            inputs,
            output,
            config,
            approximate,
            exact,
            expected_lines,
            dry_run,
        } => {
            let flags = ExactLineSettings {
                counting: counting_flag(approximate, exact),
                expected_lines,
            };
            exact_lines(inputs, output, config, flags, dry_run, cli.json)?;
        }
        Commands::NearDups {
            inputs,
            output,
            config,
            hash_count,
            band_count,
            ngram_size,
            threshold,
            seed,
            policy,
            report,
            dry_run,
        } => {
            let flags = NearDupSettings {
                hash_count,
                band_count,
                ngram_size,
                jaccard_threshold: threshold,
                seed,
                policy,
            };
            near_dups(inputs, output, config, flags, report, dry_run, cli.json)?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

fn counting_flag(approximate: bool, exact: bool) -> Option<CountingMode> {
    if approximate {
        Some(CountingMode::Approximate)
    } else if exact {
        Some(CountingMode::Exact)
    } else {
        None
    }
}

fn load_config_file(path: Option<&Path>) -> Result<DedupConfigFile> {
    match path {
        Some(path) => DedupConfigFile::load(path),
        None => Ok(DedupConfigFile::default()),
    }
}

fn resolve_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let files = expand_inputs(inputs).context("Failed to expand input paths")?;
    if files.is_empty() {
        warn!("No input files found");
    }
    info!("  Inputs: {} files", files.len());
    Ok(files)
}

fn open_output(output: &Path, dry_run: bool) -> Result<OutputDir> {
    if dry_run {
        info!("  Dry run: output is discarded");
        Ok(OutputDir::discard())
    } else {
        Ok(OutputDir::create(output)?)
    }
}

fn exact_lines(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config: Option<PathBuf>,
    flags: ExactLineSettings,
    dry_run: bool,
    json_output: bool,
) -> Result<()> {
    let file_settings = load_config_file(config.as_deref())?
        .exact_lines
        .unwrap_or_default();
    let counting = file_settings.merge(flags).resolve()?;

    info!("Starting exact-line deduplication");
    info!("  Output: {:?}", output);
    info!("  Counting: {:?}", counting);

    let files = resolve_inputs(&inputs)?;
    let output_dir = open_output(&output, dry_run)?;

    let progress = ProgressReporter::new_file_based(files.len(), json_output);
    let on_file = |pass: LinePass, path: &Path| {
        let label = match pass {
            LinePass::Count => "counting",
            LinePass::Filter => "filtering",
        };
        progress.file_done(label, path);
    };

    let stats = match counting {
        LineCounting::Exact => ExactLineDeduplicator::new().run_with_progress(&files, &output_dir, on_file),
        LineCounting::Approximate { expected_lines } => {
            ExactLineDeduplicator::approximate(expected_lines).run_with_progress(&files, &output_dir, on_file)
        }
    };
    progress.set_stats(format!(
        "{} lines | {} kept",
        format_number(stats.lines_read),
        format_number(stats.lines_kept)
    ));
    progress.finish();

    if json_output {
        let report = exact_lines_json(&stats, (!dry_run).then_some(output.as_path()));
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary_report(
            &Summary {
                title: "Exact-Line Deduplication Complete",
                unit: "lines",
                inputs: stats.files_total,
                output: (!dry_run).then_some(output.as_path()),
                total: stats.lines_read,
                removed: stats.blank_lines + stats.duplicate_lines,
                kept: stats.lines_kept,
            },
            &stats.failures,
        );
        println!(
            "  {} duplicate lines, {} blank lines dropped",
            stats.duplicate_lines, stats.blank_lines
        );
    }

    Ok(())
}

fn near_dups(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    config: Option<PathBuf>,
    flags: NearDupSettings,
    report_path: Option<PathBuf>,
    dry_run: bool,
    json_output: bool,
) -> Result<()> {
    let file_settings = load_config_file(config.as_deref())?
        .near_dups
        .unwrap_or_default();
    let config = file_settings.merge(flags).into_config()?;

    info!("Starting near-duplicate deduplication");
    info!("  Output: {:?}", output);
    info!(
        "  MinHash: {} functions, LSH: {} bands x {} rows",
        config.hash_count,
        config.band_count,
        config.rows_per_band()
    );
    info!("  Shingles: {}-grams, threshold: {}", config.ngram_size, config.jaccard_threshold);

    let detector = NearDuplicateDetector::new(config.clone())?;
    let files = resolve_inputs(&inputs)?;
    let output_dir = open_output(&output, dry_run)?;

    let progress = ProgressReporter::new_stage_based(NEAR_DUP_STAGES, json_output);
    let report = detector.run_with_progress(&files, &output_dir, |stage| progress.stage_done(stage.as_str()));
    progress.set_stats(format!(
        "{} documents | {} candidates | {} removed",
        format_number(report.stats.documents_loaded),
        format_number(report.stats.candidate_pairs),
        format_number(report.stats.documents_removed)
    ));
    progress.finish();

    if let Some(path) = &report_path {
        write_cluster_manifest(path, &config, &report)?;
        info!("  Cluster manifest: {:?}", path);
    }

    let stats = &report.stats;
    if json_output {
        let summary = json!({
            "inputs": files.len(),
            "output": if dry_run { Value::Null } else { Value::String(output.to_string_lossy().to_string()) },
            "report": report_path.as_ref().map(|p| p.to_string_lossy().to_string()),
            "documents_loaded": stats.documents_loaded,
            "empty_documents": stats.empty_documents,
            "candidate_pairs": stats.candidate_pairs,
            "verified_pairs": stats.verified_pairs,
            "lsh_precision": stats.lsh_precision(),
            "clusters": stats.clusters,
            "documents_removed": stats.documents_removed,
            "documents_written": stats.documents_written,
            "documents_overwritten": stats.documents_overwritten,
            "removal_rate": stats.removal_rate(),
            "failures": failures_json(&stats.failures),
            "dry_run": dry_run,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary_report(
            &Summary {
                title: "Near-Duplicate Deduplication Complete",
                unit: "documents",
                inputs: files.len(),
                output: (!dry_run).then_some(output.as_path()),
                total: stats.documents_loaded,
                removed: stats.documents_removed,
                kept: stats.documents_loaded - stats.documents_removed,
            },
            &stats.failures,
        );
        println!(
            "  {} candidate pairs, {} verified ({:.1}% LSH precision), {} clusters",
            stats.candidate_pairs,
            stats.verified_pairs,
            stats.lsh_precision(),
            stats.clusters
        );
    }

    Ok(())
}

fn failures_json(failures: &[FileFailure]) -> Value {
    failures
        .iter()
        .map(|f| {
            json!({
                "path": f.path.to_string_lossy().to_string(),
                "stage": f.stage.as_str(),
                "error": f.message,
            })
        })
        .collect()
}

fn exact_lines_json(stats: &LineDedupStats, output: Option<&Path>) -> Value {
    json!({
        "inputs": stats.files_total,
        "output": output.map(|p| p.to_string_lossy().to_string()),
        "files_written": stats.files_written,
        "files_overwritten": stats.files_overwritten,
        "files_failed": stats.files_failed(),
        "lines_read": stats.lines_read,
        "blank_lines": stats.blank_lines,
        "duplicate_lines": stats.duplicate_lines,
        "lines_kept": stats.lines_kept,
        "distinct_lines": stats.distinct_lines,
        "removal_rate": stats.removal_rate(),
        "failures": failures_json(&stats.failures),
        "dry_run": output.is_none(),
    })
}

/// Cluster manifest: one entry per cluster with the kept name, removed
/// names and the verified edges between members.
fn cluster_manifest(config: &NearDupConfig, report: &NearDupReport) -> Value {
    let clusters: Vec<Value> = report
        .clusters
        .iter()
        .map(|cluster| {
            let edges: Vec<Value> = cluster
                .edges
                .iter()
                .map(|edge| {
                    json!({
                        "a": edge.a,
                        "b": edge.b,
                        "similarity": (edge.similarity * 10_000.0).round() / 10_000.0,
                    })
                })
                .collect();
            json!({
                "kept": cluster.kept,
                "removed": cluster.removed,
                "edges": edges,
            })
        })
        .collect();

    json!({
        "config": {
            "hash_count": config.hash_count,
            "band_count": config.band_count,
            "ngram_size": config.ngram_size,
            "jaccard_threshold": config.jaccard_threshold,
            "seed": config.seed,
            "policy": config.policy.as_str(),
        },
        "clusters": clusters,
        "removed": report.removed,
    })
}

fn write_cluster_manifest(path: &Path, config: &NearDupConfig, report: &NearDupReport) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create report: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &cluster_manifest(config, report))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
