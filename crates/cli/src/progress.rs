//! Progress reporting and summaries for the CLI

use std::path::Path;

use corpusdedup_core::FileFailure;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress reporter with a main bar and a stats line
pub struct ProgressReporter {
    _multi: MultiProgress,
    main_bar: ProgressBar,
    stats_bar: ProgressBar,
}

impl ProgressReporter {
    /// Track files across both exact-line passes
    pub fn new_file_based(total_files: usize, hidden: bool) -> Self {
        Self::with_template(
            (total_files * 2) as u64,
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}",
            hidden,
        )
    }

    /// Track near-duplicate pipeline stages
    pub fn new_stage_based(total_stages: usize, hidden: bool) -> Self {
        Self::with_template(
            total_stages as u64,
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} stages {msg}",
            hidden,
        )
    }

    fn with_template(len: u64, template: &str, hidden: bool) -> Self {
        let multi = if hidden {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        let main_bar = multi.add(ProgressBar::new(len));
        main_bar.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░-"),
        );

        let stats_bar = multi.add(ProgressBar::new(0));
        stats_bar.set_style(
            ProgressStyle::default_bar()
                .template("Stats: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        Self {
            _multi: multi,
            main_bar,
            stats_bar,
        }
    }

    /// One file finished in the named pass
    pub fn file_done(&self, pass: &str, path: &Path) {
        self.main_bar.inc(1);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.main_bar.set_message(format!("{}: {}", pass, name));
    }

    /// One pipeline stage finished
    pub fn stage_done(&self, stage: &str) {
        self.main_bar.inc(1);
        self.main_bar.set_message(format!("{} done", stage));
    }

    pub fn set_stats(&self, message: String) {
        self.stats_bar.set_message(message);
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        self.main_bar.finish_with_message("Complete!");
        self.stats_bar.finish();
    }
}

/// Format large numbers compactly
pub fn format_number(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Counts shown in the summary box
pub struct Summary<'a> {
    pub title: &'a str,
    pub unit: &'a str,
    pub inputs: usize,
    pub output: Option<&'a Path>,
    pub total: usize,
    pub removed: usize,
    pub kept: usize,
}

/// Print a formatted summary report
pub fn print_summary_report(summary: &Summary<'_>, failures: &[FileFailure]) {
    println!("\n{}", "═".repeat(60));
    println!("{}", summary.title);
    println!("{}", "═".repeat(60));
    println!("Input files:        {}", format_with_commas(summary.inputs));

    if let Some(output_path) = summary.output {
        println!("Output:             {}", output_path.display());
    } else {
        println!("Output:             (dry run - no output written)");
    }

    println!("Total {:<13} {}", format!("{}:", summary.unit), format_with_commas(summary.total));
    println!(
        "Removed:            {} ({:.1}%)",
        format_with_commas(summary.removed),
        percent(summary.removed, summary.total)
    );
    println!(
        "Kept:               {} ({:.1}%)",
        format_with_commas(summary.kept),
        percent(summary.kept, summary.total)
    );

    if !failures.is_empty() {
        println!("Failed files:       {}", failures.len());
        for failure in failures {
            println!(
                "  [{}] {}: {}",
                failure.stage,
                failure.path.display(),
                failure.message
            );
        }
    }

    println!("{}", "═".repeat(60));
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Format number with thousand separators
fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
