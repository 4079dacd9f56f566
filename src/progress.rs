//! Progress reporting for the reassembler
//!
//! Provides a live spinner during the walk and an end-of-run summary
//! that always lists skipped fragments, even when the run succeeds.

use crate::config::GapPolicy;
use crate::walker::{ReassemblyReport, WalkProgress};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Skipped entries listed individually before the summary truncates
const MAX_LISTED_SKIPS: usize = 50;

/// Spinner showing walk status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &WalkProgress) {
        let msg = format!(
            "Dirs: {} | Fragments: {} | Size: {} | Skipped: {} | Rate: {:.0}/s | Workers: {}",
            format_number(progress.dirs),
            format_number(progress.fragments),
            format_size(progress.bytes, BINARY),
            format_number(progress.skipped),
            progress.fragments_per_second(),
            progress.workers,
        );

        self.bar.set_message(msg);
    }

    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Lines describing everything that did not make it into the output
pub fn skipped_lines(report: &ReassemblyReport) -> Vec<String> {
    let mut lines: Vec<String> = report.skipped.iter().map(|e| e.to_string()).collect();
    lines.extend(
        report
            .gaps_skipped
            .iter()
            .map(|p| format!("Skipped gap: no fragment at position {}", p)),
    );
    lines
}

/// Print a summary of the run
pub fn print_summary(report: &ReassemblyReport, output_path: &str) {
    let secs = report.duration.as_secs_f64();
    let title = if report.is_clean() {
        style("Reassembly Complete").green().bold()
    } else {
        style("Reassembly Complete (with skips)").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Directories:").bold(), format_number(report.dirs));
    println!(
        "  {} {} of {} positions",
        style("Fragments:").bold(),
        format_number(report.fragments_written as u64),
        format_number(report.slots as u64)
    );
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(report.bytes_written, BINARY)
    );
    println!("  {} {:.1}s", style("Duration:").bold(), secs);
    if report.duplicates > 0 {
        println!(
            "  {} {}",
            style("Duplicates:").yellow().bold(),
            format_number(report.duplicates)
        );
    }
    println!("  {} {}", style("Output:").bold(), output_path);

    let lines = skipped_lines(report);
    if !lines.is_empty() {
        println!();
        println!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(lines.len() as u64)
        );
        for line in lines.iter().take(MAX_LISTED_SKIPS) {
            println!("    {}", line);
        }
        if lines.len() > MAX_LISTED_SKIPS {
            println!(
                "    {}",
                style(format!("... and {} more (see log)", lines.len() - MAX_LISTED_SKIPS)).dim()
            );
        }
    }
    println!();
}

/// Print a header at the start of the run
pub fn print_header(root: &str, output: &str, gaps: GapPolicy) {
    let gaps = match gaps {
        GapPolicy::Fail => "fail",
        GapPolicy::Skip => "skip",
    };

    println!();
    println!(
        "{} {}",
        style("defrag").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Output:").bold(), output);
    println!("  {} {}", style("Gaps:").bold(), gaps);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_skipped_lines_include_gaps() {
        let report = ReassemblyReport {
            skipped: vec![TraversalError::InvalidName {
                path: "/r/a/abc.bin".into(),
            }],
            gaps_skipped: vec![2],
            ..Default::default()
        };

        let lines = skipped_lines(&report);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("abc.bin"));
        assert_eq!(lines[1], "Skipped gap: no fragment at position 2");
    }
}
