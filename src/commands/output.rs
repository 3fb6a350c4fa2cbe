//! Rendering of a finished report

use crate::cli::{Cli, OutputFormat};
use shallowize_core::error::Result;
use shallowize_core::format::human_bytes;
use shallowize_core::report::{Outcome, ReportMap, RepositoryRecord};

pub fn print_report(cli: &Cli, report: &ReportMap) -> Result<()> {
    match cli.format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Human => print_human(cli, report),
    }
    Ok(())
}

fn print_human(cli: &Cli, report: &ReportMap) {
    if report.is_empty() {
        if !cli.quiet {
            println!("No repositories found");
        }
        return;
    }

    for record in report.records() {
        println!("{}", human_line(record));
        if !cli.quiet {
            if let Some(error) = &record.error {
                for line in error.lines() {
                    println!("    {}", line);
                }
            }
        }
    }

    if !cli.quiet {
        println!();
        println!(
            "{} repositories: {} done, {} aborted, {} failed, {} skipped; {} reclaimed",
            report.len(),
            report.count(Outcome::Done),
            report.count(Outcome::Aborted),
            report.count(Outcome::Failed),
            report.count(Outcome::Skipped),
            signed_bytes(report.total_saved())
        );
    }
}

fn human_line(record: &RepositoryRecord) -> String {
    format!(
        "{:<8} {:>10} -> {:<10} {}",
        outcome_label(record.outcome),
        size_label(record.size_before_bytes),
        size_label(record.size_after_bytes),
        record.path.display()
    )
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Done => "done",
        Outcome::Aborted => "aborted",
        Outcome::Failed => "failed",
        Outcome::Skipped => "skipped",
    }
}

fn size_label(bytes: Option<u64>) -> String {
    bytes.map(human_bytes).unwrap_or_else(|| "?".to_string())
}

fn signed_bytes(bytes: i128) -> String {
    let magnitude = human_bytes(u64::try_from(bytes.unsigned_abs()).unwrap_or(u64::MAX));
    if bytes < 0 {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}
