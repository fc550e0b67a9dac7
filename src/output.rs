//! Console output.
//!
//! All text shown to the user goes through [`OutputFormatter`], so styling is
//! decided in one place. Colors come from `colored`, which turns itself off
//! when stdout is not a terminal or `NO_COLOR` is set.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use crate::file_category::Category;
use crate::file_organizer::OrganizeReport;
use crate::undo::UndoReport;

const RULE_WIDTH: usize = 50;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the main menu for the current folder.
    pub fn menu(folder: Option<&Path>) {
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("   {}", "FOLDERSORT - current folder:".bold());
        match folder {
            Some(folder) => println!("   {}", folder.display()),
            None => println!("   {}", "(none selected)".dimmed()),
        }
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("1 → Sort / organize this folder");
        println!("2 → Undo last sort");
        println!("3 → Change folder");
        println!("4 → Exit");
        println!("{}", "-".repeat(RULE_WIDTH));
    }

    /// Creates the progress bar shown while files are being moved.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints every move and skip of an organize pass, then the totals.
    pub fn organize_summary(report: &OrganizeReport) {
        for record in &report.moved {
            let name = record
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(" {} {} → {}/", "✓".green(), name, record.category);
        }
        for skipped in &report.skipped {
            eprintln!(" {} {}", "✗".red(), skipped.error);
        }

        let counts = report.category_counts();
        if !counts.is_empty() {
            Self::header("SUMMARY");
            let width = Category::ALL
                .iter()
                .map(|c| c.dir_name().len())
                .max()
                .unwrap_or(0)
                .max("Category".len());

            println!("{:<width$} | {}", "Category".bold(), "Files".bold());
            println!("{}", "-".repeat(width + 10));
            for (category, count) in &counts {
                println!(
                    "{:<width$} | {} {}",
                    category.dir_name(),
                    count.to_string().green(),
                    plural(*count)
                );
            }
            println!("{}", "-".repeat(width + 10));
        }

        let empty: Vec<_> = Category::ALL
            .iter()
            .filter(|c| !counts.contains_key(*c))
            .map(|c| c.dir_name())
            .collect();
        if !empty.is_empty() && !counts.is_empty() {
            println!("{}", format!("No files for: {}", empty.join(", ")).dimmed());
        }

        let total = report.moved_count();
        if total == 0 && report.skipped.is_empty() {
            Self::info("No files to organize.");
        } else if report.is_complete_success() {
            Self::success(&format!("Organization complete! {} {} moved.", total, plural(total)));
        } else {
            Self::warning(&format!(
                "Organization finished with problems: {} moved, {} skipped.",
                total,
                report.skipped.len()
            ));
        }
    }

    /// Prints the outcome of an undo.
    pub fn undo_summary(report: &UndoReport) {
        if report.nothing_to_undo {
            Self::info("Nothing to undo: no previous sort found.");
            return;
        }

        for record in &report.restored {
            let name = record
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(" {} restored {}", "↩".green(), name);
        }
        for failed in &report.failed {
            eprintln!(" {} {}", "✗".red(), failed.error);
        }

        let restored = report.restored_count();
        if report.is_complete_success() {
            Self::success(&format!("Undo complete! {} {} restored.", restored, plural(restored)));
        } else {
            Self::warning(&format!(
                "Undo finished with problems: {} restored, {} still pending. Fix them and undo again.",
                restored,
                report.failed.len()
            ));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
