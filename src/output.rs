//! Terminal output.
//!
//! Provides a centralized interface for all CLI output: colored messages,
//! the progress bar shown while files are moved, rendered shell lines and
//! the per-folder summary table.

use crate::categorizer::Grouping;
use crate::shell::{Line, LineKind};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Lines rendered by the shell, styled by their kind
/// - A progress bar for file moves
/// - A summary table of files per folder
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::success("Sorted 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// Errors go to stderr so they stay visible when `--json` output is piped.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::error("directory not found: /tmp/missing");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::warning("Moved 3 files, 1 failed:");
    /// ```
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::info("Sorting contents of: /home/user/Downloads");
    /// ```
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header in bold, preceded by a blank line.
    ///
    /// # Arguments
    ///
    /// * `header` - The header text
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message in yellow, prefixed with `[DRY RUN]`.
    ///
    /// # Arguments
    ///
    /// * `message` - The dry-run message
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("No files were moved.");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints lines produced by [`crate::shell::render`].
    ///
    /// Folders are blue, the fallback bucket is dimmed, and success, warning
    /// and failure lines reuse [`Self::success`], [`Self::warning`] and
    /// [`Self::error`].
    ///
    /// # Arguments
    ///
    /// * `lines` - Rendered lines, in display order
    pub fn lines(lines: &[Line]) {
        for line in lines {
            match line.kind {
                LineKind::Header => Self::header(&line.text),
                LineKind::Folder => println!("{}", line.text.blue().bold()),
                LineKind::Fallback => println!("{}", line.text.dimmed().bold()),
                LineKind::File => Self::plain(&line.text),
                LineKind::Success => Self::success(&line.text),
                LineKind::Warning => Self::warning(&line.text),
                LineKind::Failure => Self::error(&line.text),
                LineKind::Plain => Self::plain(&line.text),
            }
        }
    }

    /// Creates a progress bar for file moves.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of files that have a target folder
    ///
    /// # Returns
    ///
    /// A configured `ProgressBar` ready for use.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a summary table with the file count of each group.
    ///
    /// Groups appear in the order of the grouping, followed by a total row.
    ///
    /// # Arguments
    ///
    /// * `grouping` - The preview to summarize
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extsort::categorizer::Categorizer;
    /// use extsort::mapping::ExtensionMapping;
    /// use extsort::output::OutputFormatter;
    /// use std::path::Path;
    ///
    /// let mapping = ExtensionMapping::from_pairs([("jpg", "Images")]).unwrap();
    /// let grouping = Categorizer::new(mapping).preview(Path::new("/path/to/dir")).unwrap();
    /// OutputFormatter::summary_table(&grouping);
    /// ```
    pub fn summary_table(grouping: &Grouping) {
        Self::header("SUMMARY");

        let rows: Vec<(String, usize)> = grouping
            .groups()
            .iter()
            .map(|g| {
                let name = if g.fallback {
                    format!("{} (no rule)", g.label)
                } else {
                    g.label.clone()
                };
                (name, g.files.len())
            })
            .collect();

        let max_folder_len = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = max_folder_len
        );
        println!("{}", "-".repeat(max_folder_len + 10));

        for (folder, count) in &rows {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                file_word(*count),
                width = max_folder_len
            );
        }

        let total = grouping.file_count();
        println!("{}", "-".repeat(max_folder_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            file_word(total),
            width = max_folder_len
        );
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
