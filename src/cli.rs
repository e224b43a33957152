//! Command-line interface module for extsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging configured rules with rules given on the command line
//! - Driving the shell state with events and running its effects
//! - Rendering previews and reports, as text or JSON

use crate::categorizer::{Categorizer, UnmappedPolicy};
use crate::config::Config;
use crate::mapping::{ExtensionMapping, MappingRow};
use crate::output::OutputFormatter;
use crate::shell::{self, Effect, ShellEvent, ShellState, View};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

/// Sort the files of a directory into subfolders by extension
#[derive(Parser, Debug)]
#[command(name = "extsort", version)]
#[command(about = "Sort the files of a directory into subfolders by extension", long_about = None)]
pub struct Args {
    /// Directory whose files should be sorted (not recursive)
    pub directory: PathBuf,

    /// Extension rule, e.g. `-m jpg=Images`; `=Folder` matches files without extension
    #[arg(short = 'm', long = "map", value_name = "EXT=FOLDER")]
    pub rules: Vec<MappingRow>,

    /// Move the files; without this flag only a preview is shown
    #[arg(long)]
    pub apply: bool,

    /// How to treat files without a rule: leave or unsorted (overrides config)
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<UnmappedPolicy>,

    /// Label of the preview bucket for files without a rule (overrides config)
    #[arg(long, value_name = "LABEL")]
    pub unsorted_label: Option<String>,

    /// Print the preview or report as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace (overrides config)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCommand {
    /// Show where files would go without changing anything.
    Preview,
    /// Move the files.
    Apply,
}

impl Args {
    /// `Apply` when `--apply` was given, `Preview` otherwise.
    pub fn command(&self) -> SortCommand {
        if self.apply {
            SortCommand::Apply
        } else {
            SortCommand::Preview
        }
    }
}

/// Settings for one run, after layering command-line values over configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Configured rules with `-m` rows merged on top.
    pub mapping: ExtensionMapping,
    pub policy: UnmappedPolicy,
    /// Label of the fallback bucket in previews.
    pub unsorted_label: String,
    /// Print JSON instead of styled text.
    pub json: bool,
}

impl RunOptions {
    /// Resolves the options for `args` given `config`.
    ///
    /// # Errors
    ///
    /// Fails if either the configured rules or the command-line rules are invalid.
    pub fn resolve(args: &Args, config: &Config) -> Result<Self> {
        let configured = config.mapping().context("Invalid rule in configuration")?;
        let given = ExtensionMapping::from_rows(&args.rules).context("Invalid --map rule")?;

        Ok(Self {
            mapping: configured.merged_with(&given),
            policy: args.policy.unwrap_or(config.unmapped.policy),
            unsorted_label: args
                .unsorted_label
                .clone()
                .unwrap_or_else(|| config.unmapped.label.clone()),
            json: args.json,
        })
    }

    fn categorizer(&self, mapping: ExtensionMapping) -> Categorizer {
        Categorizer::new(mapping)
            .with_policy(self.policy)
            .with_unsorted_label(self.unsorted_label.clone())
    }
}

/// Runs the CLI application.
///
/// Returns `Ok(true)` when everything succeeded, `Ok(false)` when an apply
/// finished but some files failed, and an error when the request was
/// rejected or the directory could not be read.
pub fn run_cli(args: &Args, config: &Config) -> Result<bool> {
    let options = RunOptions::resolve(args, config)?;
    run_with_options(args.command(), &args.directory, &options)
}

/// Runs `command` against `dir` with already resolved options.
///
/// # Examples
///
/// ```no_run
/// use extsort::cli::{RunOptions, SortCommand, run_with_options};
/// use extsort::mapping::ExtensionMapping;
/// use extsort::categorizer::UnmappedPolicy;
/// use std::path::Path;
///
/// let options = RunOptions {
///     mapping: ExtensionMapping::from_pairs([("jpg", "Images")]).unwrap(),
///     policy: UnmappedPolicy::Unsorted,
///     unsorted_label: "Unsorted".to_string(),
///     json: false,
/// };
/// let all_ok = run_with_options(SortCommand::Preview, Path::new("/path/to/directory"), &options).unwrap();
/// ```
pub fn run_with_options(command: SortCommand, dir: &Path, options: &RunOptions) -> Result<bool> {
    let mut state = ShellState::default();
    for event in request_events(command, dir, &options.mapping) {
        if let Some(effect) = shell::update(&mut state, event) {
            let result = run_effect(effect, options);
            shell::update(&mut state, result);
        }
    }

    if options.json {
        return print_json(&state);
    }

    match &state.view {
        View::Preview(grouping) => {
            OutputFormatter::lines(&shell::render(&state));
            if !grouping.is_empty() {
                OutputFormatter::summary_table(grouping);
            }
            OutputFormatter::dry_run_notice("No files were moved.");
            OutputFormatter::plain(&format!(
                "Run again with --apply to move the files in {}.",
                dir.display()
            ));
            Ok(true)
        }
        View::Applied(report) => {
            OutputFormatter::lines(&shell::render(&state));
            Ok(report.is_complete_success())
        }
        View::Error(message) => Err(anyhow!(message.clone())),
        View::Idle => Ok(true),
    }
}

/// Translates a command into the events a user would have produced.
fn request_events(command: SortCommand, dir: &Path, mapping: &ExtensionMapping) -> Vec<ShellEvent> {
    let mut events = vec![ShellEvent::SelectDirectory(dir.to_path_buf())];
    for (index, (extension, folder)) in mapping.iter().enumerate() {
        events.push(ShellEvent::AddRow);
        events.push(ShellEvent::EditRow {
            index,
            extension: extension.to_string(),
            folder: folder.to_string(),
        });
    }
    events.push(match command {
        SortCommand::Preview => ShellEvent::RequestPreview,
        SortCommand::Apply => ShellEvent::RequestApply,
    });
    events
}

/// Carries out an effect and reports its result as an event.
fn run_effect(effect: Effect, options: &RunOptions) -> ShellEvent {
    match effect {
        Effect::Preview { directory, mapping } => {
            if !options.json {
                OutputFormatter::info(&format!("Previewing contents of: {}", directory.display()));
            }
            match options.categorizer(mapping).preview(&directory) {
                Ok(grouping) => ShellEvent::PreviewReady(grouping),
                Err(e) => ShellEvent::OperationFailed(format!("Error: {}", e)),
            }
        }
        Effect::Apply { directory, mapping } => {
            if !options.json {
                OutputFormatter::info(&format!("Sorting contents of: {}", directory.display()));
            }
            let categorizer = options.categorizer(mapping);
            let plan = match categorizer.plan(&directory) {
                Ok(plan) => plan,
                Err(e) => return ShellEvent::OperationFailed(format!("Error: {}", e)),
            };
            info!(
                "{} files found, {} with a rule",
                plan.len(),
                plan.mapped_count()
            );

            let report = if options.json {
                categorizer.execute(&plan, |_| {})
            } else {
                let pb = OutputFormatter::create_progress_bar(plan.mapped_count() as u64);
                let report = categorizer.execute(&plan, |outcome| {
                    if outcome.folder.is_some() {
                        pb.set_message(outcome.file_name.clone());
                        pb.inc(1);
                    }
                });
                pb.finish_and_clear();
                report
            };
            ShellEvent::ApplyFinished(report)
        }
    }
}

/// Serializes the result shown in `view`.
///
/// A preview becomes `{"groups": [{"label", "fallback", "files"}]}`; an apply
/// report becomes `{"started_at", "directory", "outcomes": [...]}` where each
/// outcome's `status` is tagged `moved`, `skipped` or `failed`.
///
/// # Errors
///
/// Returns the view's message for an error view. `Idle` yields `None`.
pub fn to_json(view: &View) -> Result<Option<String>> {
    match view {
        View::Preview(grouping) => Ok(Some(serde_json::to_string_pretty(grouping)?)),
        View::Applied(report) => Ok(Some(serde_json::to_string_pretty(report)?)),
        View::Error(message) => Err(anyhow!(message.clone())),
        View::Idle => Ok(None),
    }
}

fn print_json(state: &ShellState) -> Result<bool> {
    if let Some(json) = to_json(&state.view)? {
        println!("{}", json);
    }
    Ok(match &state.view {
        View::Applied(report) => report.is_complete_success(),
        _ => true,
    })
}
