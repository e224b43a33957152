//! Presentation state for an interactive front end.
//!
//! The front end never holds on to a categorizer or to widgets. It keeps a
//! [`ShellState`], feeds discrete [`ShellEvent`]s through [`update`], runs
//! whatever [`Effect`] comes back, reports the result as another event and
//! draws [`render`] of the new state.
//!
//! ```
//! use extsort::shell::{Effect, ShellEvent, ShellState, update};
//!
//! let mut state = ShellState::default();
//! update(&mut state, ShellEvent::SelectDirectory("/tmp".into()));
//! update(&mut state, ShellEvent::AddRow);
//! update(&mut state, ShellEvent::EditRow { index: 0, extension: "jpg".into(), folder: "Images".into() });
//! assert!(matches!(update(&mut state, ShellEvent::RequestPreview), Some(Effect::Preview { .. })));
//! ```
use crate::categorizer::{ApplyReport, Grouping, OutcomeStatus};
use crate::mapping::{ExtensionMapping, MappingRow};
use std::path::PathBuf;

/// What the front end is currently showing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum View {
    /// Nothing requested yet, or the directory just changed.
    #[default]
    Idle,
    /// Where each file would go.
    Preview(Grouping),
    /// What happened to each file.
    Applied(ApplyReport),
    /// A rejected request or a directory that could not be read.
    Error(String),
}

/// Everything the front end needs to draw itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellState {
    /// The directory to sort, once one has been chosen.
    pub directory: Option<PathBuf>,
    /// Rule rows in the order the user added them. Rows may be blank or
    /// invalid; they are only checked when a request is made.
    pub rows: Vec<MappingRow>,
    pub view: View,
}

/// A discrete user action or operation result.
#[derive(Debug, Clone)]
pub enum ShellEvent {
    /// The user picked a directory. Clears the current view.
    SelectDirectory(PathBuf),
    /// Appends an empty rule row.
    AddRow,
    /// Replaces the contents of row `index`.
    EditRow {
        index: usize,
        extension: String,
        folder: String,
    },
    /// Removes row `index`; out-of-range indices are ignored.
    RemoveRow(usize),
    RequestPreview,
    /// Rejected while there are no rules.
    RequestApply,
    PreviewReady(Grouping),
    ApplyFinished(ApplyReport),
    OperationFailed(String),
}

/// Work the front end must carry out on behalf of the shell.
///
/// Each effect carries a mapping built from the rows at the moment of the
/// request.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run [`crate::categorizer::Categorizer::preview`] and report `PreviewReady`.
    Preview {
        directory: PathBuf,
        mapping: ExtensionMapping,
    },
    /// Run [`crate::categorizer::Categorizer::apply`] and report `ApplyFinished`.
    Apply {
        directory: PathBuf,
        mapping: ExtensionMapping,
    },
}

/// Applies `event` to `state`, returning the effect to run, if any.
///
/// Requests are validated here; a rejected request puts the error in the
/// view and yields no effect. A request is rejected when no directory is
/// selected, when the rows do not form a valid mapping, or (for apply only)
/// when there are no rules at all.
///
/// # Examples
///
/// ```
/// use extsort::shell::{ShellEvent, ShellState, View, update};
///
/// let mut state = ShellState::default();
/// update(&mut state, ShellEvent::SelectDirectory("/tmp".into()));
/// assert!(update(&mut state, ShellEvent::RequestApply).is_none());
/// assert!(matches!(state.view, View::Error(_)));
/// ```
pub fn update(state: &mut ShellState, event: ShellEvent) -> Option<Effect> {
    match event {
        ShellEvent::SelectDirectory(path) => {
            state.directory = Some(path);
            state.view = View::Idle;
            None
        }
        ShellEvent::AddRow => {
            state.rows.push(MappingRow::default());
            None
        }
        ShellEvent::EditRow {
            index,
            extension,
            folder,
        } => {
            match state.rows.get_mut(index) {
                Some(row) => *row = MappingRow::new(extension, folder),
                None => state.view = View::Error(format!("No rule row {}", index + 1)),
            }
            None
        }
        ShellEvent::RemoveRow(index) => {
            if index < state.rows.len() {
                state.rows.remove(index);
            }
            None
        }
        ShellEvent::RequestPreview => {
            let (directory, mapping) = validated_request(state, false)?;
            Some(Effect::Preview { directory, mapping })
        }
        ShellEvent::RequestApply => {
            let (directory, mapping) = validated_request(state, true)?;
            Some(Effect::Apply { directory, mapping })
        }
        ShellEvent::PreviewReady(grouping) => {
            state.view = View::Preview(grouping);
            None
        }
        ShellEvent::ApplyFinished(report) => {
            state.view = View::Applied(report);
            None
        }
        ShellEvent::OperationFailed(message) => {
            state.view = View::Error(message);
            None
        }
    }
}

fn validated_request(
    state: &mut ShellState,
    require_rules: bool,
) -> Option<(PathBuf, ExtensionMapping)> {
    let Some(directory) = state.directory.clone() else {
        state.view = View::Error("Please select a folder first.".to_string());
        return None;
    };
    let mapping = match ExtensionMapping::from_rows(&state.rows) {
        Ok(mapping) => mapping,
        Err(e) => {
            state.view = View::Error(format!("Invalid rule: {}", e));
            return None;
        }
    };
    if require_rules && mapping.is_empty() {
        state.view = View::Error("Add at least one extension rule before sorting.".to_string());
        return None;
    }
    Some((directory, mapping))
}

/// Visual role of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Section title.
    Header,
    /// A target folder in the preview tree.
    Folder,
    /// The bucket of files without a rule.
    Fallback,
    /// A file name under a folder.
    File,
    Success,
    Warning,
    /// One failure; every failed file gets its own line.
    Failure,
    Plain,
}

/// One line of rendered output, styled by the front end according to its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Draws the current view.
///
/// A preview is drawn as a tree: each folder as `Folder/ (N files)` followed
/// by its indented file names, the fallback bucket as `Label (no rule, N
/// files)`. A report is either a one-line success summary or a warning line
/// followed by one failure line per failed file.
pub fn render(state: &ShellState) -> Vec<Line> {
    match &state.view {
        View::Idle => vec![Line::new(
            LineKind::Plain,
            "Select a folder and add extension rules, then preview or sort.",
        )],
        View::Preview(grouping) => render_preview(grouping),
        View::Applied(report) => render_report(report),
        View::Error(message) => vec![Line::new(LineKind::Failure, message.clone())],
    }
}

fn render_preview(grouping: &Grouping) -> Vec<Line> {
    if grouping.is_empty() {
        return vec![Line::new(LineKind::Plain, "No files to sort.")];
    }

    let mut lines = vec![Line::new(LineKind::Header, "PREVIEW")];
    for group in grouping.groups() {
        // The fallback bucket is never created on disk, so it gets no trailing slash
        let header = if group.fallback {
            Line::new(
                LineKind::Fallback,
                format!("{} (no rule, {})", group.label, plural(group.files.len())),
            )
        } else {
            Line::new(
                LineKind::Folder,
                format!("{}/ ({})", group.label, plural(group.files.len())),
            )
        };
        lines.push(header);
        lines.extend(
            group
                .files
                .iter()
                .map(|file| Line::new(LineKind::File, format!("  {}", file))),
        );
    }
    lines
}

fn render_report(report: &ApplyReport) -> Vec<Line> {
    let moved = report.moved_count();
    let skipped = report.skipped_count();

    if report.is_complete_success() {
        let mut lines = vec![Line::new(
            LineKind::Success,
            format!("Sorted {} into subfolders.", plural(moved)),
        )];
        if skipped > 0 {
            lines.push(Line::new(
                LineKind::Plain,
                format!("Left {} without a rule in place.", plural(skipped)),
            ));
        }
        return lines;
    }

    let mut lines = vec![Line::new(
        LineKind::Warning,
        format!(
            "Moved {}, {} failed:",
            plural(moved),
            report.failure_count()
        ),
    )];
    for outcome in &report.outcomes {
        if let OutcomeStatus::Failed(failure) = &outcome.status {
            lines.push(Line::new(
                LineKind::Failure,
                format!("  {}: {}", outcome.file_name, failure),
            ));
        }
    }
    lines
}

fn plural(count: usize) -> String {
    format!("{} {}", count, if count == 1 { "file" } else { "files" })
}
