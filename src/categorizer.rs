//! Classification of a directory's files by extension, and relocation into
//! per-folder subdirectories.
//!
//! A run is always a single pass over one directory level: scan once into a
//! [`Plan`], then either turn the plan into a [`Grouping`] for display or
//! execute it. Executing never re-scans, so the moves act on exactly the
//! files that were classified.
use crate::mapping::{ExtensionMapping, extension_of};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Label of the fallback bucket for files whose extension has no rule.
pub const DEFAULT_UNSORTED_LABEL: &str = "Unsorted";

/// Errors that abort a preview or apply before anything is changed.
#[derive(Debug, Error)]
pub enum CategorizeError {
    /// The path does not exist or is not a directory.
    #[error("directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },
    /// The directory exists but cannot be listed.
    #[error("permission denied while listing {}", .path.display())]
    PermissionDenied { path: PathBuf, source: io::Error },
    /// Any other failure to list the directory.
    #[error("failed to read directory {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Result type for categorization operations.
pub type CategorizeResult<T> = Result<T, CategorizeError>;

/// Why a single file could not be moved.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyFailure {
    /// The target folder could not be created, so none of its files moved.
    #[error("cannot create folder '{folder}': {reason}")]
    TargetCreationFailed { folder: String, reason: String },
    /// The rename itself failed.
    #[error("cannot move to {}: {reason}", .destination.display())]
    MoveFailed { destination: PathBuf, reason: String },
}

/// What should happen to files whose extension has no rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Leave them where they are and keep them out of the preview.
    Leave,
    /// Show them in the fallback bucket of the preview. They are still never moved.
    #[default]
    Unsorted,
}

impl std::str::FromStr for UnmappedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leave" => Ok(Self::Leave),
            "unsorted" => Ok(Self::Unsorted),
            other => Err(format!(
                "unknown policy '{}': expected 'leave' or 'unsorted'",
                other
            )),
        }
    }
}

/// A file found at the top level of the scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    file_name: OsString,
    /// Display form of the file name.
    pub name: String,
    /// Normalized extension, empty when the file has none.
    pub extension: String,
}

impl DirectoryEntry {
    fn new(file_name: OsString) -> Self {
        let name = file_name.to_string_lossy().into_owned();
        let extension = extension_of(&name);
        Self {
            file_name,
            name,
            extension,
        }
    }
}

/// A scanned directory with every file already classified.
#[derive(Debug, Clone)]
pub struct Plan {
    directory: PathBuf,
    entries: Vec<(DirectoryEntry, Option<String>)>,
}

impl Plan {
    /// The directory that was scanned; moves happen inside it.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of files found, mapped or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the directory held no files at scan time.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files that have a target folder.
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|(_, f)| f.is_some()).count()
    }

    /// Buckets entries by target, groups ordered by first use and files in scan order.
    fn buckets(&self) -> Vec<(Option<&str>, Vec<&DirectoryEntry>)> {
        let mut buckets: Vec<(Option<&str>, Vec<&DirectoryEntry>)> = Vec::new();
        for (entry, folder) in &self.entries {
            let folder = folder.as_deref();
            match buckets.iter_mut().find(|(f, _)| *f == folder) {
                Some((_, files)) => files.push(entry),
                None => buckets.push((folder, vec![entry])),
            }
        }
        buckets
    }
}

/// One bucket of a [`Grouping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Target folder name, or the fallback label.
    pub label: String,
    /// True for the fallback bucket of unmapped files.
    pub fallback: bool,
    /// File names in scan order.
    pub files: Vec<String>,
}

/// Files of a directory bucketed by target folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grouping {
    groups: Vec<Group>,
}

impl Grouping {
    /// All groups, in order of first use during the scan.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Files going to the folder `label`. Mapped folders are matched before
    /// the fallback bucket in case both share a name.
    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .filter(|g| g.label == label)
            .min_by_key(|g| g.fallback)
            .map(|g| g.files.as_slice())
    }

    /// The fallback bucket, if the policy produced one.
    pub fn unsorted(&self) -> Option<&Group> {
        self.groups.iter().find(|g| g.fallback)
    }

    /// Total number of files across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    /// True if no file was grouped.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Outcome of one file during apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The file now lives at `destination`.
    Moved { destination: PathBuf },
    /// The file was left in place on purpose.
    Skipped { reason: String },
    /// The file was left in place because something went wrong.
    Failed(ApplyFailure),
}

/// What happened to one file of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Display form of the file name, as in the preview.
    pub file_name: String,
    /// The folder the file was meant for; `None` for unmapped files.
    pub folder: Option<String>,
    pub status: OutcomeStatus,
}

impl FileOutcome {
    /// True if the file failed to move.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// Per-file results of an apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// RFC 3339 timestamp of when the run started.
    pub started_at: String,
    /// The directory that was sorted.
    pub directory: PathBuf,
    /// One entry per file, in the order files were processed.
    pub outcomes: Vec<FileOutcome>,
}

impl ApplyReport {
    fn new(directory: &Path) -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            directory: directory.to_path_buf(),
            outcomes: Vec::new(),
        }
    }

    /// Number of files moved into a folder.
    pub fn moved_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Moved { .. }))
            .count()
    }

    /// Number of unmapped files left in place.
    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Skipped { .. }))
            .count()
    }

    /// Files that failed, with the failure.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ApplyFailure)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            OutcomeStatus::Failed(failure) => Some((o.file_name.as_str(), failure)),
            _ => None,
        })
    }

    /// Number of files that failed to move.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True if nothing failed. Skipped files do not count as failures.
    pub fn is_complete_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// The outcome recorded for `file_name`, if it was part of the run.
    pub fn outcome_for(&self, file_name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file_name == file_name)
    }
}

/// Sorts the files of one directory into subfolders by extension.
#[derive(Debug, Clone)]
pub struct Categorizer {
    mapping: ExtensionMapping,
    policy: UnmappedPolicy,
    unsorted_label: String,
}

impl Categorizer {
    /// Creates a categorizer with the default policy (`Unsorted`) and label.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extsort::categorizer::{Categorizer, UnmappedPolicy};
    /// use extsort::mapping::ExtensionMapping;
    /// use std::path::Path;
    ///
    /// let mapping = ExtensionMapping::from_pairs([("jpg", "Images")]).unwrap();
    /// let categorizer = Categorizer::new(mapping).with_policy(UnmappedPolicy::Leave);
    ///
    /// match categorizer.apply(Path::new("/path/to/dir")) {
    ///     Ok(report) => println!("Moved {} files", report.moved_count()),
    ///     Err(e) => eprintln!("Sorting failed: {}", e),
    /// }
    /// ```
    pub fn new(mapping: ExtensionMapping) -> Self {
        Self {
            mapping,
            policy: UnmappedPolicy::default(),
            unsorted_label: DEFAULT_UNSORTED_LABEL.to_string(),
        }
    }

    /// Sets how files without a rule are treated.
    pub fn with_policy(mut self, policy: UnmappedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the label of the preview bucket for files without a rule.
    pub fn with_unsorted_label(mut self, label: impl Into<String>) -> Self {
        self.unsorted_label = label.into();
        self
    }

    /// Replaces the rules used by later calls.
    pub fn set_rules(&mut self, mapping: ExtensionMapping) {
        self.mapping = mapping;
    }

    /// The rules in effect.
    pub fn mapping(&self) -> &ExtensionMapping {
        &self.mapping
    }

    /// The policy for files without a rule.
    pub fn policy(&self) -> UnmappedPolicy {
        self.policy
    }

    /// Scans `dir` one level deep and classifies every file.
    ///
    /// Subdirectories, and symlinks that resolve to directories, are skipped.
    /// Entries that cannot be inspected are skipped with a warning instead of
    /// aborting the scan. Files are ordered by name so repeated scans of an
    /// unchanged directory agree.
    ///
    /// # Errors
    ///
    /// `DirectoryNotFound` if `dir` is missing or not a directory,
    /// `PermissionDenied` if it cannot be listed, `Io` otherwise.
    pub fn plan(&self, dir: &Path) -> CategorizeResult<Plan> {
        let listing = open_directory(dir)?;
        let mut entries = Vec::new();

        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
                continue;
            }

            let entry = DirectoryEntry::new(entry.file_name());
            let folder = self.mapping.folder_for(&entry.extension).map(str::to_string);
            debug!(
                "{} [{}] -> {}",
                entry.name,
                entry.extension,
                folder.as_deref().unwrap_or("<unmapped>")
            );
            entries.push((entry, folder));
        }

        entries.sort_by(|(a, _), (b, _)| a.file_name.cmp(&b.file_name));

        Ok(Plan {
            directory: dir.to_path_buf(),
            entries,
        })
    }

    /// Turns a plan into the grouping shown to the user.
    pub fn grouping(&self, plan: &Plan) -> Grouping {
        let groups = plan
            .buckets()
            .into_iter()
            .filter_map(|(folder, files)| {
                let files = files.into_iter().map(|e| e.name.clone()).collect();
                match folder {
                    Some(folder) => Some(Group {
                        label: folder.to_string(),
                        fallback: false,
                        files,
                    }),
                    None if self.policy == UnmappedPolicy::Unsorted => Some(Group {
                        label: self.unsorted_label.clone(),
                        fallback: true,
                        files,
                    }),
                    None => None,
                }
            })
            .collect();

        Grouping { groups }
    }

    /// Classifies the files of `dir` without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Same as [`Self::plan`].
    pub fn preview(&self, dir: &Path) -> CategorizeResult<Grouping> {
        let plan = self.plan(dir)?;
        Ok(self.grouping(&plan))
    }

    /// Scans `dir` once and moves every mapped file into its folder.
    ///
    /// With an empty mapping the directory is still validated but nothing is
    /// scanned or moved and the report is empty.
    ///
    /// # Errors
    ///
    /// Same as [`Self::plan`]. Per-file problems are never errors; they are
    /// recorded in the report.
    pub fn apply(&self, dir: &Path) -> CategorizeResult<ApplyReport> {
        if self.mapping.is_empty() {
            open_directory(dir)?;
            return Ok(ApplyReport::new(dir));
        }
        let plan = self.plan(dir)?;
        Ok(self.execute(&plan, |_| {}))
    }

    /// Executes a plan, calling `observer` after each file.
    ///
    /// Folder creation failures fail every file of that folder; move failures
    /// fail only the file. Neither stops the run. Unmapped files are reported
    /// as skipped under the `Unsorted` policy and omitted otherwise.
    pub fn execute<F>(&self, plan: &Plan, mut observer: F) -> ApplyReport
    where
        F: FnMut(&FileOutcome),
    {
        let mut report = ApplyReport::new(plan.directory());

        for (folder, entries) in plan.buckets() {
            let Some(folder) = folder else {
                if self.policy == UnmappedPolicy::Unsorted {
                    for entry in entries {
                        let outcome = FileOutcome {
                            file_name: entry.name.clone(),
                            folder: None,
                            status: OutcomeStatus::Skipped {
                                reason: "no rule for this extension".to_string(),
                            },
                        };
                        observer(&outcome);
                        report.outcomes.push(outcome);
                    }
                }
                continue;
            };

            let target_dir = plan.directory().join(folder);
            let prepared = ensure_folder(&target_dir).map_err(|e| {
                warn!("Cannot create folder {}: {}", target_dir.display(), e);
                ApplyFailure::TargetCreationFailed {
                    folder: folder.to_string(),
                    reason: e.to_string(),
                }
            });

            for entry in entries {
                let status = match &prepared {
                    Ok(()) => move_entry(plan.directory(), &target_dir, entry),
                    Err(failure) => OutcomeStatus::Failed(failure.clone()),
                };
                let outcome = FileOutcome {
                    file_name: entry.name.clone(),
                    folder: Some(folder.to_string()),
                    status,
                };
                observer(&outcome);
                report.outcomes.push(outcome);
            }
        }

        report
    }
}

fn open_directory(dir: &Path) -> CategorizeResult<ReadDir> {
    let classify = |e: io::Error| match e.kind() {
        io::ErrorKind::NotFound => CategorizeError::DirectoryNotFound {
            path: dir.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => CategorizeError::PermissionDenied {
            path: dir.to_path_buf(),
            source: e,
        },
        _ => CategorizeError::Io {
            path: dir.to_path_buf(),
            source: e,
        },
    };

    let metadata = fs::metadata(dir).map_err(classify)?;
    if !metadata.is_dir() {
        return Err(CategorizeError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    fs::read_dir(dir).map_err(classify)
}

/// Creates `path` as a directory unless it already is one.
fn ensure_folder(path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "a file with this name already exists",
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(path),
        Err(e) => Err(e),
    }
}

fn move_entry(base: &Path, target_dir: &Path, entry: &DirectoryEntry) -> OutcomeStatus {
    let source = base.join(&entry.file_name);
    let destination = target_dir.join(&entry.file_name);

    // rename() replaces an existing file on most platforms
    if fs::symlink_metadata(&destination).is_ok() {
        warn!("Not moving {}: {} exists", entry.name, destination.display());
        return OutcomeStatus::Failed(ApplyFailure::MoveFailed {
            destination,
            reason: "destination already exists".to_string(),
        });
    }

    match fs::rename(&source, &destination) {
        Ok(()) => {
            info!("Moved {} -> {}", source.display(), destination.display());
            OutcomeStatus::Moved { destination }
        }
        Err(e) => {
            warn!("Failed to move {}: {}", source.display(), e);
            OutcomeStatus::Failed(ApplyFailure::MoveFailed {
                destination,
                reason: e.to_string(),
            })
        }
    }
}
