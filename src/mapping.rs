//! Extension-to-folder rules.
//!
//! Users type rules as free-form `(extension, folder)` rows. This module turns
//! those rows into an immutable [`ExtensionMapping`] whose keys are always
//! normalized: trimmed, lowercase, without leading dots. The empty key stands
//! for files that have no extension.
//!
//! # Examples
//!
//! ```
//! use extsort::mapping::{ExtensionMapping, extension_of};
//!
//! let mapping = ExtensionMapping::from_pairs([(".JPG", "Images"), ("pdf", "Documents")]).unwrap();
//! assert_eq!(mapping.folder_for("jpg"), Some("Images"));
//! assert_eq!(mapping.folder_for(&extension_of("scan.PDF")), Some("Documents"));
//! assert_eq!(mapping.folder_for("txt"), None);
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while turning user rows into a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A rule names an extension but no folder.
    #[error("rule for extension '{extension}' has no folder name")]
    EmptyFolder { extension: String },
    /// The folder name would escape the scanned directory or is not a plain name.
    #[error("'{folder}' is not a valid folder name")]
    InvalidFolder { folder: String },
    /// Two rules send the same extension to different folders.
    #[error("extension '{extension}' is mapped to both '{first}' and '{second}'")]
    ConflictingRule {
        extension: String,
        first: String,
        second: String,
    },
    /// A textual rule could not be split into extension and folder.
    #[error("cannot parse rule '{0}': expected EXT=FOLDER")]
    MalformedRow(String),
}

/// One rule as the user typed it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub extension: String,
    pub folder: String,
}

impl MappingRow {
    pub fn new(extension: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            folder: folder.into(),
        }
    }

    /// True when both fields are blank; such rows are ignored.
    pub fn is_blank(&self) -> bool {
        self.extension.trim().is_empty() && self.folder.trim().is_empty()
    }
}

impl std::str::FromStr for MappingRow {
    type Err = MappingError;

    /// Parses `EXT=FOLDER`, e.g. `jpg=Images` or `=NoExtension`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (extension, folder) = s
            .split_once('=')
            .ok_or_else(|| MappingError::MalformedRow(s.to_string()))?;
        Ok(Self::new(extension, folder))
    }
}

/// Normalizes a user-supplied extension: trims whitespace, strips leading
/// dots and lowercases. `".JPG"`, `"jpg"` and `" Jpg "` all become `"jpg"`.
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}

/// Returns the normalized extension of a file name.
///
/// Names without a dot, dotfiles such as `.bashrc` and names ending in a dot
/// all have the empty extension.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn validate_folder(folder: &str) -> Result<(), MappingError> {
    let invalid = folder == "."
        || folder == ".."
        || folder.contains('/')
        || folder.contains('\\')
        || folder.contains('\0');
    if invalid {
        return Err(MappingError::InvalidFolder {
            folder: folder.to_string(),
        });
    }
    Ok(())
}

/// The complete set of extension → folder rules for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionMapping {
    rules: BTreeMap<String, String>,
}

impl ExtensionMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mapping from user rows.
    ///
    /// Blank rows are skipped. A repeated rule with the same folder is
    /// accepted; a repeated extension with a different folder is an error.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = &'a MappingRow>,
    {
        let mut rules: BTreeMap<String, String> = BTreeMap::new();

        for row in rows {
            if row.is_blank() {
                continue;
            }
            let extension = normalize_extension(&row.extension);
            let folder = row.folder.trim();
            if folder.is_empty() {
                return Err(MappingError::EmptyFolder { extension });
            }
            validate_folder(folder)?;

            match rules.get(&extension) {
                Some(existing) if existing != folder => {
                    return Err(MappingError::ConflictingRule {
                        extension,
                        first: existing.clone(),
                        second: folder.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    rules.insert(extension, folder.to_string());
                }
            }
        }

        Ok(Self { rules })
    }

    /// Convenience constructor from `(extension, folder)` pairs.
    pub fn from_pairs<E, F, I>(pairs: I) -> Result<Self, MappingError>
    where
        E: Into<String>,
        F: Into<String>,
        I: IntoIterator<Item = (E, F)>,
    {
        let rows: Vec<MappingRow> = pairs
            .into_iter()
            .map(|(ext, folder)| MappingRow::new(ext, folder))
            .collect();
        Self::from_rows(&rows)
    }

    /// Looks up the folder for an extension. The argument is normalized first.
    pub fn folder_for(&self, extension: &str) -> Option<&str> {
        self.rules
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates rules in extension order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Layers `overrides` on top of `self`; rules in `overrides` win.
    ///
    /// Used to put rules given on the command line over configured ones.
    pub fn merged_with(&self, overrides: &ExtensionMapping) -> ExtensionMapping {
        let mut rules = self.rules.clone();
        for (ext, folder) in &overrides.rules {
            rules.insert(ext.clone(), folder.clone());
        }
        ExtensionMapping { rules }
    }
}
