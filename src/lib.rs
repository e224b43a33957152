//! extsort - sort the files of a directory into subfolders by extension
//!
//! This library turns user-typed extension rules into an immutable mapping,
//! previews how a directory's top-level files would be grouped, and moves
//! them into per-folder subdirectories with per-file error reporting. A small
//! message-driven shell and TOML configuration sit on top for front ends.

pub mod categorizer;
pub mod cli;
pub mod config;
pub mod mapping;
pub mod output;
pub mod shell;

pub use categorizer::{
    ApplyFailure, ApplyReport, CategorizeError, Categorizer, FileOutcome, Grouping, OutcomeStatus,
    UnmappedPolicy,
};
pub use config::{Config, ConfigError};
pub use mapping::{ExtensionMapping, MappingError, MappingRow};

pub use cli::{Args, SortCommand, run_cli};
