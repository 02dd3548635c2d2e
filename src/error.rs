use std::path::PathBuf;
use thiserror::Error;

use crate::core::entry::{EntryId, EntryKind};

/// Rejected user intent. The store is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title cannot be empty.")]
    EmptyTitle,
    #[error("Snooze time must be in the future.")]
    SnoozeNotInFuture,
    #[error("Unsupported file type. Please select a JSON or CSV file.")]
    UnsupportedFileType(String),
    #[error("No entry matches `{0}`.")]
    NotFound(String),
    #[error("`{0}` matches more than one entry; use a longer id.")]
    AmbiguousId(String),
    #[error("{action} does not apply to a {kind:?}.")]
    NotApplicable { action: &'static str, kind: EntryKind },
    #[error("Completed or archived entries cannot be snoozed.")]
    NotSnoozable,
    #[error("Could not resolve snooze preset.")]
    UnresolvablePreset,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to read the file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Import failed. Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Import failed. JSON data must be an array of entries.")]
    NotAnArray,
    #[error("Import failed. CSV file has no header row.")]
    EmptyCsv,
    #[error("Import failed: CSV headers are missing essential fields ({}).", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Import failed. Unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No data to export.")]
    Empty,
    #[error("Failed to serialize entries: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Entry file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize entries: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Entry id {0} already exists")]
    DuplicateId(EntryId),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
