//! Recording loader errors.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Data directory does not exist: {0:?}")]
    MissingDirectory(PathBuf),

    #[error("No .json recordings in {dir:?}. Contents: {contents:?}")]
    NoRecordings { dir: PathBuf, contents: Vec<String> },

    #[error("No data for {subject} in files: {}", .files.join(", "))]
    SubjectNotFound { subject: String, files: Vec<String> },

    #[error("Cannot pick a default subject, found {} files with differing subjects", .subjects_by_file.len())]
    AmbiguousSubject {
        subjects_by_file: BTreeMap<String, Vec<String>>,
    },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Whether the error means "no such data" rather than a failure to read it.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::MissingDirectory(_)
                | LoadError::NoRecordings { .. }
                | LoadError::SubjectNotFound { .. }
        )
    }
}
