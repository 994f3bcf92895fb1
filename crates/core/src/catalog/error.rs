//! Error types for catalog loading and committing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading the song list.
///
/// A batch treats any of these as "nothing to do" rather than aborting.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source file does not exist.
    #[error("Song list not found: {path}")]
    NotFound { path: PathBuf },

    /// The source file could not be read.
    #[error("Failed to read song list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file does not have the expected shape.
    #[error("Malformed song list {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The file declares a schema version this build does not understand.
    #[error("Unsupported song list version {found} in {path} (supported: {supported})")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
}

impl LoadError {
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source: err }
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while persisting an updated catalog.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Writing, syncing or renaming the file failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog could not be encoded.
    #[error("Failed to encode catalog: {0}")]
    Encode(String),

    /// The store refused the write.
    #[error("Catalog store rejected commit: {0}")]
    Rejected(String),
}

impl CommitError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
