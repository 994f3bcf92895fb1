//! Request and result types for fetching.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::WorkItem;

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Search query, `"{artist} - {title}"`.
    pub query: String,
    /// Directory the artifact is written to.
    pub output_dir: PathBuf,
    /// File name without extension; the fetcher picks the extension.
    pub file_stem: String,
}

impl FetchRequest {
    /// Builds the request for a work item.
    pub fn for_item(item: &WorkItem, output_dir: impl AsRef<Path>) -> Self {
        Self {
            query: item.query(),
            output_dir: output_dir.as_ref().to_path_buf(),
            file_stem: item.file_stem(),
        }
    }

    /// The artifact path for a given extension.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.file_stem, extension))
    }
}

/// A fetched audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedArtifact {
    /// Final path of the audio file, when the fetcher reports it.
    pub path: Option<PathBuf>,
    /// File size in bytes, when known.
    pub size_bytes: Option<u64>,
    /// Wall-clock time the fetch took.
    pub elapsed_ms: u64,
}
