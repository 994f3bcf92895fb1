//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching one song.
///
/// The batch core does not branch on the variant; every error becomes the
/// failure reason of that song's outcome.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The downloader binary could not be started.
    #[error("Downloader not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The search produced no result.
    #[error("No result for query: {query}")]
    NotFound { query: String },

    /// The downloader ran but failed.
    #[error("Download failed: {reason}")]
    DownloadFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The fetch did not finish in time.
    #[error("Fetch timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The fetch task panicked.
    #[error("Fetch task panicked: {0}")]
    Panicked(String),

    /// I/O error while fetching.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The fetch was cancelled before it started.
    #[error("Cancelled before dispatch")]
    Cancelled,

    /// The worker holding this song died before reporting a result.
    #[error("Worker terminated before reporting an outcome")]
    WorkerTerminated,
}

impl FetchError {
    /// Creates a new download failed error with stderr output.
    pub fn download_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::DownloadFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Reason string recorded in the song's failure outcome.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Whether retrying the same song later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Io(_)
                | Self::DownloadFailed { .. }
                | Self::Cancelled
                | Self::WorkerTerminated
        )
    }
}
