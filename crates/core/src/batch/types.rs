//! Types for batch runs.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::dispatcher::Outcome;
use crate::fetcher::FetchError;
use crate::report::BatchReport;
use crate::tracker::{CommitFailure, CommitSummary};

/// Errors that end a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Configuration or output directory problem; nothing was fetched.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The downloader failed its startup check.
    #[error("downloader check failed: {0}")]
    Fetcher(#[from] FetchError),

    /// Songs were fetched but the catalog could not be updated.
    #[error("{source}")]
    Commit {
        report: Box<BatchReport>,
        #[source]
        source: CommitFailure,
    },
}

impl BatchError {
    /// The report of the run, if fetching happened before the error.
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            Self::Config(_) | Self::Fetcher(_) => None,
            Self::Commit { report, .. } => Some(report),
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub report: BatchReport,
    pub commit: CommitSummary,
    /// One outcome per dispatched song, in completion order.
    #[serde(skip)]
    pub outcomes: Vec<Outcome>,
}

impl BatchResult {
    pub fn is_full_success(&self) -> bool {
        self.report.is_full_success()
    }
}
