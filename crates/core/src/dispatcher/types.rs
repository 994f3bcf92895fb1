//! Types for the dispatcher module.

use serde::{Deserialize, Serialize};

use crate::catalog::WorkItem;
use crate::fetcher::FetchedArtifact;

/// Result of fetching one work item. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub item: WorkItem,
    pub status: OutcomeStatus,
}

/// Success or failure of one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success { artifact: FetchedArtifact },
    Failure { reason: String },
}

impl Outcome {
    pub fn success(item: WorkItem, artifact: FetchedArtifact) -> Self {
        Self {
            item,
            status: OutcomeStatus::Success { artifact },
        }
    }

    pub fn failure(item: WorkItem, reason: impl Into<String>) -> Self {
        Self {
            item,
            status: OutcomeStatus::Failure {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    /// The failure reason, if this outcome is a failure.
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Failure { reason } => Some(reason),
            OutcomeStatus::Success { .. } => None,
        }
    }
}

/// Snapshot of the dispatcher's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStatus {
    /// Configured worker limit.
    pub concurrency: usize,
    /// Fetches currently in flight.
    pub active: usize,
    /// Highest number of fetches seen in flight at once.
    pub peak_active: usize,
    /// Items waiting for a worker.
    pub queued: usize,
    /// Items fetched successfully since creation.
    pub total_succeeded: u64,
    /// Items that failed since creation.
    pub total_failed: u64,
}
