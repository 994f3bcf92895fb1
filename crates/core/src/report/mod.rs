//! Batch result reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::WorkItem;
use crate::dispatcher::{Outcome, OutcomeStatus};
use crate::events::{BatchEvent, EventSink};

/// A song that could not be fetched, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub item: WorkItem,
    pub reason: String,
}

/// Summary of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures in outcome order, enough to retry just this subset.
    pub failures: Vec<FailedItem>,
}

impl BatchReport {
    /// Aggregates outcomes into a report. Has no side effects.
    pub fn from_outcomes(
        run_id: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        outcomes: &[Outcome],
    ) -> Self {
        let failures: Vec<FailedItem> = outcomes
            .iter()
            .filter_map(|o| match &o.status {
                OutcomeStatus::Failure { reason } => Some(FailedItem {
                    item: o.item.clone(),
                    reason: reason.clone(),
                }),
                OutcomeStatus::Success { .. } => None,
            })
            .collect();

        Self {
            run_id: run_id.into(),
            started_at,
            finished_at,
            total: outcomes.len(),
            succeeded: outcomes.len() - failures.len(),
            failed: failures.len(),
            failures,
        }
    }

    /// Report for a run that had nothing to do.
    pub fn empty(run_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::from_outcomes(run_id, at, at, &[])
    }

    /// True when no song failed. An empty batch counts as a full success.
    pub fn is_full_success(&self) -> bool {
        self.failed == 0
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Emits the summary, then one line per failure.
    pub fn log_summary(&self, sink: &dyn EventSink) {
        let summary = BatchEvent::BatchSummary {
            run_id: self.run_id.clone(),
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
        };
        if self.is_full_success() {
            sink.info(summary);
        } else {
            sink.warn(summary);
        }

        for failure in &self.failures {
            sink.warn(BatchEvent::FailureListed {
                artist: failure.item.artist.clone(),
                title: failure.item.title.clone(),
                reason: failure.reason.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchedArtifact;
    use crate::testing::CapturingSink;

    fn outcomes() -> Vec<Outcome> {
        vec![
            Outcome::success(
                WorkItem::new("A", "S1"),
                FetchedArtifact {
                    path: None,
                    size_bytes: None,
                    elapsed_ms: 10,
                },
            ),
            Outcome::failure(WorkItem::new("A", "S2"), "No result for query: A - S2"),
            Outcome::failure(WorkItem::new("B", "S3"), "timed out"),
        ]
    }

    #[test]
    fn test_from_outcomes_counts() {
        let now = Utc::now();
        let report = BatchReport::from_outcomes("run-1", now, now, &outcomes());

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failures[0].item, WorkItem::new("A", "S2"));
        assert_eq!(report.failures[1].reason, "timed out");
        assert!(!report.is_full_success());
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::empty("run-2", Utc::now());

        assert_eq!(report.total, 0);
        assert!(report.failures.is_empty());
        assert!(report.is_full_success());
        assert_eq!(report.duration_ms(), 0);
    }

    #[test]
    fn test_log_summary_lists_failures() {
        let now = Utc::now();
        let report = BatchReport::from_outcomes("run-3", now, now, &outcomes());
        let sink = CapturingSink::new();

        report.log_summary(&sink);

        assert_eq!(
            sink.kinds(),
            vec!["batch_summary", "failure_listed", "failure_listed"]
        );
        assert!(matches!(
            sink.warnings()[0],
            BatchEvent::BatchSummary { failed: 2, .. }
        ));
        assert_eq!(sink.warnings().len(), 3);
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_report_serializes() {
        let now = Utc::now();
        let report = BatchReport::from_outcomes("run-4", now, now, &outcomes());

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["run_id"], "run-4");
        assert_eq!(json["failed"], 2);
        assert_eq!(json["failures"][0]["item"]["title"], "S2");
    }
}
