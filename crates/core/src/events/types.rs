//! Batch event types and their envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How loudly an event should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Batch event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    // Setup
    BatchStarted {
        run_id: String,
        total: usize,
        concurrency: usize,
        output_dir: String,
    },
    LoadFailed {
        location: String,
        error: String,
    },
    RowSkipped {
        location: String,
        line: u64,
        reason: String,
    },
    NothingPending {
        location: String,
    },

    // Per item
    ItemStarted {
        artist: String,
        title: String,
    },
    ItemSucceeded {
        artist: String,
        title: String,
        path: Option<String>,
        elapsed_ms: u64,
    },
    ItemFailed {
        artist: String,
        title: String,
        reason: String,
    },

    // Shutdown
    BatchCancelled {
        undispatched: usize,
    },

    // Commit
    CatalogCommitted {
        location: String,
        moved: usize,
    },
    CommitSkipped {
        reason: String,
    },
    CommitFailed {
        location: String,
        error: String,
        unpersisted: usize,
    },

    // Summary
    BatchSummary {
        run_id: String,
        total: usize,
        succeeded: usize,
        failed: usize,
    },
    FailureListed {
        artist: String,
        title: String,
        reason: String,
    },
}

impl BatchEvent {
    /// Snake-case name of the variant, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            BatchEvent::BatchStarted { .. } => "batch_started",
            BatchEvent::LoadFailed { .. } => "load_failed",
            BatchEvent::RowSkipped { .. } => "row_skipped",
            BatchEvent::NothingPending { .. } => "nothing_pending",
            BatchEvent::ItemStarted { .. } => "item_started",
            BatchEvent::ItemSucceeded { .. } => "item_succeeded",
            BatchEvent::ItemFailed { .. } => "item_failed",
            BatchEvent::BatchCancelled { .. } => "batch_cancelled",
            BatchEvent::CatalogCommitted { .. } => "catalog_committed",
            BatchEvent::CommitSkipped { .. } => "commit_skipped",
            BatchEvent::CommitFailed { .. } => "commit_failed",
            BatchEvent::BatchSummary { .. } => "batch_summary",
            BatchEvent::FailureListed { .. } => "failure_listed",
        }
    }

    /// One-line human description.
    pub fn message(&self) -> String {
        match self {
            BatchEvent::BatchStarted {
                total,
                concurrency,
                output_dir,
                ..
            } => format!(
                "Fetching {} song(s) into {} with {} worker(s)",
                total, output_dir, concurrency
            ),
            BatchEvent::LoadFailed { location, error } => {
                format!("Could not load song list from {}: {}", location, error)
            }
            BatchEvent::RowSkipped {
                location,
                line,
                reason,
            } => format!("Skipped row {} in {}: {}", line, location, reason),
            BatchEvent::NothingPending { location } => {
                format!("No pending songs found in {}", location)
            }
            BatchEvent::ItemStarted { artist, title } => {
                format!("Fetching {} - {}", artist, title)
            }
            BatchEvent::ItemSucceeded {
                artist,
                title,
                path,
                elapsed_ms,
            } => match path {
                Some(path) => format!(
                    "Fetched {} - {} -> {} ({} ms)",
                    artist, title, path, elapsed_ms
                ),
                None => format!("Fetched {} - {} ({} ms)", artist, title, elapsed_ms),
            },
            BatchEvent::ItemFailed {
                artist,
                title,
                reason,
            } => format!("Failed {} - {}: {}", artist, title, reason),
            BatchEvent::BatchCancelled { undispatched } => format!(
                "Batch cancelled, {} song(s) were not started",
                undispatched
            ),
            BatchEvent::CatalogCommitted { location, moved } => {
                format!("Moved {} song(s) to done in {}", moved, location)
            }
            BatchEvent::CommitSkipped { reason } => format!("Catalog left unchanged: {}", reason),
            BatchEvent::CommitFailed {
                location,
                error,
                unpersisted,
            } => format!(
                "Could not update {}: {} ({} completed song(s) NOT recorded as done)",
                location, error, unpersisted
            ),
            BatchEvent::BatchSummary {
                total,
                succeeded,
                failed,
                ..
            } => format!(
                "Batch finished: {} total, {} succeeded, {} failed",
                total, succeeded, failed
            ),
            BatchEvent::FailureListed {
                artist,
                title,
                reason,
            } => format!("Still pending: {} - {} ({})", artist, title, reason),
        }
    }
}

/// Envelope wrapping an event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub event: BatchEvent,
}

impl EventEnvelope {
    pub fn new(severity: Severity, event: BatchEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tag() {
        let event = BatchEvent::ItemFailed {
            artist: "A".to_string(),
            title: "S2".to_string(),
            reason: "not found".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"item_failed\""));

        let parsed: BatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_kind_matches_tag() {
        let event = BatchEvent::CatalogCommitted {
            location: "songs.json".to_string(),
            moved: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind());
    }

    #[test]
    fn test_commit_failed_message_is_loud() {
        let event = BatchEvent::CommitFailed {
            location: "songs.json".to_string(),
            error: "disk full".to_string(),
            unpersisted: 3,
        };
        assert!(event.message().contains("NOT recorded"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Info);
    }
}
