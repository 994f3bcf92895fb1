//! Persisting a migration.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogStore, CommitError, WorkItem};
use crate::dispatcher::Outcome;
use crate::events::{BatchEvent, EventSink};

use super::migration::apply_outcomes;

/// What a commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Songs moved from pending to done.
    pub moved: usize,
    /// Whether the store was written at all.
    pub written: bool,
}

/// A commit that did not reach the store.
///
/// Carries every song that was fetched but is still recorded as pending, so
/// the caller can tell the operator exactly what was not persisted.
#[derive(Debug, Error)]
#[error("Failed to commit catalog to {location}; {} fetched songs not recorded: {source}", .unpersisted.len())]
pub struct CommitFailure {
    pub location: String,
    pub unpersisted: Vec<WorkItem>,
    #[source]
    pub source: CommitError,
}

/// Applies batch outcomes to the persisted catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionTracker;

impl CompletionTracker {
    pub fn new() -> Self {
        Self
    }

    /// Moves succeeded songs to done and writes the catalog once.
    ///
    /// Must only be called after every outcome of the batch is collected.
    /// Nothing is written when no song succeeded.
    pub fn commit(
        &self,
        store: &dyn CatalogStore,
        catalog: &Catalog,
        outcomes: &[Outcome],
        sink: &dyn EventSink,
    ) -> Result<CommitSummary, CommitFailure> {
        let migration = apply_outcomes(catalog, outcomes);

        if migration.is_noop() {
            debug!("No successful fetches; catalog left untouched");
            sink.info(BatchEvent::CommitSkipped {
                reason: "no song was fetched successfully".to_string(),
            });
            return Ok(CommitSummary::default());
        }

        let moved = migration.moved.len();
        match store.commit(&migration.catalog) {
            Ok(()) => {
                info!(
                    store = store.name(),
                    moved,
                    pending = migration.catalog.pending_count(),
                    done = migration.catalog.done_count(),
                    "Catalog committed"
                );
                sink.info(BatchEvent::CatalogCommitted {
                    location: store.location(),
                    moved,
                });
                Ok(CommitSummary {
                    moved,
                    written: true,
                })
            }
            Err(e) => {
                sink.error(BatchEvent::CommitFailed {
                    location: store.location(),
                    error: e.to_string(),
                    unpersisted: moved,
                });
                Err(CommitFailure {
                    location: store.location(),
                    unpersisted: migration.moved,
                    source: e,
                })
            }
        }
    }
}
