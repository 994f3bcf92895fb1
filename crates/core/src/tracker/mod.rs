//! Completion tracking.
//!
//! After every outcome of a batch is in, the tracker moves the songs that were
//! fetched from `pending` to `done` and persists the result in one atomic
//! commit. Songs that failed stay pending so the next run retries them.

mod commit;
mod migration;

pub use commit::{CommitFailure, CommitSummary, CompletionTracker};
pub use migration::{apply_outcomes, Migration};
