//! Batch run orchestration.
//!
//! A run loads the song list once, fetches every pending song through the
//! dispatcher, reports, then commits the successes in a single write:
//! - Setup errors (bad config, unusable output dir) abort before any fetch
//! - An unreadable song list degrades to an empty batch
//! - Per-song failures are data, never errors
//! - A failed commit is an error that still carries the report

mod runner;
mod types;

pub use runner::BatchRunner;
pub use types::{BatchError, BatchResult};
