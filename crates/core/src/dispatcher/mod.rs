//! Dispatcher module - bounded-concurrency fan-out of work items to a fetcher.
//!
//! The `Dispatcher` runs a fixed pool of long-lived workers over a shared
//! queue. Each worker takes one item, fetches it to completion, reports an
//! [`Outcome`] through a channel, and takes the next. Failures (errors,
//! panics, timeouts) are captured per item and never stop the batch.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use songfetch_core::dispatcher::{Dispatcher, DispatcherConfig};
//! use songfetch_core::fetcher::YtDlpFetcher;
//!
//! let fetcher = Arc::new(YtDlpFetcher::with_defaults());
//! let dispatcher = Dispatcher::new(DispatcherConfig::default(), fetcher)?;
//!
//! let outcomes = dispatcher
//!     .run(items, Path::new("/music"), &CancellationToken::new())
//!     .await;
//! assert_eq!(outcomes.len(), item_count);
//! ```

mod config;
mod pool;
mod types;

pub use config::DispatcherConfig;
pub use pool::Dispatcher;
pub use types::{DispatcherStatus, Outcome, OutcomeStatus};
