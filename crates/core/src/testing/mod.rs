//! Testing utilities and mock implementations.
//!
//! These stand in for the downloader, the persisted song list and the event
//! sink so a whole batch can run in-process without yt-dlp or real files.
//!
//! # Example
//!
//! ```rust,ignore
//! use songfetch_core::testing::{CapturingSink, MemoryCatalogStore, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.fail_query("Artist - Missing", "no result");
//!
//! let store = MemoryCatalogStore::new(fixtures::catalog(&[("Artist", &["Song"])]));
//! let sink = CapturingSink::new();
//! ```

mod capturing_sink;
mod memory_store;
mod mock_fetcher;

pub use capturing_sink::CapturingSink;
pub use memory_store::MemoryCatalogStore;
pub use mock_fetcher::MockFetcher;

use std::sync::{Mutex, MutexGuard};

/// Locks a mock's state, recovering from a panic in another test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{Catalog, TitlesByArtist, WorkItem};

    /// Builds a pending map from `(artist, titles)` pairs.
    pub fn titles(entries: &[(&str, &[&str])]) -> TitlesByArtist {
        entries
            .iter()
            .map(|(artist, titles)| {
                (
                    artist.to_string(),
                    titles.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    /// A catalog with the given pending songs and nothing done.
    pub fn catalog(pending: &[(&str, &[&str])]) -> Catalog {
        Catalog::with_pending(titles(pending))
    }

    /// A catalog with both pending and done songs.
    pub fn catalog_with_done(pending: &[(&str, &[&str])], done: &[(&str, &[&str])]) -> Catalog {
        Catalog {
            pending: titles(pending),
            done: titles(done),
        }
    }

    /// `count` distinct songs by one artist: "Song 0", "Song 1", ...
    pub fn numbered_items(artist: &str, count: usize) -> Vec<WorkItem> {
        (0..count)
            .map(|i| WorkItem::new(artist, format!("Song {}", i)))
            .collect()
    }
}
