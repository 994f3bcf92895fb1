//! Song catalog - the persisted pending/done state and the work it yields.
//!
//! The catalog is the single source of truth for what still needs fetching.
//! It is read once when a batch starts and written at most once when the
//! batch ends, so no locking is needed around it.

mod atomic;
mod csv_store;
mod error;
mod json_store;
mod store;
mod types;

pub use csv_store::CsvCatalogStore;
pub use error::{CommitError, LoadError};
pub use json_store::{JsonCatalogStore, CATALOG_SCHEMA_VERSION};
pub use store::{CatalogStore, LoadedCatalog, SkippedRow};
pub use types::*;

use crate::config::{SourceConfig, SourceFormat};
use crate::events::{BatchEvent, EventSink};

/// Creates the store matching the configured source format.
pub fn open_store(config: &SourceConfig) -> Box<dyn CatalogStore> {
    match config.format.resolve(&config.path) {
        SourceFormat::Csv => Box::new(CsvCatalogStore::new(&config.path)),
        _ => Box::new(JsonCatalogStore::new(&config.path)),
    }
}

/// Loads the catalog, degrading to an empty one when it cannot be read.
///
/// A load failure is reported through the sink but never aborts the caller.
pub fn load_or_empty(store: &dyn CatalogStore, sink: &dyn EventSink) -> Catalog {
    match store.load() {
        Ok(loaded) => {
            for row in loaded.skipped {
                sink.warn(BatchEvent::RowSkipped {
                    location: store.location(),
                    line: row.line,
                    reason: row.reason,
                });
            }
            loaded.catalog
        }
        Err(e) => {
            sink.error(BatchEvent::LoadFailed {
                location: store.location(),
                error: e.to_string(),
            });
            Catalog::default()
        }
    }
}

/// Pending work items, or none when the catalog cannot be read.
pub fn load_work_items(store: &dyn CatalogStore, sink: &dyn EventSink) -> Vec<WorkItem> {
    load_or_empty(store, sink).pending_items()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CapturingSink;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_open_store_by_extension() {
        let config = SourceConfig {
            path: PathBuf::from("list.csv"),
            format: SourceFormat::Auto,
        };
        assert_eq!(open_store(&config).name(), "csv");

        let config = SourceConfig {
            path: PathBuf::from("songs.json"),
            format: SourceFormat::Auto,
        };
        assert_eq!(open_store(&config).name(), "json");
    }

    #[test]
    fn test_open_store_explicit_format_wins() {
        let config = SourceConfig {
            path: PathBuf::from("songs.txt"),
            format: SourceFormat::Csv,
        };
        assert_eq!(open_store(&config).name(), "csv");
    }

    #[test]
    fn test_load_work_items_missing_file_is_empty() {
        let sink = CapturingSink::new();
        let store = JsonCatalogStore::new("/nonexistent/songs.json");

        let items = load_work_items(&store, &sink);

        assert!(items.is_empty());
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].event, BatchEvent::LoadFailed { .. }));
    }

    #[test]
    fn test_load_work_items_reports_skipped_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("songs.csv");
        std::fs::write(&path, "A,S1\nbroken\n").unwrap();
        let sink = CapturingSink::new();

        let items = load_work_items(&CsvCatalogStore::new(&path), &sink);

        assert_eq!(items, vec![WorkItem::new("A", "S1")]);
        assert_eq!(sink.warnings().len(), 1);
    }
}
