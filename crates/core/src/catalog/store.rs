//! Storage trait for the persisted catalog.

use serde::{Deserialize, Serialize};

use super::error::{CommitError, LoadError};
use super::types::Catalog;

/// A source row that was ignored while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the source file.
    pub line: u64,
    /// Why the row was ignored.
    pub reason: String,
}

/// Result of loading a catalog: the catalog itself plus any ignored rows.
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub skipped: Vec<SkippedRow>,
}

impl From<Catalog> for LoadedCatalog {
    fn from(catalog: Catalog) -> Self {
        Self {
            catalog,
            skipped: Vec::new(),
        }
    }
}

/// Backing store for pending/done state.
///
/// The store is read once at batch start and written at most once at batch
/// end. `commit` must replace the persisted state atomically: a concurrent
/// reader sees either the previous catalog or the new one.
pub trait CatalogStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Human-readable location of the persisted state.
    fn location(&self) -> String;

    /// Reads the persisted catalog.
    fn load(&self) -> Result<LoadedCatalog, LoadError>;

    /// Atomically replaces the persisted catalog.
    fn commit(&self, catalog: &Catalog) -> Result<(), CommitError>;
}
