//! In-memory catalog store.

use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, CatalogStore, CommitError, LoadError, LoadedCatalog, SkippedRow};

use super::lock;

#[derive(Debug, Default)]
struct State {
    catalog: Catalog,
    skipped: Vec<SkippedRow>,
    load_error: Option<String>,
    commit_error: Option<String>,
    commits: usize,
    loads: usize,
}

/// Mock implementation of the CatalogStore trait.
///
/// Provides controllable behavior for testing:
/// - Inspect the committed catalog and the number of commits
/// - Simulate load failures and commit failures
/// - Report skipped rows on load
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<Mutex<State>>,
}

impl MemoryCatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                catalog,
                ..State::default()
            })),
        }
    }

    /// Current persisted catalog.
    pub fn catalog(&self) -> Catalog {
        lock(&self.state).catalog.clone()
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        lock(&self.state).commits
    }

    /// Number of load calls.
    pub fn load_count(&self) -> usize {
        lock(&self.state).loads
    }

    /// Makes every subsequent load fail with a malformed-source error.
    pub fn fail_loads(&self, reason: impl Into<String>) {
        lock(&self.state).load_error = Some(reason.into());
    }

    /// Makes every subsequent commit fail, leaving the stored catalog as is.
    pub fn fail_commits(&self, reason: impl Into<String>) {
        lock(&self.state).commit_error = Some(reason.into());
    }

    /// Reports these rows as skipped on the next loads.
    pub fn set_skipped(&self, skipped: Vec<SkippedRow>) {
        lock(&self.state).skipped = skipped;
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<LoadedCatalog, LoadError> {
        let mut state = lock(&self.state);
        state.loads += 1;
        if let Some(reason) = &state.load_error {
            return Err(LoadError::malformed("memory", reason.clone()));
        }
        Ok(LoadedCatalog {
            catalog: state.catalog.clone(),
            skipped: state.skipped.clone(),
        })
    }

    fn commit(&self, catalog: &Catalog) -> Result<(), CommitError> {
        let mut state = lock(&self.state);
        if let Some(reason) = &state.commit_error {
            return Err(CommitError::Rejected(reason.clone()));
        }
        state.catalog = catalog.clone();
        state.commits += 1;
        Ok(())
    }
}
