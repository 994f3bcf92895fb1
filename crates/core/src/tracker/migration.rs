//! Pure pending → done migration.

use std::collections::BTreeSet;

use crate::catalog::{Catalog, WorkItem};
use crate::dispatcher::Outcome;

/// Result of applying a batch's outcomes to a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Catalog with succeeded songs moved to done.
    pub catalog: Catalog,
    /// Distinct songs that succeeded, in first-success order.
    pub moved: Vec<WorkItem>,
}

impl Migration {
    /// True if nothing succeeded and the catalog is unchanged.
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty()
    }
}

/// Moves every succeeded song from `pending` to `done`.
///
/// - A succeeded title is appended to its artist's done list unless already there.
/// - Every occurrence of a succeeded title is removed from pending.
/// - Artists left with no pending titles are dropped from pending.
/// - Failed titles are left exactly where they were. Done never shrinks.
pub fn apply_outcomes(catalog: &Catalog, outcomes: &[Outcome]) -> Migration {
    let mut seen = BTreeSet::new();
    let moved: Vec<WorkItem> = outcomes
        .iter()
        .filter(|o| o.is_success())
        .filter(|o| seen.insert((o.item.artist.as_str(), o.item.title.as_str())))
        .map(|o| o.item.clone())
        .collect();

    let mut updated = catalog.clone();
    for item in &moved {
        updated.push_done(item.artist.clone(), item.title.clone());

        let emptied = match updated.pending.get_mut(&item.artist) {
            Some(titles) => {
                titles.retain(|t| t != &item.title);
                titles.is_empty()
            }
            None => false,
        };
        if emptied {
            updated.pending.remove(&item.artist);
        }
    }

    Migration {
        catalog: updated,
        moved,
    }
}
