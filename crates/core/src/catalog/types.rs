//! Types for the song catalog (pending/done state).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Hex digits of the query hash appended to sanitized stems.
const STEM_HASH_LEN: usize = 8;

/// Artist name to ordered list of titles.
pub type TitlesByArtist = BTreeMap<String, Vec<String>>;

/// One unit of work: a song identified by artist and title.
///
/// Identity is the exact, case-sensitive (artist, title) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkItem {
    pub artist: String,
    pub title: String,
}

impl WorkItem {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    /// Search query handed to the fetcher, `"{artist} - {title}"`.
    pub fn query(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    /// File name stem for the fetched artifact.
    ///
    /// Derived only from (artist, title) so the same song always lands on
    /// the same path. Path separators and characters that are invalid in
    /// file names on common filesystems become `_`. When that changes the
    /// name, a short hash of the query is appended so that distinct songs
    /// (`AC/DC` and `AC_DC`) never share a stem.
    pub fn file_stem(&self) -> String {
        let query = self.query();
        let sanitized: String = query
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        let trimmed = sanitized.trim().trim_end_matches(['.', ' ']);
        if trimmed == query {
            return query;
        }

        let digest = format!("{:x}", Sha256::digest(query.as_bytes()));
        let base = if trimmed.is_empty() { "_" } else { trimmed };
        format!("{}-{}", base, &digest[..STEM_HASH_LEN])
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Persisted pending/done state.
///
/// `pending` holds songs still to fetch, `done` holds songs already fetched.
/// `done` only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub pending: TitlesByArtist,
    pub done: TitlesByArtist,
}

impl Catalog {
    /// Creates a catalog with the given pending songs and nothing done.
    pub fn with_pending(pending: TitlesByArtist) -> Self {
        Self {
            pending,
            done: TitlesByArtist::new(),
        }
    }

    /// Adds a pending title for an artist, keeping insertion order.
    pub fn push_pending(&mut self, artist: impl Into<String>, title: impl Into<String>) {
        self.pending
            .entry(artist.into())
            .or_default()
            .push(title.into());
    }

    /// Adds a done title for an artist unless it is already there.
    pub fn push_done(&mut self, artist: impl Into<String>, title: impl Into<String>) {
        let title = title.into();
        let titles = self.done.entry(artist.into()).or_default();
        if !titles.contains(&title) {
            titles.push(title);
        }
    }

    /// All pending songs as work items, artist by artist in title order.
    ///
    /// Duplicate titles are yielded as-is.
    pub fn pending_items(&self) -> Vec<WorkItem> {
        self.pending
            .iter()
            .flat_map(|(artist, titles)| {
                titles
                    .iter()
                    .map(move |title| WorkItem::new(artist.clone(), title.clone()))
            })
            .collect()
    }

    pub fn contains_pending(&self, item: &WorkItem) -> bool {
        contains(&self.pending, item)
    }

    pub fn contains_done(&self, item: &WorkItem) -> bool {
        contains(&self.done, item)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    pub fn done_count(&self) -> usize {
        self.done.values().map(Vec::len).sum()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.values().any(|titles| !titles.is_empty())
    }
}

fn contains(map: &TitlesByArtist, item: &WorkItem) -> bool {
    map.get(&item.artist)
        .map(|titles| titles.iter().any(|t| t == &item.title))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_format() {
        let item = WorkItem::new("周杰倫", "稻香");
        assert_eq!(item.query(), "周杰倫 - 稻香");
        assert_eq!(item.to_string(), "周杰倫 - 稻香");
    }

    #[test]
    fn test_file_stem_plain_name_unchanged() {
        let item = WorkItem::new("周杰倫", "稻香");
        assert_eq!(item.file_stem(), "周杰倫 - 稻香");
    }

    #[test]
    fn test_file_stem_replaces_separators() {
        let stem = WorkItem::new("AC/DC", "What's Next?").file_stem();
        assert!(stem.starts_with("AC_DC - What's Next_-"));
        assert_eq!(stem.len(), "AC_DC - What's Next_-".len() + STEM_HASH_LEN);
    }

    #[test]
    fn test_file_stem_trims_trailing_dots() {
        let stem = WorkItem::new("Artist", "Title...").file_stem();
        assert!(stem.starts_with("Artist - Title-"));
        assert!(!stem.contains('.'));
    }

    #[test]
    fn test_file_stem_sanitized_names_do_not_collide() {
        let slash = WorkItem::new("AC/DC", "T").file_stem();
        let underscore = WorkItem::new("AC_DC", "T").file_stem();
        let colon = WorkItem::new("AC:DC", "T").file_stem();

        assert_eq!(underscore, "AC_DC - T");
        assert_ne!(slash, underscore);
        assert_ne!(slash, colon);
    }

    #[test]
    fn test_file_stem_is_deterministic() {
        let a = WorkItem::new("A", "B: remix");
        let b = WorkItem::new("A", "B: remix");
        assert_eq!(a.file_stem(), b.file_stem());
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        assert_ne!(WorkItem::new("a", "s1"), WorkItem::new("A", "s1"));
    }

    #[test]
    fn test_pending_items_order_and_duplicates() {
        let mut catalog = Catalog::default();
        catalog.push_pending("B", "s1");
        catalog.push_pending("A", "s2");
        catalog.push_pending("A", "s1");
        catalog.push_pending("A", "s2");

        let items = catalog.pending_items();
        assert_eq!(
            items,
            vec![
                WorkItem::new("A", "s2"),
                WorkItem::new("A", "s1"),
                WorkItem::new("A", "s2"),
                WorkItem::new("B", "s1"),
            ]
        );
        assert_eq!(catalog.pending_count(), 4);
    }

    #[test]
    fn test_push_done_deduplicates() {
        let mut catalog = Catalog::default();
        catalog.push_done("A", "s1");
        catalog.push_done("A", "s1");
        assert_eq!(catalog.done_count(), 1);
        assert!(catalog.contains_done(&WorkItem::new("A", "s1")));
        assert!(!catalog.contains_pending(&WorkItem::new("A", "s1")));
    }

    #[test]
    fn test_has_pending_ignores_empty_lists() {
        let mut catalog = Catalog::default();
        catalog.pending.insert("A".to_string(), vec![]);
        assert!(!catalog.has_pending());
        catalog.push_pending("A", "s1");
        assert!(catalog.has_pending());
    }
}
