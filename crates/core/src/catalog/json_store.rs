//! JSON-backed catalog: `{"version": 1, "Pending": {...}, "Downloaded": {...}}`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::atomic::write_atomic;
use super::error::{CommitError, LoadError};
use super::store::{CatalogStore, LoadedCatalog};
use super::types::{Catalog, TitlesByArtist};

/// Current on-disk schema version.
///
/// Version 1 is the grouped mapping of artist to titles in two buckets. Files
/// without a `version` field are treated as version 1.
pub const CATALOG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(rename = "Pending")]
    pending: TitlesByArtist,
    #[serde(rename = "Downloaded", alias = "Done", default)]
    done: TitlesByArtist,
}

fn default_version() -> u32 {
    CATALOG_SCHEMA_VERSION
}

/// Catalog stored as a single JSON document.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses a catalog document. `path` is only used for error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Catalog, LoadError> {
        let document: CatalogDocument = serde_json::from_str(content)
            .map_err(|e| LoadError::malformed(path, e.to_string()))?;

        if document.version != CATALOG_SCHEMA_VERSION {
            return Err(LoadError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: document.version,
                supported: CATALOG_SCHEMA_VERSION,
            });
        }

        Ok(Catalog {
            pending: document.pending,
            done: document.done,
        })
    }

    /// Renders a catalog as pretty JSON with 4-space indentation.
    pub fn render(catalog: &Catalog) -> Result<Vec<u8>, CommitError> {
        let document = CatalogDocument {
            version: CATALOG_SCHEMA_VERSION,
            pending: catalog.pending.clone(),
            done: catalog.done.clone(),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|e| CommitError::Encode(e.to_string()))?;
        buf.push(b'\n');
        Ok(buf)
    }
}

impl CatalogStore for JsonCatalogStore {
    fn name(&self) -> &str {
        "json"
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadedCatalog, LoadError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| LoadError::from_io(&self.path, e))?;
        let catalog = Self::parse(&self.path, &content)?;
        debug!(
            path = %self.path.display(),
            pending = catalog.pending_count(),
            done = catalog.done_count(),
            "Loaded JSON catalog"
        );
        Ok(catalog.into())
    }

    fn commit(&self, catalog: &Catalog) -> Result<(), CommitError> {
        let bytes = Self::render(catalog)?;
        write_atomic(&self.path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::WorkItem;
    use tempfile::TempDir;

    #[test]
    fn test_parse_grouped_mapping() {
        let json = r#"{
            "Pending": {"周杰倫": ["稻香", "晴天"], "A": ["S1"]},
            "Downloaded": {"A": ["S0"]}
        }"#;
        let catalog = JsonCatalogStore::parse(Path::new("songs.json"), json).unwrap();
        assert_eq!(catalog.pending_count(), 3);
        assert_eq!(catalog.pending["周杰倫"], vec!["稻香", "晴天"]);
        assert!(catalog.contains_done(&WorkItem::new("A", "S0")));
    }

    #[test]
    fn test_parse_done_alias() {
        let json = r#"{"Pending": {}, "Done": {"A": ["S1"]}}"#;
        let catalog = JsonCatalogStore::parse(Path::new("songs.json"), json).unwrap();
        assert_eq!(catalog.done_count(), 1);
    }

    #[test]
    fn test_parse_missing_done_is_empty() {
        let json = r#"{"Pending": {"A": ["S1"]}}"#;
        let catalog = JsonCatalogStore::parse(Path::new("songs.json"), json).unwrap();
        assert!(catalog.done.is_empty());
    }

    #[test]
    fn test_parse_missing_pending_is_malformed() {
        let json = r#"{"Downloaded": {}}"#;
        let err = JsonCatalogStore::parse(Path::new("songs.json"), json).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_parse_wrong_shape_is_malformed() {
        let json = r#"{"Pending": {"A": "S1"}}"#;
        let err = JsonCatalogStore::parse(Path::new("songs.json"), json).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_parse_future_version_rejected() {
        let json = r#"{"version": 2, "Pending": {}}"#;
        let err = JsonCatalogStore::parse(Path::new("songs.json"), json).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn test_render_keeps_unicode_and_uses_downloaded_key() {
        let mut catalog = Catalog::default();
        catalog.push_done("周杰倫", "稻香");
        let rendered = String::from_utf8(JsonCatalogStore::render(&catalog).unwrap()).unwrap();
        assert!(rendered.contains("\"周杰倫\""));
        assert!(rendered.contains("\"Downloaded\""));
        assert!(rendered.contains("\"version\": 1"));
        assert!(rendered.contains("\n    \"Pending\""));
    }

    #[test]
    fn test_load_missing_file() {
        let store = JsonCatalogStore::new("/nonexistent/songs.json");
        let err = store.load().unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_commit_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonCatalogStore::new(dir.path().join("songs.json"));

        let mut catalog = Catalog::default();
        catalog.push_pending("A", "S2");
        catalog.push_done("A", "S1");
        store.commit(&catalog).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.catalog, catalog);
        assert!(loaded.skipped.is_empty());
    }
}
