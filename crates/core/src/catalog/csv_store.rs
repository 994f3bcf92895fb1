//! CSV-backed catalog: flat `artist,title` rows, no header.
//!
//! Pending rows live in the configured file. Done rows live next to it in
//! `<stem>.done.csv` with the same shape.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::atomic::write_atomic;
use super::error::{CommitError, LoadError};
use super::store::{CatalogStore, LoadedCatalog, SkippedRow};
use super::types::{Catalog, TitlesByArtist};

/// Catalog stored as two headerless two-column CSV files.
pub struct CsvCatalogStore {
    pending_path: PathBuf,
    done_path: PathBuf,
}

impl CsvCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let pending_path = path.into();
        let done_path = Self::done_path_for(&pending_path);
        Self {
            pending_path,
            done_path,
        }
    }

    /// Sibling file holding done rows, e.g. `songs.csv` -> `songs.done.csv`.
    pub fn done_path_for(path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "songs".to_string());
        path.with_file_name(format!("{}.done.csv", stem))
    }

    pub fn pending_path(&self) -> &Path {
        &self.pending_path
    }

    pub fn done_path(&self) -> &Path {
        &self.done_path
    }

    /// Parses headerless `artist,title` rows.
    ///
    /// Rows with fewer than two non-empty fields are skipped and reported.
    /// Extra columns are ignored.
    pub fn parse_rows(
        path: &Path,
        content: &str,
    ) -> Result<(TitlesByArtist, Vec<SkippedRow>), LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut titles = TitlesByArtist::new();
        let mut skipped = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| LoadError::malformed(path, e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let artist = record.get(0).unwrap_or("");
            let title = record.get(1).unwrap_or("");
            if artist.is_empty() || title.is_empty() {
                // A lone empty field is just a blank line
                if record.len() == 1 && artist.is_empty() {
                    continue;
                }
                let reason = format!("expected 2 fields, got {}", non_empty_fields(&record));
                warn!(path = %path.display(), line, %reason, "Skipping CSV row");
                skipped.push(SkippedRow { line, reason });
                continue;
            }

            titles
                .entry(artist.to_string())
                .or_default()
                .push(title.to_string());
        }

        Ok((titles, skipped))
    }

    /// Renders rows artist by artist.
    pub fn render_rows(titles: &TitlesByArtist) -> Result<Vec<u8>, CommitError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        for (artist, list) in titles {
            for title in list {
                writer
                    .write_record([artist.as_str(), title.as_str()])
                    .map_err(|e| CommitError::Encode(e.to_string()))?;
            }
        }

        writer
            .into_inner()
            .map_err(|e| CommitError::Encode(e.to_string()))
    }

    fn read_file(path: &Path) -> Result<String, LoadError> {
        std::fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))
    }
}

fn non_empty_fields(record: &csv::StringRecord) -> usize {
    record.iter().filter(|f| !f.is_empty()).count()
}

impl CatalogStore for CsvCatalogStore {
    fn name(&self) -> &str {
        "csv"
    }

    fn location(&self) -> String {
        self.pending_path.display().to_string()
    }

    fn load(&self) -> Result<LoadedCatalog, LoadError> {
        let content = Self::read_file(&self.pending_path)?;
        let (pending, skipped) = Self::parse_rows(&self.pending_path, &content)?;

        let done = match Self::read_file(&self.done_path) {
            Ok(content) => {
                let (done, done_skipped) = Self::parse_rows(&self.done_path, &content)?;
                if !done_skipped.is_empty() {
                    warn!(
                        path = %self.done_path.display(),
                        count = done_skipped.len(),
                        "Ignored malformed rows in done file"
                    );
                }
                done
            }
            Err(LoadError::NotFound { .. }) => TitlesByArtist::new(),
            Err(e) => return Err(e),
        };

        let catalog = Catalog { pending, done };
        debug!(
            path = %self.pending_path.display(),
            pending = catalog.pending_count(),
            done = catalog.done_count(),
            skipped = skipped.len(),
            "Loaded CSV catalog"
        );

        Ok(LoadedCatalog { catalog, skipped })
    }

    fn commit(&self, catalog: &Catalog) -> Result<(), CommitError> {
        let done = Self::render_rows(&catalog.done)?;
        let pending = Self::render_rows(&catalog.pending)?;

        // Done first: a crash in between leaves items in both files, which
        // only costs a redundant fetch on the next run.
        write_atomic(&self.done_path, &done)?;
        write_atomic(&self.pending_path, &pending)
    }
}
