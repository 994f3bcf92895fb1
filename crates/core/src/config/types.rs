use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dispatcher::DispatcherConfig;
use crate::fetcher::FetcherConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Where the song list (and its pending/done state) lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub format: SourceFormat,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            format: SourceFormat::default(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("songs.json")
}

/// Record shape of the source file
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Pick by file extension (`.csv` is CSV, anything else JSON)
    #[default]
    Auto,
    /// Grouped `Pending`/`Downloaded` mapping of artist to titles
    Json,
    /// Flat `artist,title` rows without header
    Csv,
}

impl SourceFormat {
    /// Resolves `Auto` against a concrete path.
    pub fn resolve(self, path: &std::path::Path) -> SourceFormat {
        match self {
            SourceFormat::Auto => {
                let is_csv = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false);
                if is_csv {
                    SourceFormat::Csv
                } else {
                    SourceFormat::Json
                }
            }
            other => other,
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SourceFormat::Auto),
            "json" => Ok(SourceFormat::Json),
            "csv" => Ok(SourceFormat::Csv),
            other => Err(format!("unknown source format: {}", other)),
        }
    }
}

/// Where fetched audio files are written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Downloads").join("Music"))
        .unwrap_or_else(|| PathBuf::from("Music"))
}
