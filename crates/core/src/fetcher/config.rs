//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// Prefix turning the query into a search (first result only by default).
    #[serde(default = "default_search_prefix")]
    pub search_prefix: String,

    /// yt-dlp format selector.
    #[serde(default = "default_format_selector")]
    pub format_selector: String,

    /// Target audio codec (mp3, m4a, opus, flac, ...).
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality, a bitrate like "256K" or a VBR level 0-10.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Embed title/artist metadata into the file.
    #[serde(default = "default_true")]
    pub embed_metadata: bool,

    /// Embed the video thumbnail as cover art.
    #[serde(default = "default_true")]
    pub embed_thumbnail: bool,

    /// Directory or path of the ffmpeg binary used for post-processing.
    #[serde(default)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Additional yt-dlp arguments, inserted before the query.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_search_prefix() -> String {
    "ytsearch1:".to_string()
}

fn default_format_selector() -> String {
    "bestaudio/best".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "256K".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            search_prefix: default_search_prefix(),
            format_selector: default_format_selector(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            embed_metadata: true,
            embed_thumbnail: true,
            ffmpeg_location: None,
            extra_args: Vec::new(),
        }
    }
}

impl FetcherConfig {
    /// Sets the yt-dlp binary path.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the target audio codec.
    pub fn with_audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.binary, PathBuf::from("yt-dlp"));
        assert_eq!(config.search_prefix, "ytsearch1:");
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.audio_quality, "256K");
        assert!(config.embed_metadata);
        assert!(config.embed_thumbnail);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            audio_format = "opus"
            embed_thumbnail = false
        "#;
        let config: FetcherConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.audio_format, "opus");
        assert!(!config.embed_thumbnail);
        assert!(config.embed_metadata);
        assert_eq!(config.format_selector, "bestaudio/best");
    }

    #[test]
    fn test_builder() {
        let config = FetcherConfig::default()
            .with_binary("/opt/yt-dlp")
            .with_audio_format("m4a");
        assert_eq!(config.binary, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(config.audio_format, "m4a");
    }
}
