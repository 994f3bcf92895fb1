//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::Fetcher;
use super::types::{FetchRequest, FetchedArtifact};

/// Fetcher that shells out to `yt-dlp`.
///
/// Every call spawns its own child process writing to its own output path,
/// so concurrent calls need no coordination. The child is killed if the
/// future is dropped (e.g. on timeout).
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    /// Creates a new yt-dlp fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Builds yt-dlp arguments for one request.
    pub fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let template = request.output_dir.join(format!("{}.%(ext)s", request.file_stem));

        let mut args = vec![
            "-f".to_string(),
            self.config.format_selector.clone(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            // Extract audio and transcode
            "-x".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
        ];

        if self.config.embed_metadata {
            args.push("--embed-metadata".to_string());
        }
        if self.config.embed_thumbnail {
            args.push("--embed-thumbnail".to_string());
        }
        if let Some(ref location) = self.config.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                location.to_string_lossy().to_string(),
            ]);
        }

        args.extend([
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            // Final path after post-processing, on stdout
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ]);

        args.extend(self.config.extra_args.iter().cloned());

        args.push("--".to_string());
        args.push(format!("{}{}", self.config.search_prefix, request.query));

        args
    }

    /// Last non-empty stdout line, which `--print after_move:filepath` makes the final path.
    fn parse_final_path(stdout: &str) -> Option<PathBuf> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
    }

    /// Most relevant error line from stderr.
    fn parse_error_reason(stderr: &str) -> Option<String> {
        let error_regex = Regex::new(r"(?m)^ERROR:\s*(.+)$").ok()?;
        error_regex
            .captures_iter(stderr)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .last()
    }

    fn spawn_error(&self, e: std::io::Error) -> FetchError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FetchError::ToolNotFound {
                path: self.config.binary.clone(),
            }
        } else {
            FetchError::Io(e)
        }
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, request: FetchRequest) -> Result<FetchedArtifact, FetchError> {
        let start = Instant::now();
        let args = self.build_args(&request);
        debug!(query = %request.query, ?args, "Running yt-dlp");

        let output = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let reason = Self::parse_error_reason(&stderr).unwrap_or_else(|| {
                match output.status.code() {
                    Some(code) => format!("yt-dlp exited with status {}", code),
                    None => "yt-dlp was terminated by a signal".to_string(),
                }
            });
            let stderr = if stderr.trim().is_empty() {
                None
            } else {
                Some(stderr.to_string())
            };
            return Err(FetchError::download_failed(reason, stderr));
        }

        let path = Self::parse_final_path(&stdout).ok_or_else(|| FetchError::NotFound {
            query: request.query.clone(),
        })?;

        let size_bytes = tokio::fs::metadata(&path).await.ok().map(|m| m.len());

        Ok(FetchedArtifact {
            path: Some(path),
            size_bytes,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(FetchError::download_failed(
                format!("{} --version failed", self.config.binary.display()),
                None,
            ));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "yt-dlp available"
        );
        Ok(())
    }
}
