use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use songfetch_core::{Config, SourceFormat};

/// Log file used unless `--log-file` or `--no-log-file` is given.
pub const DEFAULT_LOG_FILE: &str = "logs/songfetch.log";

#[derive(Parser, Debug)]
#[command(
    name = "songfetch",
    version,
    about = "Fetch every pending song in a list and move finished ones to done"
)]
pub struct Cli {
    /// Configuration file (TOML) [default: songfetch.toml if present]
    #[arg(long, env = "SONGFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Song list to read and update (.json or .csv)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Song list format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Directory audio files are written to
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Maximum number of concurrent downloads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-song timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to the yt-dlp executable
    #[arg(long)]
    pub ytdlp: Option<PathBuf>,

    /// Console log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Plain-text log file, rotated at 1 MiB with 5 backups kept
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log to the console only
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    /// Write the batch report as JSON to this file
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Validate configuration and the downloader, then exit
    #[arg(long)]
    pub check: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Auto,
    Json,
    Csv,
}

impl From<FormatArg> for SourceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Auto => SourceFormat::Auto,
            FormatArg::Json => SourceFormat::Json,
            FormatArg::Csv => SourceFormat::Csv,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    /// The log file to write, if file logging is enabled.
    pub fn log_file(&self) -> Option<&std::path::Path> {
        (!self.no_log_file).then_some(self.log_file.as_path())
    }

    /// Command-line flags win over the config file and environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source.path = source.clone();
        }
        if let Some(format) = self.format {
            config.source.format = format.into();
        }
        if let Some(output) = &self.output {
            config.output.dir = output.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.dispatcher.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.dispatcher.fetch_timeout_secs = Some(timeout);
        }
        if let Some(ytdlp) = &self.ytdlp {
            config.fetcher.binary = ytdlp.clone();
        }
    }
}
