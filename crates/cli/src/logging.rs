use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::args::LogFormat;

/// Size at which the log file is rotated.
const LOG_FILE_MAX_BYTES: u64 = 1024 * 1024;

/// Rotated files kept next to the live one (`songfetch.log.1` ... `.5`).
const LOG_FILE_BACKUPS: usize = 5;

/// Installs the global subscriber: console output plus an optional rotating
/// log file.
pub fn init(format: LogFormat, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let (pretty, json) = match format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(false)), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    let file_layer = match log_file {
        Some(path) => {
            let appender = open_log_file(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(appender)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn open_log_file(path: &Path) -> Result<BasicRollingFileAppender> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    BasicRollingFileAppender::new(
        path,
        RollingConditionBasic::new().max_size(LOG_FILE_MAX_BYTES),
        LOG_FILE_BACKUPS,
    )
    .with_context(|| format!("Failed to open log file {:?}", path))
}
