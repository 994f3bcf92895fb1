use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Dispatcher concurrency is not 0
/// - Per-item fetch timeout, when set, is not 0
/// - Source path is not empty
/// - Output dir is not empty and is not an existing file
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.dispatcher.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "dispatcher.concurrency must be at least 1".to_string(),
        ));
    }

    if config.dispatcher.fetch_timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "dispatcher.fetch_timeout_secs must be at least 1 (omit it to disable the timeout)"
                .to_string(),
        ));
    }

    if config.source.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "source.path cannot be empty".to_string(),
        ));
    }

    let output_dir = &config.output.dir;
    if output_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "output.dir cannot be empty".to_string(),
        ));
    }
    if output_dir.exists() && !output_dir.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "output.dir {} exists and is not a directory",
            output_dir.display()
        )));
    }

    if config.fetcher.binary.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "fetcher.binary cannot be empty".to_string(),
        ));
    }

    Ok(())
}
