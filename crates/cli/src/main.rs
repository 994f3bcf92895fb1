mod args;
mod logging;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use songfetch_core::{
    load_config, load_config_or_default, open_store, validate_config, BatchError, BatchReport,
    BatchRunner, CatalogStore, Config, TracingSink, YtDlpFetcher,
};

use args::Cli;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "songfetch.toml";

/// Exit status when at least one song failed.
const EXIT_PARTIAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format, cli.log_file()) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    let fetcher = Arc::new(YtDlpFetcher::new(config.fetcher.clone()));
    let store: Arc<dyn CatalogStore> = Arc::from(open_store(&config.source));
    let store_name = store.name().to_string();
    let store_location = store.location();
    let runner = BatchRunner::new(config, store, fetcher, Arc::new(TracingSink));

    if cli.check {
        runner.check().await.context("Check failed")?;
        let config = runner.config();
        info!(
            source = %config.source.path.display(),
            output = %config.output.dir.display(),
            concurrency = config.dispatcher.concurrency,
            "Configuration OK"
        );
        return Ok(ExitCode::SUCCESS);
    }

    info!("Using {} song list at {}", store_name, store_location);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    match runner.run(&cancel).await {
        Ok(result) => {
            if let Some(path) = &cli.report_json {
                write_report(path, &result.report)?;
            }
            if result.is_full_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_PARTIAL))
            }
        }
        Err(BatchError::Commit { report, source }) => {
            if let Some(path) = &cli.report_json {
                write_report(path, &report)?;
            }
            for item in &source.unpersisted {
                error!(artist = %item.artist, title = %item.title, "Fetched but not recorded as done");
            }
            Err(anyhow::Error::new(source).context("Song list was not updated"))
        }
        Err(e) => Err(e.into()),
    }
}

fn build_config(cli: &Cli) -> Result<Config> {
    // An explicitly named file must exist; the default one is optional
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            load_config_or_default(path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
    };

    cli.apply_overrides(&mut config);
    Ok(config)
}

fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to encode report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Stop requested; finishing in-flight downloads, no new ones will start");
    cancel.cancel();
}
