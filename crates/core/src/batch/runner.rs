//! Batch runner implementation.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{load_or_empty, CatalogStore};
use crate::config::{validate_config, Config, ConfigError};
use crate::dispatcher::Dispatcher;
use crate::events::{BatchEvent, EventSink};
use crate::fetcher::Fetcher;
use crate::report::BatchReport;
use crate::tracker::{CommitSummary, CompletionTracker};

use super::types::{BatchError, BatchResult};

/// Runs one batch: load, dispatch, report, commit.
pub struct BatchRunner<F: Fetcher> {
    config: Config,
    store: Arc<dyn CatalogStore>,
    fetcher: Arc<F>,
    sink: Arc<dyn EventSink>,
    tracker: CompletionTracker,
}

impl<F: Fetcher + 'static> BatchRunner<F> {
    pub fn new(
        config: Config,
        store: Arc<dyn CatalogStore>,
        fetcher: Arc<F>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            sink,
            tracker: CompletionTracker::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validates the configuration and that the downloader can run, without
    /// touching the song list.
    pub async fn check(&self) -> Result<(), BatchError> {
        validate_config(&self.config)?;
        self.fetcher.validate().await?;
        debug!(
            source = %self.config.source.path.display(),
            output = %self.config.output.dir.display(),
            "Batch configuration checked"
        );
        Ok(())
    }

    /// Runs the batch to completion.
    ///
    /// When `cancel` fires, songs not yet started stay pending; songs already
    /// fetched are still committed.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<BatchResult, BatchError> {
        validate_config(&self.config)?;
        let dispatcher = Dispatcher::new(self.config.dispatcher.clone(), Arc::clone(&self.fetcher))?
            .with_sink(Arc::clone(&self.sink));

        let output_dir = &self.config.output.dir;
        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            ConfigError::ValidationError(format!(
                "cannot create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let catalog = load_or_empty(self.store.as_ref(), self.sink.as_ref());
        let items = catalog.pending_items();

        if items.is_empty() {
            info!(store = self.store.name(), "Nothing pending");
            self.sink.info(BatchEvent::NothingPending {
                location: self.store.location(),
            });
            let report = BatchReport::empty(run_id, started_at);
            report.log_summary(self.sink.as_ref());
            return Ok(BatchResult {
                report,
                commit: CommitSummary::default(),
                outcomes: Vec::new(),
            });
        }

        self.sink.info(BatchEvent::BatchStarted {
            run_id: run_id.clone(),
            total: items.len(),
            concurrency: dispatcher.config().concurrency,
            output_dir: output_dir.display().to_string(),
        });

        let outcomes = dispatcher.run(items, output_dir, cancel).await;
        debug!(status = ?dispatcher.status(), "Dispatcher drained");

        let report = BatchReport::from_outcomes(run_id, started_at, Utc::now(), &outcomes);
        report.log_summary(self.sink.as_ref());

        match self
            .tracker
            .commit(self.store.as_ref(), &catalog, &outcomes, self.sink.as_ref())
        {
            Ok(commit) => Ok(BatchResult {
                report,
                commit,
                outcomes,
            }),
            Err(source) => Err(BatchError::Commit {
                report: Box::new(report),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SkippedRow;
    use crate::testing::{fixtures, CapturingSink, MemoryCatalogStore, MockFetcher};
    use tempfile::TempDir;

    fn runner(
        dir: &TempDir,
        store: &MemoryCatalogStore,
        fetcher: &MockFetcher,
        sink: &CapturingSink,
    ) -> BatchRunner<MockFetcher> {
        let mut config = Config::default();
        config.output.dir = dir.path().join("music");
        config.dispatcher.concurrency = 2;
        BatchRunner::new(
            config,
            Arc::new(store.clone()),
            Arc::new(fetcher.clone()),
            Arc::new(sink.clone()),
        )
    }

    #[tokio::test]
    async fn test_run_creates_output_dir_and_commits() {
        let dir = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new(fixtures::catalog(&[("A", &["S1", "S2"])]));
        let fetcher = MockFetcher::new();
        fetcher.fail_query("A - S2", "no result");
        let sink = CapturingSink::new();

        let result = runner(&dir, &store, &fetcher, &sink)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert!(dir.path().join("music").is_dir());
        assert_eq!(result.report.total, 2);
        assert_eq!(result.report.failed, 1);
        assert_eq!(result.commit.moved, 1);
        assert_eq!(
            store.catalog(),
            fixtures::catalog_with_done(&[("A", &["S2"])], &[("A", &["S1"])])
        );
        assert_eq!(sink.count("batch_started"), 1);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_loading() {
        let dir = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new(fixtures::catalog(&[("A", &["S1"])]));
        let fetcher = MockFetcher::new();
        let sink = CapturingSink::new();
        let mut config = Config::default();
        config.output.dir = dir.path().to_path_buf();
        config.dispatcher.concurrency = 0;

        let err = BatchRunner::new(
            config,
            Arc::new(store.clone()),
            Arc::new(fetcher.clone()),
            Arc::new(sink.clone()),
        )
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

        assert!(matches!(err, BatchError::Config(_)));
        assert!(err.report().is_none());
        assert_eq!(store.load_count(), 0);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_check_reports_downloader_failure() {
        let dir = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new(fixtures::catalog(&[("A", &["S1"])]));
        let fetcher = MockFetcher::new();
        let sink = CapturingSink::new();
        let runner = runner(&dir, &store, &fetcher, &sink);

        assert!(runner.check().await.is_ok());

        fetcher.fail_validation("yt-dlp: command not found");
        let err = runner.check().await.unwrap_err();

        assert!(matches!(err, BatchError::Fetcher(_)));
        assert!(err.to_string().contains("command not found"));
        assert!(err.report().is_none());
        assert_eq!(store.load_count(), 0);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_skipped_rows_reported_before_dispatch() {
        let dir = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new(fixtures::catalog(&[("A", &["S1"])]));
        store.set_skipped(vec![SkippedRow {
            line: 3,
            reason: "expected 2 columns, found 1".to_string(),
        }]);
        let fetcher = MockFetcher::new();
        let sink = CapturingSink::new();

        let result = runner(&dir, &store, &fetcher, &sink)
            .run(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.report.total, 1);
        assert_eq!(sink.count("row_skipped"), 1);
        assert!(matches!(
            sink.warnings()[0],
            BatchEvent::RowSkipped { line: 3, .. }
        ));
        assert_eq!(sink.kinds()[0], "row_skipped");
    }

    #[tokio::test]
    async fn test_output_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("music");
        std::fs::write(&file, "not a dir").unwrap();
        let store = MemoryCatalogStore::new(fixtures::catalog(&[("A", &["S1"])]));
        let fetcher = MockFetcher::new();
        let sink = CapturingSink::new();

        let err = runner(&dir, &store, &fetcher, &sink)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::Config(_)));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_report() {
        let dir = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new(fixtures::catalog(&[("A", &["S1"])]));
        store.fail_commits("read-only");
        let fetcher = MockFetcher::new();
        let sink = CapturingSink::new();

        let err = runner(&dir, &store, &fetcher, &sink)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();

        match &err {
            BatchError::Commit { report, source } => {
                assert_eq!(report.succeeded, 1);
                assert_eq!(source.unpersisted, vec![crate::catalog::WorkItem::new("A", "S1")]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.commit_count(), 0);
    }
}
