//! Batch lifecycle integration tests.
//!
//! These tests run whole batches against the mock fetcher:
//! - One outcome per item at any concurrency
//! - Partial failure keeps failed songs pending
//! - Re-running converges without duplicating done titles
//! - Concurrency cap and cancellation

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use songfetch_core::{
    testing::{fixtures, CapturingSink, MemoryCatalogStore, MockFetcher},
    BatchEvent, BatchResult, BatchRunner, Catalog, Config,
};

/// Test helper wiring a batch runner to mocks.
struct TestHarness {
    runner: BatchRunner<MockFetcher>,
    store: MemoryCatalogStore,
    fetcher: MockFetcher,
    sink: CapturingSink,
    _output: TempDir,
}

impl TestHarness {
    fn new(catalog: Catalog) -> Self {
        Self::with_concurrency(catalog, 10)
    }

    fn with_concurrency(catalog: Catalog, concurrency: usize) -> Self {
        let output = TempDir::new().expect("Failed to create output dir");
        let mut config = Config::default();
        config.output.dir = output.path().to_path_buf();
        config.dispatcher.concurrency = concurrency;

        let store = MemoryCatalogStore::new(catalog);
        let fetcher = MockFetcher::new();
        let sink = CapturingSink::new();

        let runner = BatchRunner::new(
            config,
            Arc::new(store.clone()),
            Arc::new(fetcher.clone()),
            Arc::new(sink.clone()),
        );

        Self {
            runner,
            store,
            fetcher,
            sink,
            _output: output,
        }
    }

    async fn run(&self) -> BatchResult {
        self.runner
            .run(&CancellationToken::new())
            .await
            .expect("Batch run failed")
    }
}

#[tokio::test]
async fn test_scenario_one_success_one_failure() {
    let harness = TestHarness::new(fixtures::catalog(&[("A", &["S1", "S2"])]));
    harness.fetcher.fail_query("A - S2", "No result for query: A - S2");

    let result = harness.run().await;

    assert_eq!(result.report.total, 2);
    assert_eq!(result.report.succeeded, 1);
    assert_eq!(result.report.failures[0].reason, "Download failed: No result for query: A - S2");
    assert_eq!(
        harness.store.catalog(),
        fixtures::catalog_with_done(&[("A", &["S2"])], &[("A", &["S1"])])
    );
    assert_eq!(harness.sink.count("item_failed"), 1);
    assert_eq!(harness.sink.count("failure_listed"), 1);
}

#[tokio::test]
async fn test_duplicate_titles_fetched_once_and_moved_together() {
    let harness = TestHarness::new(fixtures::catalog(&[("A", &["S1", "S1"]), ("B", &["S2"])]));

    let result = harness.run().await;

    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(harness.fetcher.call_count(), 2);
    let catalog = harness.store.catalog();
    assert!(catalog.pending.is_empty());
    assert_eq!(catalog.done["A"], vec!["S1".to_string()]);
}

#[tokio::test]
async fn test_scenario_empty_pending() {
    let catalog = fixtures::catalog_with_done(&[], &[("A", &["S1"])]);
    let harness = TestHarness::new(catalog.clone());

    let result = harness.run().await;

    assert_eq!(harness.fetcher.call_count(), 0);
    assert_eq!(result.report.total, 0);
    assert!(result.report.failures.is_empty());
    assert_eq!(harness.store.commit_count(), 0);
    assert_eq!(harness.store.catalog(), catalog);
    assert_eq!(harness.sink.count("nothing_pending"), 1);
}

#[tokio::test]
async fn test_scenario_rerun_after_full_success_is_noop() {
    let harness = TestHarness::new(fixtures::catalog(&[("A", &["S1"]), ("B", &["S2"])]));

    harness.run().await;
    let after_first = harness.store.catalog();
    harness.sink.clear();
    let second = harness.run().await;

    assert_eq!(harness.fetcher.call_count(), 2);
    assert_eq!(second.report.total, 0);
    assert_eq!(harness.sink.count("item_started"), 0);
    assert_eq!(harness.sink.count("nothing_pending"), 1);
    assert_eq!(harness.store.catalog(), after_first);
    assert_eq!(harness.store.commit_count(), 1);
    assert!(after_first.pending.is_empty());
}

#[tokio::test]
async fn test_outcome_count_matches_input_at_any_concurrency() {
    let titles: Vec<String> = (0..25).map(|i| format!("Song {}", i)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();

    for concurrency in [1, 3, 10, 50] {
        let harness =
            TestHarness::with_concurrency(fixtures::catalog(&[("A", &refs)]), concurrency);
        for i in (0..25).step_by(4) {
            harness.fetcher.fail_query(format!("A - Song {}", i), "boom");
        }

        let result = harness.run().await;

        assert_eq!(result.outcomes.len(), 25, "concurrency {}", concurrency);
        assert_eq!(result.report.failed, 7);
        assert_eq!(harness.store.catalog().pending["A"].len(), 7);
        assert_eq!(harness.store.catalog().done["A"].len(), 18);
    }
}

#[tokio::test]
async fn test_failure_does_not_affect_other_items() {
    let harness = TestHarness::new(fixtures::catalog(&[("A", &["X", "Y"]), ("B", &["Z"])]));
    harness.fetcher.panic_on_query("A - X");

    let result = harness.run().await;

    let catalog = harness.store.catalog();
    assert!(catalog.contains_pending(&songfetch_core::WorkItem::new("A", "X")));
    assert!(!catalog.contains_done(&songfetch_core::WorkItem::new("A", "X")));
    assert!(catalog.contains_done(&songfetch_core::WorkItem::new("A", "Y")));
    assert!(catalog.contains_done(&songfetch_core::WorkItem::new("B", "Z")));
    assert!(!catalog.contains_pending(&songfetch_core::WorkItem::new("A", "Y")));
    assert_eq!(result.report.failed, 1);
}

#[tokio::test]
async fn test_concurrency_cap_respected() {
    let titles: Vec<String> = (0..12).map(|i| format!("Song {}", i)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let harness = TestHarness::with_concurrency(fixtures::catalog(&[("A", &refs)]), 3);
    harness.fetcher.set_default_delay(Duration::from_millis(20));

    harness.run().await;

    assert_eq!(harness.fetcher.call_count(), 12);
    assert!(harness.fetcher.max_in_flight() <= 3);
    assert!(harness.fetcher.max_in_flight() >= 1);
}

#[tokio::test]
async fn test_cancellation_commits_finished_and_keeps_rest_pending() {
    let titles: Vec<String> = (0..6).map(|i| format!("Song {}", i)).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let harness = TestHarness::with_concurrency(fixtures::catalog(&[("A", &refs)]), 1);
    harness.fetcher.set_default_delay(Duration::from_millis(50));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = harness.runner.run(&cancel).await.unwrap();

    assert_eq!(result.outcomes.len(), 6);
    assert_eq!(harness.fetcher.call_count(), 1);
    assert_eq!(result.report.succeeded, 1);
    let catalog = harness.store.catalog();
    assert_eq!(catalog.done["A"], vec!["Song 0".to_string()]);
    assert_eq!(catalog.pending["A"].len(), 5);
    assert!(harness
        .sink
        .warnings()
        .iter()
        .any(|e| matches!(e, BatchEvent::BatchCancelled { undispatched: 5 })));
}

#[tokio::test]
async fn test_load_failure_degrades_to_empty_batch() {
    let harness = TestHarness::new(fixtures::catalog(&[("A", &["S1"])]));
    harness.store.fail_loads("not json");

    let result = tokio_test::assert_ok!(harness.runner.run(&CancellationToken::new()).await);

    assert_eq!(result.report.total, 0);
    assert_eq!(harness.fetcher.call_count(), 0);
    assert_eq!(harness.store.commit_count(), 0);
    assert!(matches!(
        harness.sink.errors()[0],
        BatchEvent::LoadFailed { .. }
    ));
}

#[tokio::test]
async fn test_event_sequence() {
    let harness = TestHarness::new(fixtures::catalog(&[("A", &["S1"])]));

    harness.run().await;

    assert_eq!(
        harness.sink.kinds(),
        vec![
            "batch_started",
            "item_started",
            "item_succeeded",
            "batch_summary",
            "catalog_committed"
        ]
    );
}
