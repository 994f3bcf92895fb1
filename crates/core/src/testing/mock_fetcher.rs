//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::fetcher::{FetchError, FetchRequest, FetchedArtifact, Fetcher};

use super::lock;

#[derive(Debug, Default)]
struct Behavior {
    failures: HashMap<String, String>,
    panics: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    validate_error: Option<String>,
}

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Record every request for assertions
/// - Fail, panic or stall on specific queries
/// - Track how many fetches run at the same time
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    behavior: Arc<Mutex<Behavior>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far, in call order.
    pub fn recorded_requests(&self) -> Vec<FetchRequest> {
        lock(&self.requests).clone()
    }

    /// Queries received so far, in call order.
    pub fn recorded_queries(&self) -> Vec<String> {
        lock(&self.requests)
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Highest number of fetches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Fetches for this query fail with the given reason.
    pub fn fail_query(&self, query: impl Into<String>, reason: impl Into<String>) {
        lock(&self.behavior)
            .failures
            .insert(query.into(), reason.into());
    }

    /// Fetches for this query panic inside the fetch future.
    pub fn panic_on_query(&self, query: impl Into<String>) {
        lock(&self.behavior).panics.insert(query.into());
    }

    /// Fetches for this query sleep before completing.
    pub fn delay_query(&self, query: impl Into<String>, delay: Duration) {
        lock(&self.behavior).delays.insert(query.into(), delay);
    }

    /// Every fetch sleeps this long unless a per-query delay is set.
    pub fn set_default_delay(&self, delay: Duration) {
        lock(&self.behavior).default_delay = Some(delay);
    }

    /// Makes `validate` fail.
    pub fn fail_validation(&self, reason: impl Into<String>) {
        lock(&self.behavior).validate_error = Some(reason.into());
    }
}

/// Decrements the in-flight counter even when the fetch panics or is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: FetchRequest) -> Result<FetchedArtifact, FetchError> {
        lock(&self.requests).push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        let (delay, failure, panics) = {
            let behavior = lock(&self.behavior);
            (
                behavior
                    .delays
                    .get(&request.query)
                    .copied()
                    .or(behavior.default_delay),
                behavior.failures.get(&request.query).cloned(),
                behavior.panics.contains(&request.query),
            )
        };

        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        if panics {
            panic!("mock fetch panicked for {}", request.query);
        }
        if let Some(reason) = failure {
            return Err(FetchError::download_failed(reason, None));
        }

        Ok(FetchedArtifact {
            path: Some(request.output_path("mp3")),
            size_bytes: Some(1024),
            elapsed_ms: delay.map(|d| d.as_millis() as u64).unwrap_or(0),
        })
    }

    async fn validate(&self) -> Result<(), FetchError> {
        match lock(&self.behavior).validate_error.clone() {
            Some(reason) => Err(FetchError::download_failed(reason, None)),
            None => Ok(()),
        }
    }
}
