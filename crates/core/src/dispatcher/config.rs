//! Configuration for the dispatcher module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the dispatcher worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Maximum fetches in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-item fetch timeout in seconds. `None` waits indefinitely.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
}

fn default_concurrency() -> usize {
    10
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            fetch_timeout_secs: None,
        }
    }
}

impl DispatcherConfig {
    /// Sets the maximum concurrent fetches.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the per-item fetch timeout.
    pub fn with_fetch_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = Some(secs);
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}
