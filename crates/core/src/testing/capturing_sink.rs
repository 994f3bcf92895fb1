//! Event sink that keeps everything it receives.

use std::sync::{Arc, Mutex};

use crate::events::{BatchEvent, EventEnvelope, EventSink, Severity};

use super::lock;

/// Records every event for later assertions.
///
/// Clones share the same buffer, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct CapturingSink {
    events: Arc<Mutex<Vec<EventEnvelope>>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> Vec<EventEnvelope> {
        lock(&self.events).clone()
    }

    /// Events recorded at warn level.
    pub fn warnings(&self) -> Vec<BatchEvent> {
        self.at(Severity::Warn)
    }

    /// Events recorded at error level.
    pub fn errors(&self) -> Vec<BatchEvent> {
        self.at(Severity::Error)
    }

    /// Kinds of all recorded events, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(|e| e.event.kind()).collect()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: &str) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| e.event.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }

    fn at(&self, severity: Severity) -> Vec<BatchEvent> {
        lock(&self.events)
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.event.clone())
            .collect()
    }
}

impl EventSink for CapturingSink {
    fn record(&self, severity: Severity, event: BatchEvent) {
        lock(&self.events).push(EventEnvelope::new(severity, event));
    }
}
