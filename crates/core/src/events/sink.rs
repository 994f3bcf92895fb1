use tokio::sync::mpsc;

use super::{BatchEvent, EventEnvelope, Severity};

/// Destination for batch events.
///
/// Implementations must not block for long or fail the caller; a sink that
/// cannot deliver an event drops it.
pub trait EventSink: Send + Sync {
    /// Records an event at the given severity.
    fn record(&self, severity: Severity, event: BatchEvent);

    fn info(&self, event: BatchEvent) {
        self.record(Severity::Info, event);
    }

    fn warn(&self, event: BatchEvent) {
        self.record(Severity::Warn, event);
    }

    fn error(&self, event: BatchEvent) {
        self.record(Severity::Error, event);
    }
}

/// Sink that forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, severity: Severity, event: BatchEvent) {
        let kind = event.kind();
        let message = event.message();
        match severity {
            Severity::Info => tracing::info!(event = kind, "{}", message),
            Severity::Warn => tracing::warn!(event = kind, "{}", message),
            Severity::Error => tracing::error!(event = kind, "{}", message),
        }
    }
}

/// Handle for streaming events to another task
///
/// This is cheaply cloneable and can be shared across workers.
/// Events are sent through a bounded channel; if the channel is full or
/// closed the event is dropped and the failure logged.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<EventEnvelope>,
}

impl ChannelSink {
    /// Create a new sink from a channel sender
    pub fn new(tx: mpsc::Sender<EventEnvelope>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving end of its channel
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn record(&self, severity: Severity, event: BatchEvent) {
        if let Err(e) = self.tx.try_send(EventEnvelope::new(severity, event)) {
            tracing::error!("Failed to emit batch event: {}", e);
        }
    }
}

/// Fans every event out to several sinks.
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink {
    fn record(&self, severity: Severity, event: BatchEvent) {
        for sink in &self.sinks {
            sink.record(severity, event.clone());
        }
    }
}
