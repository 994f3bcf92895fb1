//! Observability sink for batch runs.
//!
//! Components report what happens through an injected [`EventSink`] rather
//! than a process-wide logger. The default [`TracingSink`] forwards events to
//! `tracing`; [`ChannelSink`] streams them to another task.

mod types;
mod sink;

pub use types::*;
pub use sink::*;
