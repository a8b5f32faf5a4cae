//! Progress sink trait and implementations.

use crate::config::EngineConfig;
use crate::core::{ProgressEvent, ProgressStatus};
use std::fmt;
use tracing::{debug, error, info, trace, warn, Level};

/// Receives progress events from a running pipeline.
pub trait ProgressSink: Send + Sync {
    /// Delivers one event. Must not panic or block.
    fn emit(&self, event: &ProgressEvent);
}

/// A sink that discards all events.
///
/// Used when the caller does not observe progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// A sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingProgressSink {
    level: Level,
}

impl Default for LoggingProgressSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingProgressSink {
    /// Creates a logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    /// Creates a sink logging at the engine's `progress_log_level`.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.progress_level())
    }

    /// The level events are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

macro_rules! log_progress {
    ($macro:ident, $event:expr) => {
        $macro!(
            node_id = %$event.node_id,
            node_type = %$event.node_type,
            status = %$event.status,
            progress = $event.progress,
            tokens = ?$event.tokens,
            "Node progress: {}", $event.node_name
        )
    };
}

impl ProgressSink for LoggingProgressSink {
    fn emit(&self, event: &ProgressEvent) {
        match self.level {
            Level::TRACE => log_progress!(trace, event),
            Level::DEBUG => log_progress!(debug, event),
            Level::INFO => log_progress!(info, event),
            Level::WARN => log_progress!(warn, event),
            _ => log_progress!(error, event),
        }
    }
}

/// A collecting sink for tests and for callers that poll progress.
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    events: parking_lot::RwLock<Vec<ProgressEvent>>,
}

impl CollectingProgressSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events with the given status.
    #[must_use]
    pub fn events_with_status(&self, status: ProgressStatus) -> Vec<ProgressEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.status == status)
            .cloned()
            .collect()
    }

    /// Returns the events reported for one node, in order.
    #[must_use]
    pub fn events_for_node(&self, node_id: &str) -> Vec<ProgressEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.node_id == node_id)
            .cloned()
            .collect()
    }
}

impl ProgressSink for CollectingProgressSink {
    fn emit(&self, event: &ProgressEvent) {
        self.events.write().push(event.clone());
    }
}

/// Adapts a caller-supplied callback into a sink.
pub struct FnProgressSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    callback: F,
}

impl<F> FnProgressSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    /// Wraps a callback.
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> fmt::Debug for FnProgressSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProgressSink").finish_non_exhaustive()
    }
}

impl<F> ProgressSink for FnProgressSink<F>
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) {
        (self.callback)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(node_id: &str, status: ProgressStatus) -> ProgressEvent {
        ProgressEvent::new(node_id, "Node", "contentWriter", status, 50.0)
    }

    #[test]
    fn test_noop_sink() {
        NoOpProgressSink.emit(&event("n1", ProgressStatus::Executing));
    }

    #[test]
    fn test_logging_sink() {
        LoggingProgressSink::default().emit(&event("n1", ProgressStatus::Completed));
        LoggingProgressSink::debug().emit(&event("n1", ProgressStatus::Error));
    }

    #[test]
    fn test_logging_sink_follows_configured_level() {
        let config = EngineConfig::from_json_str(r#"{"progress_log_level": "debug"}"#).unwrap();
        let sink = LoggingProgressSink::from_config(&config);
        assert_eq!(sink.level(), Level::DEBUG);
        sink.emit(&event("n1", ProgressStatus::AiThinking));

        let sink = LoggingProgressSink::from_config(&EngineConfig::default());
        assert_eq!(sink.level(), Level::INFO);

        let quiet = EngineConfig::from_json_str(r#"{"progress_log_level": "warn"}"#).unwrap();
        assert_eq!(LoggingProgressSink::from_config(&quiet).level(), Level::WARN);
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingProgressSink::new();
        assert!(sink.is_empty());

        sink.emit(&event("n1", ProgressStatus::Executing));
        sink.emit(&event("n1", ProgressStatus::AiThinking));
        sink.emit(&event("n2", ProgressStatus::Executing));

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_with_status(ProgressStatus::Executing).len(), 2);
        assert_eq!(sink.events_for_node("n1").len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_fn_sink_invokes_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sink = FnProgressSink::new(move |_e: &ProgressEvent| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        sink.emit(&event("n1", ProgressStatus::Executing));
        sink.emit(&event("n1", ProgressStatus::Completed));

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
