//! Progress events reported to the caller while a run is in flight.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status carried by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// The node has been handed to its handler.
    Executing,
    /// A process node is waiting on the AI provider.
    AiThinking,
    /// The node finished.
    Completed,
    /// The node failed.
    Error,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executing => write!(f, "executing"),
            Self::AiThinking => write!(f, "ai_thinking"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A progress notification for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// The node id.
    pub node_id: String,
    /// Display name (the node label, or its id).
    pub node_name: String,
    /// Lifecycle status.
    pub status: ProgressStatus,
    /// Overall run progress in `[0, 100]`.
    pub progress: f64,
    /// The node's type string.
    pub node_type: String,
    /// Tokens consumed by the node's AI call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    /// Cost of the node's AI call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Provider used for the node's AI call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// The node's output, on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// The error message, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    /// Creates a new progress event. `progress` is clamped to `[0, 100]`.
    #[must_use]
    pub fn new(
        node_id: impl Into<String>,
        node_name: impl Into<String>,
        node_type: impl Into<String>,
        status: ProgressStatus,
        progress: f64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            status,
            progress: progress.clamp(0.0, 100.0),
            node_type: node_type.into(),
            tokens: None,
            cost: None,
            provider: None,
            output: None,
            error: None,
        }
    }

    /// Attaches AI usage.
    #[must_use]
    pub fn with_usage(mut self, tokens: u64, cost: f64, provider: impl Into<String>) -> Self {
        self.tokens = Some(tokens);
        self.cost = Some(cost);
        self.provider = Some(provider.into());
        self
    }

    /// Attaches the node output.
    #[must_use]
    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }

    /// Attaches an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Percentage of `done` out of `total`, `100.0` for an empty run.
#[must_use]
pub(crate) fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = done as f64 / total as f64 * 100.0;
    pct
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_clamped() {
        let event = ProgressEvent::new("n1", "Writer", "contentWriter", ProgressStatus::Executing, 140.0);
        assert_eq!(event.progress, 100.0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 4), 0.0);
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(4, 4), 100.0);
        assert_eq!(percent(0, 0), 100.0);
    }

    #[test]
    fn test_event_serialization_uses_wire_names() {
        let event = ProgressEvent::new("n1", "Writer", "contentWriter", ProgressStatus::AiThinking, 50.0)
            .with_usage(42, 0.01, "openai");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["status"], "ai_thinking");
        assert_eq!(json["nodeId"], "n1");
        assert_eq!(json["tokens"], 42);
        assert!(json.get("error").is_none());
    }
}
