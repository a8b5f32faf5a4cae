//! Per-node result and AI usage types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token and cost usage reported by one AI invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiUsage {
    /// Total tokens consumed.
    pub tokens: u64,
    /// Cost in the provider's billing currency.
    pub cost: f64,
    /// Provider name.
    pub provider: String,
    /// Model id.
    pub model: String,
}

/// The result of one successfully executed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    /// The node id.
    pub node_id: String,
    /// The node's type string.
    pub node_type: String,
    /// What the node consumed (the previous output, or the user input for the first node).
    pub input_data: serde_json::Value,
    /// What the node produced.
    pub output_data: serde_json::Value,
    /// Handler-specific metadata (AI usage, validation notes, storage warnings).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Wall-clock processing time.
    pub processing_time_ms: u64,
    /// AI usage, when the node called a provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_usage: Option<AiUsage>,
}

impl NodeResult {
    /// Returns the `content` string of the output, if it has one.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.output_data.get("content").and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_accessor() {
        let result = NodeResult {
            node_id: "w".into(),
            node_type: "contentWriter".into(),
            input_data: serde_json::Value::Null,
            output_data: serde_json::json!({"content": "hello"}),
            metadata: HashMap::new(),
            processing_time_ms: 3,
            ai_usage: None,
        };
        assert_eq!(result.content(), Some("hello"));
    }
}
