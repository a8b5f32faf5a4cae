//! Continuity data: the ordered history of prior nodes.

use crate::core::AiUsage;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One prior node as seen by later nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousNode {
    /// Node id.
    pub node_id: String,
    /// Node type string.
    pub node_type: String,
    /// The node's output (`null` for the seed envelope).
    pub output: serde_json::Value,
    /// When the node's envelope was produced.
    pub timestamp: Timestamp,
}

/// Compact record of a prior envelope kept in the workflow history.
///
/// Continuity data is not nested, so history stays linear in size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSnapshot {
    /// Node id.
    pub node_id: String,
    /// Node type string.
    pub node_type: String,
    /// When the envelope was produced.
    pub timestamp: Timestamp,
    /// Step counter at that point.
    pub processing_step: u32,
    /// AI usage reported by the node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_usage: Option<AiUsage>,
}

/// Everything an envelope remembers about prior nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuityData {
    /// Prior nodes, oldest first.
    #[serde(default)]
    pub previous_nodes: Vec<PreviousNode>,
    /// Prior envelopes, oldest first.
    #[serde(default)]
    pub workflow_history: Vec<EnvelopeSnapshot>,
    /// Output of every prior node keyed by node id. Grows only.
    #[serde(default)]
    pub accumulated_context: BTreeMap<String, serde_json::Value>,
}

impl ContinuityData {
    /// Returns true if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.previous_nodes.is_empty()
            && self.workflow_history.is_empty()
            && self.accumulated_context.is_empty()
    }

    /// Output recorded for a prior node.
    #[must_use]
    pub fn output_of(&self, node_id: &str) -> Option<&serde_json::Value> {
        self.accumulated_context.get(node_id)
    }

    /// Appends a prior node. An id that was already recorded keeps its first value.
    pub(crate) fn record(&mut self, previous: PreviousNode, snapshot: EnvelopeSnapshot) {
        self.accumulated_context
            .entry(previous.node_id.clone())
            .or_insert_with(|| previous.output.clone());
        self.previous_nodes.push(previous);
        self.workflow_history.push(snapshot);
    }
}
