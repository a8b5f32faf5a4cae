//! The mutable record of one run.

use crate::core::{ExecutionStatus, NodeResult};
use crate::envelope::WorkflowSummary;
use crate::errors::WrappedNodeError;
use crate::utils::{now_utc, timestamps::elapsed_ms, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node failure as recorded in the execution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeErrorRecord {
    /// The failing node.
    pub node_id: String,
    /// Its type string.
    pub node_type: String,
    /// Error category (`DispatchError`, `ProviderError`, ...).
    pub kind: String,
    /// Error message.
    pub error: String,
    /// When the failure was recorded.
    pub timestamp: Timestamp,
}

impl NodeErrorRecord {
    /// Records a wrapped node error.
    #[must_use]
    pub fn from_error(error: &WrappedNodeError) -> Self {
        Self {
            node_id: error.node_id.clone(),
            node_type: error.node_type.clone(),
            kind: error.error.kind().to_string(),
            error: error.error.to_string(),
            timestamp: now_utc(),
        }
    }
}

/// Everything known about one run.
///
/// Owned and mutated by the executor while the run is in flight; handed to
/// the caller once it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Execution id.
    pub execution_id: String,
    /// Workflow id.
    pub workflow_id: String,
    /// When the run started.
    pub start_time: Timestamp,
    /// When the run reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
    /// Current status.
    pub status: ExecutionStatus,
    /// One result per completed node, in execution order.
    #[serde(default)]
    pub results: Vec<NodeResult>,
    /// Node failures. At most one, since runs stop at the first failure.
    #[serde(default)]
    pub errors: Vec<NodeErrorRecord>,
    /// Output of the last node of a completed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<serde_json::Value>,
    /// Totals of a completed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_summary: Option<WorkflowSummary>,
    /// Why a cancelled run was stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl ExecutionRecord {
    /// Creates a running record.
    #[must_use]
    pub fn start(execution_id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            workflow_id: workflow_id.into(),
            start_time: now_utc(),
            end_time: None,
            status: ExecutionStatus::Running,
            results: Vec::new(),
            errors: Vec::new(),
            final_output: None,
            workflow_summary: None,
            cancel_reason: None,
        }
    }

    /// Marks the run completed.
    pub fn complete(&mut self, final_output: Option<serde_json::Value>, summary: WorkflowSummary) {
        self.status = ExecutionStatus::Completed;
        self.final_output = final_output;
        self.workflow_summary = Some(summary);
        self.end_time = Some(now_utc());
    }

    /// Marks the run failed at `error`.
    pub fn fail(&mut self, error: &WrappedNodeError) {
        self.errors.push(NodeErrorRecord::from_error(error));
        self.status = ExecutionStatus::Failed;
        self.end_time = Some(now_utc());
    }

    /// A record for a run refused before its first node.
    #[must_use]
    pub fn rejected(execution_id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        let mut record = Self::start(execution_id, workflow_id);
        record.status = ExecutionStatus::Failed;
        record.end_time = Some(record.start_time);
        record
    }

    /// Marks the run cancelled.
    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.status = ExecutionStatus::Cancelled;
        self.cancel_reason = Some(reason.into());
        self.end_time = Some(now_utc());
    }

    /// Wall-clock duration, once the run has ended.
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time.map(|end| elapsed_ms(self.start_time, end))
    }

    /// Tokens reported by the completed nodes.
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.results
            .iter()
            .filter_map(|r| r.ai_usage.as_ref())
            .map(|u| u.tokens)
            .sum()
    }

    /// Cost reported by the completed nodes.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.results
            .iter()
            .filter_map(|r| r.ai_usage.as_ref())
            .map(|u| u.cost)
            .sum()
    }

    /// Result of a node, by id.
    #[must_use]
    pub fn result_for(&self, node_id: &str) -> Option<&NodeResult> {
        self.results.iter().find(|r| r.node_id == node_id)
    }

    /// Summary for UI and operator layers.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("execution_id".to_string(), serde_json::json!(self.execution_id));
        map.insert("workflow_id".to_string(), serde_json::json!(self.workflow_id));
        map.insert("status".to_string(), serde_json::json!(self.status));
        map.insert("completed_nodes".to_string(), serde_json::json!(self.results.len()));
        map.insert("total_tokens".to_string(), serde_json::json!(self.total_tokens()));
        map.insert("total_cost".to_string(), serde_json::json!(self.total_cost()));
        if let Some(duration) = self.duration_ms() {
            map.insert("duration_ms".to_string(), serde_json::json!(duration));
        }
        if let Some(error) = self.errors.first() {
            map.insert("error".to_string(), serde_json::json!(error));
        }
        map
    }
}
