//! Structured attributes attached to run and node spans.

use crate::core::{ExecutionStatus, NodeResult};
use crate::errors::WrappedNodeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::Span;

/// Attributes of one workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSpanAttributes {
    /// Execution id.
    pub execution_id: String,
    /// Workflow id.
    pub workflow_id: String,
    /// Number of nodes.
    pub total_nodes: usize,
    /// Tenant the run belongs to.
    pub tenant_id: Option<String>,
    /// User who started the run.
    pub user_id: Option<String>,
    /// Terminal status.
    pub status: Option<ExecutionStatus>,
}

impl RunSpanAttributes {
    /// Creates attributes for a run.
    #[must_use]
    pub fn new(execution_id: impl Into<String>, workflow_id: impl Into<String>, total_nodes: usize) -> Self {
        Self {
            execution_id: execution_id.into(),
            workflow_id: workflow_id.into(),
            total_nodes,
            ..Default::default()
        }
    }

    /// Sets the tenant and user.
    #[must_use]
    pub fn with_owner(mut self, tenant_id: Option<String>, user_id: Option<String>) -> Self {
        self.tenant_id = tenant_id;
        self.user_id = user_id;
        self
    }

    /// Sets the terminal status.
    #[must_use]
    pub fn with_status(mut self, status: ExecutionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// The `workflow.execute` span for this run.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "workflow.execute",
            execution_id = %self.execution_id,
            workflow_id = %self.workflow_id,
            total_nodes = self.total_nodes,
            tenant_id = self.tenant_id.as_deref().unwrap_or(""),
            user_id = self.user_id.as_deref().unwrap_or(""),
        )
    }

    /// Converts to OpenTelemetry-style attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("workflow.execution_id".to_string(), self.execution_id.clone());
        attrs.insert("workflow.id".to_string(), self.workflow_id.clone());
        attrs.insert("workflow.total_nodes".to_string(), self.total_nodes.to_string());
        if let Some(ref v) = self.tenant_id {
            attrs.insert("workflow.tenant_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.user_id {
            attrs.insert("workflow.user_id".to_string(), v.clone());
        }
        if let Some(v) = self.status {
            attrs.insert("workflow.status".to_string(), v.to_string());
        }
        attrs
    }
}

/// Attributes of one node execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpanAttributes {
    /// Node id.
    pub node_id: String,
    /// Node type string.
    pub node_type: String,
    /// `completed` or `failed`.
    pub status: Option<String>,
    /// Processing time.
    pub duration_ms: Option<u64>,
    /// Tokens consumed.
    pub tokens: Option<u64>,
    /// Provider used.
    pub provider: Option<String>,
    /// Error message on failure.
    pub error: Option<String>,
}

impl NodeSpanAttributes {
    /// Attributes of a completed node.
    #[must_use]
    pub fn completed(result: &NodeResult) -> Self {
        Self {
            node_id: result.node_id.clone(),
            node_type: result.node_type.clone(),
            status: Some("completed".to_string()),
            duration_ms: Some(result.processing_time_ms),
            tokens: result.ai_usage.as_ref().map(|u| u.tokens),
            provider: result.ai_usage.as_ref().map(|u| u.provider.clone()),
            error: None,
        }
    }

    /// Attributes of a failed node.
    #[must_use]
    pub fn failed(error: &WrappedNodeError) -> Self {
        Self {
            node_id: error.node_id.clone(),
            node_type: error.node_type.clone(),
            status: Some("failed".to_string()),
            error: Some(error.error.to_string()),
            ..Default::default()
        }
    }

    /// Converts to OpenTelemetry-style attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("node.id".to_string(), self.node_id.clone());
        attrs.insert("node.type".to_string(), self.node_type.clone());
        if let Some(ref v) = self.status {
            attrs.insert("node.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("node.duration_ms".to_string(), v.to_string());
        }
        if let Some(v) = self.tokens {
            attrs.insert("node.tokens".to_string(), v.to_string());
        }
        if let Some(ref v) = self.provider {
            attrs.insert("node.provider".to_string(), v.clone());
        }
        if let Some(ref v) = self.error {
            attrs.insert("node.error".to_string(), v.clone());
        }
        attrs
    }
}
