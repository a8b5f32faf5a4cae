use crate::core::{percent, AiUsage, NodeRole, ProgressEvent, ProgressStatus};
use crate::envelope::ContextEnvelope;
use crate::errors::NodeError;
use crate::nodes::{Node, NodeKind};
use crate::progress::ProgressSink;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

/// Per-node facts a handler may need besides the node and envelope.
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    /// The running execution.
    pub execution_id: &'a str,
    /// Where progress goes.
    pub progress: &'a dyn ProgressSink,
    /// Zero-based position of the node.
    pub node_index: usize,
    /// Number of nodes in the run.
    pub total_nodes: usize,
}

impl<'a> DispatchContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(
        execution_id: &'a str,
        progress: &'a dyn ProgressSink,
        node_index: usize,
        total_nodes: usize,
    ) -> Self {
        Self {
            execution_id,
            progress,
            node_index,
            total_nodes,
        }
    }

    /// Run progress before this node completes.
    #[must_use]
    pub fn progress_before(&self) -> f64 {
        percent(self.node_index, self.total_nodes)
    }

    /// Run progress once this node completes.
    #[must_use]
    pub fn progress_after(&self) -> f64 {
        percent(self.node_index + 1, self.total_nodes)
    }

    /// Emits a status for `node` at the pre-completion progress.
    pub fn emit(&self, node: &Node, status: ProgressStatus) {
        self.progress.emit(&ProgressEvent::new(
            &node.id,
            node.display_name(),
            &node.node_type,
            status,
            self.progress_before(),
        ));
    }
}

impl fmt::Debug for DispatchContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchContext")
            .field("execution_id", &self.execution_id)
            .field("node_index", &self.node_index)
            .field("total_nodes", &self.total_nodes)
            .finish_non_exhaustive()
    }
}

/// What a role handler produced for one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerOutput {
    /// The node output, threaded into the next envelope.
    pub output: serde_json::Value,
    /// Handler-specific metadata for the node result.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Usage, for nodes that called a provider.
    pub ai_usage: Option<AiUsage>,
}

impl HandlerOutput {
    /// Creates an output without metadata.
    #[must_use]
    pub fn new(output: serde_json::Value) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Sets the usage.
    #[must_use]
    pub fn with_usage(mut self, usage: AiUsage) -> Self {
        self.ai_usage = Some(usage);
        self
    }
}

/// Executes every node kind belonging to one role.
#[async_trait]
pub trait RoleHandler: Send + Sync + fmt::Debug {
    /// The role served.
    fn role(&self) -> NodeRole;

    /// Runs one node. `kind` is already known to belong to [`Self::role`].
    async fn handle(
        &self,
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<HandlerOutput, NodeError>;
}
