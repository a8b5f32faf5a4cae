use super::handlers::{ConditionHandler, InputHandler, OutputHandler, PreviewHandler, ProcessHandler};
use super::{DispatchContext, RoleHandler};
use crate::config::EngineConfig;
use crate::core::{NodeResult, NodeRole};
use crate::envelope::ContextEnvelope;
use crate::errors::{DispatchError, NodeError};
use crate::nodes::Node;
use crate::output::ExecutionStore;
use crate::providers::{AiInvocationAdapter, GenerationProvider};
use crate::utils::timestamps::elapsed_ms;
use crate::utils::now_utc;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Runs one node against the current envelope.
#[async_trait]
pub trait NodeDispatch: Send + Sync {
    /// Dispatches `node`.
    ///
    /// Returns [`NodeError::Dispatch`] without running anything when the
    /// node's type is not in the catalog.
    async fn dispatch(
        &self,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<NodeResult, NodeError>;
}

/// Routes nodes to the handler of their role.
#[derive(Debug, Clone)]
pub struct NodeDispatcher {
    input: Arc<dyn RoleHandler>,
    process: Arc<dyn RoleHandler>,
    condition: Arc<dyn RoleHandler>,
    preview: Arc<dyn RoleHandler>,
    output: Arc<dyn RoleHandler>,
}

impl NodeDispatcher {
    /// Creates a dispatcher with the built-in handlers.
    #[must_use]
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Arc<dyn ExecutionStore>,
        config: Arc<EngineConfig>,
    ) -> Self {
        let adapter = AiInvocationAdapter::new(provider, Arc::clone(&config));
        Self {
            input: Arc::new(InputHandler),
            process: Arc::new(ProcessHandler::new(adapter)),
            condition: Arc::new(ConditionHandler::new(Arc::clone(&config))),
            preview: Arc::new(PreviewHandler::new()),
            output: Arc::new(OutputHandler::new(store, config)),
        }
    }

    /// Replaces the handler for the handler's role.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn RoleHandler>) -> Self {
        match handler.role() {
            NodeRole::Input => self.input = handler,
            NodeRole::Process => self.process = handler,
            NodeRole::Condition => self.condition = handler,
            NodeRole::Preview => self.preview = handler,
            NodeRole::Output => self.output = handler,
        }
        self
    }

    /// The handler for a role.
    #[must_use]
    pub fn handler(&self, role: NodeRole) -> &dyn RoleHandler {
        match role {
            NodeRole::Input => self.input.as_ref(),
            NodeRole::Process => self.process.as_ref(),
            NodeRole::Condition => self.condition.as_ref(),
            NodeRole::Preview => self.preview.as_ref(),
            NodeRole::Output => self.output.as_ref(),
        }
    }
}

#[async_trait]
impl NodeDispatch for NodeDispatcher {
    async fn dispatch(
        &self,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<NodeResult, NodeError> {
        let kind = node
            .kind()
            .ok_or_else(|| DispatchError::new(&node.id, &node.node_type))?;
        let role = kind.role();
        debug!(node_id = %node.id, node_kind = %kind, role = %role, "Dispatching node");

        let input_data = envelope
            .current_node_output
            .clone()
            .unwrap_or_else(|| Value::Object((*envelope.user_input).clone()));

        let started = now_utc();
        let out = self.handler(role).handle(kind, node, envelope, ctx).await?;

        Ok(NodeResult {
            node_id: node.id.clone(),
            node_type: node.node_type.clone(),
            input_data,
            output_data: out.output,
            metadata: out.metadata,
            processing_time_ms: elapsed_ms(started, now_utc()),
            ai_usage: out.ai_usage,
        })
    }
}
