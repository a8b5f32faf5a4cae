//! The linear pipeline loop.

use super::{ExecutionRecord, ExecutionRequest};
use crate::cancellation::CancellationToken;
use crate::core::{NodeRole, ProgressEvent, ProgressStatus};
use crate::dispatch::{DispatchContext, NodeDispatch};
use crate::envelope::{ContextEnvelope, WorkflowSummary};
use crate::errors::{ExecutionError, WrappedNodeError};
use crate::nodes::{Node, NodeConfig};
use crate::observability::{NodeSpanAttributes, RunSpanAttributes};
use crate::progress::ProgressSink;
use crate::utils::generate_uuid_v7;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// Runs an ordered node list, threading one envelope chain through it.
///
/// Nodes execute strictly in list order. The first failing node aborts the
/// run; nodes after it are never dispatched.
#[derive(Clone)]
pub struct PipelineExecutor {
    dispatcher: Arc<dyn NodeDispatch>,
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor").finish_non_exhaustive()
    }
}

impl PipelineExecutor {
    /// Creates an executor over a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<dyn NodeDispatch>) -> Self {
        Self { dispatcher }
    }

    /// Runs `request` to a terminal status.
    ///
    /// `cancel` is checked before the first node and after every completed
    /// node; a node that is already running always finishes.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Node`] when a node fails and
    /// [`ExecutionError::Cancelled`] when the run was stopped. Both carry the
    /// terminal record.
    pub async fn run(
        &self,
        request: ExecutionRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let execution_id = request
            .execution_id
            .clone()
            .unwrap_or_else(|| generate_uuid_v7().to_string());
        let span = RunSpanAttributes::new(&execution_id, &request.workflow_id, request.nodes.len())
            .with_owner(
                request.customer_context.tenant_id.clone(),
                request.customer_context.user_id.clone(),
            )
            .span();

        self.run_inner(execution_id, request, progress, cancel)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        execution_id: String,
        request: ExecutionRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let ExecutionRequest {
            workflow_id,
            nodes,
            user_input,
            customer_context,
            ..
        } = request;
        let total = nodes.len();
        let mut record = ExecutionRecord::start(&execution_id, &workflow_id);

        info!(total_nodes = total, "Workflow execution started");

        let seed_config = seed_config(&nodes);
        let mut envelope =
            ContextEnvelope::create_initial(&seed_config, user_input, customer_context, workflow_id);
        if !envelope.metadata.validation.is_valid() {
            warn!(
                missing = ?envelope.metadata.validation.missing_fields(),
                "Required input fields are missing"
            );
        }

        check_cancelled(cancel, &mut record)?;

        for (index, node) in nodes.iter().enumerate() {
            let ctx = DispatchContext::new(&execution_id, progress, index, total);
            ctx.emit(node, ProgressStatus::Executing);
            debug!(node_id = %node.id, node_type = %node.node_type, index, "Dispatching node");

            let result = match self.dispatcher.dispatch(node, &envelope, &ctx).await {
                Ok(result) => result,
                Err(err) => {
                    let wrapped = WrappedNodeError::new(&node.id, &node.node_type, err);
                    let attrs = NodeSpanAttributes::failed(&wrapped);
                    error!(
                        node_id = %attrs.node_id,
                        node_type = %attrs.node_type,
                        kind = wrapped.error.kind(),
                        error = %wrapped.error,
                        "Node failed, aborting workflow"
                    );
                    record.fail(&wrapped);
                    progress.emit(
                        &ProgressEvent::new(
                            &node.id,
                            node.display_name(),
                            &node.node_type,
                            ProgressStatus::Error,
                            ctx.progress_before(),
                        )
                        .with_error(wrapped.error.to_string()),
                    );
                    return Err(ExecutionError::Node {
                        record: Box::new(record),
                        error: wrapped,
                    });
                }
            };

            envelope = envelope
                .extend(node, result.output_data.clone())
                .with_ai_usage(result.ai_usage.clone());

            progress.emit(&completed_event(node, &ctx, &result));
            let attrs = NodeSpanAttributes::completed(&result);
            info!(
                node_id = %attrs.node_id,
                node_type = %attrs.node_type,
                duration_ms = attrs.duration_ms,
                tokens = attrs.tokens,
                "Node completed"
            );
            record.results.push(result);

            check_cancelled(cancel, &mut record)?;
        }

        let final_output = envelope.current_node_output.clone();
        let finalized = envelope.finalize(final_output.clone().unwrap_or(serde_json::Value::Null));
        let summary = finalized
            .metadata
            .workflow_summary
            .clone()
            .unwrap_or_else(|| WorkflowSummary::from_history(&[], finalized.timestamp));
        record.complete(final_output, summary);

        info!(
            results = record.results.len(),
            total_tokens = record.total_tokens(),
            total_cost = record.total_cost(),
            duration_ms = record.duration_ms(),
            "Workflow execution completed"
        );
        Ok(record)
    }
}

/// Input configuration of the first input-role node, or an empty one.
fn seed_config(nodes: &[Node]) -> NodeConfig {
    nodes
        .iter()
        .find(|n| n.role() == Some(NodeRole::Input))
        .map(|n| n.data.clone())
        .unwrap_or_default()
}

fn check_cancelled(
    cancel: &CancellationToken,
    record: &mut ExecutionRecord,
) -> Result<(), ExecutionError> {
    if !cancel.is_cancelled() {
        return Ok(());
    }
    let reason = cancel.reason().unwrap_or_else(|| "cancelled".to_string());
    warn!(reason = %reason, completed_nodes = record.results.len(), "Workflow execution cancelled");
    record.cancel(&reason);
    Err(ExecutionError::Cancelled {
        record: Box::new(record.clone()),
        reason,
    })
}

fn completed_event(
    node: &Node,
    ctx: &DispatchContext<'_>,
    result: &crate::core::NodeResult,
) -> ProgressEvent {
    let mut event = ProgressEvent::new(
        &node.id,
        node.display_name(),
        &node.node_type,
        ProgressStatus::Completed,
        ctx.progress_after(),
    )
    .with_output(result.output_data.clone());
    if let Some(usage) = &result.ai_usage {
        event = event.with_usage(usage.tokens, usage.cost, &usage.provider);
    }
    event
}
