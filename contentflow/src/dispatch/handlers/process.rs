use crate::core::{NodeRole, ProgressStatus};
use crate::dispatch::{DispatchContext, HandlerOutput, RoleHandler};
use crate::envelope::ContextEnvelope;
use crate::errors::NodeError;
use crate::nodes::{Node, NodeKind};
use crate::providers::AiInvocationAdapter;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Runs content-producing nodes through the AI invocation adapter.
///
/// The only handler that calls a provider. Reports `ai_thinking` before the
/// call; the completion event carrying usage is reported by the executor.
#[derive(Debug, Clone)]
pub struct ProcessHandler {
    adapter: AiInvocationAdapter,
}

impl ProcessHandler {
    /// Creates a handler over an adapter.
    #[must_use]
    pub fn new(adapter: AiInvocationAdapter) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl RoleHandler for ProcessHandler {
    fn role(&self) -> NodeRole {
        NodeRole::Process
    }

    async fn handle(
        &self,
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<HandlerOutput, NodeError> {
        let view = envelope.extract_for_invocation();

        if kind.transforms_previous()
            && view.previous_content().is_none()
            && view.user_value("content").is_none()
        {
            return Err(NodeError::MissingInput(format!(
                "{kind} node '{}' has no content to work on",
                node.id
            )));
        }

        ctx.emit(node, ProgressStatus::AiThinking);
        debug!(node_id = %node.id, node_kind = %kind, "Awaiting generation");

        let outcome = self.adapter.generate(kind, &view, &node.data).await?;
        let usage = outcome.usage();

        Ok(HandlerOutput::new(json!({
            "content": outcome.content,
            "nodeType": kind.as_str(),
        }))
        .with_metadata("provider", json!(outcome.provider))
        .with_metadata("model", json!(outcome.model))
        .with_metadata("tokens", json!(outcome.tokens))
        .with_metadata("cost", json!(outcome.cost))
        .with_usage(usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::envelope::CustomerContext;
    use crate::errors::ProviderError;
    use crate::nodes::NodeConfig;
    use crate::progress::CollectingProgressSink;
    use crate::providers::GenerationResponse;
    use crate::testing::MockGenerationProvider;
    use std::sync::Arc;

    fn handler(provider: &Arc<MockGenerationProvider>) -> ProcessHandler {
        ProcessHandler::new(AiInvocationAdapter::new(
            provider.clone(),
            Arc::new(EngineConfig::default()),
        ))
    }

    fn seed() -> ContextEnvelope {
        ContextEnvelope::create_initial(
            &NodeConfig::new(),
            json!({"topic": "X"}).as_object().cloned().unwrap_or_default(),
            CustomerContext::default(),
            "wf",
        )
    }

    #[tokio::test]
    async fn test_generates_and_reports_thinking() {
        let provider = Arc::new(MockGenerationProvider::with_response(
            GenerationResponse::new("Y").with_usage(42, 0.01),
        ));
        let sink = CollectingProgressSink::new();
        let ctx = DispatchContext::new("e1", &sink, 1, 3);
        let node = Node::of_kind("writer", NodeKind::ContentWriter);

        let out = handler(&provider)
            .handle(NodeKind::ContentWriter, &node, &seed(), &ctx)
            .await
            .unwrap();

        assert_eq!(out.output["content"], "Y");
        assert_eq!(out.ai_usage.as_ref().map(|u| u.tokens), Some(42));
        assert_eq!(sink.events_with_status(ProgressStatus::AiThinking).len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transforming_kind_without_content_fails_before_calling() {
        let provider = Arc::new(MockGenerationProvider::with_response(GenerationResponse::new(
            "Y",
        )));
        let sink = CollectingProgressSink::new();
        let ctx = DispatchContext::new("e1", &sink, 0, 1);
        let node = Node::of_kind("sum", NodeKind::Summarizer);

        let err = handler(&provider)
            .handle(NodeKind::Summarizer, &node, &seed(), &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, NodeError::MissingInput(_)));
        assert_eq!(provider.call_count(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_surfaced() {
        let provider = Arc::new(MockGenerationProvider::failing(ProviderError::request(
            "openai", "503",
        )));
        let sink = CollectingProgressSink::new();
        let ctx = DispatchContext::new("e1", &sink, 0, 1);
        let node = Node::of_kind("w", NodeKind::BlogWriter);

        let err = handler(&provider)
            .handle(NodeKind::BlogWriter, &node, &seed(), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ProviderError");
    }
}
