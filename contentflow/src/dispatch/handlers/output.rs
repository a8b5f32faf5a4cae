use super::previous_text;
use crate::config::EngineConfig;
use crate::core::NodeRole;
use crate::dispatch::{DispatchContext, HandlerOutput, RoleHandler};
use crate::envelope::ContextEnvelope;
use crate::errors::NodeError;
use crate::nodes::{Node, NodeKind};
use crate::output::{
    DeliveryDescriptor, ExecutionStore, OutputFormat, OutputFormatter, PersistedArtifact,
    RenderOptions, RenderedOutput,
};
use crate::utils::{now_utc, timestamps::add_hours};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Renders the final content and persists it.
///
/// A failed write is logged and noted in the result metadata; the content
/// was already produced, so the node still succeeds.
#[derive(Clone)]
pub struct OutputHandler {
    formatter: OutputFormatter,
    store: Arc<dyn ExecutionStore>,
    config: Arc<EngineConfig>,
}

impl fmt::Debug for OutputHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputHandler")
            .field("default_format", &self.config.default_output_format)
            .field("artifact_ttl_hours", &self.config.artifact_ttl_hours)
            .finish_non_exhaustive()
    }
}

impl OutputHandler {
    /// Creates a handler writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ExecutionStore>, config: Arc<EngineConfig>) -> Self {
        Self {
            formatter: OutputFormatter::new(),
            store,
            config,
        }
    }

    fn format_for(&self, kind: NodeKind, node: &Node) -> Result<OutputFormat, NodeError> {
        match node.data.setting_str("format") {
            Some(name) => OutputFormat::parse(name).ok_or_else(|| {
                NodeError::InvalidConfig(format!("unknown output format '{name}' on '{}'", node.id))
            }),
            None if kind == NodeKind::EmailOutput => Ok(OutputFormat::Html),
            None => Ok(self.config.default_output_format),
        }
    }

    fn channel(kind: NodeKind) -> &'static str {
        match kind {
            NodeKind::ExportOutput => "export",
            NodeKind::PublishOutput => "publish",
            NodeKind::EmailOutput => "email",
            _ => "download",
        }
    }

    fn document(
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        rendered: &RenderedOutput,
        delivery: &DeliveryDescriptor,
    ) -> Value {
        let alternatives: Vec<Value> = rendered
            .alternatives
            .iter()
            .map(|a| {
                if kind == NodeKind::ExportOutput {
                    json!(a)
                } else {
                    json!({"format": a.format, "filename": a.filename, "sizeBytes": a.size_bytes})
                }
            })
            .collect();

        let mut doc = json!({
            "content": rendered.primary.content,
            "format": rendered.primary.format,
            "filename": rendered.primary.filename,
            "channel": Self::channel(kind),
            "delivery": delivery,
            "alternatives": alternatives,
        });
        match kind {
            NodeKind::EmailOutput => {
                let subject = node
                    .data
                    .setting_str("subject")
                    .map(str::to_string)
                    .or_else(|| envelope.extract_for_invocation().user_value("topic"))
                    .unwrap_or_else(|| node.display_name().to_string());
                doc["subject"] = json!(subject);
                doc["recipients"] = node.data.extra.get("recipients").cloned().unwrap_or(json!([]));
            }
            NodeKind::PublishOutput => {
                doc["status"] = json!("ready_to_publish");
                if let Some(target) = node.data.setting_str("destination") {
                    doc["destination"] = json!(target);
                }
            }
            _ => {}
        }
        doc
    }
}

#[async_trait]
impl RoleHandler for OutputHandler {
    fn role(&self) -> NodeRole {
        NodeRole::Output
    }

    async fn handle(
        &self,
        kind: NodeKind,
        node: &Node,
        envelope: &ContextEnvelope,
        ctx: &DispatchContext<'_>,
    ) -> Result<HandlerOutput, NodeError> {
        let content = previous_text(envelope).ok_or_else(|| {
            NodeError::MissingInput(format!("output node '{}' has no content to deliver", node.id))
        })?;
        let format = self.format_for(kind, node)?;
        let created_at = now_utc();
        let expires_at = add_hours(created_at, self.config.artifact_ttl_hours);

        let mut options = RenderOptions::new(
            format,
            node.data.setting_str("filename").unwrap_or(ctx.execution_id),
        );
        if let Some(label) = &node.data.label {
            options = options.with_title(label.clone());
        }
        if node.data.setting_bool("includeMetadata").unwrap_or(false) {
            options = options.with_metadata((*envelope.customer_context).clone(), created_at);
        }

        let rendered = self.formatter.render_all(&content, &options);
        let delivery = DeliveryDescriptor::for_artifact(&rendered.primary, expires_at);
        let document = Self::document(kind, node, envelope, &rendered, &delivery);

        let artifact = PersistedArtifact {
            execution_id: ctx.execution_id.to_string(),
            final_output: document.clone(),
            created_at,
            expires_at,
        };

        let mut result = HandlerOutput::new(document)
            .with_metadata("format", json!(format))
            .with_metadata("checksum", json!(delivery.checksum));
        match self.store.save(artifact).await {
            Ok(()) => {
                info!(
                    execution_id = %ctx.execution_id,
                    node_id = %node.id,
                    format = %format,
                    size_bytes = delivery.size_bytes,
                    "Final output persisted"
                );
                result = result.with_metadata("persisted", json!(true));
            }
            Err(e) => {
                warn!(
                    execution_id = %ctx.execution_id,
                    node_id = %node.id,
                    error = %e,
                    "Failed to persist final output"
                );
                result = result
                    .with_metadata("persisted", json!(false))
                    .with_metadata("storageError", json!(e.to_string()));
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::CustomerContext;
    use crate::errors::StorageError;
    use crate::nodes::NodeConfig;
    use crate::output::{InMemoryExecutionStore, MockExecutionStore};
    use crate::progress::NoOpProgressSink;
    use pretty_assertions::assert_eq;

    fn after(previous: Value) -> ContextEnvelope {
        let input = json!({"topic": "Launch"}).as_object().cloned().unwrap_or_default();
        ContextEnvelope::create_initial(&NodeConfig::new(), input, CustomerContext::default(), "wf")
            .extend(&Node::of_kind("w", NodeKind::ContentWriter), previous)
    }

    #[tokio::test]
    async fn test_renders_and_persists() {
        let store = Arc::new(InMemoryExecutionStore::new());
        let handler = OutputHandler::new(store.clone(), Arc::new(EngineConfig::default()));
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("exec-1", &sink, 2, 3);
        let node = Node::of_kind("out", NodeKind::Output);

        let out = handler
            .handle(NodeKind::Output, &node, &after(json!({"content": "Y"})), &ctx)
            .await
            .unwrap();

        assert!(out.output["content"].as_str().unwrap().contains('Y'));
        assert_eq!(out.output["format"], "html");
        assert_eq!(out.output["filename"], "exec-1.html");
        assert_eq!(out.metadata["persisted"], true);

        let stored = store.load("exec-1").await.unwrap().unwrap();
        assert_eq!(stored.final_output, out.output);
        assert_eq!(stored.expires_at - stored.created_at, chrono::Duration::hours(24));
    }

    #[tokio::test]
    async fn test_storage_failure_is_not_fatal() {
        let mut store = MockExecutionStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|a| Err(StorageError::write(a.execution_id, "disk full")));
        let handler = OutputHandler::new(Arc::new(store), Arc::new(EngineConfig::default()));
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("exec-2", &sink, 0, 1);
        let node = Node::of_kind("out", NodeKind::ExportOutput);

        let out = handler
            .handle(NodeKind::ExportOutput, &node, &after(json!("Y")), &ctx)
            .await
            .unwrap();

        assert_eq!(out.metadata["persisted"], false);
        assert!(out.metadata["storageError"].as_str().unwrap().contains("disk full"));
        assert_eq!(out.output["channel"], "export");
        assert!(out.output["alternatives"][0]["content"].is_string());
    }

    #[tokio::test]
    async fn test_format_setting_and_email_subject() {
        let store = Arc::new(InMemoryExecutionStore::new());
        let handler = OutputHandler::new(store, Arc::new(EngineConfig::default()));
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("exec-3", &sink, 0, 1);

        let md = Node::of_kind("out", NodeKind::Output)
            .with_config(NodeConfig::new().with_setting("format", json!("markdown")));
        let out = handler
            .handle(NodeKind::Output, &md, &after(json!("Y")), &ctx)
            .await
            .unwrap();
        assert_eq!(out.output["content"], "Y\n");

        let email = Node::of_kind("mail", NodeKind::EmailOutput);
        let out = handler
            .handle(NodeKind::EmailOutput, &email, &after(json!("Y")), &ctx)
            .await
            .unwrap();
        assert_eq!(out.output["subject"], "Launch");
        assert_eq!(out.output["format"], "html");
    }

    #[tokio::test]
    async fn test_unknown_format_is_config_error() {
        let handler = OutputHandler::new(
            Arc::new(InMemoryExecutionStore::new()),
            Arc::new(EngineConfig::default()),
        );
        let sink = NoOpProgressSink;
        let ctx = DispatchContext::new("e", &sink, 0, 1);
        let node = Node::of_kind("out", NodeKind::Output)
            .with_config(NodeConfig::new().with_setting("format", json!("pdf")));

        let err = handler
            .handle(NodeKind::Output, &node, &after(json!("Y")), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::InvalidConfig(_)));
    }
}
